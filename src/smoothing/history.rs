use super::kernel::SmoothingKernel;
use crate::constants::N_SHAPES;
use std::collections::VecDeque;

/// Raw blendshape scores of one detection
pub type BlendshapeFrame = [f64; N_SHAPES];

/// Fixed-capacity FIFO of raw blendshape frames, oldest first
#[derive(Debug, Clone)]
pub struct BlendshapeHistory {
    capacity: usize,
    frames: VecDeque<BlendshapeFrame>,
}

impl BlendshapeHistory {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "History capacity must be greater than 0");
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a frame, evicting the oldest once full
    pub fn push(&mut self, frame: BlendshapeFrame) {
        if self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Weighted moving average over the newest `kernel.len()` frames.
    ///
    /// The newest frame takes the kernel's last weight. Frames not yet
    /// pushed count as zero, as if the history were zero-initialized.
    pub fn convolve(&self, kernel: &SmoothingKernel) -> BlendshapeFrame {
        let weights = kernel.weights();
        let used = weights.len().min(self.frames.len());
        let skip = self.frames.len() - used;

        let mut out = [0.0; N_SHAPES];
        for (weight, frame) in weights[weights.len() - used..]
            .iter()
            .zip(self.frames.iter().skip(skip))
        {
            for (acc, value) in out.iter_mut().zip(frame.iter()) {
                *acc += weight * value;
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &BlendshapeFrame> {
        self.frames.iter()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
