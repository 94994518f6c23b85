//! Blendshape smoothing.
//!
//! Raw blendshape scores are noisy from frame to frame. The
//! [`SignalSmoother`] keeps a rolling history of them, applies a weighted
//! moving average, then splices landmark-derived eye aspect ratios over the
//! blink slots.

/// Normalized smoothing kernels
pub mod kernel;

/// Rolling blendshape history
pub mod history;

/// Eye aspect ratio from landmark geometry
pub mod ear;

pub use ear::{eye_aspect_ratios, EyeAspectRatios};
pub use history::{BlendshapeFrame, BlendshapeHistory};
pub use kernel::{KernelProfile, SmoothingKernel};

use crate::{
    constants::{EAR_AVG_SLOT, EAR_LEFT_SLOT, EAR_RIGHT_SLOT, N_SHAPES},
    detector::{DetectionResult, Landmark},
    gestures::GestureId,
    Error, Result,
};
use std::ops::Index;

/// Smoothed blendshape vector with eye aspect ratios in the blink slots
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedSignal([f64; N_SHAPES]);

impl SmoothedSignal {
    pub const fn new(values: [f64; N_SHAPES]) -> Self {
        Self(values)
    }

    /// Score for a gesture
    pub const fn get(&self, gesture: GestureId) -> f64 {
        self.0[gesture.index()]
    }

    pub const fn values(&self) -> &[f64; N_SHAPES] {
        &self.0
    }
}

impl Index<usize> for SmoothedSignal {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Rolling-history blendshape smoother
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    kernel: SmoothingKernel,
    history: BlendshapeHistory,
    latest: Option<SmoothedSignal>,
}

impl SignalSmoother {
    /// Create a smoother
    pub fn new(kernel: SmoothingKernel, history_capacity: usize) -> Result<Self> {
        if history_capacity == 0 || kernel.len() > history_capacity {
            return Err(Error::InvalidKernel(format!(
                "kernel length {} does not fit history capacity {history_capacity}",
                kernel.len()
            )));
        }
        Ok(Self {
            kernel,
            history: BlendshapeHistory::new(history_capacity),
            latest: None,
        })
    }

    /// Feed one detection. Without a face the history is left alone and the
    /// previous smoothed signal is returned unchanged.
    pub fn observe(&mut self, result: &DetectionResult) -> Option<&SmoothedSignal> {
        if result.has_face() {
            // has_face() guarantees a full-length vector
            if let Err(e) = self.push(&result.blendshapes, &result.landmarks) {
                log::warn!("Dropping detection at {}ms: {e}", result.timestamp_ms);
            }
        }
        self.latest.as_ref()
    }

    /// Append raw scores and recompute the smoothed signal
    pub fn push(&mut self, blendshapes: &[f64], landmarks: &[Landmark]) -> Result<&SmoothedSignal> {
        let frame: BlendshapeFrame = blendshapes.try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "expected {N_SHAPES} blendshape scores, got {}",
                blendshapes.len()
            ))
        })?;
        self.history.push(frame);

        let mut values = self.history.convolve(&self.kernel);
        let ears = eye_aspect_ratios(landmarks);
        values[EAR_RIGHT_SLOT] = ears.right;
        values[EAR_LEFT_SLOT] = ears.left;
        values[EAR_AVG_SLOT] = ears.average;

        Ok(&*self.latest.insert(SmoothedSignal(values)))
    }

    /// Last computed signal, if any detection with a face has been seen
    pub const fn latest(&self) -> Option<&SmoothedSignal> {
        self.latest.as_ref()
    }

    pub const fn history(&self) -> &BlendshapeHistory {
        &self.history
    }

    pub const fn kernel(&self) -> &SmoothingKernel {
        &self.kernel
    }

    /// Drop all history and the last signal
    pub fn reset(&mut self) {
        self.history.clear();
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(timestamp_ms: u64, score: f64) -> DetectionResult {
        DetectionResult {
            timestamp_ms,
            landmarks: vec![Landmark::default(); 478],
            blendshapes: vec![score; N_SHAPES],
            transformation_matrix: None,
        }
    }

    #[test]
    fn test_half_half_kernel() {
        let kernel = SmoothingKernel::new(vec![0.5, 0.5], 100).unwrap();
        let mut smoother = SignalSmoother::new(kernel, 100).unwrap();
        smoother.observe(&face(1, 0.2));
        let signal = smoother.observe(&face(2, 0.8)).unwrap();
        assert!((signal[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_gap_freezes_signal() {
        let kernel = SmoothingKernel::new(vec![1.0], 100).unwrap();
        let mut smoother = SignalSmoother::new(kernel, 100).unwrap();
        smoother.observe(&face(1, 0.6));
        let before = smoother.latest().cloned();

        let after = smoother.observe(&DetectionResult::empty(2)).cloned();
        assert_eq!(before, after);
        assert_eq!(smoother.history().len(), 1);
    }

    #[test]
    fn test_blink_slots_overwritten() {
        let kernel = SmoothingKernel::new(vec![1.0], 100).unwrap();
        let mut smoother = SignalSmoother::new(kernel, 100).unwrap();
        let signal = smoother.observe(&face(1, 0.9)).unwrap();
        // degenerate all-zero mesh yields zero EAR
        assert_eq!(signal[EAR_RIGHT_SLOT], 0.0);
        assert_eq!(signal[EAR_LEFT_SLOT], 0.0);
        assert_eq!(signal[EAR_AVG_SLOT], 0.0);
        assert!((signal[12] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_push_rejects_short_vector() {
        let kernel = SmoothingKernel::new(vec![1.0], 10).unwrap();
        let mut smoother = SignalSmoother::new(kernel, 10).unwrap();
        assert!(smoother.push(&[0.1; 10], &[]).is_err());
        assert!(smoother.history().is_empty());
    }

    #[test]
    fn test_kernel_larger_than_capacity() {
        let kernel = SmoothingKernel::new(vec![1.0; 5], 10).unwrap();
        assert!(SignalSmoother::new(kernel, 4).is_err());
    }
}
