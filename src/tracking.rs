//! Screen-space tracking point from a detection result.
//!
//! Two interchangeable strategies:
//! - landmark average: mean of a configured set of landmarks scaled to the
//!   screen. Simple and stable, but only covers small motions.
//! - head pose: the forward axis of the facial transformation's rotation,
//!   projected onto the screen. Full-screen range from head rotation, but
//!   sensitive to matrix noise.

use crate::{
    constants::{DEFAULT_HEAD_POSE_GAIN, NUM_FACE_LANDMARKS},
    detector::{DetectionResult, TransformMatrix},
    Error, Result,
};
use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Pointer position in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackingPoint {
    pub x: f64,
    pub y: f64,
}

impl TrackingPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Tracking strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingMode {
    /// Mean of the listed landmarks
    LandmarkAverage(Vec<usize>),
    /// Rotated forward vector of the transformation matrix
    HeadPose,
}

/// Computes tracking points for a fixed screen size
#[derive(Debug, Clone)]
pub struct TrackingLocator {
    mode: TrackingMode,
    screen_width: f64,
    screen_height: f64,
    gain: f64,
}

impl TrackingLocator {
    /// Create a locator
    pub fn new(mode: TrackingMode, screen_width: u32, screen_height: u32) -> Result<Self> {
        if screen_width == 0 || screen_height == 0 {
            return Err(Error::Config(format!(
                "Screen size must be non-zero, got {screen_width}x{screen_height}"
            )));
        }
        if let TrackingMode::LandmarkAverage(vertices) = &mode {
            if vertices.is_empty() {
                return Err(Error::Config("Tracking vertex set is empty".to_string()));
            }
            if let Some(bad) = vertices.iter().find(|&&v| v >= NUM_FACE_LANDMARKS) {
                return Err(Error::Config(format!(
                    "Tracking vertex {bad} is outside the {NUM_FACE_LANDMARKS}-point face mesh"
                )));
            }
        }

        Ok(Self {
            mode,
            screen_width: f64::from(screen_width),
            screen_height: f64::from(screen_height),
            gain: DEFAULT_HEAD_POSE_GAIN,
        })
    }

    /// Override the head-pose gain
    pub const fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub const fn mode(&self) -> &TrackingMode {
        &self.mode
    }

    /// Tracking point for `result`, or `None` when it cannot be computed
    /// (no face, no transformation matrix, degenerate matrix).
    #[must_use]
    pub fn locate(&self, result: &DetectionResult) -> Option<TrackingPoint> {
        if result.landmarks.is_empty() {
            return None;
        }

        match &self.mode {
            TrackingMode::LandmarkAverage(vertices) => self.landmark_average(result, vertices),
            TrackingMode::HeadPose => {
                let Some(matrix) = result.transformation_matrix.as_ref() else {
                    debug!("Head-pose tracking without a transformation matrix at {}ms", result.timestamp_ms);
                    return None;
                };
                self.head_pose(matrix)
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn landmark_average(&self, result: &DetectionResult, vertices: &[usize]) -> Option<TrackingPoint> {
        let (sum_x, sum_y, n) = vertices
            .iter()
            .filter_map(|&v| result.landmarks.get(v))
            .fold((0.0, 0.0, 0_usize), |(sx, sy, n), lm| {
                (sx + lm.x * self.screen_width, sy + lm.y * self.screen_height, n + 1)
            });

        if n == 0 {
            return None;
        }
        Some(TrackingPoint::new(sum_x / n as f64, sum_y / n as f64))
    }

    fn head_pose(&self, matrix: &TransformMatrix) -> Option<TrackingPoint> {
        let rotation = orthonormal_rotation(&matrix.rotation_block())?;
        let forward = rotation * Vector3::new(0.0, 0.0, 1.0);

        let dx = forward.x * self.gain;
        let dy = forward.y * self.gain;

        let half_w = self.screen_width / 2.0;
        let half_h = self.screen_height / 2.0;
        // screen y grows downward
        Some(TrackingPoint::new(half_w + dx * half_w, half_h - dy * half_h))
    }
}

/// Nearest rotation to `m`, `U·Vᵀ` from its SVD, discarding scale and shear
pub fn orthonormal_rotation(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    if m.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let svd = m.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    Some(u * v_t)
}
