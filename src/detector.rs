//! Landmark detector contract and detection result types.
//!
//! The detector itself is a black box: frames go in through
//! [`LandmarkDetector::detect_async`] and results come back, some time later,
//! through the [`DetectionCallback`] handed over in [`LandmarkDetector::open`].

use crate::{
    constants::{N_SHAPES, NUM_FACE_LANDMARKS},
    processor::DetectionCallback,
    Result,
};
use log::debug;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// A camera frame handed to the detector
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Packed RGB bytes, row major
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a frame from packed RGB data
    pub const fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { width, height, data }
    }
}

/// Normalized face landmark; x and y are in [0, 1] of the frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar distance to another landmark, ignoring depth
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Facial transformation matrix, row major
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformMatrix(pub [[f64; 4]; 4]);

impl TransformMatrix {
    /// Embed a bare 3×3 rotation-bearing block
    pub fn from_rotation(rows: [[f64; 3]; 3]) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (dst, src) in m.iter_mut().zip(rows.iter()) {
            dst[..3].copy_from_slice(src);
        }
        m[3][3] = 1.0;
        Self(m)
    }

    /// Identity transform
    pub fn identity() -> Self {
        Self::from_rotation([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Top-left 3×3 block
    pub fn rotation_block(&self) -> Matrix3<f64> {
        let m = &self.0;
        Matrix3::new(
            m[0][0], m[0][1], m[0][2],
            m[1][0], m[1][1], m[1][2],
            m[2][0], m[2][1], m[2][2],
        )
    }
}

/// One completed detector call. Holds at most one face.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Capture timestamp of the submitted frame
    pub timestamp_ms: u64,
    /// Face landmarks, empty when no face was found
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    /// Blendshape scores in [0, 1], empty when no face was found
    #[serde(default)]
    pub blendshapes: Vec<f64>,
    /// Facial transformation matrix, if the detector produced one
    #[serde(default)]
    pub transformation_matrix: Option<TransformMatrix>,
}

impl DetectionResult {
    /// Result for a frame in which no face was found
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Self::default()
        }
    }

    /// Whether a usable face is present: landmarks plus a full blendshape vector
    pub fn has_face(&self) -> bool {
        !self.landmarks.is_empty() && self.blendshapes.len() == N_SHAPES
    }

    /// Whether the detector reported face data that cannot be used as-is
    pub fn is_malformed(&self) -> bool {
        let partial = self.landmarks.is_empty() != self.blendshapes.is_empty();
        let wrong_len = !self.blendshapes.is_empty() && self.blendshapes.len() != N_SHAPES;
        partial || wrong_len || self.landmarks.len() > NUM_FACE_LANDMARKS
    }
}

/// Asynchronous face landmark detector
pub trait LandmarkDetector: Send {
    /// Acquire the detector resource; results are delivered to `callback`.
    fn open(&mut self, callback: DetectionCallback) -> Result<()>;

    /// Submit a frame for inference. Must not block on the result.
    fn detect_async(&mut self, frame: &Frame, timestamp_ms: u64) -> Result<()>;

    /// Release the detector resource and drop the callback. Results still
    /// in flight may be delivered after this returns; they are discarded.
    fn close(&mut self);
}

/// Admits a frame only if its timestamp is later than the last admitted one
#[derive(Debug, Default, Clone)]
pub struct FrameGate {
    latest_ms: Option<u64>,
}

impl FrameGate {
    pub const fn new() -> Self {
        Self { latest_ms: None }
    }

    /// Record and admit `timestamp_ms` if it is strictly newer
    pub fn admit(&mut self, timestamp_ms: u64) -> bool {
        match self.latest_ms {
            Some(latest) if timestamp_ms <= latest => {
                debug!("Withholding frame at {timestamp_ms}ms, last submitted {latest}ms");
                false
            }
            _ => {
                self.latest_ms = Some(timestamp_ms);
                true
            }
        }
    }

    /// Timestamp of the last admitted frame
    pub const fn latest(&self) -> Option<u64> {
        self.latest_ms
    }

    pub fn reset(&mut self) {
        self.latest_ms = None;
    }
}
