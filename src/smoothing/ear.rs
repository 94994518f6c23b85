//! Eye aspect ratio from landmark geometry.
//!
//! The value rises towards 1 as the eye closes:
//! `1 - 3 * vertical / horizontal`, clamped below at 0. There is no upper
//! clamp; with non-negative distances the value cannot exceed 1.

use crate::{
    constants::{EAR_RATIO_SCALE, EPSILON, LEFT_EYE_LANDMARKS, RIGHT_EYE_LANDMARKS},
    detector::Landmark,
};

/// Per-eye and combined eye aspect ratios
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EyeAspectRatios {
    pub right: f64,
    pub left: f64,
    pub average: f64,
}

/// Eye aspect ratios for both eyes of a face mesh
pub fn eye_aspect_ratios(landmarks: &[Landmark]) -> EyeAspectRatios {
    let right = eye_aspect_ratio(landmarks, RIGHT_EYE_LANDMARKS);
    let left = eye_aspect_ratio(landmarks, LEFT_EYE_LANDMARKS);
    EyeAspectRatios {
        right,
        left,
        average: (right + left) / 2.0,
    }
}

/// Eye aspect ratio for one eye.
///
/// `quartet` holds the horizontal corner pair followed by the vertical lid
/// pair. Missing landmarks or a degenerate eye width yield 0.
pub fn eye_aspect_ratio(landmarks: &[Landmark], quartet: [usize; 4]) -> f64 {
    let [h0, h1, v0, v1] = quartet;
    let (Some(a), Some(b), Some(c), Some(d)) = (
        landmarks.get(h0),
        landmarks.get(h1),
        landmarks.get(v0),
        landmarks.get(v1),
    ) else {
        return 0.0;
    };

    let horizontal = a.planar_distance(b);
    if !horizontal.is_finite() || horizontal <= EPSILON {
        return 0.0;
    }
    let vertical = c.planar_distance(d);

    let ear = 1.0 - EAR_RATIO_SCALE * vertical / horizontal;
    if ear.is_finite() {
        ear.max(0.0)
    } else {
        0.0
    }
}
