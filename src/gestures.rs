//! Catalog of gestures that can drive a binding.
//!
//! Each gesture names one slot of the smoothed blendshape vector. The order
//! follows the detector's blendshape output, except that slots 9, 10 and 11
//! carry eye aspect ratio values computed from landmark geometry and are
//! named after the blink they measure.

use crate::{constants::N_SHAPES, Error, Result};
use std::fmt;

/// Gesture names in blendshape slot order
pub const GESTURE_NAMES: [&str; N_SHAPES] = [
    "neutral",
    "brow_down_left",
    "brow_down_right",
    "brow_inner_up",
    "brow_outer_up_left",
    "brow_outer_up_right",
    "cheek_puff",
    "cheek_squint_left",
    "cheek_squint_right",
    "eye_blink_right",
    "eye_blink_left",
    "eye_blink",
    "eye_look_down_right",
    "eye_look_in_left",
    "eye_look_in_right",
    "eye_look_out_left",
    "eye_look_out_right",
    "eye_look_up_left",
    "eye_look_up_right",
    "eye_squint_left",
    "eye_squint_right",
    "eye_wide_left",
    "eye_wide_right",
    "jaw_forward",
    "jaw_left",
    "jaw_open",
    "jaw_right",
    "mouth_close",
    "mouth_dimple_left",
    "mouth_dimple_right",
    "mouth_frown_left",
    "mouth_frown_right",
    "mouth_funnel",
    "mouth_left",
    "mouth_lower_down_left",
    "mouth_lower_down_right",
    "mouth_press_left",
    "mouth_press_right",
    "mouth_pucker",
    "mouth_right",
    "mouth_roll_lower",
    "mouth_roll_upper",
    "mouth_shrug_lower",
    "mouth_shrug_upper",
    "mouth_smile_left",
    "mouth_smile_right",
    "mouth_stretch_left",
    "mouth_stretch_right",
    "mouth_upper_up_left",
    "mouth_upper_up_right",
    "nose_sneer_left",
    "nose_sneer_right",
];

/// Index of a gesture in the blendshape vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureId(usize);

impl GestureId {
    /// Resolve a gesture by name.
    ///
    /// Matching ignores case, spaces, underscores and dashes, so
    /// `mouth_smile_left`, `mouthSmileLeft` and `Mouth smile left` agree.
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = normalize(name);
        GESTURE_NAMES
            .iter()
            .position(|candidate| normalize(candidate) == wanted)
            .map(Self)
            .ok_or_else(|| Error::UnknownGesture(name.to_string()))
    }

    /// Slot in the blendshape vector
    pub const fn index(self) -> usize {
        self.0
    }

    /// Canonical catalog name
    pub const fn name(self) -> &'static str {
        GESTURE_NAMES[self.0]
    }
}

impl fmt::Display for GestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
