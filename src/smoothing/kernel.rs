use crate::{constants::EPSILON, Error, Result};
use serde::{Deserialize, Serialize};

/// Shape of a generated smoothing kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelProfile {
    /// Equal weight for every frame in the window
    Uniform,
    /// Weight grows linearly towards the newest frame
    #[default]
    Linear,
}

/// Normalized weight sequence, oldest frame first
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingKernel {
    weights: Vec<f64>,
}

impl SmoothingKernel {
    /// Build a kernel from raw weights, normalizing them to sum to one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKernel`] if the weights are empty, longer than
    /// `capacity`, contain a negative or non-finite value, or sum to zero.
    pub fn new(weights: Vec<f64>, capacity: usize) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidKernel("kernel has no weights".to_string()));
        }
        if weights.len() > capacity {
            return Err(Error::InvalidKernel(format!(
                "kernel length {} exceeds history capacity {capacity}",
                weights.len()
            )));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::InvalidKernel(format!(
                "weight {bad} is negative or not finite"
            )));
        }

        let sum: f64 = weights.iter().sum();
        if sum <= EPSILON {
            return Err(Error::InvalidKernel("weights sum to zero".to_string()));
        }

        Ok(Self {
            weights: weights.into_iter().map(|w| w / sum).collect(),
        })
    }

    /// Generate a kernel of `window` frames with the given profile
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKernel`] for a zero window or one larger than
    /// `capacity`.
    pub fn from_profile(window: usize, profile: KernelProfile, capacity: usize) -> Result<Self> {
        let weights = match profile {
            KernelProfile::Uniform => vec![1.0; window],
            #[allow(clippy::cast_precision_loss)]
            KernelProfile::Linear => (1..=window).map(|i| i as f64).collect(),
        };
        Self::new(weights, capacity)
    }

    /// Normalized weights, oldest frame first
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
