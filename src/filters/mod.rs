//! Optional smoothing of the tracking point.
//!
//! The locator output can jitter with landmark noise. These filters run on
//! the callback side after every located point; `none` leaves the point
//! untouched.

/// Moving average filter for simple smoothing
pub mod moving_average;

/// Median filter for outlier rejection
pub mod median;

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::{tracking::TrackingPoint, Result};

/// Trait for all tracking point filters
pub trait PointFilter: Send + Sync {
    /// Feed a located point and return the filtered one
    fn apply(&mut self, point: TrackingPoint) -> TrackingPoint;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes points through unchanged
pub struct NoFilter;

impl PointFilter for NoFilter {
    fn apply(&mut self, point: TrackingPoint) -> TrackingPoint {
        point
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a point filter by name.
///
/// Accepts an optional parameter after a colon: `moving_average:5`,
/// `median:3`, `exponential:0.4`.
pub fn create_filter(descriptor: &str) -> Result<Box<dyn PointFilter>> {
    let lowered = descriptor.trim().to_lowercase();
    let (name, param) = match lowered.split_once(':') {
        Some((name, param)) => (name, Some(param)),
        None => (lowered.as_str(), None),
    };

    match name {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "moving_average" | "movingaverage" => {
            let window = parse_param(param, 5_usize, descriptor)?;
            if window == 0 {
                return Err(bad_param(descriptor));
            }
            Ok(Box::new(moving_average::MovingAverageFilter::new(window)))
        }
        "median" => {
            let window = parse_param(param, 5_usize, descriptor)?;
            if window == 0 || window % 2 == 0 {
                return Err(bad_param(descriptor));
            }
            Ok(Box::new(median::MedianFilter::new(window)))
        }
        "exponential" => {
            let alpha = parse_param(param, 0.5_f64, descriptor)?;
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(bad_param(descriptor));
            }
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        _ => Err(crate::Error::Config(format!("Unknown filter type: {descriptor}"))),
    }
}

fn parse_param<T: std::str::FromStr>(param: Option<&str>, default: T, descriptor: &str) -> Result<T> {
    param.map_or(Ok(default), |p| p.parse().map_err(|_| bad_param(descriptor)))
}

fn bad_param(descriptor: &str) -> crate::Error {
    crate::Error::Config(format!("Invalid filter parameter: {descriptor}"))
}
