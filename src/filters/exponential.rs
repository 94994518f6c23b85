use super::PointFilter;
use crate::tracking::TrackingPoint;

/// Exponential smoothing of the tracking point
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<TrackingPoint>,
}

impl ExponentialFilter {
    /// # Panics
    ///
    /// Panics if `alpha` is outside (0, 1].
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }
}

impl PointFilter for ExponentialFilter {
    fn apply(&mut self, point: TrackingPoint) -> TrackingPoint {
        let filtered = match self.last {
            Some(last) => TrackingPoint::new(
                self.alpha * point.x + (1.0 - self.alpha) * last.x,
                self.alpha * point.y + (1.0 - self.alpha) * last.y,
            ),
            None => point,
        };
        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
