use super::PointFilter;
use crate::tracking::TrackingPoint;
use std::collections::VecDeque;

/// Moving average over the last `window_size` points
pub struct MovingAverageFilter {
    window_size: usize,
    buffer: VecDeque<TrackingPoint>,
}

impl MovingAverageFilter {
    /// # Panics
    ///
    /// Panics if `window_size` is zero.
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }
}

impl PointFilter for MovingAverageFilter {
    #[allow(clippy::cast_precision_loss)]
    fn apply(&mut self, point: TrackingPoint) -> TrackingPoint {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(point);

        let n = self.buffer.len() as f64;
        let (sx, sy) = self
            .buffer
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        TrackingPoint::new(sx / n, sy / n)
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let mut filter = MovingAverageFilter::new(3);

        assert_eq!(filter.apply(TrackingPoint::new(10.0, 20.0)), TrackingPoint::new(10.0, 20.0));
        assert_eq!(filter.apply(TrackingPoint::new(20.0, 30.0)), TrackingPoint::new(15.0, 25.0));
        assert_eq!(filter.apply(TrackingPoint::new(30.0, 40.0)), TrackingPoint::new(20.0, 30.0));

        // Window is full, oldest point should be dropped
        assert_eq!(filter.apply(TrackingPoint::new(40.0, 50.0)), TrackingPoint::new(30.0, 40.0));
    }

    #[test]
    fn test_reset() {
        let mut filter = MovingAverageFilter::new(3);
        filter.apply(TrackingPoint::new(100.0, 100.0));
        filter.reset();
        assert_eq!(filter.apply(TrackingPoint::new(1.0, 2.0)), TrackingPoint::new(1.0, 2.0));
    }
}
