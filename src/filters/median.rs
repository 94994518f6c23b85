use super::PointFilter;
use crate::tracking::TrackingPoint;
use std::collections::VecDeque;

/// Per-axis median over the last `window_size` points
pub struct MedianFilter {
    window_size: usize,
    buffer: VecDeque<TrackingPoint>,
}

impl MedianFilter {
    /// # Panics
    ///
    /// Panics if `window_size` is zero or even.
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        assert!(window_size % 2 == 1, "Median filter window size must be odd");
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }

    fn median(mut values: Vec<f64>) -> f64 {
        values.sort_by(f64::total_cmp);
        let len = values.len();
        if len == 0 {
            0.0
        } else if len % 2 == 0 {
            (values[len / 2 - 1] + values[len / 2]) / 2.0
        } else {
            values[len / 2]
        }
    }
}

impl PointFilter for MedianFilter {
    fn apply(&mut self, point: TrackingPoint) -> TrackingPoint {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(point);

        let x = Self::median(self.buffer.iter().map(|p| p.x).collect());
        let y = Self::median(self.buffer.iter().map(|p| p.y).collect());
        TrackingPoint::new(x, y)
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_filter() {
        let mut filter = MedianFilter::new(3);

        assert_eq!(filter.apply(TrackingPoint::new(10.0, 20.0)), TrackingPoint::new(10.0, 20.0));
        // median of [10, 20]
        assert_eq!(filter.apply(TrackingPoint::new(20.0, 30.0)), TrackingPoint::new(15.0, 25.0));
        assert_eq!(filter.apply(TrackingPoint::new(30.0, 40.0)), TrackingPoint::new(20.0, 30.0));
    }

    #[test]
    fn test_median_with_outliers() {
        let mut filter = MedianFilter::new(3);

        filter.apply(TrackingPoint::new(10.0, 20.0));
        filter.apply(TrackingPoint::new(11.0, 21.0));
        let point = filter.apply(TrackingPoint::new(900.0, 700.0));

        assert_eq!(point, TrackingPoint::new(11.0, 21.0));
    }
}
