//! Detector-callback stage.
//!
//! Runs on whatever thread the detector completes on. Each accepted result
//! advances the smoother and the locator, then a complete snapshot is
//! published to the mailbox for the tick driver. Nothing here touches
//! binding or trigger state.

use crate::{
    detector::DetectionResult,
    filters::PointFilter,
    mailbox::Mailbox,
    smoothing::{SignalSmoother, SmoothedSignal},
    tracking::{TrackingLocator, TrackingPoint},
};
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// Immutable view of the callback-side state after one accepted result
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSnapshot {
    /// Increments with every accepted result
    pub sequence: u64,
    /// Timestamp of the result that produced this snapshot
    pub timestamp_ms: u64,
    /// Whether that result contained a usable face
    pub face_present: bool,
    /// Smoothed signal; frozen at its last value during a detection gap
    pub signal: Option<SmoothedSignal>,
    /// Tracking point; frozen at its last value during a detection gap
    pub tracking: Option<TrackingPoint>,
}

/// Owns the smoothing and tracking state fed by the detector
pub struct DetectionProcessor {
    smoother: SignalSmoother,
    locator: TrackingLocator,
    filter: Box<dyn PointFilter>,
    mailbox: Arc<Mailbox<SignalSnapshot>>,
    last_accepted_ms: Option<u64>,
    last_point: Option<TrackingPoint>,
    sequence: u64,
    stale_discards: u64,
}

impl DetectionProcessor {
    pub fn new(
        smoother: SignalSmoother,
        locator: TrackingLocator,
        filter: Box<dyn PointFilter>,
        mailbox: Arc<Mailbox<SignalSnapshot>>,
    ) -> Self {
        Self {
            smoother,
            locator,
            filter,
            mailbox,
            last_accepted_ms: None,
            last_point: None,
            sequence: 0,
            stale_discards: 0,
        }
    }

    /// Handle one detector result. Returns false when it was discarded as
    /// stale (not later than the last accepted result).
    pub fn process(&mut self, result: &DetectionResult) -> bool {
        if let Some(last) = self.last_accepted_ms {
            if result.timestamp_ms <= last {
                self.stale_discards += 1;
                debug!(
                    "Discarding stale detection at {}ms, last accepted {}ms",
                    result.timestamp_ms, last
                );
                return false;
            }
        }
        self.last_accepted_ms = Some(result.timestamp_ms);

        let face_present = if result.is_malformed() {
            warn!(
                "Malformed detection at {}ms ({} landmarks, {} blendshapes), treating as no face",
                result.timestamp_ms,
                result.landmarks.len(),
                result.blendshapes.len()
            );
            false
        } else {
            result.has_face()
        };

        if face_present {
            self.smoother.observe(result);
            if let Some(point) = self.locator.locate(result) {
                self.last_point = Some(self.filter.apply(point));
            }
        }

        self.sequence += 1;
        self.mailbox.publish(SignalSnapshot {
            sequence: self.sequence,
            timestamp_ms: result.timestamp_ms,
            face_present,
            signal: self.smoother.latest().cloned(),
            tracking: self.last_point,
        });
        true
    }

    /// Number of results discarded as stale since the last clear
    pub const fn stale_discards(&self) -> u64 {
        self.stale_discards
    }

    pub const fn smoother(&self) -> &SignalSmoother {
        &self.smoother
    }

    /// Forget all history, the frozen point and the published snapshot
    pub fn clear(&mut self) {
        self.smoother.reset();
        self.filter.reset();
        self.mailbox.clear();
        self.last_accepted_ms = None;
        self.last_point = None;
        self.sequence = 0;
        self.stale_discards = 0;
    }
}

struct Shared {
    processor: DetectionProcessor,
    session: u64,
}

/// Handle given to the detector. Cloning shares the same processor.
///
/// Each handle belongs to the session it was cloned in. [`Self::clear`]
/// starts a new session, and results delivered through handles of an older
/// one are dropped, so a detector that finishes in-flight work after being
/// closed cannot leak results into the next run.
#[derive(Clone)]
pub struct DetectionCallback {
    inner: Arc<Mutex<Shared>>,
    session: u64,
}

impl DetectionCallback {
    pub fn new(processor: DetectionProcessor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Shared { processor, session: 0 })),
            session: 0,
        }
    }

    /// Deliver a completed detection
    pub fn on_result(&self, result: &DetectionResult) {
        let mut shared = self.inner.lock();
        if shared.session != self.session {
            debug!(
                "Dropping detection at {}ms from closed session {}",
                result.timestamp_ms, self.session
            );
            return;
        }
        shared.processor.process(result);
    }

    pub fn stale_discards(&self) -> u64 {
        self.inner.lock().processor.stale_discards()
    }

    /// Reset the processor and start a new session. Handles cloned before
    /// this call stop delivering.
    pub fn clear(&mut self) {
        let mut shared = self.inner.lock();
        shared.processor.clear();
        shared.session += 1;
        self.session = shared.session;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::N_SHAPES,
        detector::Landmark,
        filters::NoFilter,
        smoothing::SmoothingKernel,
        tracking::TrackingMode,
    };

    fn processor() -> (DetectionProcessor, Arc<Mailbox<SignalSnapshot>>) {
        let mailbox = Arc::new(Mailbox::new());
        let kernel = SmoothingKernel::new(vec![1.0], 10).unwrap();
        let smoother = SignalSmoother::new(kernel, 10).unwrap();
        let locator = TrackingLocator::new(TrackingMode::LandmarkAverage(vec![0]), 100, 100).unwrap();
        let processor = DetectionProcessor::new(smoother, locator, Box::new(NoFilter), Arc::clone(&mailbox));
        (processor, mailbox)
    }

    fn face(ts: u64, x: f64, score: f64) -> DetectionResult {
        DetectionResult {
            timestamp_ms: ts,
            landmarks: vec![Landmark::new(x, 0.5, 0.0); 478],
            blendshapes: vec![score; N_SHAPES],
            transformation_matrix: None,
        }
    }

    #[test]
    fn test_publishes_snapshot() {
        let (mut processor, mailbox) = processor();
        assert!(processor.process(&face(10, 0.25, 0.7)));

        let snapshot = mailbox.latest().unwrap();
        assert_eq!(snapshot.sequence, 1);
        assert!(snapshot.face_present);
        assert!((snapshot.signal.as_ref().unwrap()[0] - 0.7).abs() < 1e-12);
        assert_eq!(snapshot.tracking, Some(TrackingPoint::new(25.0, 50.0)));
    }

    #[test]
    fn test_stale_results_dropped() {
        let (mut processor, mailbox) = processor();
        processor.process(&face(10, 0.25, 0.7));
        assert!(!processor.process(&face(10, 0.9, 0.1)));
        assert!(!processor.process(&face(5, 0.9, 0.1)));
        assert_eq!(processor.stale_discards(), 2);
        assert_eq!(mailbox.latest().unwrap().sequence, 1);
    }

    #[test]
    fn test_gap_freezes_signal_and_point() {
        let (mut processor, mailbox) = processor();
        processor.process(&face(10, 0.25, 0.7));
        processor.process(&DetectionResult::empty(20));

        let snapshot = mailbox.latest().unwrap();
        assert!(!snapshot.face_present);
        assert_eq!(snapshot.tracking, Some(TrackingPoint::new(25.0, 50.0)));
        assert!((snapshot.signal.as_ref().unwrap()[0] - 0.7).abs() < 1e-12);
        assert_eq!(processor.smoother().history().len(), 1);
    }

    #[test]
    fn test_malformed_is_a_gap() {
        let (mut processor, mailbox) = processor();
        let mut bad = face(10, 0.25, 0.7);
        bad.blendshapes.truncate(10);
        assert!(processor.process(&bad));
        let snapshot = mailbox.latest().unwrap();
        assert!(!snapshot.face_present);
        assert!(snapshot.signal.is_none());
        assert!(snapshot.tracking.is_none());
    }

    #[test]
    fn test_clear_resets_everything() {
        let (processor, mailbox) = processor();
        let mut callback = DetectionCallback::new(processor);
        callback.on_result(&face(10, 0.25, 0.7));
        callback.on_result(&face(9, 0.25, 0.7));
        assert_eq!(callback.stale_discards(), 1);

        callback.clear();
        assert!(mailbox.latest().is_none());
        assert_eq!(callback.stale_discards(), 0);
        // earlier timestamps are accepted again after a clear
        callback.on_result(&face(1, 0.25, 0.7));
        assert_eq!(mailbox.latest().unwrap().sequence, 1);
    }

    #[test]
    fn test_late_results_from_closed_session_dropped() {
        let (processor, mailbox) = processor();
        let mut callback = DetectionCallback::new(processor);
        let in_flight = callback.clone();
        in_flight.on_result(&face(10, 0.25, 0.7));

        callback.clear();
        in_flight.on_result(&face(20, 0.75, 0.7));
        assert!(mailbox.latest().is_none());

        let fresh = callback.clone();
        fresh.on_result(&face(5, 0.25, 0.7));
        assert_eq!(mailbox.latest().unwrap().timestamp_ms, 5);
    }
}
