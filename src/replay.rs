//! Deterministic replay of recorded detector output.
//!
//! A recording is a YAML list of [`DetectionResult`]s. Replay drives the
//! normal pipeline on the recording's own clock: one tick per interval from
//! the first result to the last result plus a tail, with each result handed
//! to the pipeline through [`ScriptedDetector`] once its timestamp is due.

use crate::{
    action::{ActionEvent, ActionSink},
    config::Config,
    detector::{DetectionResult, Frame, LandmarkDetector},
    pipeline::Pipeline,
    processor::DetectionCallback,
    tracking::TrackingPoint,
    Error, Result,
};
use log::{debug, info};
use std::collections::VecDeque;
use std::path::Path;

/// Detector that answers submissions with recorded results.
///
/// A submission at time `t` delivers, in recorded order, every queued result
/// whose timestamp is at or before `t`. Delivery is synchronous.
#[derive(Default)]
pub struct ScriptedDetector {
    queue: VecDeque<DetectionResult>,
    callback: Option<DetectionCallback>,
    delivered: usize,
    closed: bool,
}

impl ScriptedDetector {
    pub fn new(results: Vec<DetectionResult>) -> Self {
        Self {
            queue: results.into(),
            ..Self::default()
        }
    }

    /// Timestamp of the next queued result
    pub fn next_due(&self) -> Option<u64> {
        self.queue.front().map(|r| r.timestamp_ms)
    }

    /// Whether a queued result is due at `now_ms`
    pub fn has_due(&self, now_ms: u64) -> bool {
        self.next_due().is_some_and(|ts| ts <= now_ms)
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Results handed to the callback so far
    pub const fn delivered(&self) -> usize {
        self.delivered
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl LandmarkDetector for ScriptedDetector {
    fn open(&mut self, callback: DetectionCallback) -> Result<()> {
        self.callback = Some(callback);
        self.closed = false;
        Ok(())
    }

    fn detect_async(&mut self, _frame: &Frame, timestamp_ms: u64) -> Result<()> {
        let Some(callback) = self.callback.as_ref() else {
            return Err(Error::Detector("scripted detector is not open".to_string()));
        };
        while self.queue.front().is_some_and(|r| r.timestamp_ms <= timestamp_ms) {
            if let Some(result) = self.queue.pop_front() {
                callback.on_result(&result);
                self.delivered += 1;
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.callback = None;
        self.closed = true;
    }
}

/// What a replay produced
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplaySummary {
    pub ticks: u64,
    /// Recorded results handed to the pipeline
    pub results_delivered: usize,
    /// Results discarded because their timestamp went backwards
    pub stale_discards: u64,
    /// Every event dispatched, including releases on stop
    pub events: Vec<ActionEvent>,
    /// Last tracking point seen by a tick
    pub last_tracking: Option<TrackingPoint>,
    /// Messages of sink failures
    pub sink_failures: Vec<String>,
}

/// Load a recording from a YAML file
pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Vec<DetectionResult>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Run `results` through a fresh pipeline into `sink`
pub fn replay<S: ActionSink>(config: &Config, results: Vec<DetectionResult>, sink: S) -> Result<ReplaySummary> {
    let start_ms = results.first().map_or(0, |r| r.timestamp_ms);
    let end_ms = results
        .iter()
        .map(|r| r.timestamp_ms)
        .max()
        .unwrap_or(start_ms)
        .saturating_add(config.pipeline.replay_tail_ms);
    let interval = config.pipeline.tick_interval_ms.max(1);
    info!("Replaying {} results over {}..={}ms", results.len(), start_ms, end_ms);

    let mut pipeline = Pipeline::new(config, ScriptedDetector::new(results), sink)?;
    pipeline.start()?;

    let mut summary = ReplaySummary::default();
    let frame = Frame::default();
    let mut next = Some(start_ms);

    while let Some(now) = next.filter(|&t| t <= end_ms) {
        if pipeline.detector().has_due(now) {
            pipeline.submit_frame(&frame, now)?;
        }

        let outcome = pipeline.tick(now)?;
        summary.ticks += 1;
        if outcome.tracking.is_some() {
            summary.last_tracking = outcome.tracking;
        }
        summary.events.extend(outcome.events);
        summary.sink_failures.extend(outcome.failures.iter().map(ToString::to_string));

        next = now.checked_add(interval);
    }

    summary.results_delivered = pipeline.detector().delivered();
    summary.stale_discards = pipeline.stale_discards();

    let released = pipeline.stop_at(end_ms)?;
    debug!("Released {} bindings at end of replay", released.events.len());
    summary.events.extend(released.events);
    summary.sink_failures.extend(released.failures.iter().map(ToString::to_string));

    Ok(summary)
}
