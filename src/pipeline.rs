//! Tick driver.
//!
//! Frames go to the detector through a strictly increasing timestamp gate.
//! Results come back on the detector's own schedule and land in the mailbox.
//! Each tick reads the latest snapshot, advances the binding engine and hands
//! events and the tracking point to the sink. Binding state is only ever
//! touched here.

use crate::{
    action::{ActionEvent, ActionSink},
    bindings::{BindingEngine, BindingTable},
    config::Config,
    detector::{Frame, FrameGate, LandmarkDetector},
    mailbox::Mailbox,
    processor::{DetectionCallback, DetectionProcessor, SignalSnapshot},
    tracking::TrackingPoint,
    Error, Result,
};
use log::{debug, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// What one tick (or a release on stop or profile switch) produced
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Events handed to the sink, in binding order
    pub events: Vec<ActionEvent>,
    /// Tracking point of the latest snapshot
    pub tracking: Option<TrackingPoint>,
    /// Sink errors; trigger state is not rolled back for these
    pub failures: Vec<Error>,
}

/// Result of polling a [`FrameProvider`]
#[derive(Debug)]
pub enum FramePoll {
    /// A new frame is ready
    Frame(Frame),
    /// Nothing new yet
    Pending,
    /// No more frames will come
    Exhausted,
}

/// Source of camera frames
pub trait FrameProvider {
    /// Return the next frame without blocking
    fn poll(&mut self) -> FramePoll;
}

/// Counters from [`Pipeline::run`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub frames_submitted: u64,
    pub events: usize,
    pub sink_failures: usize,
}

/// Gesture-to-action pipeline over a detector and a sink
pub struct Pipeline<D: LandmarkDetector, S: ActionSink> {
    detector: D,
    sink: S,
    callback: DetectionCallback,
    mailbox: Arc<Mailbox<SignalSnapshot>>,
    engine: BindingEngine,
    table: BindingTable,
    gate: FrameGate,
    running: bool,
    last_pointer: Option<TrackingPoint>,
    tick_interval: Duration,
    epoch: Instant,
}

impl<D: LandmarkDetector, S: ActionSink> Pipeline<D, S> {
    /// Build a stopped pipeline from validated configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate.
    pub fn new(config: &Config, detector: D, sink: S) -> Result<Self> {
        config.validate()?;

        let mailbox = Arc::new(Mailbox::new());
        let processor = DetectionProcessor::new(
            config.build_smoother()?,
            config.build_locator()?,
            config.build_filter()?,
            Arc::clone(&mailbox),
        );
        let table = config.binding_table()?;

        info!(
            "Pipeline configured with {} bindings, {} tracking",
            table.len(),
            if config.tracking.use_transformation_matrix { "head-pose" } else { "landmark" }
        );

        Ok(Self {
            detector,
            sink,
            callback: DetectionCallback::new(processor),
            mailbox,
            engine: BindingEngine::new(&table),
            table,
            gate: FrameGate::new(),
            running: false,
            last_pointer: None,
            tick_interval: Duration::from_millis(config.pipeline.tick_interval_ms),
            epoch: Instant::now(),
        })
    }

    /// Open the detector and accept frames
    ///
    /// # Errors
    ///
    /// Returns [`Error::PipelineState`] if already running, or the detector's
    /// error if it cannot be opened.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Err(Error::PipelineState("pipeline is already running".to_string()));
        }
        self.detector.open(self.callback.clone())?;
        self.running = true;
        info!("Pipeline started");
        Ok(())
    }

    /// Submit a frame for detection. Returns false when the frame was
    /// withheld because its timestamp is not later than the last submission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PipelineState`] when stopped, or the detector's error.
    pub fn submit_frame(&mut self, frame: &Frame, timestamp_ms: u64) -> Result<bool> {
        if !self.running {
            return Err(Error::PipelineState("cannot submit frames to a stopped pipeline".to_string()));
        }
        if !self.gate.admit(timestamp_ms) {
            return Ok(false);
        }
        self.detector.detect_async(frame, timestamp_ms)?;
        Ok(true)
    }

    /// Advance every binding once against the latest snapshot
    ///
    /// # Errors
    ///
    /// Returns [`Error::PipelineState`] when stopped. Sink failures do not
    /// fail the tick; they are reported in [`TickOutcome::failures`].
    pub fn tick(&mut self, now_ms: u64) -> Result<TickOutcome> {
        if !self.running {
            return Err(Error::PipelineState("cannot tick a stopped pipeline".to_string()));
        }

        let snapshot = self.mailbox.latest();
        let signal = snapshot.as_ref().and_then(|s| s.signal.as_ref());
        let tracking = snapshot.as_ref().and_then(|s| s.tracking);

        let mut failures = Vec::new();
        if let Some(point) = tracking {
            if self.last_pointer != Some(point) {
                self.last_pointer = Some(point);
                if let Err(e) = self.sink.move_pointer(point) {
                    warn!("Pointer move to ({:.1}, {:.1}) failed: {e}", point.x, point.y);
                    failures.push(e);
                }
            }
        }

        let events = self.engine.tick(signal, now_ms);
        failures.extend(self.dispatch(&events));

        Ok(TickOutcome {
            events,
            tracking,
            failures,
        })
    }

    /// Replace the binding table. Bindings in effect under the old table are
    /// released at the sink first.
    pub fn switch_profile(&mut self, table: BindingTable) -> TickOutcome {
        let now = self.now_ms();
        self.switch_profile_at(table, now)
    }

    /// [`Self::switch_profile`] with releases stamped at `now_ms`
    pub fn switch_profile_at(&mut self, table: BindingTable, now_ms: u64) -> TickOutcome {
        let releases = self.engine.load(&table, now_ms);
        let failures = self.dispatch(&releases);
        info!("Switched profile: {} -> {} bindings", self.table.len(), table.len());
        self.table = table;

        TickOutcome {
            events: releases,
            tracking: self.last_pointer,
            failures,
        }
    }

    /// Stop submitting frames, close the detector and clear all state so a
    /// restart begins clean. Bindings still in effect are released first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PipelineState`] if not running.
    pub fn stop(&mut self) -> Result<TickOutcome> {
        let now = self.now_ms();
        self.stop_at(now)
    }

    /// [`Self::stop`] with releases stamped at `now_ms`
    ///
    /// # Errors
    ///
    /// Returns [`Error::PipelineState`] if not running.
    pub fn stop_at(&mut self, now_ms: u64) -> Result<TickOutcome> {
        if !self.running {
            return Err(Error::PipelineState("pipeline is not running".to_string()));
        }
        self.running = false;

        let releases = self.engine.reset(now_ms);
        let failures = self.dispatch(&releases);

        self.detector.close();
        self.callback.clear();
        self.gate.reset();
        self.last_pointer = None;
        info!("Pipeline stopped");

        Ok(TickOutcome {
            events: releases,
            tracking: None,
            failures,
        })
    }

    /// Poll frames and tick on the configured interval until the provider is
    /// exhausted or `stop` is raised. The pipeline is left running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PipelineState`] when not started, or a detector error.
    pub fn run(&mut self, provider: &mut dyn FrameProvider, stop: &AtomicBool) -> Result<RunSummary> {
        if !self.running {
            return Err(Error::PipelineState("start the pipeline before running it".to_string()));
        }

        let mut summary = RunSummary::default();
        let mut next_tick = Instant::now();

        while !stop.load(Ordering::Relaxed) {
            match provider.poll() {
                FramePoll::Frame(frame) => {
                    let now = self.now_ms();
                    if self.submit_frame(&frame, now)? {
                        summary.frames_submitted += 1;
                    }
                }
                FramePoll::Pending => {}
                FramePoll::Exhausted => {
                    debug!("Frame provider exhausted");
                    break;
                }
            }

            let now = self.now_ms();
            let outcome = self.tick(now)?;
            summary.ticks += 1;
            summary.events += outcome.events.len();
            summary.sink_failures += outcome.failures.len();

            next_tick += self.tick_interval;
            if !sleep_until(next_tick, stop) {
                next_tick = Instant::now();
            }
        }

        info!(
            "Run finished after {} ticks, {} frames, {} events",
            summary.ticks, summary.frames_submitted, summary.events
        );
        Ok(summary)
    }

    /// Milliseconds on the pipeline's monotonic clock
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Detector results discarded as stale since the last start
    pub fn stale_discards(&self) -> u64 {
        self.callback.stale_discards()
    }

    pub const fn engine(&self) -> &BindingEngine {
        &self.engine
    }

    pub const fn bindings(&self) -> &BindingTable {
        &self.table
    }

    pub const fn detector(&self) -> &D {
        &self.detector
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn dispatch(&mut self, events: &[ActionEvent]) -> Vec<Error> {
        events
            .iter()
            .filter_map(|event| {
                self.sink.dispatch(event).err().map(|e| {
                    warn!("Sink failed on {:?} {}: {e}", event.kind, event.target);
                    e
                })
            })
            .collect()
    }
}

/// Longest single sleep in [`Pipeline::run`] before the stop flag is checked
const STOP_POLL: Duration = Duration::from_millis(10);

/// Sleep until `deadline` in slices, giving up early once `stop` is raised.
/// Returns false when the deadline had already passed.
fn sleep_until(deadline: Instant, stop: &AtomicBool) -> bool {
    let mut now = Instant::now();
    if deadline <= now {
        return false;
    }
    while now < deadline && !stop.load(Ordering::Relaxed) {
        std::thread::sleep((deadline - now).min(STOP_POLL));
        now = Instant::now();
    }
    true
}
