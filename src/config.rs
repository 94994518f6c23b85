//! Configuration for the gesture pointer pipeline

use crate::{
    bindings::{BindingConfig, BindingTable},
    constants::{
        DEFAULT_HEAD_POSE_GAIN, DEFAULT_HISTORY_CAPACITY, DEFAULT_REPLAY_TAIL_MS, DEFAULT_SCREEN_HEIGHT,
        DEFAULT_SCREEN_WIDTH, DEFAULT_SMOOTHING_WINDOW, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TRACKING_VERTEX, MAX_REPLAY_TAIL_MS,
        MAX_TICK_INTERVAL_MS,
    },
    filters::{create_filter, PointFilter},
    smoothing::{KernelProfile, SignalSmoother, SmoothingKernel},
    tracking::{TrackingLocator, TrackingMode},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Blendshape smoothing
    pub smoothing: SmoothingConfig,

    /// Tracking point computation
    pub tracking: TrackingConfig,

    /// Tick driver timing
    pub pipeline: PipelineConfig,

    /// Gesture bindings, evaluated in this order
    pub bindings: Vec<BindingConfig>,
}

/// Smoothing kernel and history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Explicit kernel weights, oldest to newest. Overrides `window` and
    /// `profile` when set.
    pub kernel: Option<Vec<f64>>,

    /// Generated kernel length
    pub window: usize,

    /// Generated kernel shape
    pub profile: KernelProfile,

    /// Frames kept in the blendshape history
    pub history_capacity: usize,
}

/// Tracking strategy and screen geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Project the head-pose forward vector instead of averaging landmarks
    pub use_transformation_matrix: bool,

    /// Landmarks averaged in landmark mode
    pub vertices: Vec<usize>,

    /// Screen width in pixels
    pub screen_width: u32,

    /// Screen height in pixels
    pub screen_height: u32,

    /// Gain on the rotated forward vector in head-pose mode
    pub head_pose_gain: f64,

    /// Tracking point filter (`none`, `moving_average[:n]`, `median[:n]`,
    /// `exponential[:alpha]`)
    pub filter: String,
}

/// Tick driver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Interval between ticks in milliseconds
    pub tick_interval_ms: u64,

    /// Ticks kept running after the last recorded result during replay
    pub replay_tail_ms: u64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            kernel: None,
            window: DEFAULT_SMOOTHING_WINDOW,
            profile: KernelProfile::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            use_transformation_matrix: false,
            vertices: vec![DEFAULT_TRACKING_VERTEX],
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            head_pose_gain: DEFAULT_HEAD_POSE_GAIN,
            filter: "none".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            replay_tail_ms: DEFAULT_REPLAY_TAIL_MS,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or [`Error::Yaml`] if
    /// it does not parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if the text does not parse.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] or [`Error::Io`] on failure.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Smoothing kernel described by the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKernel`] for an unusable kernel.
    pub fn build_kernel(&self) -> Result<SmoothingKernel> {
        let capacity = self.smoothing.history_capacity;
        match &self.smoothing.kernel {
            Some(weights) => SmoothingKernel::new(weights.clone(), capacity),
            None => SmoothingKernel::from_profile(self.smoothing.window, self.smoothing.profile, capacity),
        }
    }

    /// Smoother with the configured kernel and history
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKernel`] for an unusable kernel.
    pub fn build_smoother(&self) -> Result<SignalSmoother> {
        SignalSmoother::new(self.build_kernel()?, self.smoothing.history_capacity)
    }

    /// Tracking locator for the configured mode and screen
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a bad screen size or vertex set.
    pub fn build_locator(&self) -> Result<TrackingLocator> {
        let mode = if self.tracking.use_transformation_matrix {
            TrackingMode::HeadPose
        } else {
            TrackingMode::LandmarkAverage(self.tracking.vertices.clone())
        };
        Ok(TrackingLocator::new(mode, self.tracking.screen_width, self.tracking.screen_height)?
            .with_gain(self.tracking.head_pose_gain))
    }

    /// Tracking point filter
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown filter.
    pub fn build_filter(&self) -> Result<Box<dyn PointFilter>> {
        create_filter(&self.tracking.filter)
    }

    /// Validated binding table
    ///
    /// # Errors
    ///
    /// Returns the first binding validation error.
    pub fn binding_table(&self) -> Result<BindingTable> {
        BindingTable::from_configs(&self.bindings)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn validate(&self) -> Result<()> {
        if self.smoothing.history_capacity == 0 {
            return Err(Error::Config("History capacity must be greater than 0".to_string()));
        }
        self.build_smoother()?;

        if !self.tracking.head_pose_gain.is_finite() || self.tracking.head_pose_gain <= 0.0 {
            return Err(Error::Config("Head pose gain must be a positive number".to_string()));
        }
        self.build_locator()?;
        self.build_filter()?;

        if !(1..=MAX_TICK_INTERVAL_MS).contains(&self.pipeline.tick_interval_ms) {
            return Err(Error::Config(format!(
                "Tick interval must be between 1 and {MAX_TICK_INTERVAL_MS}ms, got {}",
                self.pipeline.tick_interval_ms
            )));
        }
        if self.pipeline.replay_tail_ms > MAX_REPLAY_TAIL_MS {
            return Err(Error::Config(format!(
                "Replay tail must be at most {MAX_REPLAY_TAIL_MS}ms, got {}",
                self.pipeline.replay_tail_ms
            )));
        }

        self.binding_table()?;
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gesture Pointer Configuration

# Blendshape smoothing
smoothing:
  # explicit weights, oldest to newest; remove to use window/profile
  # kernel: [0.1, 0.2, 0.3, 0.4]
  window: 8
  profile: "linear"
  history_capacity: 100

# Tracking point
tracking:
  use_transformation_matrix: false
  vertices: [8]
  screen_width: 1920
  screen_height: 1080
  head_pose_gain: 0.3
  filter: "none"

# Tick driver
pipeline:
  tick_interval_ms: 1
  replay_tail_ms: 1000

# Gesture bindings
bindings:
  - gesture: "jaw_open"
    device: "mouse"
    action: "left"
    threshold: 0.4
    trigger: "hold"
  - gesture: "eye_blink_left"
    device: "keyboard"
    action: "space"
    threshold: 0.6
    trigger: "dynamic"
    time_threshold: 0.3
  - gesture: "mouth_smile_left"
    device: "meta"
    action: "pause"
    threshold: 0.7
    trigger: "dynamic"
    time_threshold: 1.0
"#;
