//! Gesture bindings and the engine that evaluates them.

pub mod engine;
pub mod trigger;

pub use engine::BindingEngine;
pub use trigger::{create_trigger, HoldTrigger, TimedTrigger, TriggerMachine};

use crate::{action::ActionTarget, gestures::GestureId, Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Temporal firing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    /// Press while the score stays at or above threshold
    #[default]
    Hold,
    /// One-shot after the score stayed at or above threshold for a duration
    Dynamic,
}

impl TriggerType {
    /// Parse a trigger name
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "hold" => Ok(Self::Hold),
            "dynamic" | "timed" => Ok(Self::Dynamic),
            other => Err(Error::InvalidBinding(format!("unknown trigger type '{other}'"))),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_trigger() -> String {
    TriggerType::Hold.as_str().to_string()
}

/// Binding as written in a configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub gesture: String,
    pub device: String,
    pub action: String,
    /// Score in (0, 1] at which the gesture counts as performed
    pub threshold: f64,
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// Seconds the gesture must be held before a dynamic trigger fires
    #[serde(default)]
    pub time_threshold: f64,
}

/// Validated association of a gesture with an action
#[derive(Debug, Clone, PartialEq)]
pub struct GestureBinding {
    pub gesture: GestureId,
    pub target: ActionTarget,
    pub threshold: f64,
    pub trigger: TriggerType,
    /// Rounded to whole milliseconds
    pub time_threshold: Duration,
}

impl GestureBinding {
    /// Create a binding
    pub fn new(
        gesture: GestureId,
        target: ActionTarget,
        threshold: f64,
        trigger: TriggerType,
        time_threshold_secs: f64,
    ) -> Result<Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(Error::InvalidBinding(format!(
                "{target}: threshold {threshold} outside (0, 1]"
            )));
        }
        if !time_threshold_secs.is_finite() || time_threshold_secs < 0.0 {
            return Err(Error::InvalidBinding(format!(
                "{target}: time threshold {time_threshold_secs}s must be finite and non-negative"
            )));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = (time_threshold_secs * 1000.0).round() as u64;

        Ok(Self {
            gesture,
            target,
            threshold,
            trigger,
            time_threshold: Duration::from_millis(millis),
        })
    }

    /// Validate a configuration record
    pub fn from_config(config: &BindingConfig) -> Result<Self> {
        let gesture = GestureId::from_name(&config.gesture)?;
        let target = ActionTarget::parse(&config.device, &config.action)?;
        let trigger = TriggerType::parse(&config.trigger)?;
        Self::new(gesture, target, config.threshold, trigger, config.time_threshold)
    }

    pub fn to_config(&self) -> BindingConfig {
        BindingConfig {
            gesture: self.gesture.name().to_string(),
            device: self.target.device().to_string(),
            action: self.target.action().to_string(),
            threshold: self.threshold,
            trigger: self.trigger.to_string(),
            time_threshold: self.time_threshold.as_secs_f64(),
        }
    }
}

/// Ordered set of bindings, at most one per action target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingTable {
    bindings: Vec<GestureBinding>,
}

impl BindingTable {
    pub const fn new() -> Self {
        Self { bindings: Vec::new() }
    }

    /// Build a table, rejecting two bindings for the same target
    pub fn from_bindings(bindings: Vec<GestureBinding>) -> Result<Self> {
        let mut table = Self::new();
        for binding in bindings {
            if table.get(&binding.target).is_some() {
                return Err(Error::DuplicateBinding {
                    device: binding.target.device().to_string(),
                    action: binding.target.action().to_string(),
                });
            }
            table.bindings.push(binding);
        }
        Ok(table)
    }

    /// Validate configuration records into a table
    pub fn from_configs(configs: &[BindingConfig]) -> Result<Self> {
        let bindings = configs
            .iter()
            .map(GestureBinding::from_config)
            .collect::<Result<Vec<_>>>()?;
        Self::from_bindings(bindings)
    }

    /// Import the flat `gesture: [device, action, threshold, trigger, time]`
    /// mapping used by older profile files. Entries with a `None` gesture or
    /// action are unfinished rows and are skipped. A later entry for the same
    /// target replaces an earlier one.
    pub fn from_legacy_str(text: &str) -> Result<Self> {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(text)?;
        let mut table = Self::new();

        for (key, value) in mapping {
            let Some(gesture) = key.as_str() else {
                return Err(Error::InvalidBinding(format!("non-string gesture key {key:?}")));
            };
            let (device, action, threshold, trigger, time_threshold): (String, String, f64, String, f64) =
                serde_yaml::from_value(value)?;

            if gesture == "None" || action == "None" {
                debug!("Skipping unfinished legacy binding '{gesture}'");
                continue;
            }

            let config = BindingConfig {
                gesture: gesture.to_string(),
                device,
                action,
                threshold,
                trigger,
                time_threshold,
            };
            table.insert(GestureBinding::from_config(&config)?);
        }

        Ok(table)
    }

    /// Add a binding, replacing any binding for the same target. Returns the
    /// replaced binding.
    pub fn insert(&mut self, binding: GestureBinding) -> Option<GestureBinding> {
        if let Some(pos) = self.position(&binding.target) {
            warn!(
                "Binding for {} rebound from {} to {}",
                binding.target, self.bindings[pos].gesture, binding.gesture
            );
            return Some(std::mem::replace(&mut self.bindings[pos], binding));
        }
        self.bindings.push(binding);
        None
    }

    pub fn get(&self, target: &ActionTarget) -> Option<&GestureBinding> {
        self.bindings.iter().find(|b| &b.target == target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn to_configs(&self) -> Vec<BindingConfig> {
        self.bindings.iter().map(GestureBinding::to_config).collect()
    }

    fn position(&self, target: &ActionTarget) -> Option<usize> {
        self.bindings.iter().position(|b| &b.target == target)
    }
}
