//! Gesture pointer library: facial gestures and head movement to pointer
//! and input actions.
//!
//! The pipeline consumes the output of an asynchronous face landmark
//! detector and turns it into:
//! - a screen-space tracking point for the pointer
//! - discrete input events (key press/release, clicks, meta actions) driven
//!   by configured gesture bindings
//!
//! Stages:
//! 1. The detector callback smooths blendshape scores over a rolling history
//!    and splices in eye aspect ratios computed from landmarks
//! 2. The same callback locates the tracking point, by landmark average or
//!    head pose, and publishes an immutable snapshot
//! 3. A fixed tick reads the latest snapshot and advances one trigger state
//!    machine per binding
//! 4. Events and pointer moves go to an [`action::ActionSink`]
//!
//! # Examples
//!
//! ## Bindings and triggers
//!
//! ```
//! use gesture_pointer::{
//!     bindings::{BindingConfig, BindingEngine, BindingTable},
//!     smoothing::SmoothedSignal,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = BindingTable::from_configs(&[BindingConfig {
//!     gesture: "jaw_open".to_string(),
//!     device: "mouse".to_string(),
//!     action: "left".to_string(),
//!     threshold: 0.4,
//!     trigger: "hold".to_string(),
//!     time_threshold: 0.0,
//! }])?;
//! let mut engine = BindingEngine::new(&table);
//!
//! let mut scores = [0.0; 52];
//! scores[25] = 0.5; // jaw_open
//! let events = engine.tick(Some(&SmoothedSignal::new(scores)), 0);
//! assert_eq!(events.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Replaying a recording
//!
//! ```no_run
//! use gesture_pointer::{action::RecordingSink, config::Config, replay};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file("gesture-pointer.yaml")?;
//! let results = replay::load_recording("session.yaml")?;
//!
//! let mut sink = RecordingSink::new();
//! let summary = replay::replay(&config, results, &mut sink)?;
//! println!("{} events over {} ticks", summary.events.len(), summary.ticks);
//! # Ok(())
//! # }
//! ```

/// Action events and sinks
pub mod action;

/// Gesture bindings, trigger machines and the binding engine
pub mod bindings;

/// Configuration management
pub mod config;

/// Constants used throughout the library
pub mod constants;

/// X11 action sink
pub mod cursor_control;

/// Landmark detector contract and detection results
pub mod detector;

/// Error types and result handling
pub mod error;

/// Tracking point filters
pub mod filters;

/// Gesture catalog
pub mod gestures;

/// Latest-value mailbox between the detector and the tick driver
pub mod mailbox;

/// Tick driver and pipeline lifecycle
pub mod pipeline;

/// Detector-callback stage
pub mod processor;

/// Deterministic replay of recorded detector output
pub mod replay;

/// Blendshape smoothing and eye aspect ratios
pub mod smoothing;

/// Tracking point computation
pub mod tracking;

pub use error::{Error, Result};
