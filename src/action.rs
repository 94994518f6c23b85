//! Action events and the sink that applies them.

use crate::{tracking::TrackingPoint, Error, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Input device an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Keyboard,
    Mouse,
    /// Actions on the pointer pipeline itself
    Meta,
}

impl Device {
    /// Parse a device name
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "keyboard" => Ok(Self::Keyboard),
            "mouse" => Ok(Self::Mouse),
            "meta" => Ok(Self::Meta),
            other => Err(Error::InvalidBinding(format!("unknown device '{other}'"))),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Mouse => "mouse",
            Self::Meta => "meta",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

/// Pipeline-level actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaAction {
    /// Toggle pointer movement on and off
    Pause,
    /// Move the pointer to the screen centre
    Reset,
    /// Move focus to the next monitor
    Cycle,
    /// Middle click
    Middle,
}

impl MetaAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Reset => "reset",
            Self::Cycle => "cycle",
            Self::Middle => "middle",
        }
    }
}

/// What a binding drives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionTarget {
    /// Key symbol such as `space`, `a` or `f5`
    Key(String),
    Mouse(MouseButton),
    Meta(MetaAction),
}

impl ActionTarget {
    /// Parse a device/action pair from configuration
    pub fn parse(device: &str, action: &str) -> Result<Self> {
        let action_lc = action.trim().to_lowercase();
        match Device::parse(device)? {
            Device::Keyboard => {
                if action_lc.is_empty() || action_lc == "none" {
                    return Err(Error::InvalidBinding("keyboard binding without a key".to_string()));
                }
                Ok(Self::Key(action_lc))
            }
            Device::Mouse => match action_lc.as_str() {
                "left" => Ok(Self::Mouse(MouseButton::Left)),
                "right" => Ok(Self::Mouse(MouseButton::Right)),
                "middle" => Ok(Self::Mouse(MouseButton::Middle)),
                other => Err(Error::InvalidBinding(format!("unknown mouse button '{other}'"))),
            },
            Device::Meta => match action_lc.as_str() {
                "pause" => Ok(Self::Meta(MetaAction::Pause)),
                "reset" => Ok(Self::Meta(MetaAction::Reset)),
                "cycle" => Ok(Self::Meta(MetaAction::Cycle)),
                "middle" => Ok(Self::Meta(MetaAction::Middle)),
                other => Err(Error::InvalidBinding(format!("unknown meta action '{other}'"))),
            },
        }
    }

    pub const fn device(&self) -> Device {
        match self {
            Self::Key(_) => Device::Keyboard,
            Self::Mouse(_) => Device::Mouse,
            Self::Meta(_) => Device::Meta,
        }
    }

    /// Action name as written in configuration
    pub fn action(&self) -> &str {
        match self {
            Self::Key(key) => key,
            Self::Mouse(button) => button.as_str(),
            Self::Meta(meta) => meta.as_str(),
        }
    }
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device(), self.action())
    }
}

/// Transition reported for a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Sustained action starts (press)
    Activate,
    /// Sustained action ends (release)
    Deactivate,
    /// One-shot action
    Fire,
}

/// Discrete event handed to the sink
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub target: ActionTarget,
    pub kind: ActionKind,
    /// Tick time at which the transition happened
    pub timestamp_ms: u64,
}

impl ActionEvent {
    pub const fn new(target: ActionTarget, kind: ActionKind, timestamp_ms: u64) -> Self {
        Self {
            target,
            kind,
            timestamp_ms,
        }
    }

    pub const fn device(&self) -> Device {
        self.target.device()
    }
}

/// Consumer of action events and pointer positions
pub trait ActionSink {
    /// Apply one event
    fn dispatch(&mut self, event: &ActionEvent) -> Result<()>;

    /// Move the pointer to `point`
    fn move_pointer(&mut self, point: TrackingPoint) -> Result<()>;
}

impl<S: ActionSink + ?Sized> ActionSink for &mut S {
    fn dispatch(&mut self, event: &ActionEvent) -> Result<()> {
        (**self).dispatch(event)
    }

    fn move_pointer(&mut self, point: TrackingPoint) -> Result<()> {
        (**self).move_pointer(point)
    }
}

impl<S: ActionSink + ?Sized> ActionSink for Box<S> {
    fn dispatch(&mut self, event: &ActionEvent) -> Result<()> {
        (**self).dispatch(event)
    }

    fn move_pointer(&mut self, point: TrackingPoint) -> Result<()> {
        (**self).move_pointer(point)
    }
}

/// Sink that only logs what it receives
#[derive(Debug, Default)]
pub struct LogSink;

impl ActionSink for LogSink {
    fn dispatch(&mut self, event: &ActionEvent) -> Result<()> {
        info!("{:?} {} at {}ms", event.kind, event.target, event.timestamp_ms);
        Ok(())
    }

    fn move_pointer(&mut self, point: TrackingPoint) -> Result<()> {
        log::trace!("Pointer to ({:.1}, {:.1})", point.x, point.y);
        Ok(())
    }
}

/// Sink that keeps everything it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<ActionEvent>,
    pub pointer_moves: Vec<TrackingPoint>,
    /// Targets whose dispatch is rejected
    pub reject: Vec<ActionTarget>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events of one kind, in dispatch order
    pub fn events_of(&self, kind: ActionKind) -> Vec<&ActionEvent> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }
}

impl ActionSink for RecordingSink {
    fn dispatch(&mut self, event: &ActionEvent) -> Result<()> {
        self.events.push(event.clone());
        if self.reject.contains(&event.target) {
            return Err(Error::SinkDispatch(format!("{} rejected", event.target)));
        }
        Ok(())
    }

    fn move_pointer(&mut self, point: TrackingPoint) -> Result<()> {
        self.pointer_moves.push(point);
        Ok(())
    }
}
