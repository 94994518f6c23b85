//! Per-binding trigger state machines.
//!
//! Every loaded binding owns one machine. The engine advances it once per
//! tick with the binding's current score; the machine decides whether that
//! tick produces an event.

use super::TriggerType;
use crate::action::ActionKind;
use log::debug;
use std::time::Duration;

/// Temporal firing policy of a binding
pub trait TriggerMachine: Send {
    /// Advance one tick. `value` is the gesture score, `now_ms` the tick time.
    fn advance(&mut self, value: f64, threshold: f64, now_ms: u64) -> Option<ActionKind>;

    /// Drop back to idle, e.g. because the signal disappeared. Returns the
    /// event needed to undo an action that is still in effect.
    fn release(&mut self) -> Option<ActionKind>;

    /// Whether the bound action is currently in effect
    fn is_active(&self) -> bool;

    /// Get machine name
    fn name(&self) -> &str;
}

/// Build the machine for a trigger type
pub fn create_trigger(trigger: TriggerType, time_threshold: Duration) -> Box<dyn TriggerMachine> {
    match trigger {
        TriggerType::Hold => Box::new(HoldTrigger::new()),
        TriggerType::Dynamic => Box::new(TimedTrigger::new(time_threshold)),
    }
}

/// Active for as long as the score stays at or above the threshold.
/// Emits `Activate` on the rising edge and `Deactivate` on the falling edge.
#[derive(Debug, Default)]
pub struct HoldTrigger {
    active: bool,
}

impl HoldTrigger {
    pub const fn new() -> Self {
        Self { active: false }
    }
}

impl TriggerMachine for HoldTrigger {
    fn advance(&mut self, value: f64, threshold: f64, _now_ms: u64) -> Option<ActionKind> {
        let above = value >= threshold;
        match (self.active, above) {
            (false, true) => {
                self.active = true;
                Some(ActionKind::Activate)
            }
            (true, false) => {
                self.active = false;
                Some(ActionKind::Deactivate)
            }
            _ => None,
        }
    }

    fn release(&mut self) -> Option<ActionKind> {
        if std::mem::take(&mut self.active) {
            Some(ActionKind::Deactivate)
        } else {
            None
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn name(&self) -> &str {
        "hold"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimedState {
    /// Below threshold, ready to arm
    Idle,
    /// Above threshold since the given tick, not yet fired
    Pending { since_ms: u64 },
    /// Fired; waiting for the score to fall below threshold
    Latched,
}

/// Fires once after the score has stayed at or above the threshold for the
/// configured duration. Dips below threshold before that discard the attempt.
/// After firing, the score has to fall below threshold before it can arm
/// again.
#[derive(Debug)]
pub struct TimedTrigger {
    hold_for_ms: u64,
    state: TimedState,
}

impl TimedTrigger {
    pub fn new(hold_for: Duration) -> Self {
        Self {
            hold_for_ms: u64::try_from(hold_for.as_millis()).unwrap_or(u64::MAX),
            state: TimedState::Idle,
        }
    }

    /// Tick at which the current attempt started, if one is pending
    pub const fn active_since(&self) -> Option<u64> {
        match self.state {
            TimedState::Pending { since_ms } => Some(since_ms),
            _ => None,
        }
    }

    /// Whether the machine fired and still waits for the score to drop
    pub fn is_latched(&self) -> bool {
        self.state == TimedState::Latched
    }
}

impl TriggerMachine for TimedTrigger {
    fn advance(&mut self, value: f64, threshold: f64, now_ms: u64) -> Option<ActionKind> {
        let above = value >= threshold;

        if !above {
            if let TimedState::Pending { since_ms } = self.state {
                debug!(
                    "Timed trigger dropped after {}ms of {}ms",
                    now_ms.saturating_sub(since_ms),
                    self.hold_for_ms
                );
            }
            self.state = TimedState::Idle;
            return None;
        }

        let since_ms = match self.state {
            TimedState::Latched => return None,
            TimedState::Pending { since_ms } => since_ms,
            TimedState::Idle => {
                self.state = TimedState::Pending { since_ms: now_ms };
                now_ms
            }
        };

        if now_ms.saturating_sub(since_ms) >= self.hold_for_ms {
            self.state = TimedState::Latched;
            Some(ActionKind::Fire)
        } else {
            None
        }
    }

    fn release(&mut self) -> Option<ActionKind> {
        // a fired one-shot has nothing to undo
        self.state = TimedState::Idle;
        None
    }

    fn is_active(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "dynamic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_edges() {
        let mut trigger = HoldTrigger::new();
        assert_eq!(trigger.advance(0.1, 0.5, 0), None);
        assert_eq!(trigger.advance(0.5, 0.5, 1), Some(ActionKind::Activate));
        assert_eq!(trigger.advance(0.9, 0.5, 2), None);
        assert!(trigger.is_active());
        assert_eq!(trigger.advance(0.4, 0.5, 3), Some(ActionKind::Deactivate));
        assert_eq!(trigger.advance(0.4, 0.5, 4), None);
    }

    #[test]
    fn test_hold_release() {
        let mut trigger = HoldTrigger::new();
        assert_eq!(trigger.release(), None);
        trigger.advance(1.0, 0.5, 0);
        assert_eq!(trigger.release(), Some(ActionKind::Deactivate));
        assert!(!trigger.is_active());
    }

    #[test]
    fn test_timed_fires_once() {
        let mut trigger = TimedTrigger::new(Duration::from_millis(100));
        assert_eq!(trigger.advance(0.8, 0.5, 1000), None);
        assert_eq!(trigger.active_since(), Some(1000));
        assert_eq!(trigger.advance(0.8, 0.5, 1099), None);
        assert_eq!(trigger.advance(0.8, 0.5, 1100), Some(ActionKind::Fire));
        assert!(trigger.is_latched());
        assert_eq!(trigger.advance(0.8, 0.5, 1500), None);

        // must drop before re-arming
        assert_eq!(trigger.advance(0.1, 0.5, 1501), None);
        assert_eq!(trigger.advance(0.8, 0.5, 1502), None);
        assert_eq!(trigger.advance(0.8, 0.5, 1602), Some(ActionKind::Fire));
    }

    #[test]
    fn test_timed_dip_discards_attempt() {
        let mut trigger = TimedTrigger::new(Duration::from_millis(50));
        trigger.advance(0.9, 0.5, 0);
        trigger.advance(0.9, 0.5, 40);
        trigger.advance(0.2, 0.5, 41);
        assert_eq!(trigger.active_since(), None);
        trigger.advance(0.9, 0.5, 42);
        assert_eq!(trigger.advance(0.9, 0.5, 60), None);
        assert_eq!(trigger.advance(0.9, 0.5, 92), Some(ActionKind::Fire));
    }

    #[test]
    fn test_timed_zero_duration_fires_on_rising_edge() {
        let mut trigger = TimedTrigger::new(Duration::ZERO);
        assert_eq!(trigger.advance(0.6, 0.5, 7), Some(ActionKind::Fire));
        assert_eq!(trigger.advance(0.6, 0.5, 8), None);
    }

    #[test]
    fn test_create_trigger() {
        assert_eq!(create_trigger(TriggerType::Hold, Duration::ZERO).name(), "hold");
        assert_eq!(create_trigger(TriggerType::Dynamic, Duration::from_millis(300)).name(), "dynamic");
    }
}
