use super::{create_trigger, BindingTable, GestureBinding, TriggerMachine};
use crate::{
    action::{ActionEvent, ActionKind},
    smoothing::SmoothedSignal,
};
use log::{debug, info};

struct BindingSlot {
    binding: GestureBinding,
    machine: Box<dyn TriggerMachine>,
}

impl BindingSlot {
    fn new(binding: GestureBinding) -> Self {
        let machine = create_trigger(binding.trigger, binding.time_threshold);
        Self { binding, machine }
    }

    fn event(&self, kind: ActionKind, now_ms: u64) -> ActionEvent {
        ActionEvent::new(self.binding.target.clone(), kind, now_ms)
    }
}

/// Evaluates the loaded bindings against the smoothed signal once per tick.
///
/// Trigger state lives here and nowhere else. The engine is driven from a
/// single thread, so machines need no locking.
pub struct BindingEngine {
    slots: Vec<BindingSlot>,
}

impl BindingEngine {
    pub fn new(table: &BindingTable) -> Self {
        Self {
            slots: table.iter().cloned().map(BindingSlot::new).collect(),
        }
    }

    /// Advance every trigger machine once, in table order.
    ///
    /// Without a signal, bindings that are in effect are released and pending
    /// attempts are discarded. Bindings that never activated stay silent.
    pub fn tick(&mut self, signal: Option<&SmoothedSignal>, now_ms: u64) -> Vec<ActionEvent> {
        let mut events = Vec::new();

        for slot in &mut self.slots {
            let kind = match signal {
                Some(signal) => {
                    let value = signal.get(slot.binding.gesture);
                    slot.machine.advance(value, slot.binding.threshold, now_ms)
                }
                None => slot.machine.release(),
            };

            if let Some(kind) = kind {
                debug!(
                    "{:?} {} ({} via {}) at {}ms",
                    kind,
                    slot.binding.target,
                    slot.binding.gesture,
                    slot.machine.name(),
                    now_ms
                );
                events.push(slot.event(kind, now_ms));
            }
        }

        events
    }

    /// Replace the loaded bindings. Returns the releases for bindings that
    /// were in effect under the old table.
    pub fn load(&mut self, table: &BindingTable, now_ms: u64) -> Vec<ActionEvent> {
        let releases = self.reset(now_ms);
        self.slots = table.iter().cloned().map(BindingSlot::new).collect();
        info!("Loaded {} bindings", self.slots.len());
        releases
    }

    /// Return every machine to idle. Returns the releases for bindings that
    /// were in effect.
    pub fn reset(&mut self, now_ms: u64) -> Vec<ActionEvent> {
        self.slots
            .iter_mut()
            .filter_map(|slot| {
                let kind = slot.machine.release()?;
                Some(slot.event(kind, now_ms))
            })
            .collect()
    }

    /// Number of bindings whose action is currently in effect
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.machine.is_active()).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn bindings(&self) -> impl Iterator<Item = &GestureBinding> {
        self.slots.iter().map(|s| &s.binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        action::{ActionTarget, MouseButton},
        bindings::{BindingConfig, TriggerType},
        constants::N_SHAPES,
        gestures::GestureId,
    };

    fn table(entries: &[(&str, &str, &str, &str, f64)]) -> BindingTable {
        let configs: Vec<_> = entries
            .iter()
            .map(|&(gesture, device, action, trigger, time)| BindingConfig {
                gesture: gesture.to_string(),
                device: device.to_string(),
                action: action.to_string(),
                threshold: 0.5,
                trigger: trigger.to_string(),
                time_threshold: time,
            })
            .collect();
        BindingTable::from_configs(&configs).unwrap()
    }

    fn signal_with(gesture: &str, value: f64) -> SmoothedSignal {
        let mut values = [0.0; N_SHAPES];
        values[GestureId::from_name(gesture).unwrap().index()] = value;
        SmoothedSignal::new(values)
    }

    #[test]
    fn test_hold_binding_activates_once() {
        let mut engine = BindingEngine::new(&table(&[("jaw_open", "mouse", "left", "hold", 0.0)]));
        let high = signal_with("jaw_open", 0.9);
        let low = signal_with("jaw_open", 0.1);

        let mut events = Vec::new();
        for t in 0..10 {
            events.extend(engine.tick(Some(&high), t));
        }
        assert_eq!(engine.active_count(), 1);
        events.extend(engine.tick(Some(&low), 10));

        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Activate, ActionKind::Deactivate]);
        assert_eq!(events[0].target, ActionTarget::Mouse(MouseButton::Left));
        assert_eq!(events[1].timestamp_ms, 10);
    }

    #[test]
    fn test_missing_signal_releases_only_active() {
        let mut engine = BindingEngine::new(&table(&[
            ("jaw_open", "mouse", "left", "hold", 0.0),
            ("mouth_pucker", "keyboard", "a", "hold", 0.0),
            ("cheek_puff", "keyboard", "b", "dynamic", 1.0),
        ]));
        assert!(engine.tick(None, 0).is_empty());

        let mut values = [0.0; N_SHAPES];
        values[GestureId::from_name("jaw_open").unwrap().index()] = 0.8;
        values[GestureId::from_name("cheek_puff").unwrap().index()] = 0.8;
        let events = engine.tick(Some(&SmoothedSignal::new(values)), 1);
        assert_eq!(events.len(), 1);

        let released = engine.tick(None, 2);
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].kind, ActionKind::Deactivate);
        assert_eq!(released[0].target, ActionTarget::Mouse(MouseButton::Left));

        // pending dynamic attempt was discarded: restarting needs the full duration
        let signal = SmoothedSignal::new(values);
        engine.tick(Some(&signal), 3);
        let fired: Vec<_> = (4..=1003)
            .flat_map(|t| engine.tick(Some(&signal), t))
            .filter(|e| e.kind == ActionKind::Fire)
            .collect();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].timestamp_ms, 1003);
    }

    #[test]
    fn test_events_follow_table_order() {
        let mut engine = BindingEngine::new(&table(&[
            ("mouth_pucker", "keyboard", "z", "hold", 0.0),
            ("jaw_open", "keyboard", "a", "hold", 0.0),
        ]));
        let events = engine.tick(Some(&SmoothedSignal::new([1.0; N_SHAPES])), 5);
        let actions: Vec<_> = events.iter().map(|e| e.target.action().to_string()).collect();
        assert_eq!(actions, vec!["z", "a"]);
    }

    #[test]
    fn test_load_releases_previous_table() {
        let mut engine = BindingEngine::new(&table(&[("jaw_open", "mouse", "left", "hold", 0.0)]));
        engine.tick(Some(&signal_with("jaw_open", 1.0)), 0);

        let next = table(&[("cheek_puff", "mouse", "right", "dynamic", 0.2)]);
        let releases = engine.load(&next, 7);
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].kind, ActionKind::Deactivate);
        assert_eq!(releases[0].timestamp_ms, 7);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.bindings().next().unwrap().trigger, TriggerType::Dynamic);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_reset_is_quiet_when_idle() {
        let mut engine = BindingEngine::new(&table(&[("jaw_open", "mouse", "left", "hold", 0.0)]));
        assert!(engine.reset(0).is_empty());
        assert!(!engine.is_empty());
    }
}
