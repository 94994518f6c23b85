//! Trigger semantics through the binding engine


use gesture_pointer::{
    action::{ActionKind, ActionTarget, MouseButton},
    bindings::{BindingEngine, BindingTable},
    constants::N_SHAPES,
    smoothing::SmoothedSignal,
};
use test_helpers::{binding, scores};

fn signal(values: &[(&str, f64)]) -> SmoothedSignal {
    let raw = scores(values);
    let mut array = [0.0; N_SHAPES];
    array.copy_from_slice(&raw);
    SmoothedSignal::new(array)
}

fn engine(bindings: Vec<gesture_pointer::bindings::BindingConfig>) -> BindingEngine {
    BindingEngine::new(&BindingTable::from_configs(&bindings).unwrap())
}

#[test]
fn test_hold_emits_one_pair_for_long_hold() {
    let mut engine = engine(vec![binding("mouth_pucker", "keyboard", "w", 0.5, "hold", 0.0)]);
    let high = signal(&[("mouth_pucker", 0.7)]);
    let low = signal(&[("mouth_pucker", 0.2)]);

    for n in [1_u64, 2, 50, 500] {
        let mut events = Vec::new();
        for t in 0..n {
            events.extend(engine.tick(Some(&high), t));
        }
        events.extend(engine.tick(Some(&low), n));
        events.extend(engine.tick(Some(&low), n + 1));

        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Activate, ActionKind::Deactivate], "hold for {n} ticks");
    }
}

#[test]
fn test_hold_threshold_is_inclusive() {
    let mut engine = engine(vec![binding("jaw_open", "mouse", "left", 0.4, "hold", 0.0)]);
    let events = engine.tick(Some(&signal(&[("jaw_open", 0.4)])), 0);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ActionKind::Activate);
}

#[test]
fn test_timed_fires_at_exact_duration() {
    let mut engine = engine(vec![binding("eye_blink_left", "mouse", "right", 0.6, "dynamic", 0.25)]);
    let high = signal(&[("eye_blink_left", 0.9)]);
    let low = signal(&[("eye_blink_left", 0.0)]);

    let mut events = Vec::new();
    for t in 1000..=1250 {
        events.extend(engine.tick(Some(&high), t));
    }
    events.extend(engine.tick(Some(&low), 1251));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ActionKind::Fire);
    assert_eq!(events[0].timestamp_ms, 1250);
    assert_eq!(events[0].target, ActionTarget::Mouse(MouseButton::Right));
}

#[test]
fn test_timed_drop_one_ms_early_is_silent() {
    let mut engine = engine(vec![binding("eye_blink_left", "mouse", "right", 0.6, "dynamic", 0.25)]);
    let high = signal(&[("eye_blink_left", 0.9)]);
    let low = signal(&[("eye_blink_left", 0.0)]);

    let mut events = Vec::new();
    for t in 1000..1250 {
        events.extend(engine.tick(Some(&high), t));
    }
    events.extend(engine.tick(Some(&low), 1250));
    assert!(events.is_empty());
}

#[test]
fn test_timed_does_not_repeat_while_held() {
    let mut engine = engine(vec![binding("cheek_puff", "keyboard", "space", 0.5, "dynamic", 0.01)]);
    let high = signal(&[("cheek_puff", 1.0)]);
    let low = signal(&[("cheek_puff", 0.0)]);

    let mut fires = 0;
    for cycle in 0..3_u64 {
        let base = cycle * 1000;
        for t in base..base + 500 {
            fires += engine.tick(Some(&high), t).len();
        }
        engine.tick(Some(&low), base + 500);
    }
    assert_eq!(fires, 3);
}

#[test]
fn test_independent_machines() {
    let mut engine = engine(vec![
        binding("jaw_open", "mouse", "left", 0.5, "hold", 0.0),
        binding("jaw_open", "keyboard", "j", 0.5, "dynamic", 0.002),
        binding("mouth_pucker", "meta", "pause", 0.5, "hold", 0.0),
    ]);
    let jaw = signal(&[("jaw_open", 0.8)]);

    let first = engine.tick(Some(&jaw), 0);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].target, ActionTarget::Mouse(MouseButton::Left));
    assert!(engine.tick(Some(&jaw), 1).is_empty());

    let fired = engine.tick(Some(&jaw), 2);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].kind, ActionKind::Fire);
    assert_eq!(fired[0].target, ActionTarget::Key("j".to_string()));
    assert_eq!(engine.active_count(), 1);
}

#[test]
fn test_no_signal_yet_is_silent() {
    let mut engine = engine(vec![
        binding("jaw_open", "mouse", "left", 0.5, "hold", 0.0),
        binding("cheek_puff", "keyboard", "a", 0.5, "dynamic", 0.1),
    ]);
    for t in 0..100 {
        assert!(engine.tick(None, t).is_empty());
    }
}
