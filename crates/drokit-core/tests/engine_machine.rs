mod common;

use common::{close, machine, MockChannel, MockFeed};
use drokit_core::{
    DisplayUnit, DroError, DroEvent, DroVariant, Engine, EngineOptions, IndicatorColor,
    InterpState, Key, SafetyViolation, TaskMode,
};

fn options(display_unit: DisplayUnit, machine_unit: DisplayUnit) -> EngineOptions {
    EngineOptions {
        axes: vec!["X".to_string(), "Y".to_string()],
        variant: DroVariant::Machine,
        display_unit,
        machine_unit,
        initial_system: 0,
    }
}

fn inch() -> EngineOptions {
    options(DisplayUnit::Inch, DisplayUnit::Inch)
}

#[test]
fn test_offset_commands() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();

    engine.zero(0).unwrap();
    engine.commit(1, Some(5.0)).unwrap();
    engine.zero_all().unwrap();

    let sent = m.lock().sent.clone();
    assert_eq!(
        sent,
        vec![
            "G10 L20 P1 X0.0",
            "G10 L20 P1 Y5.0",
            "G10 L20 P1 X0.0 Y0.0",
        ]
    );
    // Offsets only change when the controller reports them
    assert!(close(engine.displayed()[0], 1.0));
}

#[test]
fn test_switches_to_mdi_once() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();

    engine.zero(0).unwrap();
    engine.zero(1).unwrap();
    assert_eq!(m.lock().mode_requests, vec![TaskMode::Mdi]);
}

#[test]
fn test_values_sent_in_machine_units() {
    let m = machine(vec![0.0, 0.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(
        options(DisplayUnit::Inch, DisplayUnit::Millimeter),
        &mut feed,
        &mut channel,
    )
    .unwrap();

    engine.commit(0, Some(2.0)).unwrap();
    assert_eq!(m.lock().sent, vec!["G10 L20 P1 X50.8"]);
}

#[test]
fn test_half_uses_displayed_value() {
    let m = machine(vec![3.0, 0.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();

    engine.half(0).unwrap();
    assert_eq!(m.lock().sent, vec!["G10 L20 P1 X1.5"]);
}

#[test]
fn test_select_is_confirmed_by_feed() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();
    let mut rx = engine.events().subscribe();

    engine.select_coordinate_system(2).unwrap();
    assert_eq!(m.lock().sent, vec!["G56"]);
    assert_eq!(engine.selected_system(), 2);
    assert_eq!(engine.confirmed_system(), 0);

    // Pending selection does not decide the P number
    engine.zero(0).unwrap();
    assert_eq!(m.lock().sent.last().map(String::as_str), Some("G10 L20 P1 X0.0"));

    m.lock().snapshot.active_system = 3;
    engine.poll().unwrap();
    assert_eq!(engine.confirmed_system(), 2);
    engine.zero(0).unwrap();
    assert_eq!(m.lock().sent.last().map(String::as_str), Some("G10 L20 P3 X0.0"));

    let mut changed = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let DroEvent::SystemChanged { name, .. } = event {
            changed.push(name);
        }
    }
    assert_eq!(changed, vec!["G56"]);
}

#[test]
fn test_estop_blocks_every_command() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();

    m.lock().snapshot.estop = true;
    let err = engine.select_coordinate_system(4).unwrap_err();
    assert!(matches!(err, DroError::Safety(SafetyViolation::EstopActive)));
    assert_eq!(engine.selected_system(), 0);

    let err = engine.commit(0, Some(1.0)).unwrap_err();
    assert!(err.is_safety_rejection());
    assert!(engine.toggle_enable().is_err());

    let m = m.lock();
    assert!(m.sent.is_empty());
    assert!(m.mode_requests.is_empty());
    assert!(m.enable_requests.is_empty());
}

#[test]
fn test_gate_conditions() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();

    m.lock().snapshot.interp_state = InterpState::Reading;
    assert!(matches!(
        engine.zero(0),
        Err(DroError::Safety(SafetyViolation::InterpreterBusy))
    ));

    m.lock().snapshot.interp_state = InterpState::Idle;
    m.lock().snapshot.homed_mask = 0b01;
    assert!(matches!(
        engine.zero(0),
        Err(DroError::Safety(SafetyViolation::NotHomed))
    ));
    assert!(!engine.editing_enabled());
    assert_eq!(engine.indicators().homed, IndicatorColor::Red);

    m.lock().snapshot.homed_mask = 0b11;
    m.lock().snapshot.enabled = false;
    assert!(matches!(
        engine.zero(0),
        Err(DroError::Safety(SafetyViolation::NotEnabled))
    ));
    assert!(m.lock().sent.is_empty());
}

#[test]
fn test_rejected_commit_keeps_buffer() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();
    let mut rx = engine.events().subscribe();

    engine.begin_edit(0).unwrap();
    engine.press_key(Key::Digit(3)).unwrap();
    m.lock().reject_with = Some("not in MDI".to_string());

    let err = engine.press_key(Key::Enter).unwrap_err();
    assert!(matches!(err, DroError::Command(_)));
    assert_eq!(engine.armed_axis(), Some(0));
    assert_eq!(engine.edit_buffer(), "3");

    let rejected = std::iter::from_fn(|| rx.try_recv().ok())
        .any(|e| matches!(e, DroEvent::CommandRejected(_)));
    assert!(rejected);

    m.lock().reject_with = None;
    engine.press_key(Key::Enter).unwrap();
    assert_eq!(engine.armed_axis(), None);
    assert_eq!(m.lock().sent, vec!["G10 L20 P1 X3.0"]);
}

#[test]
fn test_safety_rejected_commit_keeps_buffer() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();

    engine.begin_edit(0).unwrap();
    engine.press_key(Key::Digit(3)).unwrap();
    m.lock().snapshot.estop = true;

    let err = engine.press_key(Key::Enter).unwrap_err();
    assert!(matches!(err, DroError::Safety(SafetyViolation::EstopActive)));
    assert_eq!(engine.armed_axis(), Some(0));
    assert_eq!(engine.edit_buffer(), "3");
    assert!(m.lock().sent.is_empty());

    m.lock().snapshot.estop = false;
    engine.press_key(Key::Enter).unwrap();
    assert_eq!(engine.armed_axis(), None);
    assert_eq!(m.lock().sent, vec!["G10 L20 P1 X3.0"]);
}

#[test]
fn test_non_finite_commit_sends_nothing() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();

    assert!(engine.commit(1, Some(f64::NAN)).unwrap_err().is_input_error());
    assert!(engine.commit(1, Some(f64::INFINITY)).unwrap_err().is_input_error());
    assert!(m.lock().sent.is_empty());
}

#[test]
fn test_losing_gate_clears_session() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();

    engine.begin_edit(1).unwrap();
    m.lock().snapshot.estop = true;
    engine.poll().unwrap();

    assert!(!engine.editing_enabled());
    assert_eq!(engine.armed_axis(), None);
    assert!(matches!(engine.begin_edit(1), Err(DroError::EditingDisabled)));
    assert_eq!(engine.indicators().estop, IndicatorColor::Red);
}

#[test]
fn test_mirrors_controller_offsets() {
    let m = machine(vec![1.0, 2.0]);
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(
        options(DisplayUnit::Millimeter, DisplayUnit::Inch),
        &mut feed,
        &mut channel,
    )
    .unwrap();

    m.lock().snapshot.active_offset = Some(vec![-1.0, 0.5]);
    engine.poll().unwrap();
    assert_eq!(engine.formatted(), vec!["0.00", "63.50"]);
}

#[test]
fn test_toggle_enable() {
    let m = machine(vec![1.0, 2.0]);
    m.lock().snapshot.homed_mask = 0;
    let mut feed = MockFeed(m.clone());
    let mut channel = MockChannel(m.clone());
    let mut engine = Engine::new(inch(), &mut feed, &mut channel).unwrap();

    engine.toggle_enable().unwrap();
    engine.toggle_enable().unwrap();
    assert_eq!(m.lock().enable_requests, vec![false, true]);
}
