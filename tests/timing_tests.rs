//! Temporal trigger logic: hold delays and repeats, delayed presses with
//! deferred releases, priority arbitration, repeat overrides, analog holds.

mod helpers;

use actionmap_core::prelude::*;
use helpers::Rig;
use pretty_assertions::assert_eq;

fn hold_binding(hold_trigger_delay: f32, hold_repeat_delay: Option<f32>) -> ActionInput {
    let mut input = ActionInput::new("w", InputDevice::Keyboard)
        .with_activation(ActivationModes::hold());
    input.hold_trigger_delay = hold_trigger_delay;
    input.hold_repeat_delay = hold_repeat_delay;
    input
}

#[test]
fn hold_waits_for_its_delay_then_repeats_at_cadence() {
    let mut rig = Rig::with_player_map();
    rig.manager
        .add_action_input("player", "charge", hold_binding(0.5, Some(0.1)), None);

    rig.press("w");
    assert_eq!(rig.listener.count(), 0, "hold-only binding ignores the press");

    let mut fire_times: Vec<f32> = Vec::new();
    let mut seen = 0usize;
    for _ in 0..63 {
        rig.clock.advance(0.016);
        rig.hold("w");
        let now = rig.listener.count_for("charge");
        if now > seen {
            seen = now;
            fire_times.push(rig.clock.game_time());
        }
    }

    assert!(!fire_times.is_empty(), "the hold fired at least once");
    // no fire before the hold delay elapsed
    assert!(fire_times[0] >= 0.5);
    // the first fire happens on the first tick past the delay
    assert!(fire_times[0] < 0.5 + 0.017);
    // successive fires respect the repeat cadence
    for pair in fire_times.windows(2) {
        assert!(
            pair[1] - pair[0] >= 0.1 - f32::EPSILON,
            "repeat gap {} shorter than cadence",
            pair[1] - pair[0]
        );
    }
    // every fire was reported as a held state
    assert!(rig.listener.events().iter().all(|e| e.1 == InputState::Down));
}

#[test]
fn hold_without_repeat_fires_exactly_once() {
    let mut rig = Rig::with_player_map();
    rig.manager
        .add_action_input("player", "charge", hold_binding(0.2, None), None);

    rig.press("w");
    for _ in 0..40 {
        rig.clock.advance(0.016);
        rig.hold("w");
    }

    assert_eq!(rig.listener.count_for("charge"), 1);
}

#[test]
fn immediate_hold_delay_skips_the_duplicate_first_fire() {
    // hold delay 0 fires on the press path, so the hold path must not fire
    // again on the same instant
    let mut rig = Rig::with_player_map();
    let mut input = ActionInput::new("w", InputDevice::Keyboard).with_activation(ActivationModes {
        on_press: true,
        on_hold: true,
        ..Default::default()
    });
    input.hold_trigger_delay = 0.0;
    input.hold_repeat_delay = Some(0.1);
    rig.manager.add_action_input("player", "walk", input, None);

    rig.press("w");
    assert_eq!(rig.listener.count_for("walk"), 1);

    rig.clock.advance(0.15);
    rig.hold("w");
    assert_eq!(rig.listener.count_for("walk"), 2);
}

#[test]
fn delayed_press_fires_on_update_after_the_delay() {
    let mut rig = Rig::with_player_map();
    let mut input =
        ActionInput::new("up", InputDevice::Keyboard).with_activation(ActivationModes::press());
    input.press_trigger_delay = 0.3;
    rig.manager.add_action_input("player", "nudge", input, None);

    assert!(!rig.press("up"));
    assert_eq!(rig.listener.count(), 0, "the press is withheld");

    // first update only consumes the just-registered mark
    rig.clock.advance(0.05);
    rig.manager.update();
    assert_eq!(rig.listener.count(), 0);

    rig.clock.advance(0.1);
    rig.manager.update();
    assert_eq!(rig.listener.count(), 0, "still inside the delay");

    rig.clock.advance(0.2);
    rig.manager.update();
    assert_eq!(
        rig.listener.events(),
        vec![("nudge".to_string(), InputState::Pressed, 1.0)]
    );

    // the refire entry is gone; further updates stay quiet
    rig.manager.update();
    rig.manager.update();
    assert_eq!(rig.listener.count(), 1);
}

#[test]
fn release_before_delayed_press_is_deferred_until_after_the_press() {
    let mut rig = Rig::with_player_map();
    let mut input = ActionInput::new("up", InputDevice::Keyboard)
        .with_activation(ActivationModes::press_release());
    input.press_trigger_delay = 0.3;
    rig.manager.add_action_input("player", "nudge", input, None);

    rig.press("up");
    rig.clock.advance(0.05);
    rig.manager.update(); // consume the registration mark

    rig.clock.advance(0.05);
    rig.release("up");
    assert_eq!(rig.listener.count(), 0, "the release is deferred, not dropped");

    rig.clock.advance(0.25); // t = 0.35, past the delay
    rig.manager.update();

    let modes: Vec<InputState> = rig.listener.events().iter().map(|e| e.1).collect();
    assert_eq!(
        modes,
        vec![InputState::Pressed, InputState::Released],
        "press strictly precedes the synthetic release"
    );
}

#[test]
fn equal_priority_delayed_press_cancels_pending_ones() {
    let mut rig = Rig::with_player_map();
    for (action, token) in [("up", "dpad_up"), ("upright", "dpad_upright")] {
        let mut input =
            ActionInput::new(token, InputDevice::Keyboard).with_activation(ActivationModes::press());
        input.press_trigger_delay = 0.2;
        rig.manager.add_action_input("player", action, input, None);
    }

    rig.press("dpad_up");
    rig.clock.advance(0.01);
    // same priority (0) >= highest pending (0): the newcomer wins
    rig.press("dpad_upright");

    rig.clock.advance(0.05);
    rig.manager.update();
    rig.clock.advance(0.3);
    rig.manager.update();

    assert_eq!(rig.listener.count_for("up"), 0, "cancelled by the newcomer");
    assert_eq!(rig.listener.count_for("upright"), 1);
}

#[test]
fn lower_priority_delayed_press_is_swallowed() {
    let mut rig = Rig::with_player_map();
    let mut high =
        ActionInput::new("dpad_up", InputDevice::Keyboard).with_activation(ActivationModes::press());
    high.press_trigger_delay = 0.2;
    high.press_delay_priority = 5;
    rig.manager.add_action_input("player", "up", high, None);

    let mut low = ActionInput::new("dpad_left", InputDevice::Keyboard)
        .with_activation(ActivationModes::press());
    low.press_trigger_delay = 0.2;
    low.press_delay_priority = 1;
    rig.manager.add_action_input("player", "left", low, None);

    rig.press("dpad_up");
    rig.clock.advance(0.01);
    rig.press("dpad_left");

    rig.clock.advance(0.05);
    rig.manager.update();
    rig.clock.advance(0.3);
    rig.manager.update();

    assert_eq!(rig.listener.count_for("up"), 1);
    assert_eq!(rig.listener.count_for("left"), 0, "outprioritized press never fires");
}

#[test]
fn repeated_key_press_override_fires_immediately() {
    let mut rig = Rig::with_player_map();
    let mut input =
        ActionInput::new("up", InputDevice::Keyboard).with_activation(ActivationModes::press());
    input.press_trigger_delay = 0.3;
    input.press_trigger_delay_repeat_override = Some(0.05);
    rig.manager.add_action_input("player", "nudge", input, None);

    let key = KeyId(200);
    let event = InputEvent::new("up", InputState::Pressed).with_key_id(key);
    rig.manager.on_input_event(&event);
    assert_eq!(rig.listener.count(), 0, "first press waits for the delay");

    rig.clock.advance(0.05);
    // same key id again: the manager sees a repeat and fires at once
    rig.manager.on_input_event(&event);
    assert_eq!(rig.listener.count_for("nudge"), 1);

    // the pending delayed press was cancelled, not fired a second time
    rig.clock.advance(0.5);
    rig.manager.update();
    rig.manager.update();
    assert_eq!(rig.listener.count_for("nudge"), 1);
}

#[test]
fn repeated_key_hold_override_shortens_the_hold_delay() {
    let mut rig = Rig::with_player_map();
    let mut input = hold_binding(0.5, None);
    input.hold_trigger_delay_repeat_override = Some(0.2);
    rig.manager.add_action_input("player", "charge", input, None);

    let key = KeyId(77);
    let press = InputEvent::new("w", InputState::Pressed).with_key_id(key);
    let down = InputEvent::new("w", InputState::Down).with_key_id(key);

    // first press: the full 0.5s delay applies; repeated Down events mark the
    // key as repeated
    rig.manager.on_input_event(&press);
    for _ in 0..40 {
        rig.clock.advance(0.016);
        rig.manager.on_input_event(&down);
    }
    assert_eq!(rig.listener.count_for("charge"), 1);

    // release and press the same key again: the 0.2s override applies
    rig.manager
        .on_input_event(&InputEvent::new("w", InputState::Released).with_key_id(key));
    rig.manager.on_input_event(&press);
    let before = rig.clock.game_time();
    let mut fired_at = None;
    for _ in 0..25 {
        rig.clock.advance(0.016);
        rig.manager.on_input_event(&down);
        if rig.listener.count_for("charge") > 1 {
            fired_at = Some(rig.clock.game_time() - before);
            break;
        }
    }
    let elapsed = fired_at.expect("override fired the hold early");
    assert!(elapsed >= 0.2 && elapsed < 0.5, "fired after {elapsed}, not the full delay");
}

#[test]
fn analog_hold_refires_without_new_hardware_events() {
    let mut rig = Rig::with_player_map();
    let mut input = ActionInput::new("xi_trigger_l", InputDevice::Keyboard).with_activation(
        ActivationModes {
            on_press: true,
            on_hold: true,
            ..Default::default()
        },
    );
    input.analog_compare = Some(AnalogCompare::new(CompareOp::GreaterThan, 0.5));
    input.hold_trigger_delay = 0.0;
    input.hold_repeat_delay = Some(0.0);
    rig.manager.add_action_input("player", "aim", input, None);

    // condition becomes true: the analog press fires
    rig.manager
        .on_input_event(&InputEvent::new("xi_trigger_l", InputState::Changed).with_value(0.8));
    assert_eq!(rig.listener.count_for("aim"), 1);

    // no further hardware events; refires keep the action alive
    rig.clock.advance(0.016);
    rig.manager.update(); // consumes the registration mark
    rig.clock.advance(0.016);
    rig.manager.update();
    rig.clock.advance(0.016);
    rig.manager.update();
    assert!(rig.listener.count_for("aim") >= 3);

    // condition drops: the refire entry dies with it
    let count = rig.listener.count_for("aim");
    rig.manager
        .on_input_event(&InputEvent::new("xi_trigger_l", InputState::Changed).with_value(0.1));
    rig.clock.advance(0.016);
    rig.manager.update();
    rig.clock.advance(0.016);
    rig.manager.update();
    assert_eq!(rig.listener.count_for("aim"), count);
}

#[test]
fn release_past_threshold_is_swallowed() {
    let mut rig = Rig::with_player_map();
    let mut input = ActionInput::new("e", InputDevice::Keyboard)
        .with_activation(ActivationModes::press_release());
    input.release_trigger_threshold = Some(0.25);
    rig.manager.add_action_input("player", "interact", input, None);

    // quick tap: release inside the threshold fires
    rig.press("e");
    rig.clock.advance(0.1);
    rig.release("e");
    let modes: Vec<InputState> = rig.listener.events().iter().map(|e| e.1).collect();
    assert_eq!(modes, vec![InputState::Pressed, InputState::Released]);

    rig.listener.clear();

    // long hold: the release is suppressed
    rig.press("e");
    rig.clock.advance(0.5);
    rig.release("e");
    let modes: Vec<InputState> = rig.listener.events().iter().map(|e| e.1).collect();
    assert_eq!(modes, vec![InputState::Pressed]);
}

#[test]
fn paused_host_reads_the_ui_timeline() {
    let mut rig = Rig::with_player_map();
    rig.manager
        .add_action_input("player", "charge", hold_binding(0.2, None), None);

    *rig.host.paused.lock() = true;

    rig.press("w");
    // only the UI clock advances while paused
    rig.clock.advance_ui(0.3);
    rig.hold("w");

    assert_eq!(
        rig.listener.count_for("charge"),
        1,
        "hold delay measured on the UI timeline while paused"
    );
}
