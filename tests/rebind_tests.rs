//! Rebinding: uniqueness, the rebound-input counters, reset-to-default and
//! the rebind-delta save/load round trip.

mod helpers;

use actionmap_core::prelude::*;
use helpers::Rig;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn creating_the_same_action_twice_fails() {
    let mut rig = Rig::with_player_map();
    assert!(rig.manager.create_action("player", "jump"));
    assert!(!rig.manager.create_action("player", "jump"));
    assert_eq!(
        rig.manager.action_map("player").map(|m| m.action_count()),
        Some(1)
    );
}

#[test]
fn duplicate_input_on_one_action_fails() {
    let mut rig = Rig::with_player_map();
    rig.bind("jump", "space", ActivationModes::press());
    let dup = ActionInput::new("space", InputDevice::Keyboard);
    assert!(!rig.manager.add_action_input("player", "jump", dup, None));
}

#[test]
fn rebound_event_routes_to_the_new_token() {
    let mut rig = Rig::with_player_map();
    rig.bind("jump", "space", ActivationModes::press());

    assert!(rig.manager.rebind_action_input("player", "jump", "space", "f"));

    rig.press("space");
    assert_eq!(rig.listener.count(), 0, "old token no longer dispatches");

    rig.press("f");
    assert_eq!(rig.listener.count_for("jump"), 1);
}

#[test]
fn rebind_counter_counts_transitions_not_calls() {
    let mut rig = Rig::with_player_map();
    rig.bind("move_forward", "w", ActivationModes::press());
    let count = |rig: &Rig| {
        rig.manager
            .action_map("player")
            .map(|m| m.num_rebound_inputs())
            .unwrap_or(-99)
    };

    assert_eq!(count(&rig), 0);

    assert!(rig.manager.rebind_action_input("player", "move_forward", "w", "x"));
    assert_eq!(count(&rig), 1);

    // still away from default: the counter must not grow
    assert!(rig.manager.rebind_action_input("player", "move_forward", "x", "y"));
    assert_eq!(count(&rig), 1);

    assert!(rig.manager.rebind_action_input("player", "move_forward", "y", "w"));
    assert_eq!(count(&rig), 0);
}

proptest! {
    /// The counter is exactly "bound token differs from default", no matter
    /// how many intermediate rebinds happened.
    #[test]
    fn rebind_counter_matches_default_divergence(seq in proptest::collection::vec(0usize..4, 0..24)) {
        let tokens = ["w", "x", "y", "z"];
        let mut rig = Rig::with_player_map();
        rig.bind("move_forward", "w", ActivationModes::press());

        let mut current = "w".to_string();
        for pick in seq {
            let target = tokens[pick];
            let changed = rig.manager.rebind_action_input("player", "move_forward", &current, target);
            prop_assert_eq!(changed, current != target, "rebinding to the same token is a no-op");
            if changed {
                current = target.to_string();
            }

            let expected = i32::from(current != "w");
            let map_count = rig.manager.action_map("player").map(|m| m.num_rebound_inputs());
            prop_assert_eq!(map_count, Some(expected));
        }
    }
}

#[test]
fn rebind_to_same_token_fails() {
    let mut rig = Rig::with_player_map();
    rig.bind("jump", "space", ActivationModes::press());
    assert!(!rig.manager.rebind_action_input("player", "jump", "space", "space"));
}

#[test]
fn rebind_missing_action_or_input_fails() {
    let mut rig = Rig::with_player_map();
    rig.bind("jump", "space", ActivationModes::press());
    assert!(!rig.manager.rebind_action_input("player", "slide", "space", "f"));
    assert!(!rig.manager.rebind_action_input("player", "jump", "q", "f"));
    assert!(!rig.manager.rebind_action_input("vehicle", "jump", "space", "f"));
}

#[test]
fn empty_token_clears_the_binding() {
    let mut rig = Rig::with_player_map();
    rig.bind("jump", "space", ActivationModes::press());

    assert!(rig.manager.rebind_action_input("player", "jump", "space", ""));
    rig.press("space");
    assert_eq!(rig.listener.count(), 0);

    // the input slot survives, unbound and counted as rebound
    let action = rig
        .manager
        .action_map("player")
        .and_then(|m| m.get_action("jump"))
        .expect("action kept");
    assert_eq!(action.input_count(), 1);
    assert!(!action.inputs[0].is_bound());
    assert_eq!(action.num_rebound_inputs(), 1);
}

#[test]
fn rebind_by_device_index_targets_the_nth_binding() {
    let mut rig = Rig::with_player_map();
    rig.bind("jump", "space", ActivationModes::press());
    rig.bind("jump", "j", ActivationModes::press());

    assert!(rig.manager.rebind_action_input_by_device(
        "player",
        "jump",
        "k",
        InputDevice::Keyboard,
        1,
    ));

    rig.press("j");
    assert_eq!(rig.listener.count(), 0);
    rig.press("k");
    assert_eq!(rig.listener.count_for("jump"), 1);
}

#[test]
fn reset_restores_defaults_and_reenables() {
    let mut rig = Rig::with_player_map();
    rig.bind("jump", "space", ActivationModes::press());
    rig.bind("crouch", "c", ActivationModes::press());

    rig.manager.rebind_action_input("player", "jump", "space", "f");
    rig.manager.rebind_action_input("player", "crouch", "c", "v");
    rig.manager.enable_action_map("player", false);

    rig.manager.reset();

    let map = rig.manager.action_map("player").expect("map exists");
    assert!(map.enabled());
    assert_eq!(map.num_rebound_inputs(), 0);

    rig.press("space");
    rig.press("c");
    assert_eq!(rig.listener.count_for("jump"), 1);
    assert_eq!(rig.listener.count_for("crouch"), 1);
}

#[test]
fn removing_a_rebound_action_fixes_the_map_counter() {
    let mut rig = Rig::with_player_map();
    rig.bind("jump", "space", ActivationModes::press());
    rig.bind("crouch", "c", ActivationModes::press());

    rig.manager.rebind_action_input("player", "jump", "space", "f");
    assert_eq!(
        rig.manager.action_map("player").map(|m| m.num_rebound_inputs()),
        Some(1)
    );

    rig.manager.remove_action("player", "jump");
    assert_eq!(
        rig.manager.action_map("player").map(|m| m.num_rebound_inputs()),
        Some(0)
    );
}

#[test]
fn rebind_delta_round_trips_through_xml() {
    let mut rig = Rig::with_player_map();
    rig.manager.set_version(3);
    rig.bind("jump", "space", ActivationModes::press());
    rig.bind("crouch", "c", ActivationModes::press());
    rig.manager.rebind_action_input("player", "jump", "space", "f");

    let xml = rig.manager.save_rebinds_xml().expect("serializes");
    assert!(xml.contains("version=\"3\""));
    assert!(xml.contains("defaultInput=\"space\""));
    // only the delta is recorded
    assert!(!xml.contains("crouch"));

    // a fresh manager with the same profile picks the delta up
    let mut fresh = Rig::with_player_map();
    fresh.manager.set_version(3);
    fresh.bind("jump", "space", ActivationModes::press());
    fresh.bind("crouch", "c", ActivationModes::press());
    fresh.manager.load_rebinds_xml(&xml).expect("loads");

    fresh.press("f");
    assert_eq!(fresh.listener.count_for("jump"), 1);
    fresh.press("space");
    assert_eq!(fresh.listener.count_for("jump"), 1);
}

#[test]
fn rebind_load_rejects_version_mismatch() {
    let mut rig = Rig::with_player_map();
    rig.manager.set_version(3);
    rig.bind("jump", "space", ActivationModes::press());
    rig.manager.rebind_action_input("player", "jump", "space", "f");
    let xml = rig.manager.save_rebinds_xml().expect("serializes");

    let mut fresh = Rig::with_player_map();
    fresh.manager.set_version(4);
    fresh.bind("jump", "space", ActivationModes::press());

    assert!(fresh.manager.load_rebinds_xml(&xml).is_err());
    // rejected wholesale: nothing was applied
    fresh.press("f");
    assert_eq!(fresh.listener.count(), 0);
}

#[test]
fn rebind_load_honors_ignore_version() {
    let mut rig = Rig::with_player_map();
    rig.manager.set_version(9);
    rig.bind("jump", "space", ActivationModes::press());

    let xml = r#"<rebinds version="1" ignoreVersion="1">
  <actionmap name="player">
    <action name="jump">
      <rebind device="keyboard" input="f" defaultInput="space"/>
    </action>
  </actionmap>
</rebinds>"#;

    rig.manager.load_rebinds_xml(xml).expect("version ignored");
    rig.press("f");
    assert_eq!(rig.listener.count_for("jump"), 1);
}

#[test]
fn rebind_load_resets_to_default_via_marker() {
    let mut rig = Rig::with_player_map();
    rig.manager.set_version(1);
    rig.bind("jump", "space", ActivationModes::press());
    rig.manager.rebind_action_input("player", "jump", "space", "f");

    let xml = r#"<rebinds version="1">
  <actionmap name="player">
    <action name="jump">
      <rebind device="keyboard" input="DEFAULT" defaultInput="space"/>
    </action>
  </actionmap>
</rebinds>"#;

    rig.manager.load_rebinds_xml(xml).expect("loads");
    rig.press("space");
    assert_eq!(rig.listener.count_for("jump"), 1);
    assert_eq!(
        rig.manager.action_map("player").map(|m| m.num_rebound_inputs()),
        Some(0)
    );
}

#[test]
fn bad_entries_do_not_void_the_rest_of_the_rebind_file() {
    let mut rig = Rig::with_player_map();
    rig.manager.set_version(1);
    rig.bind("jump", "space", ActivationModes::press());
    rig.bind("crouch", "c", ActivationModes::press());

    let xml = r#"<rebinds version="1">
  <actionmap name="player">
    <action name="missing_action">
      <rebind device="keyboard" input="q" defaultInput="p"/>
    </action>
    <action name="crouch">
      <rebind device="keyboard" input="v" defaultInput="c"/>
    </action>
  </actionmap>
  <actionmap name="ghost_map">
    <action name="jump">
      <rebind device="keyboard" input="g" defaultInput="space"/>
    </action>
  </actionmap>
</rebinds>"#;

    rig.manager.load_rebinds_xml(xml).expect("best-effort load succeeds");
    rig.press("v");
    assert_eq!(rig.listener.count_for("crouch"), 1);
}
