//! A named, independently enable-able group of actions, plus the trigger
//! decision logic that determines whether a raw event fires a binding.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::ActionId;
use crate::bindings::action::{Action, InsertInputError};
use crate::bindings::action_input::ActionInput;
use crate::bindings::trigger::{RefireRequest, TriggerContext};
use crate::input::device::InputDevice;
use crate::input::event::{InputEvent, InputState};
use crate::listener::ActionListener;
use crate::log::InputLog;
use crate::manager::registry::{BindRef, BindRegistry};
use crate::str_intern::{intern, intern_token};

pub struct ActionMap {
    name: Arc<str>,
    enabled: bool,
    actions: IndexMap<ActionId, Action>,
    /// The game-object notified when an action fires; absence silently skips
    /// that channel.
    listener: Option<Arc<dyn ActionListener>>,
    map_listeners: Vec<Arc<dyn ActionListener>>,
    num_rebound_inputs: i32,
}

impl ActionMap {
    pub(crate) fn new(name: &str) -> Self {
        ActionMap {
            name: intern(name),
            enabled: true,
            actions: IndexMap::new(),
            listener: None,
            map_listeners: Vec::new(),
            num_rebound_inputs: 0,
        }
    }

    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    pub fn num_rebound_inputs(&self) -> i32 {
        self.num_rebound_inputs
    }

    pub fn get_action(&self, action_id: &str) -> Option<&Action> {
        self.actions.get(action_id)
    }

    /// Iterate actions in insertion order. The order is not a contract.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    /// Receiver of fired actions for this map.
    pub fn set_action_listener(&mut self, listener: Arc<dyn ActionListener>) {
        self.listener = Some(listener);
    }

    pub fn clear_action_listener(&mut self) {
        self.listener = None;
    }

    pub fn action_listener(&self) -> Option<&Arc<dyn ActionListener>> {
        self.listener.as_ref()
    }

    pub fn add_map_listener(&mut self, listener: Arc<dyn ActionListener>) {
        if !self.map_listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            self.map_listeners.push(listener);
        }
    }

    pub fn remove_map_listener(&mut self, listener: &Arc<dyn ActionListener>) {
        self.map_listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Create an empty action; fails if the id already exists.
    pub fn create_action(&mut self, action_id: &str, log: &Arc<dyn InputLog>) -> bool {
        if self.actions.contains_key(action_id) {
            log.warn(&format!(
                "ActionMap::create_action: unable to create action, {action_id} already exists"
            ));
            return false;
        }
        self.actions
            .insert(intern(action_id), Action::new(action_id));
        true
    }

    /// Enabling is a plain flag flip; disabling first releases every action
    /// that is currently pressed or mid-analog so nothing sticks.
    pub fn enable(&mut self, enable: bool) {
        if enable == self.enabled {
            return;
        }
        if !enable {
            let ActionMap {
                actions,
                listener,
                map_listeners,
                ..
            } = self;
            for action in actions.values_mut() {
                release_action_if_active(action, listener.as_ref(), map_listeners);
            }
        }
        self.enabled = enable;
    }

    /// Synthesize a release for one action if any of its inputs is active.
    pub fn release_action_if_active(&mut self, action_id: &str) {
        let ActionMap {
            actions,
            listener,
            map_listeners,
            ..
        } = self;
        if let Some(action) = actions.get_mut(action_id) {
            release_action_if_active(action, listener.as_ref(), map_listeners);
        }
    }

    pub(crate) fn release_all_actions_if_active(&mut self) {
        let ActionMap {
            actions,
            listener,
            map_listeners,
            ..
        } = self;
        for action in actions.values_mut() {
            release_action_if_active(action, listener.as_ref(), map_listeners);
        }
    }

    /// Release every currently-active input whose action is filtered. Fires
    /// per input, to the entity listener plus the global and map listeners;
    /// without an entity listener nothing is released.
    pub(crate) fn release_filtered_actions(
        &mut self,
        is_filtered: &dyn Fn(&ActionId) -> bool,
        global_listeners: &[Arc<dyn ActionListener>],
    ) {
        let Some(entity) = self.listener.clone() else {
            return;
        };

        for (action_id, action) in self.actions.iter_mut() {
            for input in action.inputs.iter_mut() {
                let pressed_or_down = matches!(
                    input.current_state,
                    InputState::Pressed | InputState::Down
                );
                let changed = input.current_state == InputState::Changed;
                if (!pressed_or_down && !changed) || !is_filtered(action_id) {
                    continue;
                }

                input.current_hold_fraction = 0.0;

                let mode = if input.activation.on_release {
                    InputState::Released
                } else {
                    InputState::Unknown
                };
                if mode == InputState::Released || changed {
                    entity.on_action(action_id, mode, 0.0);
                    for l in global_listeners {
                        l.on_action(action_id, mode, 0.0);
                    }
                    for l in &self.map_listeners {
                        l.on_action(action_id, mode, 0.0);
                    }
                }
            }
        }
    }

    /// Per-frame hook: the map's listeners are told a processed frame ended.
    pub(crate) fn input_processed(&self) {
        if let Some(entity) = &self.listener {
            entity.after_action();
        }
        for l in &self.map_listeners {
            l.after_action();
        }
    }

    pub(crate) fn notify_map_listeners(&self, action_id: &ActionId, mode: InputState, value: f32) {
        for l in &self.map_listeners {
            l.on_action(action_id, mode, value);
        }
    }

    // ---- binding CRUD (dispatch index kept in sync through `registry`) ----

    /// Add a binding and register it for dispatch; creates the action when
    /// absent. Either fully completes or leaves action and index untouched.
    pub(crate) fn add_action_input(
        &mut self,
        registry: &mut BindRegistry,
        action_id: &str,
        input: ActionInput,
        by_device_index: Option<usize>,
        log: &Arc<dyn InputLog>,
    ) -> bool {
        let mut input = input;
        input.input = intern_token(input.input.as_ref());
        input.default_input = intern_token(input.default_input.as_ref());

        let id = intern(action_id);
        let action = self
            .actions
            .entry(Arc::clone(&id))
            .or_insert_with(|| Action::new(action_id));

        let token = Arc::clone(&input.input);
        match action.insert_input(input, by_device_index) {
            Ok(_) => {}
            Err(InsertInputError::EmptyToken) => {
                log.warn("ActionMap::add_action_input: can't add empty input");
                return false;
            }
            Err(InsertInputError::DuplicateToken) => {
                log.warn(&format!(
                    "ActionMap::add_action_input: unable to add input {token}, already exists on {action_id}"
                ));
                return false;
            }
            Err(InsertInputError::BadDeviceIndex(ix)) => {
                log.warn(&format!(
                    "ActionMap::add_action_input: failed adding input {token}, device index {ix} is incorrect"
                ));
                return false;
            }
        }

        let bind = BindRef {
            map: Arc::clone(&self.name),
            action: id,
            input: Arc::clone(&token),
        };
        if !registry.add_bind(bind) {
            // roll the insertion back so the operation is all-or-nothing
            action.remove_input(token.as_ref());
            log.warn(&format!(
                "ActionMap::add_action_input: failed binding input {token} for {action_id}"
            ));
            return false;
        }
        true
    }

    /// Remove an action and every dispatch/refire entry referencing it.
    pub(crate) fn remove_action(
        &mut self,
        registry: &mut BindRegistry,
        action_id: &str,
        log: &Arc<dyn InputLog>,
    ) -> bool {
        let Some(action) = self.actions.get(action_id) else {
            log.warn(&format!(
                "ActionMap::remove_action: failed to find action: {action_id}"
            ));
            return false;
        };

        registry.remove_action(&self.name, &action.id);
        let rebound = action.inputs.iter().filter(|i| i.is_rebound()).count() as i32;
        self.num_rebound_inputs -= rebound;
        self.actions.shift_remove(action_id);
        true
    }

    /// Remove one binding of an action (and its dispatch entry).
    pub(crate) fn remove_action_input(
        &mut self,
        registry: &mut BindRegistry,
        action_id: &str,
        token: &str,
        log: &Arc<dyn InputLog>,
    ) -> bool {
        let Some(action) = self.actions.get_mut(action_id) else {
            log.warn(&format!(
                "ActionMap::remove_action_input: failed to find action: {action_id}"
            ));
            return false;
        };
        let token = intern_token(token);
        let Some(ix) = action.find_input_index(token.as_ref()) else {
            log.warn(&format!(
                "ActionMap::remove_action_input: failed to find action input for input: {token}"
            ));
            return false;
        };

        let bind = BindRef {
            map: Arc::clone(&self.name),
            action: Arc::clone(&action.id),
            input: Arc::clone(&action.inputs[ix].input),
        };
        if !registry.remove_bind(&bind) {
            log.warn(&format!(
                "ActionMap::remove_action_input: failed to remove binding for input: {token}"
            ));
            return false;
        }
        action.inputs.remove(ix);
        true
    }

    /// Rebind by current token. An empty `new_token` clears the binding.
    pub(crate) fn rebind_action_input(
        &mut self,
        registry: &mut BindRegistry,
        action_id: &str,
        current_token: &str,
        new_token: &str,
        log: &Arc<dyn InputLog>,
    ) -> bool {
        let current = intern_token(current_token);
        let Some(action) = self.actions.get(action_id) else {
            log.warn(&format!(
                "ActionMap::rebind_action_input: unable to rebind action {action_id}, doesn't exist"
            ));
            return false;
        };
        let Some(ix) = action.find_input_index(current.as_ref()) else {
            log.warn(&format!(
                "ActionMap::rebind_action_input: can't find input {current} for action {action_id}"
            ));
            return false;
        };
        self.rebind_input_at(registry, action_id, ix, new_token, log)
    }

    /// Rebind the `index`-th binding of `device` for an action.
    pub(crate) fn rebind_action_input_by_device(
        &mut self,
        registry: &mut BindRegistry,
        action_id: &str,
        new_token: &str,
        device: InputDevice,
        index: usize,
        log: &Arc<dyn InputLog>,
    ) -> bool {
        let Some(action) = self.actions.get(action_id) else {
            log.warn(&format!(
                "ActionMap::rebind_action_input: can't find action: {action_id}"
            ));
            return false;
        };
        let Some(ix) = action.input_index_by_device(device, index) else {
            log.warn(&format!(
                "ActionMap::rebind_action_input: can't get input by index {index} for action {action_id}"
            ));
            return false;
        };
        self.rebind_input_at(registry, action_id, ix, new_token, log)
    }

    fn rebind_input_at(
        &mut self,
        registry: &mut BindRegistry,
        action_id: &str,
        input_ix: usize,
        new_token: &str,
        log: &Arc<dyn InputLog>,
    ) -> bool {
        let new_token = intern_token(new_token);
        let Some(action) = self.actions.get_mut(action_id) else {
            return false;
        };

        let old_token = Arc::clone(&action.inputs[input_ix].input);
        if old_token == new_token {
            // rebinding to the same input
            return false;
        }

        let old_bind = BindRef {
            map: Arc::clone(&self.name),
            action: Arc::clone(&action.id),
            input: Arc::clone(&old_token),
        };
        // might not be bound if previously cleared
        if registry.has_bind(&old_bind) && !registry.remove_bind(&old_bind) {
            log.warn(&format!(
                "ActionMap::rebind_action_input: failed removing bind for input {old_token} for action {action_id}"
            ));
            return false;
        }

        let input = &mut action.inputs[input_ix];
        let was_default = !input.is_rebound();
        input.input = Arc::clone(&new_token);

        if !new_token.is_empty() {
            let new_bind = BindRef {
                map: Arc::clone(&self.name),
                action: Arc::clone(&action.id),
                input: Arc::clone(&new_token),
            };
            if !registry.add_bind(new_bind) {
                log.warn(&format!(
                    "ActionMap::rebind_action_input: failed adding bind for input {new_token} for action {action_id}"
                ));
                return false;
            }
        }

        // the counters move only on bound!=default transitions
        let is_default = !action.inputs[input_ix].is_rebound();
        if was_default && !is_default {
            action.num_rebound_inputs += 1;
            self.num_rebound_inputs += 1;
        } else if !was_default && is_default {
            action.num_rebound_inputs -= 1;
            self.num_rebound_inputs -= 1;
        }

        true
    }

    /// Re-bind every non-default input back to its default and re-enable the
    /// map. Stops at the first failure.
    pub(crate) fn reset(&mut self, registry: &mut BindRegistry, log: &Arc<dyn InputLog>) -> bool {
        self.enabled = true;

        let mut pending: Vec<(Arc<str>, Arc<str>, Arc<str>)> = Vec::new();
        for action in self.actions.values() {
            for input in &action.inputs {
                if input.is_rebound() {
                    pending.push((
                        Arc::clone(&action.id),
                        Arc::clone(&input.input),
                        Arc::clone(&input.default_input),
                    ));
                }
            }
        }

        for (action_id, current, default) in pending {
            if !self.rebind_action_input(registry, &action_id, &current, &default, log) {
                log.warn(&format!(
                    "ActionMap::reset: failed resetting binding to default input in action: {action_id}"
                ));
                return false;
            }
        }
        true
    }

    // ---- trigger evaluation ----

    /// Decide whether this raw event is the instant the given binding fires,
    /// updating the binding's transient state and emitting deferred refire
    /// requests. The core trigger state machine of the subsystem.
    pub(crate) fn can_process_input(
        &mut self,
        event: &InputEvent,
        action_id: &str,
        token: &str,
        ctx: &TriggerContext,
        requests: &mut Vec<RefireRequest>,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(action) = self.actions.get_mut(action_id) else {
            return false;
        };
        let Some(ix) = action.find_input_index(token) else {
            return false;
        };
        evaluate_input(&mut action.inputs[ix], event, ctx, requests)
    }

    /// Install a fully built action (snapshot import path), fixing up the
    /// rebound-input bookkeeping.
    pub(crate) fn insert_action(&mut self, mut action: Action) {
        action.recount_rebound_inputs();
        self.num_rebound_inputs += action.num_rebound_inputs();
        self.actions.insert(Arc::clone(&action.id), action);
    }

    pub(crate) fn input_mut(&mut self, action_id: &str, token: &str) -> Option<&mut ActionInput> {
        let action = self.actions.get_mut(action_id)?;
        let ix = action.find_input_index(token)?;
        Some(&mut action.inputs[ix])
    }

    pub(crate) fn input_ref(&self, action_id: &str, token: &str) -> Option<&ActionInput> {
        self.actions.get(action_id)?.find_input(token)
    }
}

/// Release/always synthesis for one action: at most one release and one
/// always notification, no matter how many inputs are active.
fn release_action_if_active(
    action: &mut Action,
    entity: Option<&Arc<dyn ActionListener>>,
    map_listeners: &[Arc<dyn ActionListener>],
) {
    let mut fire_release = false;
    let mut fire_always = false;

    for input in action.inputs.iter_mut() {
        let pressed_or_down = matches!(
            input.current_state,
            InputState::Pressed | InputState::Down
        );
        if input.activation.on_release && pressed_or_down {
            fire_release = true;
        }
        if input.current_state == InputState::Changed {
            fire_always = true;
        }
        input.current_hold_fraction = 0.0;
    }

    if fire_release {
        if let Some(listener) = entity {
            listener.on_action(&action.id, InputState::Released, 0.0);
        }
        for l in map_listeners {
            l.on_action(&action.id, InputState::Released, 0.0);
        }
    }
    if fire_always {
        if let Some(listener) = entity {
            listener.on_action(&action.id, InputState::Changed, 0.0);
        }
        for l in map_listeners {
            l.on_action(&action.id, InputState::Changed, 0.0);
        }
    }
}

/// Trigger decision for one binding against one raw event.
fn evaluate_input(
    input: &mut ActionInput,
    event: &InputEvent,
    ctx: &TriggerContext,
    requests: &mut Vec<RefireRequest>,
) -> bool {
    let now = ctx.now;
    let fired;

    if let Some(compare) = input.analog_compare {
        // Analog inputs only ever report Changed; press/hold/release are
        // reconstructed from the compare condition plus a refire entry that
        // keeps evaluating while the condition holds.
        if compare.matches(event.value) {
            if !ctx.refiring {
                requests.push(RefireRequest::Register);
            }
            if !input.analog_condition_met {
                input.pressed_at = now;
                input.last_repeat_at = now;
                input.hold_trigger_fired = false;
                input.current_hold_fraction = 0.0;
                input.analog_condition_met = true;
            }
            fired = is_input_triggered(input, event, ctx, requests);
        } else {
            if !ctx.refiring && input.analog_condition_met {
                input.analog_condition_met = false;
                requests.push(RefireRequest::Remove);
            }
            input.current_hold_fraction = 0.0;
            fired = false;
        }
    } else if event.state == InputState::Pressed {
        input.pressed_at = now;
        if input.activation.on_hold {
            input.last_repeat_at = now;
            // an immediate hold delay would double up with the press event
            input.hold_trigger_fired = input.hold_trigger_delay <= 0.0;
            input.current_hold_fraction = 0.0;
        }
        fired = is_input_triggered(input, event, ctx, requests);
    } else {
        fired = is_input_triggered(input, event, ctx, requests);
    }

    // settle the binding's state for listeners and filter-release logic
    if !fired {
        let keep_pressed = event.state == InputState::Down
            && input.current_state == InputState::Pressed
            && input.activation.on_release;
        if !keep_pressed {
            input.current_state = InputState::Unknown;
        }
    } else if event.state == InputState::Changed {
        input.current_state = InputState::Changed;
    } else if event.state == InputState::Down {
        input.current_state = InputState::Down;
    } else if (input.activation.on_press || input.activation.on_release)
        && matches!(event.state, InputState::Pressed | InputState::Released)
    {
        input.current_state = event.state;
    }

    fired
}

fn is_input_triggered(
    input: &mut ActionInput,
    event: &InputEvent,
    ctx: &TriggerContext,
    requests: &mut Vec<RefireRequest>,
) -> bool {
    if event.modifiers.any() && input.activation.no_modifiers {
        return false;
    }

    let now = ctx.now;
    let time_pressed = now - input.pressed_at;
    let just_pressed = time_pressed.abs() < f32::EPSILON;

    let mut state_matches = input.activation.matches_state(event.state);
    if event.state == InputState::Down && input.activation.on_hold {
        if just_pressed {
            // the press event was handled this same instant; skip the hold tick
            return false;
        }
        state_matches = true;
    } else if event.state == InputState::Changed {
        if just_pressed && !input.activation.on_press {
            // analog press, but the binding doesn't handle presses
            return false;
        }
        state_matches = true;
    } else if event.state == InputState::Released {
        input.current_hold_fraction = 0.0;
        if let Some(threshold) = input.release_trigger_threshold {
            if time_pressed >= threshold {
                return false;
            }
        }
    }

    if !state_matches {
        return false;
    }

    let analog_held = event.state == InputState::Changed && !just_pressed;
    if input.activation.on_hold && (event.state == InputState::Down || analog_held) {
        // initial hold delay, then the repeat gate
        if input.hold_trigger_fired {
            if let Some(repeat) = input.hold_repeat_delay {
                if now - input.last_repeat_at >= repeat {
                    input.last_repeat_at = now;
                    return true;
                }
            }
            return false;
        }

        let wants_repeat_override = ctx.repeated_hold_fired
            && ctx.is_current_key
            && input.hold_trigger_delay_repeat_override.is_some();
        if wants_repeat_override {
            if let Some(override_delay) = input.hold_trigger_delay_repeat_override {
                if time_pressed >= override_delay {
                    input.hold_trigger_fired = true;
                    input.current_hold_fraction = 1.0;
                    input.last_repeat_at = now;
                    return true;
                }
            }
            return false;
        }

        if time_pressed >= input.hold_trigger_delay {
            input.hold_trigger_fired = true;
            input.current_hold_fraction = 1.0;
            input.last_repeat_at = now;
            if ctx.input_repeated && ctx.is_current_key {
                requests.push(RefireRequest::RepeatedHoldTriggerFired);
            }
            return true;
        }

        input.current_hold_fraction = if input.hold_trigger_delay > 0.0 {
            time_pressed / input.hold_trigger_delay
        } else {
            0.0
        };
        return false;
    }

    if event.state == InputState::Pressed
        && input.press_trigger_delay >= f32::EPSILON
        && !ctx.refiring
    {
        // delayed press: schedule a refire instead of firing now, unless the
        // repeated-key override applies
        if ctx.input_repeated
            && ctx.is_current_key
            && input.press_trigger_delay_repeat_override.is_some()
        {
            requests.push(RefireRequest::Remove);
            return true;
        }
        if input.press_delay_priority >= ctx.highest_pending_press_priority {
            requests.push(RefireRequest::RemoveAllDelayedPress);
            requests.push(RefireRequest::Register);
        }
        return false;
    }

    if event.state == InputState::Released
        && input.press_trigger_delay >= f32::EPSILON
        && !ctx.refiring
    {
        if time_pressed - input.press_trigger_delay < f32::EPSILON {
            // the delayed press hasn't fired yet; the release follows it
            requests.push(RefireRequest::MarkNeedsRelease);
            return false;
        }
        return true;
    }

    true
}
