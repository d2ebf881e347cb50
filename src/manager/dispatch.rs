//! Per-event dispatch: gating, repeated-key tracking, priority-list
//! construction and the accepted-event fan-out.

use std::sync::Arc;

use crate::bindings::action_input::InputBlock;
use crate::bindings::trigger::{RefireRequest, TriggerContext};
use crate::input::device::InputDevice;
use crate::input::event::{InputEvent, InputState, KeyId};
use crate::input::host::BlockRequest;
use crate::manager::ActionMapManager;
use crate::manager::registry::BindRef;

/// Snapshot of the binding fields the fan-out needs after trigger
/// evaluation settled the binding's state.
struct DispatchView {
    state: InputState,
    retriggerable: bool,
    console_cmd: bool,
    block: InputBlock,
    analog_condition_met: bool,
    pressed_at: f32,
}

impl ActionMapManager {
    /// Feed one raw input event through the dispatcher.
    ///
    /// Returns `true` only when a console-command binding consumed the event;
    /// ordinary action notifications leave it `false` so the host can keep
    /// routing the event elsewhere.
    pub fn on_input_event(&mut self, event: &InputEvent) -> bool {
        if !self.enabled {
            return false;
        }
        // no actions while the console captures input (gamepads still pass)
        if self.host.is_console_open() && event.device != InputDevice::Gamepad {
            return false;
        }
        if self.host.is_editing() {
            return false;
        }
        if event.key_name.is_empty() {
            return false;
        }
        // alt+enter toggles display mode at the host, never an action
        if event.modifiers.alt && event.key_name.as_ref() == "enter" {
            return false;
        }

        if event.key_id != KeyId::UNKNOWN {
            if self.current_key != event.key_id {
                self.current_key = event.key_id;
                self.incoming_input_repeated = false;
                self.repeated_input_hold_fired = false;
            } else {
                self.incoming_input_repeated = true;
            }
        }

        let accepted = self.create_event_priority_list(event);
        if accepted.is_empty() {
            false
        } else {
            self.handle_accepted_events(event, &accepted)
        }
    }

    /// Walk every binding registered under the event's token and collect, in
    /// index order, the ones whose action is unfiltered and whose trigger
    /// conditions are met right now.
    pub(crate) fn create_event_priority_list(&mut self, event: &InputEvent) -> Vec<BindRef> {
        let token = event.token();
        let binds: Vec<BindRef> = self.registry.binds_for(&token).to_vec();

        let mut accepted = Vec::new();
        for bind in binds {
            if self.action_filtered(&bind.action) {
                continue;
            }
            let ctx = self.trigger_context(false, event);
            let mut requests = Vec::new();
            let fired = match self.maps.get_mut(&bind.map) {
                Some(map) => {
                    map.can_process_input(event, &bind.action, &bind.input, &ctx, &mut requests)
                }
                None => continue,
            };
            self.apply_refire_requests(&bind, event, &requests);
            if fired {
                accepted.push(bind);
            }
        }
        accepted
    }

    pub(crate) fn trigger_context(&self, refiring: bool, event: &InputEvent) -> TriggerContext {
        TriggerContext {
            now: self.current_time(),
            refiring,
            input_repeated: self.incoming_input_repeated,
            is_current_key: self.current_key == event.key_id,
            repeated_hold_fired: self.repeated_input_hold_fired,
            highest_pending_press_priority: self.highest_pending_press_priority(),
        }
    }

    /// Apply the deferred mutations one binding's trigger evaluation emitted,
    /// in emission order.
    pub(crate) fn apply_refire_requests(
        &mut self,
        bind: &BindRef,
        event: &InputEvent,
        requests: &[RefireRequest],
    ) {
        for request in requests {
            match request {
                RefireRequest::Register => self.registry.update_refire(bind, event),
                RefireRequest::Remove => {
                    self.registry.remove_refire(bind);
                }
                RefireRequest::RemoveAllDelayedPress => self.registry.remove_all_delayed_press(),
                RefireRequest::MarkNeedsRelease => {
                    self.registry.set_needs_release(bind, true);
                }
                RefireRequest::RepeatedHoldTriggerFired => {
                    self.repeated_input_hold_fired = true;
                }
            }
        }
    }

    /// Fan an accepted priority list out to listeners, in list order.
    ///
    /// Returns `true` when a console-command binding pre-empted the rest of
    /// the list for this event.
    pub(crate) fn handle_accepted_events(&self, event: &InputEvent, accepted: &[BindRef]) -> bool {
        let now = self.current_time();

        for bind in accepted {
            let Some(map) = self.maps.get(&bind.map) else {
                continue;
            };
            if !map.enabled() {
                continue;
            }
            let Some(view) = self.dispatch_view(bind) else {
                continue;
            };

            // inputs without the retriggerable flag sit out retrigger passes
            if self.host.is_retriggering() && !view.retriggerable {
                continue;
            }

            // the binding will fire below; apply its blocking side effects
            self.handle_input_blocking(event, &view, now);

            // console-command bindings pre-empt the rest of the list
            if view.console_cmd {
                self.host.run_console_command(bind.action.as_ref());
                for l in &self.global_listeners {
                    l.on_action(&bind.action, view.state, event.value);
                }
                return true;
            }

            // blocking listeners get first refusal, then the normal fan-out
            if self.process_blocking_listeners(bind, view.state, event) {
                continue;
            }

            for l in &self.global_listeners {
                l.on_action(&bind.action, view.state, event.value);
            }
            map.notify_map_listeners(&bind.action, view.state, event.value);
            if let Some(entity) = map.action_listener() {
                entity.on_action(&bind.action, view.state, event.value);
            }
        }

        false
    }

    fn process_blocking_listeners(
        &self,
        bind: &BindRef,
        state: InputState,
        event: &InputEvent,
    ) -> bool {
        for l in &self.blocking_listeners {
            if l.on_action(&bind.action, state, event.value, event) {
                return true;
            }
        }
        false
    }

    fn dispatch_view(&self, bind: &BindRef) -> Option<DispatchView> {
        let map = self.maps.get(&bind.map)?;
        let input = map.input_ref(&bind.action, &bind.input)?;
        Some(DispatchView {
            state: input.current_state(),
            retriggerable: input.activation.retriggerable,
            console_cmd: input.activation.console_cmd,
            block: input.block.clone(),
            analog_condition_met: input.analog_condition_met,
            pressed_at: input.pressed_at,
        })
    }

    /// Blocking side effects of a binding about to fire: translate the event
    /// into a press/hold/release phase and, if the descriptor's mask matches,
    /// hand the host a block (or clear-all) request.
    fn handle_input_blocking(&self, event: &InputEvent, view: &DispatchView, now: f32) {
        // refired events reach here even when the input is already blocked
        if self.refiring && self.host.should_block_refire(event) {
            return;
        }

        let (inputs, duration, activation, device_index) = match &view.block {
            InputBlock::None => return,
            InputBlock::ClearAll => {
                // the clear-all marker ignores phase masks entirely
                self.host.clear_blocked_inputs();
                return;
            }
            InputBlock::Block {
                inputs,
                duration,
                activation,
                device_index,
            } => (inputs, *duration, *activation, *device_index),
        };

        // analog events carry no press/release state; reconstruct the phase
        // from the compare condition and the time since it became true
        let compare_state = if event.state == InputState::Changed {
            if view.analog_condition_met {
                if now - view.pressed_at >= f32::EPSILON {
                    InputState::Down
                } else {
                    InputState::Pressed
                }
            } else {
                InputState::Released
            }
        } else {
            event.state
        };

        if activation.matches(compare_state) {
            for token in inputs {
                self.host.block_input(&BlockRequest {
                    token: Arc::clone(token),
                    duration,
                    device_index,
                });
            }
        }
    }
}
