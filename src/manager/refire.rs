//! Per-frame work: replaying the refire table so delayed presses mature and
//! held analog conditions keep notifying without new hardware events.

use crate::input::event::{InputEvent, InputState};
use crate::manager::ActionMapManager;
use crate::manager::registry::BindRef;

impl ActionMapManager {
    /// Advance the dispatcher one frame: evaluate pending refires, then give
    /// every enabled map its end-of-frame notification.
    pub fn update(&mut self) {
        if !self.enabled {
            return;
        }

        self.update_refiring_inputs();

        for map in self.maps.values() {
            if map.enabled() {
                map.input_processed();
            }
        }
    }

    /// One full priority-list-and-dispatch pass per pending refire entry.
    ///
    /// Mutation discipline: while the pass runs, removals are collected into
    /// side lists (`remove_list`, the deferred remove-all flag) and applied
    /// only after the iteration completes. Synthetic releases owed by matured
    /// delayed presses are batched and fired strictly after every press in
    /// the pass.
    fn update_refiring_inputs(&mut self) {
        // same gates as hardware events
        if self.host.is_console_open() {
            return;
        }
        if self.host.is_editing() {
            return;
        }

        self.refiring = true;

        let mut remove_list: Vec<BindRef> = Vec::new();
        let mut release_batches: Vec<(InputEvent, Vec<BindRef>)> = Vec::new();

        for token in self.registry.refire_tokens() {
            let Some((event, binds)) = self.registry.take_refire_pass(&token) else {
                continue;
            };
            let now = self.current_time();

            let mut accepted: Vec<BindRef> = Vec::new();
            let mut needs_release_list: Vec<BindRef> = Vec::new();

            for (bind, ignored, needs_release) in binds {
                if ignored {
                    // a hardware event just touched this entry; skip one pass
                    continue;
                }

                // a delayed press fires once when it reaches its delay, then
                // leaves the table
                if event.state == InputState::Pressed {
                    let Some((pressed_at, press_delay)) = self.press_info(&bind) else {
                        continue;
                    };
                    if press_delay >= f32::EPSILON {
                        if now - pressed_at >= press_delay {
                            remove_list.push(bind.clone());
                            if needs_release {
                                needs_release_list.push(bind.clone());
                            }
                        } else {
                            continue;
                        }
                    }
                }

                if self.action_filtered(&bind.action) {
                    continue;
                }
                let ctx = self.trigger_context(true, &event);
                let mut requests = Vec::new();
                let fired = match self.maps.get_mut(&bind.map) {
                    Some(map) => {
                        map.can_process_input(&event, &bind.action, &bind.input, &ctx, &mut requests)
                    }
                    None => continue,
                };
                self.apply_refire_requests(&bind, &event, &requests);
                if fired {
                    accepted.push(bind);
                }
            }

            if !accepted.is_empty() {
                self.handle_accepted_events(&event, &accepted);

                if self.deferred_remove_all_refires {
                    // a filter was disabled mid-pass and wants the table gone
                    self.deferred_remove_all_refires = false;
                    self.refiring = false;
                    self.registry.clear_refires();
                    return;
                }
            }

            if !needs_release_list.is_empty() {
                // these were approved when the press was accepted; flip the
                // stored states by hand so the action fires as a release
                let mut release_event = event.clone();
                release_event.state = InputState::Released;
                for bind in &needs_release_list {
                    self.set_input_state(bind, InputState::Released);
                }
                release_batches.push((release_event, needs_release_list));
            }
        }

        // releases owed by delayed presses fire after every press in the pass
        for (event, binds) in &release_batches {
            self.handle_accepted_events(event, binds);
        }

        self.refiring = false;

        // safe to mutate the table now
        for bind in &remove_list {
            self.registry.remove_refire(bind);
        }
    }

    fn press_info(&self, bind: &BindRef) -> Option<(f32, f32)> {
        let map = self.maps.get(&bind.map)?;
        let input = map.input_ref(&bind.action, &bind.input)?;
        Some((input.pressed_at, input.press_trigger_delay))
    }

    fn set_input_state(&mut self, bind: &BindRef, state: InputState) {
        if let Some(map) = self.maps.get_mut(&bind.map) {
            if let Some(input) = map.input_mut(&bind.action, &bind.input) {
                input.current_state = state;
            }
        }
    }
}
