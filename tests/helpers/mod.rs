//! Shared test doubles: a recording listener, a scripted host and a
//! manager rig wired to a manual clock.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;

use actionmap_core::prelude::*;

/// Listener that records every notification it receives.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<(String, InputState, f32)>>,
    after_action_calls: Mutex<usize>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingListener::default())
    }

    pub fn events(&self) -> Vec<(String, InputState, f32)> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn count_for(&self, action: &str) -> usize {
        self.events.lock().iter().filter(|e| e.0 == action).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn after_action_calls(&self) -> usize {
        *self.after_action_calls.lock()
    }
}

impl ActionListener for RecordingListener {
    fn on_action(&self, action_id: &ActionId, mode: InputState, value: f32) {
        self.events
            .lock()
            .push((action_id.to_string(), mode, value));
    }

    fn after_action(&self) {
        *self.after_action_calls.lock() += 1;
    }
}

/// Blocking listener that claims (or passes on) everything it hears.
pub struct ClaimingListener {
    pub claim: bool,
    heard: Mutex<Vec<(String, InputState)>>,
}

impl ClaimingListener {
    pub fn new(claim: bool) -> Arc<Self> {
        Arc::new(ClaimingListener {
            claim,
            heard: Mutex::new(Vec::new()),
        })
    }

    pub fn heard(&self) -> Vec<(String, InputState)> {
        self.heard.lock().clone()
    }
}

impl BlockingActionListener for ClaimingListener {
    fn on_action(
        &self,
        action_id: &ActionId,
        mode: InputState,
        _value: f32,
        _event: &InputEvent,
    ) -> bool {
        self.heard.lock().push((action_id.to_string(), mode));
        self.claim
    }
}

/// Host double with scriptable gates and recorded side effects.
#[derive(Default)]
pub struct ScriptedHost {
    pub console_open: Mutex<bool>,
    pub editing: Mutex<bool>,
    pub paused: Mutex<bool>,
    pub retriggering: Mutex<bool>,
    block_requests: Mutex<Vec<BlockRequest>>,
    clear_block_calls: Mutex<usize>,
    key_state_clears: Mutex<usize>,
    console_commands: Mutex<Vec<String>>,
}

impl ScriptedHost {
    pub fn new() -> Arc<Self> {
        Arc::new(ScriptedHost::default())
    }

    pub fn block_requests(&self) -> Vec<BlockRequest> {
        self.block_requests.lock().clone()
    }

    pub fn clear_block_calls(&self) -> usize {
        *self.clear_block_calls.lock()
    }

    pub fn key_state_clears(&self) -> usize {
        *self.key_state_clears.lock()
    }

    pub fn console_commands(&self) -> Vec<String> {
        self.console_commands.lock().clone()
    }
}

impl InputHost for ScriptedHost {
    fn is_console_open(&self) -> bool {
        *self.console_open.lock()
    }

    fn is_editing(&self) -> bool {
        *self.editing.lock()
    }

    fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    fn is_retriggering(&self) -> bool {
        *self.retriggering.lock()
    }

    fn block_input(&self, request: &BlockRequest) {
        self.block_requests.lock().push(request.clone());
    }

    fn clear_blocked_inputs(&self) {
        *self.clear_block_calls.lock() += 1;
    }

    fn clear_key_state(&self) {
        *self.key_state_clears.lock() += 1;
    }

    fn run_console_command(&self, command: &str) {
        self.console_commands.lock().push(command.to_string());
    }
}

/// Manager wired to a manual clock, a scripted host and a recording listener
/// installed as the "player" map's entity listener.
pub struct Rig {
    pub manager: ActionMapManager,
    pub clock: Arc<ManualClock>,
    pub host: Arc<ScriptedHost>,
    pub listener: Arc<RecordingListener>,
}

impl Rig {
    /// Empty manager with a keyboard device mapping registered.
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new());
        let host = ScriptedHost::new();
        let mut manager = ActionMapManager::new(
            Arc::clone(&host) as Arc<dyn InputHost>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::new(NoopLog),
        );
        manager.add_input_device_mapping(InputDevice::Keyboard, "keyboard");
        Rig {
            manager,
            clock,
            host,
            listener: RecordingListener::new(),
        }
    }

    /// Rig with a "player" map whose entity listener records notifications.
    pub fn with_player_map() -> Self {
        let mut rig = Rig::new();
        rig.manager.create_action_map("player");
        let listener = Arc::clone(&rig.listener);
        if let Some(map) = rig.manager.action_map_mut("player") {
            map.set_action_listener(listener);
        }
        rig
    }

    /// Bind `token` to `action` in the "player" map with the given rules.
    pub fn bind(&mut self, action: &str, token: &str, activation: ActivationModes) {
        let input = ActionInput::new(token, InputDevice::Keyboard).with_activation(activation);
        assert!(self.manager.add_action_input("player", action, input, None));
    }

    pub fn press(&mut self, token: &str) -> bool {
        self.manager
            .on_input_event(&InputEvent::new(token, InputState::Pressed))
    }

    pub fn release(&mut self, token: &str) -> bool {
        self.manager
            .on_input_event(&InputEvent::new(token, InputState::Released))
    }

    pub fn hold(&mut self, token: &str) -> bool {
        self.manager
            .on_input_event(&InputEvent::new(token, InputState::Down))
    }
}
