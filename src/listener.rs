//! Listener seams for fired actions.

use crate::ActionId;
use crate::input::event::{InputEvent, InputState};

/// Receiver of action notifications. `mode` is the input state the binding
/// settled in when it fired (Pressed/Down/Released/Changed).
pub trait ActionListener: Send + Sync {
    fn on_action(&self, action_id: &ActionId, mode: InputState, value: f32);

    /// Called once per processed frame for every enabled map the listener is
    /// attached to.
    fn after_action(&self) {}
}

/// Listener consulted before the normal fan-out. Returning `true` claims the
/// action: no other listener hears it for that binding.
pub trait BlockingActionListener: Send + Sync {
    fn on_action(
        &self,
        action_id: &ActionId,
        mode: InputState,
        value: f32,
        event: &InputEvent,
    ) -> bool;
}
