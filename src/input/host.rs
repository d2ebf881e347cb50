//! Host seam for everything the dispatcher asks of the surrounding engine.
//!
//! The manager never reaches for globals: console state, pause state, input
//! blocking and console command execution all go through an injected
//! `Arc<dyn InputHost>`. Every method has a no-op/false default so embedders
//! implement only what they have.

use std::sync::Arc;

use crate::input::event::InputEvent;

/// A request to suppress a physical input for a while, emitted when a fired
/// binding carries an input-blocking descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRequest {
    /// Token of the input to suppress.
    pub token: Arc<str>,
    /// Seconds the block should last.
    pub duration: f32,
    /// When `Some`, only that device index is affected.
    pub device_index: Option<u8>,
}

pub trait InputHost: Send + Sync {
    /// Console/terminal captures the keyboard; gamepad events still pass.
    fn is_console_open(&self) -> bool {
        false
    }

    /// Non-interactive editor mode; all dispatch is suspended.
    fn is_editing(&self) -> bool {
        false
    }

    /// Selects the UI timer instead of the game timer for elapsed-time math.
    fn is_paused(&self) -> bool {
        false
    }

    /// True while the input layer re-sends held keys after a focus change.
    /// Bindings without the retriggerable flag are skipped during such a pass.
    fn is_retriggering(&self) -> bool {
        false
    }

    /// Asked before applying block side effects for a refired event, so an
    /// already-blocked input doesn't re-arm its own block.
    fn should_block_refire(&self, event: &InputEvent) -> bool {
        let _ = event;
        false
    }

    fn block_input(&self, request: &BlockRequest) {
        let _ = request;
    }

    fn clear_blocked_inputs(&self) {}

    /// Drop transient key-down state; called when a filter is disabled so
    /// held inputs don't come back stale.
    fn clear_key_state(&self) {}

    /// Execute a console-command action. The action id is the command line.
    fn run_console_command(&self, command: &str) {
        let _ = command;
    }
}

/// Host that has no console, no editor, no blocking layer.
pub struct NullHost;
impl InputHost for NullHost {}
