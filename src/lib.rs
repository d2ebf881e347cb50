//! Action map / input dispatch runtime.
//!
//! This crate is engine-agnostic and host-agnostic. It exposes:
//! - `bindings`: the data model: action maps, actions, per-input trigger rules.
//! - `manager`: the dispatcher: priority lists, listener fan-out, refire queue.
//! - `filter`: named allow/deny overlays that mute action subsets.
//! - `profile`: XML profile / rebind documents and a JSON snapshot of the graph.
//! - `input`: raw event types plus the host seams (clock, console, blocking).
//! - `log::InputLog`: thin logging trait the host (game/CLI) can implement.
//!
//! Import the `prelude` if you want the most common types in scope.

pub mod log;

pub mod bindings {
    pub mod action;
    pub mod action_input;
    pub mod action_map;
    pub mod activation;
    pub(crate) mod trigger;
}
pub mod filter;
pub mod input {
    pub mod clock;
    pub mod device;
    pub mod event;
    pub mod host;
}
pub mod listener;
pub mod manager {
    mod core;
    mod dispatch;
    mod refire;
    pub(crate) mod registry;

    pub use self::core::ActionMapManager;
}
pub mod profile {
    pub mod paths;
    pub mod snapshot;
    pub mod xml_read;
    pub mod xml_write;
}

// Internal helpers (available within the crate)
pub(crate) mod str_intern;

use std::sync::Arc;

/// Interned identifier of a logical action ("jump", "move_forward", ...).
pub type ActionId = Arc<str>;

pub mod prelude {
    pub use crate::ActionId;
    pub use crate::log::{InputLog, NoopLog, StderrLog};

    // Bindings graph
    pub use crate::bindings::action::Action;
    pub use crate::bindings::action_input::{ActionInput, InputBlock};
    pub use crate::bindings::action_map::ActionMap;
    pub use crate::bindings::activation::{ActivationModes, AnalogCompare, CompareOp, StateMask};
    pub use crate::filter::{ActionFilter, FilterKind};

    // Dispatch
    pub use crate::listener::{ActionListener, BlockingActionListener};
    pub use crate::manager::ActionMapManager;

    // Raw input + host seams
    pub use crate::input::clock::{Clock, ManualClock, SystemClock};
    pub use crate::input::device::{DeviceMapping, InputDevice};
    pub use crate::input::event::{InputEvent, InputState, KeyId, Modifiers};
    pub use crate::input::host::{BlockRequest, InputHost, NullHost};

    // Profile I/O
    pub use crate::profile::snapshot::ProfileSnapshot;
}
