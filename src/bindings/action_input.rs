//! One binding of a physical input token to an action, with its trigger
//! timing configuration and the transient state the trigger evaluation
//! tracks between events.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::bindings::activation::{ActivationModes, AnalogCompare, StateMask};
use crate::input::device::InputDevice;
use crate::input::event::InputState;
use crate::str_intern::intern_token;

/// Input-blocking side effect carried by a binding. When the binding fires in
/// a phase the mask selects, the listed tokens are suppressed for `duration`
/// seconds (or every active block is lifted, for `ClearAll`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum InputBlock {
    #[default]
    None,
    ClearAll,
    Block {
        inputs: Vec<Arc<str>>,
        duration: f32,
        activation: StateMask,
        /// When `Some`, only that device index is blocked.
        device_index: Option<u8>,
    },
}

impl InputBlock {
    pub fn is_none(&self) -> bool {
        matches!(self, InputBlock::None)
    }
}

/// One binding. Configuration fields persist; the trailing `#[serde(skip)]`
/// fields are trigger state owned by the dispatch loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInput {
    /// Currently bound token, lower-cased. Empty means explicitly unbound.
    pub input: Arc<str>,
    /// Token restored by `Reset`; rebind bookkeeping compares against this.
    pub default_input: Arc<str>,
    pub device: InputDevice,
    pub activation: ActivationModes,

    /// Seconds a press is withheld before firing; 0 fires immediately.
    pub press_trigger_delay: f32,
    /// When the same physical key repeats, fire the delayed press immediately
    /// once held this long. `None` disables the override.
    pub press_trigger_delay_repeat_override: Option<f32>,
    /// A newly delayed press with priority >= every pending one cancels them.
    pub press_delay_priority: i32,

    /// Seconds a hold must last before the first hold fire; 0 is immediate.
    pub hold_trigger_delay: f32,
    /// Repeated-key override for the initial hold delay. `None` disables.
    pub hold_trigger_delay_repeat_override: Option<f32>,
    /// Cadence of hold fires after the first. `Some(0.0)` refires every held
    /// tick, `None` fires once and never repeats.
    pub hold_repeat_delay: Option<f32>,
    /// Releases later than this many seconds after the press are swallowed.
    /// `None` disables the cutoff.
    pub release_trigger_threshold: Option<f32>,

    /// When set, the binding fires on a value comparison instead of discrete
    /// press/release transitions.
    pub analog_compare: Option<AnalogCompare>,

    #[serde(default, skip_serializing_if = "InputBlock::is_none")]
    pub block: InputBlock,

    // -- transient trigger state, never persisted --
    #[serde(skip)]
    pub(crate) current_state: InputState,
    #[serde(skip)]
    pub(crate) pressed_at: f32,
    #[serde(skip)]
    pub(crate) last_repeat_at: f32,
    #[serde(skip)]
    pub(crate) hold_trigger_fired: bool,
    #[serde(skip)]
    pub(crate) current_hold_fraction: f32,
    #[serde(skip)]
    pub(crate) analog_condition_met: bool,
}

impl Default for ActionInput {
    /// Unbound input with the engine's stock timing: immediate press,
    /// immediate hold, repeat every held tick, no overrides, no cutoff.
    fn default() -> Self {
        ActionInput {
            input: Arc::from(""),
            default_input: Arc::from(""),
            device: InputDevice::Unknown,
            activation: ActivationModes::default(),
            press_trigger_delay: 0.0,
            press_trigger_delay_repeat_override: None,
            press_delay_priority: 0,
            hold_trigger_delay: 0.0,
            hold_trigger_delay_repeat_override: None,
            hold_repeat_delay: Some(0.0),
            release_trigger_threshold: None,
            analog_compare: None,
            block: InputBlock::None,
            current_state: InputState::Unknown,
            pressed_at: 0.0,
            last_repeat_at: 0.0,
            hold_trigger_fired: false,
            current_hold_fraction: 0.0,
            analog_condition_met: false,
        }
    }
}

impl ActionInput {
    /// Binding for `token` on `device`, firing on press, no timing tricks.
    pub fn new(token: &str, device: InputDevice) -> Self {
        let token = intern_token(token);
        ActionInput {
            input: Arc::clone(&token),
            default_input: token,
            device,
            activation: ActivationModes::press(),
            ..Default::default()
        }
    }

    pub fn with_activation(mut self, activation: ActivationModes) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_analog_compare(mut self, compare: AnalogCompare) -> Self {
        self.analog_compare = Some(compare);
        self
    }

    pub fn with_block(mut self, block: InputBlock) -> Self {
        self.block = block;
        self
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        !self.input.is_empty()
    }

    #[inline]
    pub fn is_rebound(&self) -> bool {
        self.input != self.default_input
    }

    /// State the binding last settled in; what listeners receive as the
    /// activation mode when it fires.
    #[inline]
    pub fn current_state(&self) -> InputState {
        self.current_state
    }

    /// Hold progress in [0, 1] while waiting for the hold delay, for UI
    /// charge bars. 1.0 once the hold has fired.
    #[inline]
    pub fn hold_fraction(&self) -> f32 {
        self.current_hold_fraction
    }

    /// Forget everything the dispatch loop learned about this binding.
    pub(crate) fn reset_transient_state(&mut self) {
        self.current_state = InputState::Unknown;
        self.pressed_at = 0.0;
        self.last_repeat_at = 0.0;
        self.hold_trigger_fired = false;
        self.current_hold_fraction = 0.0;
        self.analog_condition_met = false;
    }
}
