//! Activation rules for a single binding: which input-state transitions make
//! it fire, plus the analog-compare condition that substitutes for
//! press/release on axes.

use serde::{Deserialize, Serialize};

use crate::input::event::InputState;

/// Which transitions of the bound input trigger the action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationModes {
    pub on_press: bool,
    pub on_hold: bool,
    pub on_release: bool,
    pub always: bool,
    /// The action id is executed as a console command; pre-empts every other
    /// binding matched by the same raw event.
    pub console_cmd: bool,
    /// Reject the event when any modifier key is held.
    pub no_modifiers: bool,
    /// Allow firing during an input-layer retriggering pass.
    pub retriggerable: bool,
}

impl ActivationModes {
    pub fn press() -> Self {
        ActivationModes {
            on_press: true,
            ..Default::default()
        }
    }

    pub fn press_release() -> Self {
        ActivationModes {
            on_press: true,
            on_release: true,
            ..Default::default()
        }
    }

    pub fn hold() -> Self {
        ActivationModes {
            on_hold: true,
            ..Default::default()
        }
    }

    /// Direct state/mode intersection; `Down` and `Changed` events get
    /// special-cased by the trigger logic before consulting this.
    pub fn matches_state(&self, state: InputState) -> bool {
        match state {
            InputState::Pressed => self.on_press,
            InputState::Released => self.on_release,
            InputState::Down => self.on_hold,
            InputState::Changed => self.always,
            InputState::Unknown => false,
        }
    }
}

/// Comparison operator for analog-compare bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
}

impl CompareOp {
    /// Upper-case profile attribute spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Equals => "EQUALS",
            CompareOp::NotEquals => "NOTEQUALS",
            CompareOp::GreaterThan => "GREATERTHAN",
            CompareOp::LessThan => "LESSTHAN",
        }
    }

    pub fn parse(s: &str) -> Option<CompareOp> {
        match s {
            "EQUALS" => Some(CompareOp::Equals),
            "NOTEQUALS" => Some(CompareOp::NotEquals),
            "GREATERTHAN" => Some(CompareOp::GreaterThan),
            "LESSTHAN" => Some(CompareOp::LessThan),
            _ => None,
        }
    }
}

/// Condition an analog binding must satisfy; while it holds, the binding is
/// treated as a held key and run through the same press/hold logic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalogCompare {
    pub op: CompareOp,
    pub value: f32,
}

impl AnalogCompare {
    pub fn new(op: CompareOp, value: f32) -> Self {
        AnalogCompare { op, value }
    }

    pub fn matches(&self, sample: f32) -> bool {
        match self.op {
            CompareOp::Equals => (sample - self.value).abs() < f32::EPSILON,
            CompareOp::NotEquals => (sample - self.value).abs() >= f32::EPSILON,
            CompareOp::GreaterThan => sample > self.value,
            CompareOp::LessThan => sample < self.value,
        }
    }
}

/// Which phases of the triggering binding arm its input-blocking side effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMask {
    pub pressed: bool,
    pub held: bool,
    pub released: bool,
}

impl StateMask {
    pub const ALL: StateMask = StateMask {
        pressed: true,
        held: true,
        released: true,
    };

    pub fn matches(&self, state: InputState) -> bool {
        match state {
            InputState::Pressed => self.pressed,
            InputState::Down => self.held,
            InputState::Released => self.released,
            _ => false,
        }
    }
}
