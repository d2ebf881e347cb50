//! Raw input events as delivered by the host input layer.
//!
//! Digital buttons go through `Pressed` -> `Down` (held, once per frame) ->
//! `Released`. Analog axes only ever report `Changed` with a value; the
//! trigger logic reconstructs press/hold/release semantics for them from an
//! analog-compare condition.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::input::device::InputDevice;
use crate::str_intern::intern_token;

/// Transition state carried by a raw event, and also the "activation mode"
/// reported to listeners when a binding fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputState {
    #[default]
    Unknown,
    Pressed,
    Released,
    Down,
    Changed,
}

/// Opaque physical key identity, used only for repeated-key detection.
/// Hosts that can't supply one pass `KeyId::UNKNOWN` and lose the
/// repeat-override behaviors, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId(pub u32);

impl KeyId {
    pub const UNKNOWN: KeyId = KeyId(u32::MAX);
}

impl Default for KeyId {
    fn default() -> Self {
        KeyId::UNKNOWN
    }
}

/// Modifier keys held while the event was generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    #[inline]
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// One hardware input transition.
#[derive(Debug, Clone)]
pub struct InputEvent {
    /// Token naming the physical input ("w", "space", "xi_trigger_l").
    /// Matched case-insensitively against bindings.
    pub key_name: Arc<str>,
    pub key_id: KeyId,
    pub device: InputDevice,
    pub device_index: u8,
    pub state: InputState,
    /// 0/1 for digital inputs, axis position for analog ones.
    pub value: f32,
    pub modifiers: Modifiers,
}

impl InputEvent {
    /// Event with the given token and state; everything else defaulted.
    pub fn new(key_name: &str, state: InputState) -> Self {
        InputEvent {
            key_name: intern_token(key_name),
            key_id: KeyId::UNKNOWN,
            device: InputDevice::Unknown,
            device_index: 0,
            state,
            value: match state {
                InputState::Released => 0.0,
                _ => 1.0,
            },
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value;
        self
    }

    pub fn with_key_id(mut self, key_id: KeyId) -> Self {
        self.key_id = key_id;
        self
    }

    pub fn with_device(mut self, device: InputDevice, device_index: u8) -> Self {
        self.device = device;
        self.device_index = device_index;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Normalized (lower-cased, interned) form of `key_name`, the key used by
    /// the dispatch index and refire table.
    pub fn token(&self) -> Arc<str> {
        intern_token(self.key_name.as_ref())
    }
}
