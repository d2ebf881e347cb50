//! Input device classification and the device-name mapping table.
//!
//! Profile documents address devices by a configurable string ("keyboard",
//! "xboxpad", ...). The host registers the mapping before loading profiles;
//! anything not registered is simply skipped by the loader.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::str_intern::intern_token;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputDevice {
    #[default]
    Unknown,
    Keyboard,
    Mouse,
    Gamepad,
    Joystick,
}

/// One registered (device, profile attribute name) pair.
#[derive(Debug, Clone)]
pub struct DeviceMapping {
    pub device: InputDevice,
    pub name: Arc<str>,
}

impl DeviceMapping {
    pub fn new(device: InputDevice, name: &str) -> Self {
        DeviceMapping {
            device,
            name: intern_token(name),
        }
    }
}

/// The conventional mapping most hosts want; handed to
/// `ActionMapManager::add_input_device_mapping` one by one or installed via
/// the CLI/test helpers.
pub fn default_device_mappings() -> Vec<DeviceMapping> {
    vec![
        DeviceMapping::new(InputDevice::Keyboard, "keyboard"),
        DeviceMapping::new(InputDevice::Mouse, "mouse"),
        DeviceMapping::new(InputDevice::Gamepad, "gamepad"),
        DeviceMapping::new(InputDevice::Joystick, "joystick"),
    ]
}
