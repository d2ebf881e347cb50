//! Profile and rebind document loading.
//!
//! A profile document lists named action maps, each listing named actions,
//! each carrying one or more input bindings with activation/timing
//! attributes. Attributes written on an outer node apply to every binding
//! beneath it; inner nodes override. Loading is best-effort: a malformed
//! entry is warned about and skipped, never aborting the rest of the
//! document.
//!
//! A rebind document records only bindings that differ from their default,
//! tagged with a version that must match the loaded profile unless
//! `ignoreVersion="1"`.

use roxmltree::{Document, Node};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::bindings::action_input::{ActionInput, InputBlock};
use crate::bindings::activation::{AnalogCompare, CompareOp, StateMask};
use crate::filter::FilterKind;
use crate::manager::ActionMapManager;
use crate::str_intern::intern_token;

const CLEAR_ALL_MARKER: &str = "CLEARALL";

impl ActionMapManager {
    pub fn load_profile_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), String> {
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("read {}: {e}", path.as_ref().display()))?;
        self.load_profile_xml(&content)
    }

    /// Load a profile document, creating maps, actions, bindings and filters.
    pub fn load_profile_xml(&mut self, xml: &str) -> Result<(), String> {
        let doc = Document::parse(xml).map_err(|e| format!("parse profile XML: {e}"))?;
        let root = doc.root_element();

        let version = root
            .attribute("version")
            .and_then(|v| v.parse::<i32>().ok())
            .ok_or("obsolete action map format - version info is missing")?;
        self.version = version;

        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "actionmap" => self.load_action_map_node(child),
                "actionfilter" => self.load_action_filter_node(child),
                other => self
                    .log
                    .warn(&format!("load_profile: unexpected element <{other}>, ignoring")),
            }
        }
        Ok(())
    }

    fn load_action_map_node(&mut self, node: Node) {
        let Some(map_name) = non_empty_attr(node, "name") else {
            self.log
                .warn("load_profile: actionmap is missing its name, ignoring");
            return;
        };
        if !self.create_action_map(map_name) {
            return;
        }

        for action_node in node.children().filter(Node::is_element) {
            if action_node.tag_name().name() != "action" {
                self.log.warn(
                    "load_profile: found non action child, actionmaps should only have action children",
                );
                continue;
            }
            self.load_action_node(map_name, action_node);
        }
    }

    fn load_action_node(&mut self, map_name: &str, node: Node) {
        let Some(action_name) = non_empty_attr(node, "name") else {
            self.log
                .warn("load_profile: action missing name, ignoring action");
            return;
        };
        if !self.create_action(map_name, action_name) {
            return;
        }

        // Attributes on the action node seed every binding beneath it.
        let mut base_input = ActionInput::default();
        if node.attributes().count() > 1 {
            if let Err(e) = apply_input_attributes(node, &mut base_input) {
                self.log.warn(&format!(
                    "load_profile: failed loading action input attributes for action {action_name}: {e}"
                ));
                return;
            }

            // Flat form: every registered device may appear as an attribute.
            let device_attrs: Vec<(crate::input::device::InputDevice, Arc<str>)> = self
                .device_mappings
                .iter()
                .filter_map(|m| {
                    non_empty_attr(node, m.name.as_ref())
                        .map(|token| (m.device, intern_token(token)))
                })
                .collect();
            for (device, token) in device_attrs {
                let mut input = base_input.clone();
                input.input = Arc::clone(&token);
                input.default_input = token;
                input.device = device;
                if !self.add_action_input(map_name, action_name, input, None) {
                    continue;
                }
            }
        }

        // Nested form: one child node per device, overriding the base attrs.
        for device_node in node.children().filter(Node::is_element) {
            let Some(mapping) = self.device_mapping_by_name(device_node.tag_name().name()) else {
                continue;
            };
            let device = mapping.device;

            let mut device_input = base_input.clone();
            if let Err(e) = apply_input_attributes(device_node, &mut device_input) {
                self.log.warn(&format!(
                    "load_profile: failed loading action input attributes for action {action_name}: {e}"
                ));
                continue;
            }

            if let Some(token) = non_empty_attr(device_node, "input") {
                let mut input = device_input;
                input.input = intern_token(token);
                input.default_input = Arc::clone(&input.input);
                input.device = device;
                self.add_action_input(map_name, action_name, input, None);
                continue;
            }

            for input_node in device_node.children().filter(Node::is_element) {
                if input_node.tag_name().name() != "inputdata" {
                    self.log
                        .warn("load_profile: children inside device tags must be inputdata");
                    continue;
                }
                let Some(token) = non_empty_attr(input_node, "input") else {
                    self.log.warn("load_profile: inputdata tag must contain input");
                    continue;
                };
                let mut input = device_input.clone();
                if let Err(e) = apply_input_attributes(input_node, &mut input) {
                    self.log.warn(&format!(
                        "load_profile: failed loading inputdata attributes for action {action_name}: {e}"
                    ));
                    continue;
                }
                input.input = intern_token(token);
                input.default_input = Arc::clone(&input.input);
                input.device = device;
                self.add_action_input(map_name, action_name, input, None);
            }
        }
    }

    fn load_action_filter_node(&mut self, node: Node) {
        let Some(name) = non_empty_attr(node, "name") else {
            self.log
                .warn("load_profile: actionfilter is missing its name, ignoring");
            return;
        };
        let kind = match node.attribute("type").and_then(FilterKind::parse) {
            Some(kind) => kind,
            None => {
                self.log.warn(&format!(
                    "load_profile: actionfilter {name} has an unknown type, ignoring"
                ));
                return;
            }
        };
        if !self.create_action_filter(name, kind) {
            return;
        }
        let Some(filter) = self.action_filter_mut(name) else {
            return;
        };
        for child in node.children().filter(Node::is_element) {
            if child.tag_name().name() != "filter" {
                continue;
            }
            if let Some(action) = non_empty_attr(child, "action") {
                filter.filter_action(action);
            }
        }
    }

    pub fn load_rebinds_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), String> {
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("read {}: {e}", path.as_ref().display()))?;
        self.load_rebinds_xml(&content)
    }

    /// Apply a rebind document on top of the loaded profile. A version
    /// mismatch rejects the whole document; individual bad entries are
    /// skipped with a warning.
    pub fn load_rebinds_xml(&mut self, xml: &str) -> Result<(), String> {
        let doc = Document::parse(xml).map_err(|e| format!("parse rebind XML: {e}"))?;
        let root = doc.root_element();

        let ignore_version = root
            .attribute("ignoreVersion")
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(0);
        if ignore_version == 0 {
            let version = root
                .attribute("version")
                .and_then(|v| v.parse::<i32>().ok())
                .ok_or("load_rebinds: obsolete rebind format - version info is missing")?;
            if version != self.version {
                return Err(format!(
                    "load_rebinds: version found {version} -> required {}",
                    self.version
                ));
            }
        }

        for map_node in root.children().filter(Node::is_element) {
            if map_node.tag_name().name() != "actionmap" {
                continue;
            }
            let Some(map_name) = non_empty_attr(map_node, "name") else {
                continue;
            };
            if self.action_map(map_name).is_none() {
                self.log.warn(&format!(
                    "load_rebinds: failed to find actionmap: {map_name}"
                ));
                continue;
            }
            self.load_rebind_map_node(map_name, map_node);
        }
        Ok(())
    }

    fn load_rebind_map_node(&mut self, map_name: &str, map_node: Node) {
        for action_node in map_node.children().filter(Node::is_element) {
            if action_node.tag_name().name() != "action" {
                self.log
                    .warn("load_rebinds: found non action child, ignoring");
                continue;
            }
            let Some(action_name) = non_empty_attr(action_node, "name") else {
                self.log
                    .warn("load_rebinds: action missing name, ignoring action");
                continue;
            };
            let action_exists = self
                .action_map(map_name)
                .and_then(|m| m.get_action(action_name))
                .is_some();
            if !action_exists {
                self.log.warn(&format!(
                    "load_rebinds: action {action_name} doesn't exist, can't rebind"
                ));
                continue;
            }

            for input_node in action_node.children().filter(Node::is_element) {
                let Some(token) = input_node.attribute("input") else {
                    self.log.warn(&format!(
                        "load_rebinds: action {action_name} has an input tag missing input attribute"
                    ));
                    continue;
                };
                let Some(device_name) = non_empty_attr(input_node, "device") else {
                    self.log.warn(&format!(
                        "load_rebinds: action {action_name} has an input tag missing device attribute"
                    ));
                    continue;
                };
                let Some(mapping) = self.device_mapping_by_name(device_name) else {
                    continue;
                };
                let device = mapping.device;
                let reset_to_default = token.eq_ignore_ascii_case("DEFAULT");

                match non_empty_attr(input_node, "defaultInput") {
                    None => {
                        // no default recorded: the entry targets the first
                        // input of that device
                        if reset_to_default {
                            let default = self
                                .action_map(map_name)
                                .and_then(|m| m.get_action(action_name))
                                .and_then(|a| a.input_by_device(device, 0))
                                .map(|i| i.default_input.to_string());
                            match default {
                                Some(default) => {
                                    self.rebind_action_input_by_device(
                                        map_name,
                                        action_name,
                                        &default,
                                        device,
                                        0,
                                    );
                                }
                                None => self.log.warn(&format!(
                                    "load_rebinds: failed to find input for device {device_name} on action {action_name}"
                                )),
                            }
                        } else {
                            self.rebind_action_input_by_device(
                                map_name,
                                action_name,
                                token,
                                device,
                                0,
                            );
                        }
                    }
                    Some(default_token) => {
                        if reset_to_default {
                            // put the input whose default this is back to it
                            let current = self
                                .action_map(map_name)
                                .and_then(|m| m.get_action(action_name))
                                .and_then(|a| {
                                    let wanted = intern_token(default_token);
                                    a.inputs
                                        .iter()
                                        .find(|i| i.default_input == wanted && i.is_rebound())
                                        .map(|i| i.input.to_string())
                                });
                            if let Some(current) = current {
                                self.rebind_action_input(
                                    map_name,
                                    action_name,
                                    &current,
                                    default_token,
                                );
                            }
                        } else {
                            self.rebind_action_input(map_name, action_name, default_token, token);
                        }
                    }
                }
            }
        }
    }
}

fn non_empty_attr<'a>(node: Node<'a, 'a>, key: &str) -> Option<&'a str> {
    node.attribute(key).map(str::trim).filter(|s| !s.is_empty())
}

/// Overlay the activation/timing/blocking attributes present on `node` onto
/// `input`. Absent attributes leave the current value in place, which is how
/// outer-node attributes cascade to inner bindings.
fn apply_input_attributes(node: Node, input: &mut ActionInput) -> Result<(), String> {
    apply_flag(node, "onPress", &mut input.activation.on_press);
    apply_flag(node, "onRelease", &mut input.activation.on_release);
    apply_flag(node, "onHold", &mut input.activation.on_hold);
    apply_flag(node, "always", &mut input.activation.always);
    apply_flag(node, "consoleCmd", &mut input.activation.console_cmd);
    apply_flag(node, "noModifiers", &mut input.activation.no_modifiers);
    apply_flag(node, "retriggerable", &mut input.activation.retriggerable);

    apply_f32(node, "pressTriggerDelay", &mut input.press_trigger_delay);
    apply_opt_f32(
        node,
        "pressTriggerDelayRepeatOverride",
        &mut input.press_trigger_delay_repeat_override,
    );
    if let Some(v) = node.attribute("pressDelayPriority").and_then(|v| v.parse::<i32>().ok()) {
        input.press_delay_priority = v;
    }

    apply_f32(node, "holdTriggerDelay", &mut input.hold_trigger_delay);
    apply_opt_f32(
        node,
        "holdTriggerDelayRepeatOverride",
        &mut input.hold_trigger_delay_repeat_override,
    );
    apply_opt_f32(node, "holdRepeatDelay", &mut input.hold_repeat_delay);
    apply_opt_f32(
        node,
        "releaseTriggerThreshold",
        &mut input.release_trigger_threshold,
    );

    if node.attribute("useAnalogCompare") == Some("1") {
        let op = node
            .attribute("analogCompareOp")
            .and_then(CompareOp::parse)
            .ok_or("failed to find analogCompareOp")?;
        let value = node
            .attribute("analogCompareVal")
            .and_then(|v| v.parse::<f32>().ok())
            .ok_or("failed to find analogCompareVal")?;
        input.analog_compare = Some(AnalogCompare::new(op, value));
    }

    if let Some(inputs_to_block) = non_empty_attr(node, "inputsToBlock") {
        input.block = parse_input_block(node, inputs_to_block)?;
    }

    Ok(())
}

/// `attr="1"` sets the flag, any other numeric value clears it, absence
/// leaves it alone.
fn apply_flag(node: Node, key: &str, flag: &mut bool) {
    if let Some(v) = node.attribute(key).and_then(|v| v.parse::<i32>().ok()) {
        *flag = v == 1;
    }
}

fn apply_f32(node: Node, key: &str, value: &mut f32) {
    if let Some(v) = node.attribute(key).and_then(|v| v.parse::<f32>().ok()) {
        *value = v;
    }
}

/// Timing attributes where a negative value means "disabled".
fn apply_opt_f32(node: Node, key: &str, value: &mut Option<f32>) {
    if let Some(v) = node.attribute(key).and_then(|v| v.parse::<f32>().ok()) {
        *value = if v < 0.0 { None } else { Some(v) };
    }
}

fn parse_input_block(node: Node, inputs_to_block: &str) -> Result<InputBlock, String> {
    if inputs_to_block == CLEAR_ALL_MARKER {
        return Ok(InputBlock::ClearAll);
    }

    let duration = node
        .attribute("inputBlockTime")
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(0.0);
    if duration < f32::EPSILON {
        return Err(format!("must have a valid blockTime, value is: {duration:.2}"));
    }

    let activation = match non_empty_attr(node, "inputBlockActivation") {
        None => StateMask::ALL,
        Some(list) => {
            let mut mask = StateMask::default();
            let mut use_always = false;
            for phase in list.split('|').map(str::trim).filter(|s| !s.is_empty()) {
                match phase {
                    "onPress" => mask.pressed = true,
                    "onHold" => mask.held = true,
                    "onRelease" => mask.released = true,
                    "always" => {
                        use_always = true;
                        break;
                    }
                    other => return Err(format!("invalid block activation: {other}")),
                }
            }
            if use_always { StateMask::ALL } else { mask }
        }
    };

    let inputs: Vec<Arc<str>> = inputs_to_block
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(intern_token)
        .collect();
    if inputs.is_empty() {
        return Err("failed to find any inputs to block".into());
    }

    let device_index = node
        .attribute("inputBlockDeviceIndex")
        .and_then(|v| v.parse::<i32>().ok())
        .filter(|&v| v != -1)
        .map(|v| v as u8);

    Ok(InputBlock::Block {
        inputs,
        duration,
        activation,
        device_index,
    })
}
