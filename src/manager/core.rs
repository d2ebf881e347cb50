//! The top-level dispatcher: owns every action map and filter, the dispatch
//! index, the refire table and the listener registries.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::ActionId;
use crate::bindings::action_input::ActionInput;
use crate::bindings::action_map::ActionMap;
use crate::filter::{ActionFilter, FilterKind};
use crate::input::clock::{Clock, SystemClock};
use crate::input::device::{DeviceMapping, InputDevice};
use crate::input::event::KeyId;
use crate::input::host::{InputHost, NullHost};
use crate::listener::{ActionListener, BlockingActionListener};
use crate::log::{InputLog, NoopLog};
use crate::manager::registry::BindRegistry;

pub struct ActionMapManager {
    pub(crate) maps: IndexMap<Arc<str>, ActionMap>,
    pub(crate) filters: IndexMap<Arc<str>, ActionFilter>,
    pub(crate) registry: BindRegistry,
    pub(crate) device_mappings: Vec<DeviceMapping>,

    pub(crate) global_listeners: Vec<Arc<dyn ActionListener>>,
    pub(crate) blocking_listeners: Vec<Arc<dyn BlockingActionListener>>,

    pub(crate) host: Arc<dyn InputHost>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) log: Arc<dyn InputLog>,

    pub(crate) enabled: bool,

    // refire-pass reentrancy bookkeeping
    pub(crate) refiring: bool,
    pub(crate) deferred_remove_all_refires: bool,

    // repeated-key tracking for the hold/press delay overrides
    pub(crate) current_key: KeyId,
    pub(crate) incoming_input_repeated: bool,
    pub(crate) repeated_input_hold_fired: bool,

    /// Profile version; the first loaded document sets it.
    pub(crate) version: i32,
}

impl ActionMapManager {
    pub fn new(host: Arc<dyn InputHost>, clock: Arc<dyn Clock>, log: Arc<dyn InputLog>) -> Self {
        ActionMapManager {
            maps: IndexMap::new(),
            filters: IndexMap::new(),
            registry: BindRegistry::new(),
            device_mappings: Vec::new(),
            global_listeners: Vec::new(),
            blocking_listeners: Vec::new(),
            host,
            clock,
            log,
            enabled: true,
            refiring: false,
            deferred_remove_all_refires: false,
            current_key: KeyId::UNKNOWN,
            incoming_input_repeated: false,
            repeated_input_hold_fired: false,
            version: -1,
        }
    }

    /// Manager with no host integration, a wall clock and no logging.
    pub fn with_defaults() -> Self {
        ActionMapManager::new(
            Arc::new(NullHost),
            Arc::new(SystemClock::new()),
            Arc::new(NoopLog),
        )
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Globally enable/disable dispatch. Disabling with `reset_state` also
    /// releases every active action and flushes all pending refires.
    pub fn enable(&mut self, enable: bool, reset_state_on_disable: bool) {
        self.enabled = enable;
        if !enable && reset_state_on_disable {
            for map in self.maps.values_mut() {
                map.release_all_actions_if_active();
            }
            self.remove_all_refire_data();
        }
    }

    #[inline]
    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    /// Current time on the timeline matching the host's pause state. Every
    /// elapsed-time computation in dispatch goes through here.
    pub(crate) fn current_time(&self) -> f32 {
        if self.host.is_paused() {
            self.clock.ui_time()
        } else {
            self.clock.game_time()
        }
    }

    // ---- action map lifecycle ----

    pub fn create_action_map(&mut self, name: &str) -> bool {
        if self.maps.contains_key(name) {
            self.log.warn(&format!(
                "ActionMapManager::create_action_map: failed to create actionmap {name}, already exists"
            ));
            return false;
        }
        let map = ActionMap::new(name);
        self.maps.insert(Arc::clone(map.name()), map);
        true
    }

    pub fn remove_action_map(&mut self, name: &str) -> bool {
        if self.maps.shift_remove(name).is_none() {
            return false;
        }
        self.registry.remove_map(name);
        true
    }

    pub fn remove_all_action_maps(&mut self) {
        self.maps.clear();
        self.registry.clear_binds();
        self.remove_all_refire_data();
    }

    /// Drop every map and filter; dispatch state starts over.
    pub fn clear(&mut self) {
        self.remove_all_action_maps();
        self.filters.clear();
        self.version = -1;
    }

    /// Reset every map's bindings to their defaults.
    pub fn reset(&mut self) {
        let ActionMapManager {
            maps,
            registry,
            log,
            ..
        } = self;
        for map in maps.values_mut() {
            map.reset(registry, log);
        }
    }

    pub fn action_map(&self, name: &str) -> Option<&ActionMap> {
        self.maps.get(name)
    }

    pub fn action_map_mut(&mut self, name: &str) -> Option<&mut ActionMap> {
        self.maps.get_mut(name)
    }

    /// Maps in creation order; read-only view for diagnostics overlays.
    pub fn action_maps(&self) -> impl Iterator<Item = &ActionMap> {
        self.maps.values()
    }

    pub fn action_map_count(&self) -> usize {
        self.maps.len()
    }

    /// Total number of actions across all maps.
    pub fn action_count(&self) -> usize {
        self.maps.values().map(|m| m.action_count()).sum()
    }

    /// Visit every action id of every map.
    pub fn enumerate_actions(&self, mut visit: impl FnMut(&ActionId)) {
        for map in self.maps.values() {
            for action in map.actions() {
                visit(action.id());
            }
        }
    }

    /// Enable/disable one map by name, or every map when `name` is empty.
    /// A single-map state change releases any now-filtered active actions.
    pub fn enable_action_map(&mut self, name: &str, enable: bool) {
        if name.is_empty() {
            for map in self.maps.values_mut() {
                map.enable(enable);
            }
            return;
        }
        let Some(map) = self.maps.get_mut(name) else {
            return;
        };
        if map.enabled() != enable {
            map.enable(enable);
            self.release_filtered_actions();
        }
    }

    // ---- binding CRUD (keeps the dispatch index in sync) ----

    pub fn create_action(&mut self, map_name: &str, action_id: &str) -> bool {
        let ActionMapManager { maps, log, .. } = self;
        match maps.get_mut(map_name) {
            Some(map) => map.create_action(action_id, log),
            None => {
                log.warn(&format!(
                    "ActionMapManager::create_action: failed to find actionmap: {map_name}"
                ));
                false
            }
        }
    }

    /// Add a binding to an action (created on demand), registering it for
    /// dispatch. `by_device_index` inserts before the n-th binding of the
    /// same device instead of appending.
    pub fn add_action_input(
        &mut self,
        map_name: &str,
        action_id: &str,
        input: ActionInput,
        by_device_index: Option<usize>,
    ) -> bool {
        let ActionMapManager {
            maps,
            registry,
            log,
            ..
        } = self;
        match maps.get_mut(map_name) {
            Some(map) => map.add_action_input(registry, action_id, input, by_device_index, log),
            None => {
                log.warn(&format!(
                    "ActionMapManager::add_action_input: failed to find actionmap: {map_name}"
                ));
                false
            }
        }
    }

    pub fn remove_action(&mut self, map_name: &str, action_id: &str) -> bool {
        let ActionMapManager {
            maps,
            registry,
            log,
            ..
        } = self;
        match maps.get_mut(map_name) {
            Some(map) => map.remove_action(registry, action_id, log),
            None => false,
        }
    }

    pub fn remove_action_input(&mut self, map_name: &str, action_id: &str, token: &str) -> bool {
        let ActionMapManager {
            maps,
            registry,
            log,
            ..
        } = self;
        match maps.get_mut(map_name) {
            Some(map) => map.remove_action_input(registry, action_id, token, log),
            None => false,
        }
    }

    /// Rebind by old/new token. Empty `new_token` clears the binding.
    pub fn rebind_action_input(
        &mut self,
        map_name: &str,
        action_id: &str,
        current_token: &str,
        new_token: &str,
    ) -> bool {
        let ActionMapManager {
            maps,
            registry,
            log,
            ..
        } = self;
        match maps.get_mut(map_name) {
            Some(map) => map.rebind_action_input(registry, action_id, current_token, new_token, log),
            None => {
                log.warn(&format!(
                    "ActionMapManager::rebind_action_input: failed to find actionmap: {map_name}"
                ));
                false
            }
        }
    }

    /// Rebind the n-th binding of a device for an action.
    pub fn rebind_action_input_by_device(
        &mut self,
        map_name: &str,
        action_id: &str,
        new_token: &str,
        device: InputDevice,
        index: usize,
    ) -> bool {
        let ActionMapManager {
            maps,
            registry,
            log,
            ..
        } = self;
        match maps.get_mut(map_name) {
            Some(map) => {
                map.rebind_action_input_by_device(registry, action_id, new_token, device, index, log)
            }
            None => {
                log.warn(&format!(
                    "ActionMapManager::rebind_action_input: failed to find actionmap: {map_name}"
                ));
                false
            }
        }
    }

    /// Currently bound input for (map, action, device, index-by-device).
    pub fn get_action_input(
        &self,
        map_name: &str,
        action_id: &str,
        device: InputDevice,
        index: usize,
    ) -> Option<&ActionInput> {
        let Some(map) = self.maps.get(map_name) else {
            self.log.warn(&format!(
                "ActionMapManager::get_action_input: failed to find actionmap: {map_name}"
            ));
            return None;
        };
        let Some(action) = map.get_action(action_id) else {
            self.log.warn(&format!(
                "ActionMapManager::get_action_input: failed to find action {action_id} in actionmap {map_name}"
            ));
            return None;
        };
        let found = action.input_by_device(device, index);
        if found.is_none() {
            self.log.warn(&format!(
                "ActionMapManager::get_action_input: no input with device {device:?} index {index} in action {action_id}"
            ));
        }
        found
    }

    // ---- filters ----

    pub fn create_action_filter(&mut self, name: &str, kind: FilterKind) -> bool {
        if self.filters.contains_key(name) {
            self.log.warn(&format!(
                "ActionMapManager::create_action_filter: filter {name} already exists"
            ));
            return false;
        }
        let filter = ActionFilter::new(name, kind);
        self.filters.insert(Arc::clone(filter.name()), filter);
        true
    }

    pub fn remove_action_filter(&mut self, name: &str) -> bool {
        self.filters.shift_remove(name).is_some()
    }

    pub fn action_filter(&self, name: &str) -> Option<&ActionFilter> {
        self.filters.get(name)
    }

    pub fn action_filter_mut(&mut self, name: &str) -> Option<&mut ActionFilter> {
        self.filters.get_mut(name)
    }

    /// Filters in creation order; read-only view for diagnostics overlays.
    pub fn action_filters(&self) -> impl Iterator<Item = &ActionFilter> {
        self.filters.values()
    }

    pub fn is_filter_enabled(&self, name: &str) -> bool {
        self.filters.get(name).is_some_and(|f| f.enabled())
    }

    /// True when any enabled filter blocks the action.
    pub fn action_filtered(&self, action_id: &str) -> bool {
        self.filters.values().any(|f| f.action_filtered(action_id))
    }

    /// Enable/disable a filter (every filter when `name` is empty).
    ///
    /// Enabling releases now-filtered active actions so held inputs don't
    /// stick. Disabling flushes transient input state: key-down state at the
    /// host plus all pending refire data.
    pub fn enable_filter(&mut self, name: &str, enable: bool) {
        if name.is_empty() {
            let names: Vec<Arc<str>> = self.filters.keys().cloned().collect();
            for n in names {
                self.apply_filter_enable(&n, enable);
            }
            return;
        }
        self.apply_filter_enable(name, enable);
    }

    fn apply_filter_enable(&mut self, name: &str, enable: bool) {
        let Some(filter) = self.filters.get_mut(name) else {
            return;
        };
        if filter.enabled() == enable {
            return;
        }
        filter.set_enabled(enable);

        if enable {
            self.release_filtered_actions();
        } else {
            self.host.clear_key_state();
            self.remove_all_refire_data();
        }
    }

    /// Release every active action an enabled filter currently blocks, in
    /// every enabled map.
    pub fn release_filtered_actions(&mut self) {
        let ActionMapManager {
            maps,
            filters,
            global_listeners,
            ..
        } = self;
        let is_filtered =
            |action: &ActionId| filters.values().any(|f| f.action_filtered(action.as_ref()));
        for map in maps.values_mut() {
            if map.enabled() {
                map.release_filtered_actions(&is_filtered, global_listeners);
            }
        }
    }

    /// Synthesize a release for one action in every map where it is active.
    pub fn release_action_if_active(&mut self, action_id: &str) {
        for map in self.maps.values_mut() {
            map.release_action_if_active(action_id);
        }
    }

    // ---- listeners ----

    /// Register a listener; with `map_name` it is scoped to that map,
    /// otherwise it hears every fired action.
    pub fn add_extra_listener(
        &mut self,
        listener: Arc<dyn ActionListener>,
        map_name: Option<&str>,
    ) -> bool {
        match map_name {
            Some(name) if !name.is_empty() => match self.maps.get_mut(name) {
                Some(map) => {
                    map.add_map_listener(listener);
                    true
                }
                None => false,
            },
            _ => {
                if !self
                    .global_listeners
                    .iter()
                    .any(|l| Arc::ptr_eq(l, &listener))
                {
                    self.global_listeners.push(listener);
                }
                true
            }
        }
    }

    pub fn remove_extra_listener(
        &mut self,
        listener: &Arc<dyn ActionListener>,
        map_name: Option<&str>,
    ) -> bool {
        match map_name {
            Some(name) if !name.is_empty() => match self.maps.get_mut(name) {
                Some(map) => {
                    map.remove_map_listener(listener);
                    true
                }
                None => false,
            },
            _ => {
                self.global_listeners.retain(|l| !Arc::ptr_eq(l, listener));
                true
            }
        }
    }

    /// Register a blocking listener, consulted before normal listeners; the
    /// first one that claims an action stops its fan-out.
    pub fn add_blocking_listener(&mut self, listener: Arc<dyn BlockingActionListener>) {
        if !self
            .blocking_listeners
            .iter()
            .any(|l| Arc::ptr_eq(l, &listener))
        {
            self.blocking_listeners.push(listener);
        }
    }

    pub fn remove_blocking_listener(&mut self, listener: &Arc<dyn BlockingActionListener>) {
        self.blocking_listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn remove_all_blocking_listeners(&mut self) {
        self.blocking_listeners.clear();
    }

    // ---- device mappings ----

    /// Register how a device is named in profile documents.
    pub fn add_input_device_mapping(&mut self, device: InputDevice, name: &str) -> bool {
        if self.device_mappings.iter().any(|m| m.device == device) {
            self.log.warn(&format!(
                "ActionMapManager::add_input_device_mapping: device type already exists, failed to add device: {name}"
            ));
            return false;
        }
        self.device_mappings.push(DeviceMapping::new(device, name));
        true
    }

    pub fn remove_input_device_mapping(&mut self, device: InputDevice) -> bool {
        let before = self.device_mappings.len();
        self.device_mappings.retain(|m| m.device != device);
        if self.device_mappings.len() == before {
            self.log
                .warn("ActionMapManager::remove_input_device_mapping: failed to find device");
            return false;
        }
        true
    }

    pub fn clear_input_device_mappings(&mut self) {
        self.device_mappings.clear();
    }

    pub fn device_mappings(&self) -> &[DeviceMapping] {
        &self.device_mappings
    }

    pub fn device_mapping_by_type(&self, device: InputDevice) -> Option<&DeviceMapping> {
        self.device_mappings.iter().find(|m| m.device == device)
    }

    pub fn device_mapping_by_name(&self, name: &str) -> Option<&DeviceMapping> {
        self.device_mappings
            .iter()
            .find(|m| m.name.as_ref() == name)
    }

    // ---- repeated-key tracking ----

    /// Forget the last seen physical key, e.g. after a focus change.
    pub fn clear_stored_current_input_data(&mut self) {
        self.current_key = KeyId::UNKNOWN;
        self.incoming_input_repeated = false;
    }

    // ---- refire data ----

    /// Drop every pending refire entry; deferred until the end of the pass
    /// when called while a refire pass is running.
    pub(crate) fn remove_all_refire_data(&mut self) {
        if self.refiring {
            // can happen when a filter is disabled from a refired input
            self.deferred_remove_all_refires = true;
        } else {
            self.registry.clear_refires();
        }
    }

    /// Highest priority among pending delayed presses, -1 when none.
    pub(crate) fn highest_pending_press_priority(&self) -> i32 {
        let mut highest = -1;
        for bind in self.registry.refire_binds() {
            let Some(map) = self.maps.get(&bind.map) else {
                continue;
            };
            if let Some(input) = map.input_ref(&bind.action, &bind.input) {
                highest = highest.max(input.press_delay_priority);
            }
        }
        highest
    }
}
