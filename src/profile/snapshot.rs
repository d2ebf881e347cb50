//! JSON snapshot of the whole configuration graph.
//!
//! Only configuration is serialized; transient trigger state is skipped and
//! the dispatch index is rebuilt on import, the same way lookup tables are
//! rebuilt after deserializing any derived structure.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::bindings::action::Action;
use crate::filter::FilterKind;
use crate::manager::ActionMapManager;
use crate::manager::registry::BindRef;
use crate::str_intern::{intern, intern_token};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub version: i32,
    pub action_maps: Vec<ActionMapData>,
    pub filters: Vec<FilterData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionMapData {
    pub name: Arc<str>,
    pub enabled: bool,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterData {
    pub name: Arc<str>,
    pub kind: FilterKind,
    pub enabled: bool,
    pub actions: Vec<Arc<str>>,
}

impl ProfileSnapshot {
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("serialize profile snapshot: {e}"))
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("deserialize profile snapshot: {e}"))
    }
}

impl ActionMapManager {
    /// Capture maps, filters and the profile version as a serializable value.
    pub fn export_snapshot(&self) -> ProfileSnapshot {
        let action_maps = self
            .action_maps()
            .map(|map| ActionMapData {
                name: Arc::clone(map.name()),
                enabled: map.enabled(),
                actions: map.actions().cloned().collect(),
            })
            .collect();

        let filters = self
            .action_filters()
            .map(|filter| {
                let mut actions: Vec<Arc<str>> = filter.filtered_actions().cloned().collect();
                actions.sort();
                FilterData {
                    name: Arc::clone(filter.name()),
                    kind: filter.kind(),
                    enabled: filter.enabled(),
                    actions,
                }
            })
            .collect();

        ProfileSnapshot {
            version: self.version(),
            action_maps,
            filters,
        }
    }

    /// Replace the whole configuration with a snapshot and rebuild the
    /// dispatch index from it.
    pub fn import_snapshot(&mut self, snapshot: ProfileSnapshot) {
        self.clear();
        self.set_version(snapshot.version);

        for map_data in snapshot.action_maps {
            if !self.create_action_map(map_data.name.as_ref()) {
                continue;
            }
            let Some(map) = self.action_map_mut(map_data.name.as_ref()) else {
                continue;
            };
            for mut action in map_data.actions {
                action.id = intern(action.id.as_ref());
                for input in action.inputs.iter_mut() {
                    input.input = intern_token(input.input.as_ref());
                    input.default_input = intern_token(input.default_input.as_ref());
                    input.reset_transient_state();
                }
                map.insert_action(action);
            }
            map.enable(map_data.enabled);
        }

        for filter_data in snapshot.filters {
            if !self.create_action_filter(filter_data.name.as_ref(), filter_data.kind) {
                continue;
            }
            if let Some(filter) = self.action_filter_mut(filter_data.name.as_ref()) {
                filter.set_filter_list(filter_data.actions.iter().map(|a| a.as_ref()));
                filter.set_enabled(filter_data.enabled);
            }
        }

        self.rebuild_bindings();
    }

    pub fn export_json(&self) -> Result<String, String> {
        self.export_snapshot().to_json()
    }

    pub fn import_json(&mut self, content: &str) -> Result<(), String> {
        let snapshot = ProfileSnapshot::from_json(content)?;
        self.import_snapshot(snapshot);
        Ok(())
    }

    /// Reconstruct the dispatch index from the map graph. Call after any bulk
    /// import that bypassed the incremental bind registration.
    pub(crate) fn rebuild_bindings(&mut self) {
        self.registry.clear_binds();
        self.registry.clear_refires();

        let mut binds: Vec<BindRef> = Vec::new();
        for map in self.maps.values() {
            for action in map.actions() {
                for input in &action.inputs {
                    if input.is_bound() {
                        binds.push(BindRef {
                            map: Arc::clone(map.name()),
                            action: Arc::clone(action.id()),
                            input: Arc::clone(&input.input),
                        });
                    }
                }
            }
        }
        for bind in binds {
            self.registry.add_bind(bind);
        }
    }
}
