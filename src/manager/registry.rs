//! Derived dispatch structures: the token -> bindings index consulted on
//! every raw event, and the refire table driving delayed presses and
//! analog-hold repeats.
//!
//! Both are caches over the action-map graph. Every removal path (input,
//! action, whole map) must fully purge matching entries; all removals are
//! idempotent and safe on already-absent entries.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::input::event::InputEvent;

/// Handle to one registered binding: names, not pointers, so entries can be
/// validated against the owning graph at use time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct BindRef {
    pub map: Arc<str>,
    pub action: Arc<str>,
    /// Normalized bound token at registration time.
    pub input: Arc<str>,
}

/// One binding pending refire evaluation.
#[derive(Debug, Clone)]
pub(crate) struct RefireBind {
    pub bind: BindRef,
    /// Set when a real hardware event just (re)registered the entry; the next
    /// update pass skips it once.
    pub ignore_next_update: bool,
    /// A release arrived while the delayed press was still pending; fire a
    /// synthetic release right after the press.
    pub needs_release: bool,
}

/// Refire records for one input token. The stored event is replayed on every
/// update pass until the entry is removed.
#[derive(Debug, Clone)]
pub(crate) struct RefireData {
    pub event: InputEvent,
    pub binds: Vec<RefireBind>,
}

#[derive(Default)]
pub(crate) struct BindRegistry {
    by_token: HashMap<Arc<str>, Vec<BindRef>>,
    refires: IndexMap<Arc<str>, RefireData>,
}

impl BindRegistry {
    pub fn new() -> Self {
        BindRegistry::default()
    }

    // ---- dispatch index ----

    /// Register a binding. Fails on an exact duplicate triple.
    pub fn add_bind(&mut self, bind: BindRef) -> bool {
        if bind.input.is_empty() {
            return false;
        }
        let bucket = self.by_token.entry(Arc::clone(&bind.input)).or_default();
        if bucket.contains(&bind) {
            return false;
        }
        bucket.push(bind);
        true
    }

    pub fn remove_bind(&mut self, bind: &BindRef) -> bool {
        let Some(bucket) = self.by_token.get_mut(&bind.input) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|b| b != bind);
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            self.by_token.remove(&bind.input);
        }
        if removed {
            self.remove_refire(bind);
        }
        removed
    }

    pub fn has_bind(&self, bind: &BindRef) -> bool {
        self.by_token
            .get(&bind.input)
            .is_some_and(|bucket| bucket.contains(bind))
    }

    /// All bindings registered under a token, in registration order.
    pub fn binds_for(&self, token: &Arc<str>) -> &[BindRef] {
        self.by_token.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Purge everything referencing a map.
    pub fn remove_map(&mut self, map: &str) {
        self.by_token.retain(|_, bucket| {
            bucket.retain(|b| b.map.as_ref() != map);
            !bucket.is_empty()
        });
        self.refires.retain(|_, data| {
            data.binds.retain(|rb| rb.bind.map.as_ref() != map);
            !data.binds.is_empty()
        });
    }

    /// Purge everything referencing one action of one map.
    pub fn remove_action(&mut self, map: &str, action: &str) {
        self.by_token.retain(|_, bucket| {
            bucket
                .retain(|b| !(b.map.as_ref() == map && b.action.as_ref() == action));
            !bucket.is_empty()
        });
        self.refires.retain(|_, data| {
            data.binds
                .retain(|rb| !(rb.bind.map.as_ref() == map && rb.bind.action.as_ref() == action));
            !data.binds.is_empty()
        });
    }

    pub fn clear_binds(&mut self) {
        self.by_token.clear();
    }

    // ---- refire table ----

    /// Register or refresh a refire entry for a binding. The stored event is
    /// replaced (analog value may have moved) and the bind is marked to skip
    /// the immediately following update pass.
    pub fn update_refire(&mut self, bind: &BindRef, event: &InputEvent) {
        match self.refires.get_mut(&bind.input) {
            Some(data) => {
                data.event = event.clone();
                match data.binds.iter_mut().find(|rb| &rb.bind == bind) {
                    Some(rb) => rb.ignore_next_update = true,
                    None => data.binds.push(RefireBind {
                        bind: bind.clone(),
                        ignore_next_update: true,
                        needs_release: false,
                    }),
                }
            }
            None => {
                self.refires.insert(
                    Arc::clone(&bind.input),
                    RefireData {
                        event: event.clone(),
                        binds: vec![RefireBind {
                            bind: bind.clone(),
                            ignore_next_update: true,
                            needs_release: false,
                        }],
                    },
                );
            }
        }
    }

    pub fn remove_refire(&mut self, bind: &BindRef) -> bool {
        let Some(data) = self.refires.get_mut(&bind.input) else {
            return false;
        };
        let before = data.binds.len();
        data.binds.retain(|rb| &rb.bind != bind);
        let removed = data.binds.len() != before;
        if data.binds.is_empty() {
            self.refires.shift_remove(&bind.input);
        }
        removed
    }

    pub fn clear_refires(&mut self) {
        self.refires.clear();
    }

    /// Drop every entry registered by a delayed press (stored state Pressed).
    pub fn remove_all_delayed_press(&mut self) {
        self.refires
            .retain(|_, data| data.event.state != crate::input::event::InputState::Pressed);
    }

    pub fn set_needs_release(&mut self, bind: &BindRef, needs_release: bool) -> bool {
        let Some(data) = self.refires.get_mut(&bind.input) else {
            return false;
        };
        match data.binds.iter_mut().find(|rb| &rb.bind == bind) {
            Some(rb) => {
                rb.needs_release = needs_release;
                true
            }
            None => false,
        }
    }

    pub fn refire_tokens(&self) -> Vec<Arc<str>> {
        self.refires.keys().cloned().collect()
    }

    /// Snapshot one refire entry for an update pass, clearing the
    /// ignore-next-update marks in place.
    pub fn take_refire_pass(&mut self, token: &Arc<str>) -> Option<(InputEvent, Vec<(BindRef, bool, bool)>)> {
        let data = self.refires.get_mut(token)?;
        let event = data.event.clone();
        let snapshot = data
            .binds
            .iter_mut()
            .map(|rb| {
                let ignored = rb.ignore_next_update;
                rb.ignore_next_update = false;
                (rb.bind.clone(), ignored, rb.needs_release)
            })
            .collect();
        Some((event, snapshot))
    }

    /// Bindings with pending refires, for delayed-press priority arbitration.
    pub fn refire_binds(&self) -> impl Iterator<Item = &BindRef> {
        self.refires.values().flat_map(|d| d.binds.iter()).map(|rb| &rb.bind)
    }

    pub fn has_refire(&self, token: &Arc<str>) -> bool {
        self.refires.contains_key(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{InputEvent, InputState};
    use crate::str_intern::intern;

    fn bind(map: &str, action: &str, input: &str) -> BindRef {
        BindRef {
            map: intern(map),
            action: intern(action),
            input: intern(input),
        }
    }

    #[test]
    fn duplicate_binds_are_rejected() {
        let mut reg = BindRegistry::new();
        assert!(reg.add_bind(bind("player", "jump", "space")));
        assert!(!reg.add_bind(bind("player", "jump", "space")));
        assert_eq!(reg.binds_for(&intern("space")).len(), 1);
    }

    #[test]
    fn removals_are_idempotent() {
        let mut reg = BindRegistry::new();
        let b = bind("player", "jump", "space");
        assert!(reg.add_bind(b.clone()));
        assert!(reg.remove_bind(&b));
        assert!(!reg.remove_bind(&b));
        assert!(!reg.remove_refire(&b));
    }

    #[test]
    fn removing_bind_drops_its_refire() {
        let mut reg = BindRegistry::new();
        let b = bind("player", "jump", "space");
        reg.add_bind(b.clone());
        reg.update_refire(&b, &InputEvent::new("space", InputState::Pressed));
        assert!(reg.has_refire(&intern("space")));
        reg.remove_bind(&b);
        assert!(!reg.has_refire(&intern("space")));
    }

    #[test]
    fn map_scope_purge_keeps_other_maps() {
        let mut reg = BindRegistry::new();
        reg.add_bind(bind("player", "jump", "space"));
        reg.add_bind(bind("vehicle", "brake", "space"));
        reg.remove_map("player");
        let left = reg.binds_for(&intern("space"));
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].map.as_ref(), "vehicle");
    }
}
