//! Named allow/deny overlays over action ids, independent of any map.
//!
//! An `ActionFail` filter blocks exactly the actions it lists while enabled.
//! An `ActionPass` filter blocks everything *except* the actions it lists
//! while enabled. A disabled filter blocks nothing.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::str_intern::intern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    ActionFail,
    ActionPass,
}

impl FilterKind {
    /// Profile attribute spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::ActionFail => "actionFail",
            FilterKind::ActionPass => "actionPass",
        }
    }

    pub fn parse(s: &str) -> Option<FilterKind> {
        match s {
            "actionFail" => Some(FilterKind::ActionFail),
            "actionPass" => Some(FilterKind::ActionPass),
            _ => None,
        }
    }
}

pub struct ActionFilter {
    name: Arc<str>,
    kind: FilterKind,
    enabled: bool,
    actions: HashSet<Arc<str>>,
}

impl ActionFilter {
    pub(crate) fn new(name: &str, kind: FilterKind) -> Self {
        ActionFilter {
            name: intern(name),
            kind,
            enabled: false,
            actions: HashSet::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Raw flag flip. Use `ActionMapManager::enable_filter` to also release
    /// newly filtered actions and flush transient input state.
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Add one action id to the filtered set.
    pub fn filter_action(&mut self, action_id: &str) {
        self.actions.insert(intern(action_id));
    }

    /// Replace the filtered set.
    pub fn set_filter_list<I, S>(&mut self, action_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.actions = action_ids.into_iter().map(intern).collect();
    }

    pub fn filtered_actions(&self) -> impl Iterator<Item = &Arc<str>> {
        self.actions.iter()
    }

    /// Pure query: does this filter block the action right now?
    pub fn action_filtered(&self, action_id: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let listed = self.actions.contains(action_id);
        match self.kind {
            FilterKind::ActionFail => listed,
            FilterKind::ActionPass => !listed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_filter_blocks_listed_actions_only() {
        let mut f = ActionFilter::new("no_jumping", FilterKind::ActionFail);
        f.filter_action("jump");
        f.set_enabled(true);
        assert!(f.action_filtered("jump"));
        assert!(!f.action_filtered("run"));
    }

    #[test]
    fn pass_filter_blocks_everything_else() {
        let mut f = ActionFilter::new("cutscene", FilterKind::ActionPass);
        f.filter_action("jump");
        f.set_enabled(true);
        assert!(!f.action_filtered("jump"));
        assert!(f.action_filtered("run"));
    }

    #[test]
    fn disabled_filter_blocks_nothing() {
        let mut f = ActionFilter::new("no_jumping", FilterKind::ActionFail);
        f.filter_action("jump");
        assert!(!f.action_filtered("jump"));
        f.set_enabled(true);
        f.set_enabled(false);
        assert!(!f.action_filtered("jump"));
    }
}
