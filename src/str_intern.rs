use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

static INTERN: Lazy<RwLock<HashMap<String, Arc<str>>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Intern a &str -> Arc<str>. Equal strings share the same Arc buffer.
///
/// Action ids, map names and input tokens are interned so the dispatch index,
/// refire table and listener notifications all share one allocation per name.
pub fn intern<S: AsRef<str>>(s: S) -> Arc<str> {
    let s = s.as_ref();
    // fast path: read lock
    if let Some(existing) = INTERN.read().get(s) {
        return Arc::clone(existing);
    }
    // slow path: upgrade to write
    let mut w = INTERN.write();
    if let Some(existing) = w.get(s) {
        return Arc::clone(existing);
    }
    let arc: Arc<str> = Arc::from(s.to_owned());
    w.insert(arc.to_string(), Arc::clone(&arc));
    arc
}

/// Intern the lower-cased, trimmed form of an input token.
/// Token identity in the dispatch index is case-insensitive.
pub fn intern_token<S: AsRef<str>>(s: S) -> Arc<str> {
    intern(s.as_ref().trim().to_ascii_lowercase())
}
