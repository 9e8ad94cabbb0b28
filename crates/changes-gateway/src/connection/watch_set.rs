//! Case-insensitive watch sets
//!
//! Keys are folded with `str::to_lowercase` (ordinal, locale-independent)
//! on the way in and on every lookup, so matching is deterministic across
//! environments.

use dashmap::DashSet;

fn fold(key: &str) -> String {
    key.to_lowercase()
}

/// A concurrent set of subscription keys
#[derive(Debug, Default)]
pub struct WatchSet {
    keys: DashSet<String>,
}

impl WatchSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key; returns false if it was already present
    pub fn insert(&self, key: &str) -> bool {
        self.keys.insert(fold(key))
    }

    /// Remove a key; returns false if it was not present
    pub fn remove(&self, key: &str) -> bool {
        self.keys.remove(&fold(key)).is_some()
    }

    /// Exact, case-insensitive membership
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(&fold(key))
    }

    /// Whether any key in the set is a case-insensitive prefix of `name`
    pub fn matches_prefix_of(&self, name: &str) -> bool {
        let name = fold(name);
        self.keys.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Folded keys, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.clone()).collect()
    }
}
