//! Persisted mutation history, enforcing non-repetition per point.
//!
//! The store is a file shared across engine invocations. Each key addresses
//! one point (and optionally one operand of it); the value list holds every
//! raw value ever produced there, original first. Access is a full
//! read-modify-write cycle with no locking; concurrent writers race and the
//! last one wins, which is an accepted limitation.

use mutest_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryStore {
    entries: BTreeMap<String, Vec<Value>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for a point, with an optional operand index for rules that track
    /// history per operand
    pub fn key(function: &str, ordinal: usize, operand: Option<usize>) -> String {
        match operand {
            Some(index) => format!("{}:{}:{}", function, ordinal, index),
            None => format!("{}:{}", function, ordinal),
        }
    }

    /// Load the store from disk. A missing or unparseable file is treated
    /// as an empty store.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::new(),
        };
        match serde_json::from_str(&text) {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!("History file {} is unreadable: {}", path.display(), err);
                Self::new()
            }
        }
    }

    /// Write the entire store back to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Create the record for `key` with `original` as its first entry,
    /// if the record does not exist yet
    pub fn seed(&mut self, key: &str, original: Value) {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| vec![original]);
    }

    pub fn contains(&self, key: &str, value: &Value) -> bool {
        self.entries
            .get(key)
            .map(|values| values.contains(value))
            .unwrap_or(false)
    }

    pub fn append(&mut self, key: &str, value: Value) {
        self.entries.entry(key.to_string()).or_default().push(value);
    }

    pub fn values(&self, key: &str) -> &[Value] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_formats() {
        assert_eq!(HistoryStore::key("f", 3, None), "f:3");
        assert_eq!(HistoryStore::key("f", 3, Some(1)), "f:3:1");
    }

    #[test]
    fn test_seed_is_idempotent() {
        let mut store = HistoryStore::new();
        store.seed("f:1", json!(42));
        store.seed("f:1", json!(99));
        assert_eq!(store.values("f:1"), &[json!(42)]);
    }

    #[test]
    fn test_contains_and_append() {
        let mut store = HistoryStore::new();
        store.seed("f:1", json!("SGT"));
        assert!(store.contains("f:1", &json!("SGT")));
        assert!(!store.contains("f:1", &json!("SLT")));

        store.append("f:1", json!("SLT"));
        assert!(store.contains("f:1", &json!("SLT")));
        assert_eq!(store.values("f:1").len(), 2);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::load(&dir.path().join("absent.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_garbage_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json at all").unwrap();
        let store = HistoryStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::new();
        store.seed("f:2:0", json!(7));
        store.append("f:2:0", json!(8));
        store.save(&path).unwrap();

        let loaded = HistoryStore::load(&path);
        assert_eq!(loaded.values("f:2:0"), &[json!(7), json!(8)]);
    }
}
