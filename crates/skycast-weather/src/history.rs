//! Recent searches, most recent first.

use skycast_core::StorageError;

use crate::store::{load_json, save_json, KeyValueStore, StoreKey};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
    limit: usize,
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl SearchHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move `name` to the front, dropping any case-insensitive duplicate and
    /// anything past the limit. Blank names are ignored.
    ///
    /// Returns true if the list changed.
    pub fn push(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        if self.entries.first().map(String::as_str) == Some(name) {
            return false;
        }

        let folded = name.to_lowercase();
        self.entries.retain(|e| e.to_lowercase() != folded);
        self.entries.insert(0, name.to_string());
        self.entries.truncate(self.limit);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load the persisted list, applying `limit`.
    pub fn load(store: &dyn KeyValueStore, limit: usize) -> Result<Self, StorageError> {
        let mut entries: Vec<String> =
            load_json(store, StoreKey::SearchHistory)?.unwrap_or_default();
        entries.truncate(limit);
        Ok(Self { entries, limit })
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        save_json(store, StoreKey::SearchHistory, &self.entries)?;
        tracing::debug!("Saved {} search history entries", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::store::SqliteStore;

    #[test]
    fn test_push_most_recent_first() {
        let mut history = SearchHistory::default();
        history.push("Cairo");
        history.push("Giza");
        assert_eq!(history.entries(), ["Giza", "Cairo"]);
    }

    #[test]
    fn test_push_trims_and_ignores_blank() {
        let mut history = SearchHistory::default();
        assert!(!history.push("   "));
        assert!(history.push("  Luxor "));
        assert_eq!(history.entries(), ["Luxor"]);
    }

    #[test]
    fn test_case_insensitive_dedup_last_casing_wins() {
        let mut history = SearchHistory::default();
        history.push("Cairo");
        history.push("Giza");
        history.push("cairo");
        assert_eq!(history.entries(), ["cairo", "Giza"]);
    }

    #[test]
    fn test_repeated_push_is_idempotent() {
        let mut history = SearchHistory::default();
        history.push("Cairo");
        assert!(!history.push("Cairo"));
        history.push("Cairo");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_capped_at_limit() {
        let mut history = SearchHistory::default();
        for i in 0..25 {
            history.push(&format!("City {}", i));
        }
        assert_eq!(history.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(history.entries()[0], "City 24");
        assert_eq!(history.entries()[9], "City 15");
    }

    #[test]
    fn test_clear() {
        let mut history = SearchHistory::default();
        history.push("Cairo");
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_persistence_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let mut history = SearchHistory::default();
        history.push("Cairo");
        history.push("Alexandria");
        history.save(&store).unwrap();

        let loaded = SearchHistory::load(&store, DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(loaded.entries(), ["Alexandria", "Cairo"]);
    }

    #[test]
    fn test_load_applies_smaller_limit() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .set(StoreKey::SearchHistory, r#"["a","b","c","d"]"#)
            .unwrap();
        let loaded = SearchHistory::load(&store, 2).unwrap();
        assert_eq!(loaded.entries(), ["a", "b"]);
    }

    #[test]
    fn test_load_missing_is_empty() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(SearchHistory::load(&store, 10).unwrap().is_empty());
    }
}
