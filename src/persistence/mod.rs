//! Durable state storage.
//!
//! Three independent JSON stores in one data directory:
//!
//! - `resolved_cache.json`: the resolved-location records
//! - `pending_queue.json`: the retry queue, in order
//! - `governor_state.json`: cooldown and daily-counter state
//!
//! Each store loads and saves on its own, so a corrupt queue file never takes
//! down the cache. Writes go to a temp file in the same directory and are
//! moved into place with an atomic rename; a crash mid-write leaves the
//! previous file intact, never a truncated one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::LocationRecord;
use crate::error_handling::PersistenceError;
use crate::governor::GovernorState;
use crate::queue::QueueItem;

const CACHE_FILE: &str = "resolved_cache.json";
const QUEUE_FILE: &str = "pending_queue.json";
const GOVERNOR_FILE: &str = "governor_state.json";

/// Handle to the three on-disk state files.
pub struct StateStore {
    cache_path: PathBuf,
    queue_path: PathBuf,
    governor_path: PathBuf,
}

impl StateStore {
    /// Opens (creating if needed) the data directory.
    pub fn open(data_dir: &Path) -> Result<Self, PersistenceError> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            cache_path: data_dir.join(CACHE_FILE),
            queue_path: data_dir.join(QUEUE_FILE),
            governor_path: data_dir.join(GOVERNOR_FILE),
        })
    }

    /// Loads the resolved-location records; empty if the file is absent.
    pub fn load_cache(&self) -> Result<Vec<LocationRecord>, PersistenceError> {
        Ok(load_json(&self.cache_path)?.unwrap_or_default())
    }

    /// Persists the resolved-location records.
    pub fn save_cache(&self, records: &[LocationRecord]) -> Result<(), PersistenceError> {
        save_json(&self.cache_path, &records)
    }

    /// Loads the pending queue; empty if the file is absent.
    pub fn load_queue(&self) -> Result<Vec<QueueItem>, PersistenceError> {
        Ok(load_json(&self.queue_path)?.unwrap_or_default())
    }

    /// Persists the pending queue.
    pub fn save_queue(&self, items: &[QueueItem]) -> Result<(), PersistenceError> {
        save_json(&self.queue_path, &items)
    }

    /// Loads the governor state; `None` if the file is absent.
    pub fn load_governor(&self) -> Result<Option<GovernorState>, PersistenceError> {
        load_json(&self.governor_path)
    }

    /// Persists the governor state.
    pub fn save_governor(&self, state: &GovernorState) -> Result<(), PersistenceError> {
        save_json(&self.governor_path, state)
    }
}

/// Reads and parses a JSON state file. Absent file is `Ok(None)`.
fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Serializes to a sibling temp file, then renames into place.
fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let content = serde_json::to_string(value)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_missing_files_load_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open store");

        assert!(store.load_cache().expect("load cache").is_empty());
        assert!(store.load_queue().expect("load queue").is_empty());
        assert!(store.load_governor().expect("load governor").is_none());
    }

    #[test]
    fn test_cache_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open store");

        let records = vec![
            LocationRecord::located("AA:BB:CC:DD:EE:FF", "cafe", 51.5, -0.1, Utc::now()),
            LocationRecord::negative("AA:BB:CC:DD:EE:01", "ghost", Utc::now()),
        ];
        store.save_cache(&records).expect("save cache");

        let loaded = store.load_cache().expect("load cache");
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_queue_roundtrip_preserves_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open store");

        let mut first = QueueItem::new("AA:00:00:00:00:01", "one", Utc::now());
        first.retry_count = 3;
        let items = vec![first, QueueItem::new("AA:00:00:00:00:02", "two", Utc::now())];
        store.save_queue(&items).expect("save queue");

        let loaded = store.load_queue().expect("load queue");
        assert_eq!(loaded, items);
        assert_eq!(loaded[0].retry_count, 3);
    }

    #[test]
    fn test_governor_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open store");

        let mut state = GovernorState::initial(Utc::now());
        state.daily_request_count = 7;
        store.save_governor(&state).expect("save governor");

        let loaded = store.load_governor().expect("load governor");
        assert_eq!(loaded, Some(state));
    }

    #[test]
    fn test_corrupt_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open store");

        std::fs::write(dir.path().join("pending_queue.json"), "{not json").expect("write junk");
        assert!(matches!(
            store.load_queue(),
            Err(PersistenceError::Corrupt(_))
        ));
        // The other stores are unaffected.
        assert!(store.load_cache().expect("load cache").is_empty());
    }

    #[test]
    fn test_save_replaces_atomically() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::open(dir.path()).expect("open store");

        store
            .save_cache(&[LocationRecord::negative("AA:00:00:00:00:01", "a", Utc::now())])
            .expect("first save");
        store
            .save_cache(&[LocationRecord::negative("AA:00:00:00:00:02", "b", Utc::now())])
            .expect("second save");

        let loaded = store.load_cache().expect("load cache");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].bssid, "AA:00:00:00:00:02");
        // No temp file left behind.
        assert!(!dir.path().join("resolved_cache.json.tmp").exists());
    }
}
