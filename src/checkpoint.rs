// ABOUTME: Durable sync progress record: last-synced time + recent event ids
// ABOUTME: JSON file store with atomic writes and fallback-to-default loads

use crate::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Ids kept for duplicate suppression. Ids older than this window can in
/// principle be re-published if they re-enter the fetch window; the cap is a
/// deliberate memory/durability trade-off.
pub const RECENT_ID_CAP: usize = 1000;

/// How far back the first run looks when no checkpoint exists yet.
const FIRST_RUN_LOOKBACK_SECS: u64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub last_synced_timestamp: u64,
    #[serde(default)]
    pub synced_event_ids: Vec<String>,
}

impl Checkpoint {
    /// Fresh checkpoint covering the last 24 hours.
    pub fn starting_from(now: u64) -> Self {
        Checkpoint {
            last_synced_timestamp: now.saturating_sub(FIRST_RUN_LOOKBACK_SECS),
            synced_event_ids: Vec::new(),
        }
    }

    /// Record a published event. The timestamp only ever moves forward; the
    /// id list evicts oldest-first past the cap.
    pub fn record_published(&mut self, id: &str, timestamp: u64) {
        self.synced_event_ids.push(id.to_string());
        if self.synced_event_ids.len() > RECENT_ID_CAP {
            let excess = self.synced_event_ids.len() - RECENT_ID_CAP;
            self.synced_event_ids.drain(..excess);
        }
        self.last_synced_timestamp = self.last_synced_timestamp.max(timestamp);
    }

    pub fn is_duplicate(&self, id: &str) -> bool {
        self.synced_event_ids.iter().any(|known| known == id)
    }
}

pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: PathBuf) -> Self {
        CheckpointStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint. Never fails: a missing or unreadable file yields
    /// the 24-hour default, and corruption is reported rather than swallowed.
    pub fn load(&self) -> Checkpoint {
        let now = chrono::Utc::now().timestamp().max(0) as u64;

        match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(checkpoint) => checkpoint,
                Err(e) => {
                    eprintln!(
                        "warning: recovered from corrupt checkpoint {}: {}",
                        self.path.display(),
                        e
                    );
                    Checkpoint::starting_from(now)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Checkpoint::starting_from(now)
            }
            Err(e) => {
                eprintln!(
                    "warning: recovered from unreadable checkpoint {}: {}",
                    self.path.display(),
                    e
                );
                Checkpoint::starting_from(now)
            }
        }
    }

    /// Persist synchronously. Writes to a temp file in the same directory and
    /// renames over the target, so a crash never leaves partial JSON behind.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let json = serde_json::to_string_pretty(checkpoint)?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(Error::Persistence)?;

        let random: u32 = rand::thread_rng().gen();
        let tmp_path = dir.join(format!(".checkpoint-{:08x}.part", random));

        fs::write(&tmp_path, json.as_bytes()).map_err(Error::Persistence)?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            Error::Persistence(e)
        })?;

        Ok(())
    }
}


#[cfg(test)]
mod store_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_returns_default() {
        let temp = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp.path().join("state.json"));

        let cp = store.load();
        assert!(cp.synced_event_ids.is_empty());
        assert!(cp.last_synced_timestamp > 0);
    }

    #[test]
    fn test_load_corrupt_returns_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let store = CheckpointStore::new(path);
        let cp = store.load();
        assert!(cp.synced_event_ids.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp.path().join("state.json"));

        let mut cp = Checkpoint {
            last_synced_timestamp: 1_700_000_000,
            synced_event_ids: vec![],
        };
        cp.record_published("ev1", 1_700_000_100);
        store.save(&cp).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, cp);
    }

    #[test]
    fn test_save_leaves_no_partial_files() {
        let temp = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp.path().join("state.json"));

        let cp = Checkpoint::starting_from(1_700_000_000);
        store.save(&cp).unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_schema_field_names() {
        // The on-disk schema is shared with earlier versions of the tool.
        let cp = Checkpoint {
            last_synced_timestamp: 42,
            synced_event_ids: vec!["ab".into()],
        };
        let json = serde_json::to_string(&cp).unwrap();
        assert!(json.contains("\"last_synced_timestamp\":42"));
        assert!(json.contains("\"synced_event_ids\":[\"ab\"]"));
    }
}
