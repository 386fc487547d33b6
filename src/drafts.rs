// src/drafts.rs
// Durable keyed string storage for the operator's last inputs.

use crate::error::StorageError;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const LAST_MODEL_KEY: &str = "ollama-remote.ui.lastModel";
pub const LAST_PROMPT_KEY: &str = "ollama-remote.ui.lastPrompt";

/// A flat JSON object of string keys, written through on every change.
///
/// A missing file or key is a normal state and reads as empty. A store
/// without a path keeps everything in memory.
#[derive(Debug, Default)]
pub struct DraftStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl DraftStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store at `path`. An unreadable or corrupt file is logged
    /// and treated as empty; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring corrupt draft store");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read draft store");
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn get(&self, key: &str) -> &str {
        self.entries.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_all(&[(key, value)])
    }

    /// Sets several keys with a single write.
    pub fn set_all(&mut self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in pairs {
            self.entries.insert((*key).to_string(), (*value).to_string());
        }
        self.flush()
    }

    fn flush(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_vec_pretty(&self.entries)?;
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        fs::write(path, raw).map_err(write_err)?;
        debug!(path = %path.display(), keys = self.entries.len(), "draft store written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::open(dir.path().join("absent.json"));
        assert_eq!(store.get(LAST_MODEL_KEY), "");
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut store = DraftStore::open(&path);
        store
            .set_all(&[(LAST_MODEL_KEY, "llama3"), (LAST_PROMPT_KEY, "hi there")])
            .unwrap();

        let reopened = DraftStore::open(&path);
        assert_eq!(reopened.get(LAST_MODEL_KEY), "llama3");
        assert_eq!(reopened.get(LAST_PROMPT_KEY), "hi there");
    }

    #[test]
    fn corrupt_file_is_replaced_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{not json").unwrap();

        let mut store = DraftStore::open(&path);
        assert_eq!(store.get(LAST_MODEL_KEY), "");
        store.set(LAST_MODEL_KEY, "phi3").unwrap();
        assert_eq!(DraftStore::open(&path).get(LAST_MODEL_KEY), "phi3");
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten as a file.
        let mut store = DraftStore::open(dir.path());
        let err = store.set(LAST_MODEL_KEY, "x").unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }
}
