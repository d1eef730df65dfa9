//! Local persistence for the flow document and the running transcript,
//! keyed by the assistant's public id.
//!
//! Per key there are two entries: the raw flow document JSON, and the
//! transcript snapshot for resume.
//! All operations are best-effort; the runtime logs and ignores failures.
//! There is no cross-process coordination: two sessions sharing a key
//! race on it and the last write wins.

use crate::error::StoreError;
use crate::session::TranscriptSnapshot;
use std::fs;
use std::path::PathBuf;

pub trait SessionStore: Send + Sync {
    /// The cached raw flow document JSON, if any.
    fn load_flow(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn save_flow(&self, key: &str, json: &str) -> Result<(), StoreError>;

    /// The saved transcript snapshot, if any.
    fn load_transcript(&self, key: &str) -> Result<Option<TranscriptSnapshot>, StoreError>;

    fn save_transcript(&self, key: &str, snapshot: &TranscriptSnapshot) -> Result<(), StoreError>;

    /// Removes both entries for the key.
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// A store keeping one directory per key under a base directory, with
/// `flow.json` and `transcript.json` entries.
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn entry_dir(&self, key: &str) -> PathBuf {
        self.base.join(sanitize_key(key))
    }

    fn read_entry(&self, key: &str, file: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_dir(key).join(file);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write_entry(&self, key: &str, file: &str, contents: &str) -> Result<(), StoreError> {
        let dir = self.entry_dir(key);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file), contents)?;
        Ok(())
    }
}

/// Keys come from assistant public ids; keep only filesystem-safe
/// characters so a hostile id cannot escape the base directory.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl SessionStore for FileStore {
    fn load_flow(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read_entry(key, "flow.json")
    }

    fn save_flow(&self, key: &str, json: &str) -> Result<(), StoreError> {
        self.write_entry(key, "flow.json", json)
    }

    fn load_transcript(&self, key: &str) -> Result<Option<TranscriptSnapshot>, StoreError> {
        match self.read_entry(key, "transcript.json")? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    fn save_transcript(&self, key: &str, snapshot: &TranscriptSnapshot) -> Result<(), StoreError> {
        self.write_entry(key, "transcript.json", &serde_json::to_string(snapshot)?)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let dir = self.entry_dir(key);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
