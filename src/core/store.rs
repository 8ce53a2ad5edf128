//! Store abstraction for promptvault's persisted registry document.
//!
//! The store is a dumb persistence boundary: it loads and atomically replaces
//! the entire document and performs no invariant validation. Lifecycle rules
//! are enforced by the owning subsystem (`plugins::prompts`).

use crate::core::error::VaultError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Handle for a promptvault store workspace.
///
/// All registry state is scoped to a root directory: the document itself,
/// the mutation lock, and the audit event log.
#[derive(Debug, Clone)]
pub struct PromptStore {
    /// Absolute path to the store root directory.
    pub root: PathBuf,
}

impl PromptStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the persisted registry document.
    pub fn document_path(&self) -> PathBuf {
        self.root.join("prompts.json")
    }

    /// Path of the cross-process mutation lock.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("prompts.lock")
    }

    /// Path of the append-only audit event log.
    pub fn events_path(&self) -> PathBuf {
        self.root.join("prompts.events.jsonl")
    }

    /// Load the full document, or bootstrap a fresh one when no persisted
    /// state exists yet (first use, not an error).
    pub fn load<T: DeserializeOwned>(
        &self,
        bootstrap: impl FnOnce() -> T,
    ) -> Result<T, VaultError> {
        let path = self.document_path();
        if !path.exists() {
            return Ok(bootstrap());
        }
        let raw = fs::read_to_string(&path).map_err(VaultError::IoError)?;
        serde_json::from_str(&raw).map_err(|e| {
            VaultError::StorageError(format!("corrupt document at {}: {}", path.display(), e))
        })
    }

    /// Atomically replace the full document: write to a temp file in the same
    /// directory, then rename into place. A crash mid-write never produces a
    /// partially-written document.
    pub fn replace<T: Serialize>(&self, state: &T) -> Result<(), VaultError> {
        let path = self.document_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(VaultError::IoError)?;
        }
        let payload = serde_json::to_string_pretty(state)
            .map_err(|e| VaultError::StorageError(format!("unencodable document: {}", e)))?;
        let tmp_path = tmp_document_path(&path);
        fs::write(&tmp_path, payload).map_err(VaultError::IoError)?;
        fs::rename(&tmp_path, &path).map_err(VaultError::IoError)?;
        Ok(())
    }
}

fn tmp_document_path(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    final_path.with_file_name(format!(".{}.tmp", name))
}
