//! Mutation broker: the single corridor for registry writes.
//!
//! Every mutating operation is a full load–mutate–replace cycle over the
//! whole document. Two such cycles racing would silently clobber each other's
//! entries, so the broker serializes them: an in-process lock for threads
//! sharing this process, and a lock file for independent processes sharing
//! the store. It also appends one audit event per mutation attempt.

use crate::core::error::VaultError;
use crate::core::store::PromptStore;
use crate::core::time;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const LOCK_ATTEMPTS: u32 = 10;
const LOCK_RETRY_BASE_MS: u64 = 15;

#[derive(Serialize, Debug, Clone)]
pub struct RegistryEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub key: String,
    pub status: String,
}

pub struct RegistryBroker;

impl RegistryBroker {
    /// Run a mutation against the store under the full serialization
    /// discipline. The document is replaced only when the closure succeeds;
    /// the audit event records the outcome either way.
    pub fn with_state<T, R, F>(
        store: &PromptStore,
        actor: &str,
        op: &str,
        key: &str,
        bootstrap: impl FnOnce() -> T,
        f: F,
    ) -> Result<R, VaultError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<R, VaultError>,
    {
        // In-process serialization; the lock file below covers other processes.
        static STORE_LOCK: Mutex<()> = Mutex::new(());
        let _guard = STORE_LOCK
            .lock()
            .map_err(|_| VaultError::LockError("in-process store lock poisoned".to_string()))?;

        fs::create_dir_all(&store.root).map_err(VaultError::IoError)?;
        let _lease = acquire_lock(&store.lock_path())?;

        let mut state: T = store.load(bootstrap)?;
        let result = f(&mut state);
        let result = match result {
            Ok(value) => store.replace(&state).map(|()| value),
            Err(e) => Err(e),
        };

        let status = if result.is_ok() { "success" } else { "error" };
        log_event(&store.events_path(), actor, op, key, status)?;

        result
    }
}

/// Single-winner lock acquisition: `create_new` wins or loses atomically.
/// Contention is retried with jittered backoff; exhaustion surfaces as a
/// `LockError` so callers treat the registry as temporarily unavailable.
fn acquire_lock(lock_path: &Path) -> Result<StoreLease, VaultError> {
    for attempt in 0..LOCK_ATTEMPTS {
        match OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
        {
            Ok(file) => {
                return Ok(StoreLease {
                    path: lock_path.to_path_buf(),
                    _file: file,
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                let backoff = LOCK_RETRY_BASE_MS * u64::from(attempt + 1) + jitter_ms(10);
                std::thread::sleep(Duration::from_millis(backoff));
            }
            Err(err) => return Err(VaultError::IoError(err)),
        }
    }
    Err(VaultError::LockError(format!(
        "could not acquire {} after {} attempts",
        lock_path.display(),
        LOCK_ATTEMPTS
    )))
}

fn jitter_ms(max_exclusive: u64) -> u64 {
    if max_exclusive <= 1 {
        return 0;
    }
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    now_ms % max_exclusive
}

struct StoreLease {
    path: PathBuf,
    _file: File,
}

impl Drop for StoreLease {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn log_event(
    events_path: &Path,
    actor: &str,
    op: &str,
    key: &str,
    status: &str,
) -> Result<(), VaultError> {
    use std::io::Write;

    let ev = RegistryEvent {
        ts: time::now_epoch_z(),
        event_id: time::new_event_id(),
        actor: actor.to_string(),
        op: op.to_string(),
        key: key.to_string(),
        status: status.to_string(),
    };
    let line = serde_json::to_string(&ev)
        .map_err(|e| VaultError::StorageError(format!("unencodable audit event: {}", e)))?;

    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(events_path)
        .map_err(VaultError::IoError)?;
    writeln!(f, "{}", line).map_err(VaultError::IoError)?;
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "broker",
        "version": "0.1.0",
        "description": "Serialized load-mutate-replace corridor for registry state",
        "storage": ["prompts.json", "prompts.lock", "prompts.events.jsonl"],
        "notes": "Mutations are serialized per store; reads rely on atomic document replace"
    })
}
