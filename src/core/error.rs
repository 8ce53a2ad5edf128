use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Storage failure: {0}")]
    StorageError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Version {version} not in retained history for key {key}")]
    VersionNotFound { key: String, version: u32 },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Lock contention: {0}")]
    LockError(String),
}
