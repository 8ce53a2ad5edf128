//! Optional `promptvault.toml` configuration.
//!
//! A missing config file is not an error; defaults apply. The store root
//! resolution order (env var, config file, fixed default) lives in
//! [`crate::run`].

use crate::core::error::VaultError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "promptvault.toml";

/// Default store root, relative to the working directory.
pub const DEFAULT_STORE_DIR: &str = ".promptvault/data";

/// Environment variable overriding the store root.
pub const STORE_ENV_VAR: &str = "PROMPTVAULT_STORE";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VaultConfig {
    #[serde(default)]
    pub store: StoreSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreSection {
    /// Store root directory; relative paths resolve against the config dir.
    pub path: Option<PathBuf>,
}

/// Load `promptvault.toml` from `dir`. No config = defaults (not an error).
pub fn load_config(dir: &Path) -> Result<VaultConfig, VaultError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(VaultConfig::default());
    }
    let content = fs::read_to_string(&config_path).map_err(VaultError::IoError)?;
    toml::from_str(&content).map_err(|e| {
        VaultError::ValidationError(format!("invalid {}: {}", config_path.display(), e))
    })
}

/// Resolve the store root: `PROMPTVAULT_STORE` env var wins, then the config
/// file, then the fixed default under `dir`.
pub fn resolve_store_root(dir: &Path) -> Result<PathBuf, VaultError> {
    if let Ok(env_root) = std::env::var(STORE_ENV_VAR) {
        if !env_root.trim().is_empty() {
            return Ok(PathBuf::from(env_root));
        }
    }
    let config = load_config(dir)?;
    if let Some(path) = config.store.path {
        if path.is_absolute() {
            return Ok(path);
        }
        return Ok(dir.join(path));
    }
    Ok(dir.join(DEFAULT_STORE_DIR))
}
