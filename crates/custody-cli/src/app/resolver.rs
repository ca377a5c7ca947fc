//! Path resolution for config and database files.

use std::path::{Path, PathBuf};

use crate::config::default_config_path;

/// Resolve the config file path, checking CUSTODY_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("CUSTODY_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Error message when the database file is missing.
pub fn missing_db_message(path: &Path) -> String {
    format!("Database not found: {}", path.display())
}

/// Error message when the config file is missing.
pub fn missing_config_message(config_path: &Path) -> String {
    format!("Config file not found: {}", config_path.display())
}

pub const INIT_HINT: &str =
    "Run `custody init`, or pass --db /path/to/custody.db (or set CUSTODY_DB).";
