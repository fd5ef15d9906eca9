//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

/// Where entities are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// Nothing survives the process.
    Memory,
    /// One JSON document file per collection under the data directory.
    #[default]
    File,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "file" | "json" => Ok(StorageKind::File),
            other => Err(format!("unknown storage kind '{other}'")),
        }
    }
}

/// Tracker configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `TRACKER_STORAGE`: `memory` or `file` (default: `file`)
/// - `TRACKER_DATA_DIR`: directory for collection files (default: `./data`)
/// - `TRACKER_USER`: console user, created if missing (default: `admin`)
///
/// Log filtering is read separately from `RUST_LOG` when tracing starts.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageKind,
    pub data_dir: PathBuf,
    pub username: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// An unrecognized `TRACKER_STORAGE` value falls back to the default with
    /// a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let storage = match std::env::var("TRACKER_STORAGE") {
            Ok(value) => value.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "ignoring TRACKER_STORAGE");
                defaults.storage
            }),
            Err(_) => defaults.storage,
        };

        Self {
            storage,
            data_dir: std::env::var("TRACKER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            username: std::env::var("TRACKER_USER").unwrap_or(defaults.username),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageKind::File,
            data_dir: PathBuf::from("./data"),
            username: "admin".to_string(),
        }
    }
}
