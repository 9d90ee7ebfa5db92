mod config;
pub mod database;
mod memory;
pub mod migrations;

pub use config::{Config, KeysConfig, LogConfig, TimerConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, StorageError};

/// One logged Work interval: the calendar date it was recorded on and the
/// time of day it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkHistoryEntry {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
}

/// Append-only log of completed Work intervals.
pub trait HistoryStore {
    /// Ensure the log exists. Idempotent.
    fn initialize(&mut self) -> Result<(), StorageError>;

    /// Append one entry durably. Either the row is written or an error is
    /// returned; there is no partial state.
    fn record(&mut self, entry: &WorkHistoryEntry) -> Result<(), StorageError>;

    /// Number of entries whose date equals `date`.
    fn count_for_date(&self, date: NaiveDate) -> Result<u64, StorageError>;
}

/// Returns the focusbar data directory, creating it if needed.
///
/// Resolution order:
/// 1. `FOCUSBAR_DATA_DIR` if set
/// 2. `~/.config/focusbar-dev/` when `FOCUSBAR_ENV=dev`
/// 3. `~/.config/focusbar/`
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = match std::env::var_os("FOCUSBAR_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCUSBAR_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusbar-dev")
            } else {
                base_dir.join("focusbar")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
