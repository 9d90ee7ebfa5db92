//! Core error types for focusbar-core.
//!
//! Storage failures are split out into [`StorageError`] so callers can tell a
//! fatal startup failure (the store could not be opened or migrated) from a
//! recoverable one (a single `record` call failed mid-session).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusbar-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The history store could not persist or query.
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A request named an interval kind or choice that does not exist.
    #[error("Invalid transition: unrecognized '{0}'")]
    InvalidTransition(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// History store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The medium refused the write (permissions, read-only mount, query_only).
    #[error("Database is read-only")]
    ReadOnly,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => match e.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    StorageError::Locked
                }
                rusqlite::ErrorCode::ReadOnly => StorageError::ReadOnly,
                _ => StorageError::QueryFailed(err.to_string()),
            },
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readonly_sqlite_error_maps_to_readonly() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_READONLY),
            None,
        );
        assert!(matches!(StorageError::from(err), StorageError::ReadOnly));
    }

    #[test]
    fn other_sqlite_errors_keep_message() {
        let err = StorageError::from(rusqlite::Error::QueryReturnedNoRows);
        match err {
            StorageError::QueryFailed(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected QueryFailed, got {other:?}"),
        }
    }

    #[test]
    fn invalid_transition_names_the_input() {
        let err = CoreError::InvalidTransition("nap".into());
        assert!(err.to_string().contains("nap"));
    }
}
