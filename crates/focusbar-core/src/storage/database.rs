//! SQLite-backed work history.
//!
//! One row per logged Work interval, `(date, time)` as ISO-8601 text.
//! Rows are only ever inserted; nothing in focusbar updates or deletes them.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};

use super::{data_dir, migrations, HistoryStore, WorkHistoryEntry};
use crate::error::{CoreError, StorageError};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// SQLite database holding the work history log.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/focusbar.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory, the file or the schema cannot
    /// be set up.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("focusbar.db");
        Ok(Self::open_at(path)?)
    }

    /// Open (creating if needed) the database file at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut db = Self { conn };
        db.initialize()?;
        tracing::debug!(path = %path.display(), "history database opened");
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Entries recorded on `date`, ordered by start time.
    ///
    /// Rows whose time column cannot be parsed (hand-edited files) are
    /// skipped with a warning.
    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<WorkHistoryEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT time FROM work_history
             WHERE date = ?1
             ORDER BY time, id",
        )?;
        let rows = stmt.query_map(params![date.format(DATE_FORMAT).to_string()], |row| {
            row.get::<_, String>(0)
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let raw = row?;
            match NaiveTime::parse_from_str(&raw, TIME_FORMAT) {
                Ok(start_time) => entries.push(WorkHistoryEntry { date, start_time }),
                Err(e) => tracing::warn!(%date, time = %raw, error = %e, "skipping malformed history row"),
            }
        }
        Ok(entries)
    }
}

impl HistoryStore for Database {
    fn initialize(&mut self) -> Result<(), StorageError> {
        migrations::migrate(&self.conn)
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))
    }

    fn record(&mut self, entry: &WorkHistoryEntry) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO work_history (date, time) VALUES (?1, ?2)",
            params![
                entry.date.format(DATE_FORMAT).to_string(),
                entry.start_time.format(TIME_FORMAT).to_string(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn count_for_date(&self, date: NaiveDate) -> Result<u64, StorageError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM work_history WHERE date = ?1",
            params![date.format(DATE_FORMAT).to_string()],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(count)
    }
}
