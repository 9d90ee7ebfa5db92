use chrono::NaiveDate;

use super::{HistoryStore, WorkHistoryEntry};
use crate::error::StorageError;

/// Volatile history log for simulations and tests.
///
/// `fail_writes` makes every `record` call fail with [`StorageError::ReadOnly`],
/// which stands in for a full or write-protected disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Vec<WorkHistoryEntry>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = WorkHistoryEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            fail_writes: false,
        }
    }

    pub fn entries(&self) -> &[WorkHistoryEntry] {
        &self.entries
    }
}

impl HistoryStore for MemoryStore {
    fn initialize(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn record(&mut self, entry: &WorkHistoryEntry) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::ReadOnly);
        }
        self.entries.push(*entry);
        Ok(())
    }

    fn count_for_date(&self, date: NaiveDate) -> Result<u64, StorageError> {
        Ok(self.entries.iter().filter(|e| e.date == date).count() as u64)
    }
}
