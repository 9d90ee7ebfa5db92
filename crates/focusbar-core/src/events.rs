use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::timer::IntervalKind;

/// Every state change the session controller makes produces an Event.
/// Hosts print, log or render them; the controller never reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    IntervalArmed {
        kind: IntervalKind,
        required_secs: u64,
        at: NaiveDateTime,
    },
    IntervalCompleted {
        kind: IntervalKind,
        at: NaiveDateTime,
    },
    WorkRecorded {
        date: NaiveDate,
        start_time: NaiveTime,
        today_count: u64,
    },
    /// The history store refused a write. The session carried on.
    RecordFailed {
        reason: String,
        at: NaiveDateTime,
    },
    /// The calendar date changed and the day counter was re-seeded.
    DayRolledOver {
        date: NaiveDate,
        today_count: u64,
    },
    StateSnapshot {
        kind: IntervalKind,
        required_secs: u64,
        elapsed_secs: u64,
        remaining_secs: u64,
        progress: f64,
        today_count: u64,
        pending_work_start: Option<NaiveDateTime>,
        at: NaiveDateTime,
    },
}
