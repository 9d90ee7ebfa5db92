//! Interval timer implementation.
//!
//! The timer does not own a clock or a thread. The caller delivers elapsed
//! whole seconds through [`IntervalTimer::advance`], usually once per second,
//! but a delayed host may hand over a larger catch-up delta in one call.
//!
//! ## Lifecycle
//!
//! ```text
//! arm(kind) -> advance(..) StillRunning* -> JustCompleted -> AlreadyComplete*
//!     ^                                                          |
//!     +---------------------------- arm(kind) -------------------+
//! ```
//!
//! ## Usage
//!
//! ```
//! use focusbar_core::timer::{IntervalKind, IntervalTimer, TickResult};
//!
//! let mut timer = IntervalTimer::new(IntervalKind::ShortRest);
//! assert_eq!(timer.advance(299), TickResult::StillRunning { remaining_secs: 1 });
//! assert_eq!(timer.advance(1), TickResult::JustCompleted);
//! assert_eq!(timer.advance(1), TickResult::AlreadyComplete);
//! ```

use serde::{Deserialize, Serialize};

use super::interval::IntervalKind;

/// Result of a single [`IntervalTimer::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickResult {
    StillRunning { remaining_secs: u64 },
    /// Reported on the one call that makes elapsed reach required.
    JustCompleted,
    /// The timer was already full; nothing changed.
    AlreadyComplete,
}

/// Elapsed-versus-required counter for the current interval.
///
/// Invariant: `elapsed_secs <= required_secs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalTimer {
    kind: IntervalKind,
    required_secs: u64,
    elapsed_secs: u64,
}

impl IntervalTimer {
    /// Create a timer already armed for `kind`.
    pub fn new(kind: IntervalKind) -> Self {
        Self {
            kind,
            required_secs: kind.duration_secs(),
            elapsed_secs: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn kind(&self) -> IntervalKind {
        self.kind
    }

    pub fn required_secs(&self) -> u64 {
        self.required_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn remaining(&self) -> u64 {
        self.required_secs - self.elapsed_secs
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed_secs == self.required_secs
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress_fraction(&self) -> f64 {
        if self.required_secs == 0 {
            return 1.0;
        }
        self.elapsed_secs as f64 / self.required_secs as f64
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Reset to zero elapsed with the fixed duration for `kind`.
    pub fn arm(&mut self, kind: IntervalKind) {
        self.kind = kind;
        self.required_secs = kind.duration_secs();
        self.elapsed_secs = 0;
    }

    /// Add `delta_secs` to elapsed, clamped at the required duration.
    pub fn advance(&mut self, delta_secs: u64) -> TickResult {
        if self.is_complete() {
            return TickResult::AlreadyComplete;
        }
        self.elapsed_secs = self
            .elapsed_secs
            .saturating_add(delta_secs)
            .min(self.required_secs);
        if self.is_complete() {
            TickResult::JustCompleted
        } else {
            TickResult::StillRunning {
                remaining_secs: self.remaining(),
            }
        }
    }
}
