//! # focusbar Core Library
//!
//! This library provides the session timer and history engine behind the
//! focusbar overlay timer. Every host (the terminal CLI, a GUI overlay) is a
//! thin layer that feeds ticks and hotkeys in and renders readouts out.
//!
//! ## Architecture
//!
//! - **Interval Timer**: elapsed-versus-required counter with exactly-once
//!   completion; the caller delivers elapsed seconds through `advance()`
//! - **Session Controller**: the state machine that arms intervals, runs the
//!   end-of-interval decision protocol and keeps the "completed today" count
//! - **Storage**: SQLite work history and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`IntervalTimer`]: per-interval progress and completion
//! - [`SessionController`]: interval selection, completion protocol, day counter
//! - [`CompletionPrompt`]: the decision contract a host implements
//! - [`HistoryStore`] / [`Database`]: append-only log of logged Work intervals
//! - [`Config`]: host configuration management

pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use session::{
    Clock, CompletionPrompt, Decision, ManualClock, RecordOutcome, RestChoice, ScriptedPrompt,
    SessionController, SystemClock, TickOutcome, Transition, WorkChoice,
};
pub use storage::{Config, Database, HistoryStore, MemoryStore, WorkHistoryEntry};
pub use timer::{IntervalKind, IntervalTimer, TickResult};
