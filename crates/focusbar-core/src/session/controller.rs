//! The session state machine.
//!
//! One interval is always armed. The host drives it with
//! [`SessionController::on_tick`] and [`SessionController::select_interval`];
//! both take `&mut self`, so a host that shares the controller between
//! threads has to put it behind a single owner or a mutex.
//!
//! ## Completion protocol
//!
//! ```text
//! Work done  -> Rest         : record, arm ShortRest
//!            -> NewWork      : record, arm Work (fresh start time)
//!            -> RestartWork  :         arm Work (fresh start time)
//! Rest done  -> StartWork    :         arm Work (fresh start time)
//!            -> RestartRest  :         arm the same rest again
//! ```
//!
//! A failed record never blocks the transition; it is reported in
//! [`Transition::record`] and the day counter is left alone.

use std::collections::VecDeque;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use super::clock::{Clock, SystemClock};
use super::prompt::{CompletionPrompt, Decision, RestChoice, WorkChoice};
use crate::error::CoreError;
use crate::events::Event;
use crate::storage::{HistoryStore, WorkHistoryEntry};
use crate::timer::{IntervalKind, IntervalTimer, TickResult};

/// What happened to the history log during a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// The choice did not ask for a record (rest completions, RestartWork).
    NotRequested,
    Recorded { entry: WorkHistoryEntry },
    /// The store refused the write; the session moved on regardless.
    Failed { reason: String },
}

impl RecordOutcome {
    /// Non-fatal warning for the host to show, if any.
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// A completed interval and the transition it led to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub finished: IntervalKind,
    pub decision: Decision,
    pub next: IntervalKind,
    pub record: RecordOutcome,
}

/// Result of [`SessionController::on_tick`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickOutcome {
    Running { remaining_secs: u64 },
    /// The armed interval finished on this tick and the next one is armed.
    Completed(Transition),
}

/// Undrained events kept before the oldest are dropped.
pub const MAX_PENDING_EVENTS: usize = 256;

/// Owns the interval timer, the day counter and the history store.
pub struct SessionController<S, C = SystemClock> {
    store: S,
    clock: C,
    timer: IntervalTimer,
    /// Start of the most recently armed Work interval, to the second.
    pending_work_start: Option<NaiveDateTime>,
    today_count: u64,
    /// The date `today_count` was counted for.
    count_date: NaiveDate,
    /// Bounded by [`MAX_PENDING_EVENTS`].
    events: VecDeque<Event>,
}

impl<S: HistoryStore, C: Clock> SessionController<S, C> {
    /// Initialize the store, seed the day counter and arm `initial`.
    ///
    /// # Errors
    /// Returns [`CoreError::Storage`] if the store cannot be initialized or
    /// counted. There is no session without a working store.
    pub fn start(mut store: S, clock: C, initial: IntervalKind) -> Result<Self, CoreError> {
        store.initialize()?;
        let today = clock.today();
        let today_count = store.count_for_date(today)?;
        tracing::info!(%today, today_count, "session started");

        let mut controller = Self {
            store,
            clock,
            timer: IntervalTimer::new(initial),
            pending_work_start: None,
            today_count,
            count_date: today,
            events: VecDeque::new(),
        };
        controller.arm(initial);
        Ok(controller)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current_kind(&self) -> IntervalKind {
        self.timer.kind()
    }

    pub fn today_count(&self) -> u64 {
        self.today_count
    }

    pub fn remaining(&self) -> u64 {
        self.timer.remaining()
    }

    pub fn progress_fraction(&self) -> f64 {
        self.timer.progress_fraction()
    }

    pub fn pending_work_start(&self) -> Option<NaiveDateTime> {
        self.pending_work_start
    }

    pub fn timer(&self) -> &IntervalTimer {
        &self.timer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            kind: self.timer.kind(),
            required_secs: self.timer.required_secs(),
            elapsed_secs: self.timer.elapsed_secs(),
            remaining_secs: self.timer.remaining(),
            progress: self.timer.progress_fraction(),
            today_count: self.today_count,
            pending_work_start: self.pending_work_start,
            at: self.clock.now(),
        }
    }

    /// Take the events produced since the last call, oldest first.
    ///
    /// Hosts that never drain only lose the oldest events once
    /// [`MAX_PENDING_EVENTS`] are queued.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Abandon whatever is running and arm `kind` from zero.
    pub fn select_interval(&mut self, kind: IntervalKind) {
        self.refresh_day(self.clock.today());
        self.arm(kind);
    }

    /// [`select_interval`](Self::select_interval) by name.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTransition`] for an unknown name; nothing
    /// changes in that case.
    pub fn select_interval_named(&mut self, name: &str) -> Result<(), CoreError> {
        let kind = name.parse::<IntervalKind>()?;
        self.select_interval(kind);
        Ok(())
    }

    /// Feed elapsed seconds to the timer. On completion the prompt is asked
    /// for the next step and the protocol runs to the end before returning.
    pub fn on_tick<P>(&mut self, delta_secs: u64, prompt: &mut P) -> TickOutcome
    where
        P: CompletionPrompt + ?Sized,
    {
        self.refresh_day(self.clock.today());

        match self.timer.advance(delta_secs) {
            TickResult::StillRunning { remaining_secs } => TickOutcome::Running { remaining_secs },
            TickResult::JustCompleted => TickOutcome::Completed(self.complete(prompt)),
            TickResult::AlreadyComplete => {
                // complete() always re-arms, so a full timer here means the
                // protocol was bypassed. Start the same kind over.
                tracing::warn!(kind = %self.timer.kind(), "tick on a finished interval, re-arming");
                self.arm(self.timer.kind());
                TickOutcome::Running {
                    remaining_secs: self.timer.remaining(),
                }
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete<P>(&mut self, prompt: &mut P) -> Transition
    where
        P: CompletionPrompt + ?Sized,
    {
        let finished = self.timer.kind();
        self.push_event(Event::IntervalCompleted {
            kind: finished,
            at: self.now(),
        });
        tracing::info!(kind = %finished, "interval completed");

        let (decision, next, record) = match finished {
            IntervalKind::Work => {
                let choice = prompt.ask_work_completion();
                let record = if choice.records() {
                    self.record_pending_work()
                } else {
                    RecordOutcome::NotRequested
                };
                let next = match choice {
                    WorkChoice::Rest => IntervalKind::ShortRest,
                    WorkChoice::NewWork | WorkChoice::RestartWork => IntervalKind::Work,
                };
                (Decision::Work(choice), next, record)
            }
            IntervalKind::ShortRest | IntervalKind::LongRest => {
                let choice = prompt.ask_rest_completion(finished);
                let next = match choice {
                    RestChoice::StartWork => IntervalKind::Work,
                    RestChoice::RestartRest => finished,
                };
                (Decision::Rest(choice), next, RecordOutcome::NotRequested)
            }
        };

        tracing::debug!(%finished, ?decision, %next, "completion decided");
        self.arm(next);

        Transition {
            finished,
            decision,
            next,
            record,
        }
    }

    fn record_pending_work(&mut self) -> RecordOutcome {
        let now = self.now();
        let today = now.date();
        self.refresh_day(today);

        let started = self.pending_work_start.unwrap_or_else(|| {
            now - Duration::seconds(self.timer.elapsed_secs() as i64)
        });
        let entry = WorkHistoryEntry {
            date: today,
            start_time: started.time(),
        };

        match self.store.record(&entry) {
            Ok(()) => {
                if today == self.count_date {
                    self.today_count += 1;
                }
                tracing::info!(
                    date = %entry.date,
                    start_time = %entry.start_time,
                    today_count = self.today_count,
                    "work interval recorded"
                );
                self.push_event(Event::WorkRecorded {
                    date: entry.date,
                    start_time: entry.start_time,
                    today_count: self.today_count,
                });
                RecordOutcome::Recorded { entry }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to record work interval");
                let reason = e.to_string();
                self.push_event(Event::RecordFailed {
                    reason: reason.clone(),
                    at: now,
                });
                RecordOutcome::Failed { reason }
            }
        }
    }

    fn arm(&mut self, kind: IntervalKind) {
        let now = self.now();
        if kind == IntervalKind::Work {
            self.pending_work_start = Some(now);
        }
        self.timer.arm(kind);
        tracing::info!(%kind, required_secs = self.timer.required_secs(), "interval armed");
        self.push_event(Event::IntervalArmed {
            kind,
            required_secs: self.timer.required_secs(),
            at: now,
        });
    }

    fn push_event(&mut self, event: Event) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Re-seed the day counter when the calendar date has moved.
    fn refresh_day(&mut self, today: NaiveDate) {
        if today == self.count_date {
            return;
        }
        match self.store.count_for_date(today) {
            Ok(count) => {
                tracing::info!(from = %self.count_date, to = %today, today_count = count, "day rolled over");
                self.today_count = count;
                self.count_date = today;
                self.push_event(Event::DayRolledOver {
                    date: today,
                    today_count: count,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, %today, "failed to re-seed day counter, will retry");
            }
        }
    }

    /// Clock time truncated to whole seconds.
    fn now(&self) -> NaiveDateTime {
        let now = self.clock.now();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ManualClock, ScriptedPrompt};
    use crate::storage::MemoryStore;
    use chrono::NaiveTime;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn controller(
        initial: IntervalKind,
    ) -> (SessionController<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(at(9, 0, 0));
        let ctl = SessionController::start(MemoryStore::new(), clock.clone(), initial).unwrap();
        (ctl, clock)
    }

    #[test]
    fn start_arms_initial_kind() {
        let (ctl, _) = controller(IntervalKind::Work);
        assert_eq!(ctl.current_kind(), IntervalKind::Work);
        assert_eq!(ctl.remaining(), 1500);
        assert_eq!(ctl.pending_work_start(), Some(at(9, 0, 0)));
        assert_eq!(ctl.today_count(), 0);
    }

    #[test]
    fn start_seeds_today_count_from_store() {
        let date = at(0, 0, 0).date();
        let store = MemoryStore::with_entries([
            WorkHistoryEntry { date, start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap() },
            WorkHistoryEntry {
                date: date.pred_opt().unwrap(),
                start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            },
        ]);
        let ctl = SessionController::start(
            store,
            ManualClock::new(at(12, 0, 0)),
            IntervalKind::ShortRest,
        )
        .unwrap();
        assert_eq!(ctl.today_count(), 1);
        assert_eq!(ctl.pending_work_start(), None);
    }

    #[test]
    fn work_then_rest_records_and_moves_to_short_rest() {
        let (mut ctl, clock) = controller(IntervalKind::Work);
        let mut prompt = ScriptedPrompt::new([Decision::Work(WorkChoice::Rest)]);

        clock.advance(Duration::seconds(1500));
        let outcome = ctl.on_tick(1500, &mut prompt);

        let TickOutcome::Completed(transition) = outcome else {
            panic!("Expected completion");
        };
        assert_eq!(transition.finished, IntervalKind::Work);
        assert_eq!(transition.next, IntervalKind::ShortRest);
        assert_eq!(
            transition.record,
            RecordOutcome::Recorded {
                entry: WorkHistoryEntry {
                    date: at(0, 0, 0).date(),
                    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                }
            }
        );
        assert_eq!(ctl.today_count(), 1);
        assert_eq!(ctl.store().entries().len(), 1);
        assert_eq!(ctl.current_kind(), IntervalKind::ShortRest);
        assert_eq!(ctl.timer().required_secs(), 300);
        assert_eq!(ctl.timer().elapsed_secs(), 0);
    }

    #[test]
    fn new_work_records_and_captures_fresh_start() {
        let (mut ctl, clock) = controller(IntervalKind::Work);
        let mut prompt = ScriptedPrompt::new([Decision::Work(WorkChoice::NewWork)]);

        clock.advance(Duration::seconds(1500));
        ctl.on_tick(1500, &mut prompt);

        assert_eq!(ctl.today_count(), 1);
        assert_eq!(ctl.current_kind(), IntervalKind::Work);
        assert_eq!(ctl.pending_work_start(), Some(at(9, 25, 0)));
        assert_eq!(ctl.timer().elapsed_secs(), 0);
    }

    #[test]
    fn restart_work_does_not_record() {
        let (mut ctl, clock) = controller(IntervalKind::Work);
        let mut prompt = ScriptedPrompt::new([Decision::Work(WorkChoice::RestartWork)]);

        clock.advance(Duration::seconds(1500));
        let outcome = ctl.on_tick(1500, &mut prompt);

        let TickOutcome::Completed(transition) = outcome else {
            panic!("Expected completion");
        };
        assert_eq!(transition.record, RecordOutcome::NotRequested);
        assert_eq!(ctl.today_count(), 0);
        assert!(ctl.store().entries().is_empty());
        assert_eq!(ctl.current_kind(), IntervalKind::Work);
        assert_eq!(ctl.pending_work_start(), Some(at(9, 25, 0)));
    }

    #[test]
    fn restart_rest_rearms_same_kind() {
        let (mut ctl, _) = controller(IntervalKind::ShortRest);
        let mut prompt = ScriptedPrompt::new([Decision::Rest(RestChoice::RestartRest)]);

        assert_eq!(
            ctl.on_tick(299, &mut prompt),
            TickOutcome::Running { remaining_secs: 1 }
        );
        assert!(matches!(ctl.on_tick(1, &mut prompt), TickOutcome::Completed(_)));
        assert_eq!(ctl.current_kind(), IntervalKind::ShortRest);
        assert_eq!(ctl.timer().elapsed_secs(), 0);
        assert_eq!(ctl.timer().required_secs(), 300);
        assert!(ctl.store().entries().is_empty());
    }

    #[test]
    fn long_rest_start_work_captures_start() {
        let (mut ctl, clock) = controller(IntervalKind::LongRest);
        let mut prompt = ScriptedPrompt::new([Decision::Rest(RestChoice::StartWork)]);

        clock.advance(Duration::minutes(15));
        ctl.on_tick(900, &mut prompt);

        assert_eq!(ctl.current_kind(), IntervalKind::Work);
        assert_eq!(ctl.pending_work_start(), Some(at(9, 15, 0)));
    }

    #[test]
    fn record_failure_still_transitions() {
        let clock = ManualClock::new(at(9, 0, 0));
        let mut store = MemoryStore::new();
        store.fail_writes = true;
        let mut ctl = SessionController::start(store, clock.clone(), IntervalKind::Work).unwrap();
        let mut prompt = ScriptedPrompt::new([Decision::Work(WorkChoice::Rest)]);

        let outcome = ctl.on_tick(1500, &mut prompt);

        let TickOutcome::Completed(transition) = outcome else {
            panic!("Expected completion");
        };
        assert!(transition.record.warning().is_some());
        assert_eq!(ctl.today_count(), 0);
        assert_eq!(ctl.current_kind(), IntervalKind::ShortRest);
        assert_eq!(ctl.timer().elapsed_secs(), 0);
        assert!(ctl
            .drain_events()
            .iter()
            .any(|e| matches!(e, Event::RecordFailed { .. })));
    }

    #[test]
    fn rest_kind_selection_keeps_pending_work_start() {
        let (mut ctl, clock) = controller(IntervalKind::Work);
        clock.advance(Duration::minutes(3));
        ctl.select_interval(IntervalKind::LongRest);
        assert_eq!(ctl.pending_work_start(), Some(at(9, 0, 0)));
        assert_eq!(ctl.remaining(), 900);

        ctl.select_interval(IntervalKind::Work);
        assert_eq!(ctl.pending_work_start(), Some(at(9, 3, 0)));
    }

    #[test]
    fn unknown_interval_name_leaves_state_alone() {
        let (mut ctl, _) = controller(IntervalKind::Work);
        let mut prompt = ScriptedPrompt::default();
        ctl.on_tick(100, &mut prompt);

        let err = ctl.select_interval_named("siesta").unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(_)));
        assert_eq!(ctl.current_kind(), IntervalKind::Work);
        assert_eq!(ctl.timer().elapsed_secs(), 100);

        ctl.select_interval_named("short_rest").unwrap();
        assert_eq!(ctl.current_kind(), IntervalKind::ShortRest);
    }

    #[test]
    fn overshooting_tick_completes_once() {
        let (mut ctl, _) = controller(IntervalKind::ShortRest);
        let mut prompt = ScriptedPrompt::new([Decision::Rest(RestChoice::RestartRest)]);

        assert!(matches!(ctl.on_tick(10_000, &mut prompt), TickOutcome::Completed(_)));
        assert_eq!(prompt.asked().len(), 1);
        assert_eq!(ctl.timer().elapsed_secs(), 0);
        assert_eq!(
            ctl.on_tick(1, &mut prompt),
            TickOutcome::Running { remaining_secs: 299 }
        );
    }

    #[test]
    fn date_is_taken_at_record_time() {
        let clock = ManualClock::new(at(23, 50, 0));
        let mut ctl =
            SessionController::start(MemoryStore::new(), clock.clone(), IntervalKind::Work).unwrap();
        let mut prompt = ScriptedPrompt::new([Decision::Work(WorkChoice::Rest)]);

        clock.advance(Duration::minutes(25));
        ctl.on_tick(1500, &mut prompt);

        let entry = ctl.store().entries()[0];
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(entry.start_time, NaiveTime::from_hms_opt(23, 50, 0).unwrap());
        assert_eq!(ctl.today_count(), 1);
    }

    #[test]
    fn day_rollover_reseeds_counter() {
        let (mut ctl, clock) = controller(IntervalKind::Work);
        let mut prompt = ScriptedPrompt::new([
            Decision::Work(WorkChoice::NewWork),
            Decision::Work(WorkChoice::NewWork),
        ]);
        ctl.on_tick(1500, &mut prompt);
        ctl.on_tick(1500, &mut prompt);
        assert_eq!(ctl.today_count(), 2);

        clock.set(at(0, 0, 0) + Duration::days(1));
        ctl.on_tick(1, &mut prompt);
        assert_eq!(ctl.today_count(), 0);
        assert!(ctl
            .drain_events()
            .iter()
            .any(|e| matches!(e, Event::DayRolledOver { today_count: 0, .. })));
    }

    #[test]
    fn events_track_arming_and_completion() {
        let (mut ctl, _) = controller(IntervalKind::ShortRest);
        let mut prompt = ScriptedPrompt::new([Decision::Rest(RestChoice::StartWork)]);
        ctl.drain_events();

        ctl.on_tick(300, &mut prompt);
        let events = ctl.drain_events();
        assert!(matches!(
            events[0],
            Event::IntervalCompleted { kind: IntervalKind::ShortRest, .. }
        ));
        assert!(matches!(
            events[1],
            Event::IntervalArmed { kind: IntervalKind::Work, required_secs: 1500, .. }
        ));
        assert!(ctl.drain_events().is_empty());
    }

    #[test]
    fn undrained_events_are_bounded() {
        let (mut ctl, _) = controller(IntervalKind::Work);
        for _ in 0..MAX_PENDING_EVENTS {
            ctl.select_interval(IntervalKind::ShortRest);
        }
        ctl.select_interval(IntervalKind::LongRest);

        let events = ctl.drain_events();
        assert_eq!(events.len(), MAX_PENDING_EVENTS);
        assert!(matches!(
            events.last(),
            Some(Event::IntervalArmed { kind: IntervalKind::LongRest, .. })
        ));
        assert!(events
            .iter()
            .all(|e| !matches!(e, Event::IntervalArmed { kind: IntervalKind::Work, .. })));
    }

    #[test]
    fn unanswered_work_prompt_logs_nothing() {
        let (mut ctl, _) = controller(IntervalKind::Work);
        let outcome = ctl.on_tick(1500, &mut ScriptedPrompt::default());

        let TickOutcome::Completed(transition) = outcome else {
            panic!("Expected completion");
        };
        assert_eq!(transition.decision, Decision::Work(WorkChoice::RestartWork));
        assert_eq!(transition.record, RecordOutcome::NotRequested);
        assert_eq!(transition.next, IntervalKind::Work);
        assert!(ctl.store().entries().is_empty());
        assert_eq!(ctl.today_count(), 0);
    }

    #[test]
    fn snapshot_reports_progress() {
        let (mut ctl, _) = controller(IntervalKind::Work);
        ctl.on_tick(750, &mut ScriptedPrompt::default());
        match ctl.snapshot() {
            Event::StateSnapshot {
                kind,
                remaining_secs,
                progress,
                today_count,
                ..
            } => {
                assert_eq!(kind, IntervalKind::Work);
                assert_eq!(remaining_secs, 750);
                assert_eq!(progress, 0.5);
                assert_eq!(today_count, 0);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
