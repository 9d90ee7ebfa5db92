mod clock;
mod controller;
mod prompt;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{
    RecordOutcome, SessionController, TickOutcome, Transition, MAX_PENDING_EVENTS,
};
pub use prompt::{CompletionPrompt, Decision, RestChoice, ScriptedPrompt, WorkChoice};
