mod engine;
mod interval;

pub use engine::{IntervalTimer, TickResult};
pub use interval::IntervalKind;
