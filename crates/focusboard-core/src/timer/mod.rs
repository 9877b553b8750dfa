mod breaks;
mod durations;
mod engine;
pub mod ticker;

pub use breaks::{break_after, BreakCycle, BreakKind};
pub use durations::{minutes_to_ms, Durations};
pub use engine::{
    Completion, EngineSnapshot, PendingStop, Phase, StartOutcome, StopOutcome, TimerEngine,
    TimerState, TimerStatus, Toggled,
};
