use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Short,
    Long,
}

/// Break length after the `completed`-th pomodoro: long on every
/// `interval`-th one, short otherwise. An interval of zero is treated as one.
pub fn break_after(completed: u64, interval: u32) -> BreakKind {
    let interval = u64::from(interval.max(1));
    if completed % interval == 0 {
        BreakKind::Long
    } else {
        BreakKind::Short
    }
}

/// Count of pomodoros that ran to completion.
///
/// Only automatic completion counts; a pomodoro stopped by hand does not
/// move the cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakCycle {
    completed: u64,
}

impl BreakCycle {
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Count one more completed pomodoro and return the new total.
    pub fn record_pomodoro(&mut self) -> u64 {
        self.completed = self.completed.saturating_add(1);
        self.completed
    }

    /// Break to take now, given the pomodoros completed so far.
    pub fn next_break(&self, interval: u32) -> BreakKind {
        break_after(self.completed, interval)
    }
}
