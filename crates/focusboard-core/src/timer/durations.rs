use serde::{Deserialize, Serialize};

use super::breaks::BreakKind;
use crate::board::BoardId;
use crate::storage::{
    Settings, DEFAULT_LONG_BREAK_INTERVAL, DEFAULT_LONG_BREAK_MINUTES, DEFAULT_POMODORO_MINUTES,
    DEFAULT_SHORT_BREAK_MINUTES,
};

/// Effective session lengths for one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub pomodoro_ms: u64,
    pub short_break_ms: u64,
    pub long_break_ms: u64,
    pub long_break_interval: u32,
}

impl Durations {
    /// Resolve lengths for items on `board`.
    ///
    /// The pomodoro length comes from the board override, then the global
    /// setting, then the built-in default. Break lengths and the interval
    /// are global only.
    pub fn resolve(settings: &Settings, board: Option<&BoardId>) -> Self {
        let local = board
            .and_then(|b| settings.board(b))
            .and_then(|b| positive(b.pomodoro_minutes));
        let timer = &settings.timer;
        Self {
            pomodoro_ms: minutes_to_ms(
                local
                    .or(positive(timer.pomodoro_minutes))
                    .unwrap_or(DEFAULT_POMODORO_MINUTES),
            ),
            short_break_ms: minutes_to_ms(
                positive(timer.short_break_minutes).unwrap_or(DEFAULT_SHORT_BREAK_MINUTES),
            ),
            long_break_ms: minutes_to_ms(
                positive(timer.long_break_minutes).unwrap_or(DEFAULT_LONG_BREAK_MINUTES),
            ),
            long_break_interval: positive(timer.long_break_interval)
                .unwrap_or(DEFAULT_LONG_BREAK_INTERVAL),
        }
    }

    pub fn break_ms(&self, kind: BreakKind) -> u64 {
        match kind {
            BreakKind::Short => self.short_break_ms,
            BreakKind::Long => self.long_break_ms,
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self::resolve(&Settings::default(), None)
    }
}

fn positive(minutes: Option<u32>) -> Option<u32> {
    minutes.filter(|m| *m > 0)
}

/// Minutes to milliseconds, saturating instead of overflowing.
pub fn minutes_to_ms(minutes: u32) -> u64 {
    u64::from(minutes).saturating_mul(60).saturating_mul(1000)
}
