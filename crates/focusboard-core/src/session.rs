use serde::{Deserialize, Serialize};

use crate::board::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Stopwatch,
    Pomodoro,
    Break,
}

impl TimerMode {
    /// Pomodoro and break sessions end on their own; a stopwatch runs
    /// until stopped.
    pub fn is_timed(self) -> bool {
        matches!(self, TimerMode::Pomodoro | TimerMode::Break)
    }

    /// Whether time in this mode counts as focused work.
    pub fn is_focus(self) -> bool {
        matches!(self, TimerMode::Stopwatch | TimerMode::Pomodoro)
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Stopwatch => "stopwatch",
            TimerMode::Pomodoro => "pomodoro",
            TimerMode::Break => "break",
        }
    }
}

impl std::str::FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stopwatch" => Ok(TimerMode::Stopwatch),
            "pomodoro" => Ok(TimerMode::Pomodoro),
            "break" => Ok(TimerMode::Break),
            other => Err(format!("unknown timer mode: {other}")),
        }
    }
}

/// One finalized span of time against one item.
///
/// Immutable once built; `duration_ms == end_epoch_ms - start_epoch_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub item_id: Option<ItemId>,
    /// Title at the time the session was finalized.
    pub item_title: Option<String>,
    pub mode: TimerMode,
    pub start_epoch_ms: i64,
    pub end_epoch_ms: i64,
    pub duration_ms: u64,
}

impl FocusSession {
    /// Build a session from its span. A reversed span is clamped to zero
    /// length at `start_epoch_ms`.
    pub fn new(
        item_id: Option<ItemId>,
        item_title: Option<String>,
        mode: TimerMode,
        start_epoch_ms: i64,
        end_epoch_ms: i64,
    ) -> Self {
        let end_epoch_ms = end_epoch_ms.max(start_epoch_ms);
        Self {
            item_id,
            item_title,
            mode,
            start_epoch_ms,
            end_epoch_ms,
            duration_ms: (end_epoch_ms - start_epoch_ms) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_span_is_clamped() {
        let s = FocusSession::new(None, None, TimerMode::Stopwatch, 5_000, 1_000);
        assert_eq!(s.end_epoch_ms, 5_000);
        assert_eq!(s.duration_ms, 0);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Pomodoro".parse::<TimerMode>(), Ok(TimerMode::Pomodoro));
        assert!("nap".parse::<TimerMode>().is_err());
        assert!(!TimerMode::Break.is_focus());
        assert!(!TimerMode::Stopwatch.is_timed());
    }
}
