//! Per-item and per-day aggregation over finalized sessions.
//!
//! Breaks are recorded like any other session but never count as focus.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::board::ItemId;
use crate::session::FocusSession;

/// Focused milliseconds logged against `item`.
pub fn total_focused_ms(sessions: &[FocusSession], item: &ItemId) -> u64 {
    sessions
        .iter()
        .filter(|s| s.mode.is_focus() && s.item_id.as_ref() == Some(item))
        .map(|s| s.duration_ms)
        .sum()
}

/// Sessions whose start falls on `date` in local time, oldest first.
pub fn sessions_on(sessions: &[FocusSession], date: NaiveDate) -> Vec<FocusSession> {
    let mut day: Vec<_> = sessions
        .iter()
        .filter(|s| local_date(s.start_epoch_ms) == Some(date))
        .cloned()
        .collect();
    day.sort_by_key(|s| s.start_epoch_ms);
    day
}

/// Focused milliseconds per local calendar day.
pub fn daily_totals(sessions: &[FocusSession]) -> BTreeMap<NaiveDate, u64> {
    let mut totals = BTreeMap::new();
    for session in sessions.iter().filter(|s| s.mode.is_focus()) {
        if let Some(date) = local_date(session.start_epoch_ms) {
            *totals.entry(date).or_insert(0) += session.duration_ms;
        }
    }
    totals
}

/// Focused milliseconds per item.
pub fn item_totals(sessions: &[FocusSession]) -> BTreeMap<ItemId, u64> {
    let mut totals = BTreeMap::new();
    for session in sessions.iter().filter(|s| s.mode.is_focus()) {
        if let Some(item) = &session.item_id {
            *totals.entry(item.clone()).or_insert(0) += session.duration_ms;
        }
    }
    totals
}

/// One day's sessions with its focus total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub focused_ms: u64,
    pub break_ms: u64,
    pub sessions: Vec<FocusSession>,
}

impl DayReport {
    pub fn build(sessions: &[FocusSession], date: NaiveDate) -> Self {
        let sessions = sessions_on(sessions, date);
        let (focus, rest): (Vec<_>, Vec<_>) = sessions.iter().partition(|s| s.mode.is_focus());
        Self {
            date,
            focused_ms: focus.iter().map(|s| s.duration_ms).sum(),
            break_ms: rest.iter().map(|s| s.duration_ms).sum(),
            sessions,
        }
    }
}

/// `"1 h 05 min"` / `"25 min"` for display.
pub fn format_focused(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    if hours > 0 {
        format!("{hours} h {minutes:02} min")
    } else {
        format!("{minutes} min")
    }
}

fn local_date(epoch_ms: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|dt| dt.date_naive())
}
