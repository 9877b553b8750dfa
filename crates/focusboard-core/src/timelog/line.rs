//! The session log line.
//!
//! ```text
//! [bullet] <marker> @{YYYY-MM-DD} @@{HH:MM} <dash> @@{HH:MM} (<minutes> m)
//! ```
//!
//! Markers: `++` for a stopwatch session (`⏱` is read as the same),
//! `🍅` for a pomodoro and `☕` for a break. Any of `-`, `–`, `—` may
//! separate the times. Lines that do not match are simply not log lines.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use regex::Regex;

use crate::session::{FocusSession, TimerMode};

static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?:[-*+]\s+(?:\[[ xX]\]\s+)?)?",
        r"(?P<marker>\+\+|🍅|☕|⏱\x{FE0F}?)\s*",
        r"@\{(?P<date>\d{4}-\d{2}-\d{2})\}\s*",
        r"@@\{(?P<start>\d{1,2}:\d{2})\}\s*[-–—]\s*",
        r"@@\{(?P<end>\d{1,2}:\d{2})\}\s*",
        r"\(\s*(?P<minutes>\d+)\s*m\)?",
    ))
    .expect("log line pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Logged,
    Pomodoro,
    Break,
}

impl Marker {
    pub fn for_mode(mode: TimerMode) -> Self {
        match mode {
            TimerMode::Stopwatch => Marker::Logged,
            TimerMode::Pomodoro => Marker::Pomodoro,
            TimerMode::Break => Marker::Break,
        }
    }

    pub fn mode(self) -> TimerMode {
        match self {
            Marker::Logged => TimerMode::Stopwatch,
            Marker::Pomodoro => TimerMode::Pomodoro,
            Marker::Break => TimerMode::Break,
        }
    }

    fn token(self) -> &'static str {
        match self {
            Marker::Logged => "++",
            Marker::Pomodoro => "🍅",
            Marker::Break => "☕",
        }
    }

    fn from_token(token: &str) -> Self {
        match token {
            "🍅" => Marker::Pomodoro,
            "☕" => Marker::Break,
            _ => Marker::Logged,
        }
    }
}

/// A parsed or to-be-written log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub marker: Marker,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub minutes: u64,
}

impl LogLine {
    pub fn parse(line: &str) -> Option<Self> {
        let caps = LOG_LINE.captures(line)?;
        Some(Self {
            marker: Marker::from_token(&caps["marker"]),
            date: NaiveDate::parse_from_str(&caps["date"], "%Y-%m-%d").ok()?,
            start: NaiveTime::parse_from_str(&caps["start"], "%H:%M").ok()?,
            end: NaiveTime::parse_from_str(&caps["end"], "%H:%M").ok()?,
            minutes: caps["minutes"].parse().ok()?,
        })
    }

    /// Line for a finalized session, in local time. `None` if the start
    /// instant is out of range for the calendar.
    pub fn from_session(session: &FocusSession) -> Option<Self> {
        let start = Local.timestamp_millis_opt(session.start_epoch_ms).single()?;
        let end = Local.timestamp_millis_opt(session.end_epoch_ms).single()?;
        Some(Self {
            marker: Marker::for_mode(session.mode),
            date: start.date_naive(),
            start: truncate_to_minute(start.time()),
            end: truncate_to_minute(end.time()),
            minutes: (session.duration_ms as f64 / 60_000.0).round() as u64,
        })
    }

    pub fn mode(&self) -> TimerMode {
        self.marker.mode()
    }

    /// Start and end as epoch milliseconds in local time.
    ///
    /// An end time earlier than the start time belongs to the next day.
    /// Returns `None` for wall-clock times that do not exist locally.
    pub fn span_ms(&self) -> Option<(i64, i64)> {
        let start = NaiveDateTime::new(self.date, self.start);
        let mut end = NaiveDateTime::new(self.date, self.end);
        if end < start {
            end += Duration::days(1);
        }
        Some((local_epoch_ms(start)?, local_epoch_ms(end)?))
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @{{{}}} @@{{{}}} – @@{{{}}} ({} m)",
            self.marker.token(),
            self.date.format("%Y-%m-%d"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.minutes
        )
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

fn local_epoch_ms(at: NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(&at)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_ms(date: &str, time: &str) -> i64 {
        let at =
            NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").unwrap();
        local_epoch_ms(at).unwrap()
    }

    #[test]
    fn parses_stopwatch_line_without_closing_paren() {
        let line = LogLine::parse("++ @{2024-01-01} @@{09:00} – @@{09:25} (25 m").unwrap();
        assert_eq!(line.marker, Marker::Logged);
        assert_eq!(line.minutes, 25);
        let (start, end) = line.span_ms().unwrap();
        assert_eq!(start, local_ms("2024-01-01", "09:00"));
        assert_eq!(end, local_ms("2024-01-01", "09:25"));
    }

    #[test]
    fn accepts_bullets_markers_and_dashes() {
        let cases = [
            ("- 🍅 @{2024-03-05} @@{14:00} - @@{14:25} (25 m)", Marker::Pomodoro),
            ("* [x] ++ @{2024-03-05} @@{8:05} — @@{8:35} (30 m)", Marker::Logged),
            ("\t+ ☕ @{2024-03-05} @@{14:25} – @@{14:30} (5 m)", Marker::Break),
            ("⏱️ @{2024-03-05} @@{10:00} – @@{10:10} (10 m)", Marker::Logged),
        ];
        for (text, marker) in cases {
            let line = LogLine::parse(text).unwrap_or_else(|| panic!("no match: {text}"));
            assert_eq!(line.marker, marker, "{text}");
        }
    }

    #[test]
    fn rejects_non_log_lines() {
        for text in [
            "Write the report",
            "++ @{2024-13-01} @@{09:00} – @@{09:25} (25 m)",
            "++ @{2024-01-01} @@{09:00} @@{09:25} (25 m)",
            "++ @{2024-01-01} @@{09:00} – @@{09:25}",
            "due:@{2024-01-01}",
        ] {
            assert!(LogLine::parse(text).is_none(), "{text}");
        }
    }

    #[test]
    fn end_before_start_rolls_to_next_day() {
        let line = LogLine::parse("++ @{2024-01-01} @@{23:50} – @@{00:10} (20 m)").unwrap();
        let (start, end) = line.span_ms().unwrap();
        assert_eq!(end - start, 20 * 60_000);
    }

    #[test]
    fn display_uses_en_dash_and_marker() {
        let line = LogLine {
            marker: Marker::Pomodoro,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(9, 25, 0).unwrap(),
            minutes: 25,
        };
        assert_eq!(line.to_string(), "🍅 @{2024-01-01} @@{09:00} – @@{09:25} (25 m)");
    }

    #[test]
    fn from_session_rounds_minutes_and_truncates_times() {
        let start = local_ms("2024-06-10", "09:00") + 40_000;
        let session = FocusSession::new(
            Some("x".into()),
            None,
            TimerMode::Stopwatch,
            start,
            start + 24 * 60_000 + 30_000,
        );
        let line = LogLine::from_session(&session).unwrap();
        assert_eq!(line.start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(line.end, NaiveTime::from_hms_opt(9, 25, 0).unwrap());
        assert_eq!(line.minutes, 25);
        assert_eq!(line.marker, Marker::Logged);
    }
}
