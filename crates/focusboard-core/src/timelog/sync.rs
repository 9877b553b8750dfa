//! Reconciles in-memory sessions with the log lines stored in item bodies.

use std::collections::HashSet;

use crate::board::{update_at_path, Board, BoardIndex, BoardStore, ItemId};
use crate::error::Result;
use crate::session::{FocusSession, TimerMode};

use super::line::LogLine;

/// Identity of a session for de-duplication.
///
/// Log lines only keep minutes, so both ends are compared at minute
/// resolution; a session finalized in memory and the line written for it
/// then collapse to one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    item: Option<ItemId>,
    mode: TimerMode,
    start_minute: i64,
    end_minute: i64,
}

impl SessionKey {
    fn of(session: &FocusSession) -> Self {
        Self {
            item: session.item_id.clone(),
            mode: session.mode,
            start_minute: session.start_epoch_ms.div_euclid(60_000),
            end_minute: session.end_epoch_ms.div_euclid(60_000),
        }
    }
}

/// Append-only list of known sessions.
#[derive(Debug, Default, Clone)]
pub struct SessionLog {
    sessions: Vec<FocusSession>,
    seen: HashSet<SessionKey>,
    /// Board count at the last parse pass; `None` until the first pass.
    parsed_board_count: Option<usize>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[FocusSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Keep a session the timer just finalized. Always recorded, even when
    /// an earlier session shares its key; the line written for it is then
    /// skipped by later parse passes.
    pub fn record(&mut self, session: FocusSession) {
        self.seen.insert(SessionKey::of(&session));
        self.sessions.push(session);
    }

    /// Record a parsed session unless its key is already known. Returns
    /// whether it was added.
    pub fn insert(&mut self, session: FocusSession) -> bool {
        if !self.seen.insert(SessionKey::of(&session)) {
            return false;
        }
        self.sessions.push(session);
        true
    }

    /// A parse pass is due before the first read and whenever the number of
    /// boards changed since the last pass.
    pub fn needs_parse(&self, board_count: usize) -> bool {
        self.parsed_board_count != Some(board_count)
    }

    /// Forget when the last pass ran so the next read parses again.
    pub fn invalidate(&mut self) {
        self.parsed_board_count = None;
    }

    /// Read every log line from every item body on `boards`.
    ///
    /// Idempotent: lines already represented in memory are skipped. Returns
    /// the number of sessions added.
    pub fn parse_boards(&mut self, boards: &[Board]) -> usize {
        let mut added = 0;
        for board in boards {
            for item in board.walk() {
                let title = item.title();
                for text in item.body.lines().skip(1) {
                    let Some(line) = LogLine::parse(text) else {
                        continue;
                    };
                    let Some((start, end)) = line.span_ms() else {
                        continue;
                    };
                    let session = FocusSession::new(
                        Some(item.id.clone()),
                        Some(title.clone()),
                        line.mode(),
                        start,
                        end,
                    );
                    if self.insert(session) {
                        added += 1;
                    }
                }
            }
        }
        self.parsed_board_count = Some(boards.len());
        tracing::debug!(boards = boards.len(), added, "parsed session log lines");
        added
    }
}

/// Write `session` as a new last line of its item's body.
///
/// Reads the store fresh, edits the owning board copy-on-write and commits
/// the whole item tree back. Returns `Ok(false)` without writing when the
/// session has no item or no board holds the item.
pub fn append_session(store: &mut dyn BoardStore, session: &FocusSession) -> Result<bool> {
    let Some(item_id) = session.item_id.as_ref() else {
        return Ok(false);
    };
    let boards = store.boards();
    let index = BoardIndex::build(&boards);
    let Some(location) = index.locate(item_id) else {
        tracing::debug!(item = %item_id, "no board holds item; session not written");
        return Ok(false);
    };
    let Some(line) = LogLine::from_session(session) else {
        tracing::debug!(item = %item_id, "session start out of calendar range");
        return Ok(false);
    };
    let Some(board) = boards.iter().find(|b| b.id == location.board) else {
        return Ok(false);
    };
    let text = line.to_string();
    let Some(items) = update_at_path(&board.items, &location.path, |item| {
        item.with_appended_line(&text)
    }) else {
        return Ok(false);
    };
    store.replace_items(&location.board, items)?;
    tracing::debug!(
        item = %item_id,
        board = %location.board,
        line = %text,
        "appended session line"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Item, MemoryBoardStore};

    fn board_with(body: &str) -> Board {
        Board::new(
            "b",
            "B",
            vec![Item::new("lane", "Todo").with_children(vec![Item::new("card", body)])],
        )
    }

    #[test]
    fn parse_skips_title_line_and_garbage() {
        let boards = vec![board_with(concat!(
            "++ @{2024-01-01} @@{09:00} – @@{09:25} (25 m)\n",
            "notes\n",
            "🍅 @{2024-01-01} @@{10:00} – @@{10:25} (25 m)",
        ))];
        let mut log = SessionLog::new();
        assert_eq!(log.parse_boards(&boards), 1);
        assert_eq!(log.sessions()[0].mode, TimerMode::Pomodoro);
        assert_eq!(log.sessions()[0].item_id, Some(ItemId::from("card")));
    }

    #[test]
    fn repeated_parse_is_idempotent() {
        let boards = vec![board_with("Card\n++ @{2024-01-01} @@{09:00} – @@{09:25} (25 m)")];
        let mut log = SessionLog::new();
        assert!(log.needs_parse(1));
        assert_eq!(log.parse_boards(&boards), 1);
        assert!(!log.needs_parse(1));
        assert!(log.needs_parse(2));
        assert_eq!(log.parse_boards(&boards), 0);
        log.invalidate();
        assert!(log.needs_parse(1));
        assert_eq!(log.parse_boards(&boards), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn append_then_parse_does_not_duplicate() {
        let mut store = MemoryBoardStore::new(vec![board_with("Card")]);
        let start = 1_717_000_000_000 + 42_000;
        let session = FocusSession::new(
            Some("card".into()),
            Some("Card".into()),
            TimerMode::Stopwatch,
            start,
            start + 10 * 60_000,
        );

        let mut log = SessionLog::new();
        assert!(log.insert(session.clone()));
        assert!(append_session(&mut store, &session).unwrap());

        let boards = store.boards();
        let body = &boards[0].item_at(&[0, 0]).unwrap().body;
        assert!(body.starts_with("Card\n++ @{"), "{body}");

        assert_eq!(log.parse_boards(&store.boards()), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn recorded_sessions_sharing_a_minute_are_all_kept() {
        let start = 1_716_999_960_000;
        let quick = FocusSession::new(
            Some("card".into()),
            None,
            TimerMode::Stopwatch,
            start,
            start + 20_000,
        );
        let pomodoro = FocusSession::new(
            Some("card".into()),
            None,
            TimerMode::Pomodoro,
            start + 30_000,
            start + 30_000 + 25 * 60_000,
        );
        let mut store = MemoryBoardStore::new(vec![board_with("Card")]);
        let mut log = SessionLog::new();
        for session in [&quick, &pomodoro] {
            log.record(session.clone());
            assert!(append_session(&mut store, session).unwrap());
        }
        assert_eq!(log.len(), 2);

        log.invalidate();
        assert_eq!(log.parse_boards(&store.boards()), 0);
        assert_eq!(log.len(), 2);

        let mut fresh = SessionLog::new();
        assert_eq!(fresh.parse_boards(&store.boards()), 2);
    }

    #[test]
    fn append_skips_unknown_item() {
        let mut store = MemoryBoardStore::new(vec![board_with("Card")]);
        let session = FocusSession::new(Some("ghost".into()), None, TimerMode::Pomodoro, 0, 60_000);
        assert!(!append_session(&mut store, &session).unwrap());
        let orphan = FocusSession::new(None, None, TimerMode::Pomodoro, 0, 60_000);
        assert!(!append_session(&mut store, &orphan).unwrap());
        assert_eq!(store.boards()[0].item_at(&[0, 0]).unwrap().body, "Card");
    }
}
