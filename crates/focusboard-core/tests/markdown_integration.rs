//! End-to-end tests over markdown board files.
//!
//! A session timed by one engine is written into the board file; a fresh
//! engine opened on the same file later reports the same totals.

use indoc::indoc;
use tempfile::TempDir;

use focusboard_core::stats::DayReport;
use focusboard_core::{
    BoardStore, ItemId, ManualClock, MarkdownBoardStore, Settings, StopOutcome, TimerEngine,
    TimerMode, TimerStateFile,
};

const MIN: i64 = 60_000;
// 2024-06-10 07:33:20 UTC
const T0: i64 = 1_718_004_800_000;

const BOARD: &str = indoc! {"
    ---
    kanban-plugin: basic
    ---

    ## Todo

    - [ ] Write report
    - [ ] Plan sprint

    ## Done

    - [x] Ship release
    \t++ @{2024-06-01} @@{10:00} – @@{10:30} (30 m)

    %% kanban:settings
    %%
"};

fn board_file() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprint.md");
    std::fs::write(&path, BOARD).unwrap();
    (dir, path)
}

fn engine_on(path: &std::path::Path, clock: &ManualClock) -> TimerEngine {
    let store = MarkdownBoardStore::open(&[path]).unwrap();
    TimerEngine::new(store, Settings::default()).with_clock(clock.clone())
}

#[test]
fn ids_follow_file_stem_and_position() {
    let (_dir, path) = board_file();
    let store = MarkdownBoardStore::open(&[&path]).unwrap();
    let board = store.boards().remove(0);
    let ids: Vec<_> = board.walk().iter().map(|i| i.id.to_string()).collect();
    assert_eq!(
        ids,
        ["sprint/0", "sprint/0/0", "sprint/0/1", "sprint/1", "sprint/1/0"]
    );
}

#[test]
fn session_survives_restart_through_the_file() {
    let (_dir, path) = board_file();
    let clock = ManualClock::new(T0);
    let card = ItemId::from("sprint/0/1");

    let mut engine = engine_on(&path, &clock);
    engine.start(TimerMode::Stopwatch, Some(card.clone())).unwrap();
    clock.advance_ms(45 * MIN);
    assert!(matches!(engine.stop(false), StopOutcome::Finalized(_)));
    drop(engine);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("- [ ] Plan sprint\n\t++ @{"), "{text}");
    assert!(text.contains("(45 m)"));
    assert!(text.starts_with("---\nkanban-plugin: basic\n---\n"));
    assert!(text.ends_with("%% kanban:settings\n%%\n"));

    let mut reopened = engine_on(&path, &clock);
    assert_eq!(reopened.total_focused_ms(&card), 45 * MIN as u64);
    assert_eq!(
        reopened.total_focused_ms(&ItemId::from("sprint/1/0")),
        30 * MIN as u64
    );
    assert_eq!(reopened.item_totals().len(), 2);
}

#[test]
fn day_report_covers_logged_day() {
    let (_dir, path) = board_file();
    let clock = ManualClock::new(T0);
    let mut engine = engine_on(&path, &clock);
    let day = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    let report = DayReport::build(engine.sessions(), day);
    assert_eq!(report.sessions.len(), 1);
    assert_eq!(report.focused_ms, 30 * MIN as u64);
    assert_eq!(report.sessions[0].item_title.as_deref(), Some("Ship release"));
}

#[test]
fn pending_stop_survives_snapshot_file() {
    let (dir, path) = board_file();
    let clock = ManualClock::new(T0);
    let state = TimerStateFile::new(dir.path().join("timer.json"));
    let card = ItemId::from("sprint/0/0");

    let mut engine = engine_on(&path, &clock);
    engine.start(TimerMode::Pomodoro, Some(card.clone())).unwrap();
    clock.advance_ms(7 * MIN);
    engine.stop(true);
    state.save(&engine.snapshot()).unwrap();
    drop(engine);

    // Later, in another process.
    clock.advance_ms(30 * MIN);
    let mut engine = engine_on(&path, &clock);
    engine.restore(state.load().unwrap().unwrap());
    let session = engine.resolve_with_reason("Interrupted").unwrap();
    assert_eq!(session.duration_ms, 7 * MIN as u64);
    assert_eq!(session.end_epoch_ms, T0 + 7 * MIN);
    assert_eq!(engine.total_focused_ms(&card), 7 * MIN as u64);
}

#[test]
fn external_edit_during_a_session_is_kept() {
    let (_dir, path) = board_file();
    let clock = ManualClock::new(T0);

    let mut engine = engine_on(&path, &clock);
    engine.start(TimerMode::Stopwatch, Some(ItemId::from("sprint/0/0"))).unwrap();

    // Another editor adds a card while the timer runs.
    let edited = BOARD.replace(
        "- [ ] Plan sprint\n",
        "- [ ] Plan sprint\n- [ ] New card added meanwhile\n",
    );
    std::fs::write(&path, edited).unwrap();

    clock.advance_ms(5 * MIN);
    assert!(matches!(engine.stop(false), StopOutcome::Finalized(_)));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("- [ ] Write report\n\t++ @{"), "{text}");
    assert!(text.contains("- [ ] New card added meanwhile\n"), "{text}");
    assert!(text.contains("- [x] Ship release\n"), "{text}");
}
