//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` about
//! once per second (see [`super::ticker`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Idle                        (stop without asking / auto-complete)
//! Idle -> Running -> AwaitingStopReason -> Idle  (reason chosen)
//!                    AwaitingStopReason -> Running (prompt dismissed)
//! ```
//!
//! The clock is banked the moment `stop` is called, so time spent waiting
//! for a stop reason never counts toward the session.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(store, settings);
//! engine.start(TimerMode::Pomodoro, Some(card_id))?;
//! // In a loop:
//! engine.tick(); // Returns Some(Completion) when a pomodoro or break ends
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::breaks::{BreakCycle, BreakKind};
use super::durations::Durations;
use crate::board::{find_title, Board, BoardId, BoardIndex, BoardStore, ItemId};
use crate::clock::{Clock, SystemClock};
use crate::error::TimerError;
use crate::events::{Observers, SubscriptionId, TimerEvent};
use crate::notify::{
    play_cue, Cue, NoopCollector, Notifier, ReasonCollector, ReasonRequest, TracingNotifier,
};
use crate::session::{FocusSession, TimerMode};
use crate::stats;
use crate::storage::Settings;
use crate::timelog::{append_session, SessionLog};

/// Observable run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub running: bool,
    pub mode: TimerMode,
    /// Start of the current run segment; meaningful only while running.
    pub start_epoch_ms: i64,
    /// Time banked from earlier segments of the same session.
    pub accumulated_elapsed_ms: u64,
    pub target: Option<ItemId>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            running: false,
            mode: TimerMode::Stopwatch,
            start_epoch_ms: 0,
            accumulated_elapsed_ms: 0,
            target: None,
        }
    }
}

/// A paused session waiting for the stop prompt to be answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingStop {
    /// When `stop` banked the clock. Becomes the session end.
    pub paused_at_ms: i64,
    pub banked_elapsed_ms: u64,
    pub request: ReasonRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    AwaitingStopReason(PendingStop),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// A stop decision is pending; nothing was started.
    AwaitingDecision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    NotRunning,
    Finalized(FocusSession),
    AwaitingReason(ReasonRequest),
    /// A stop decision is already pending; nothing changed.
    AlreadyAwaiting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Start(StartOutcome),
    Stop(StopOutcome),
}

/// A timed session that ran out on a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "completed", rename_all = "snake_case")]
pub enum Completion {
    Pomodoro {
        session: FocusSession,
        next_break: BreakKind,
    },
    Break {
        session: FocusSession,
    },
}

/// Everything needed to carry a timer across process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub state: TimerState,
    pub phase: Phase,
    pub break_cycle: BreakCycle,
    #[serde(default)]
    pub active_break: Option<BreakKind>,
    #[serde(default)]
    pub active_board: Option<BoardId>,
    #[serde(default)]
    pub target_ms: u64,
}

/// Point-in-time view for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerStatus {
    pub running: bool,
    pub awaiting_reason: bool,
    pub mode: TimerMode,
    pub target: Option<ItemId>,
    pub board: Option<BoardId>,
    pub break_kind: Option<BreakKind>,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
    pub completed_pomodoros: u64,
}

/// Core timer engine.
///
/// Owns the run state, the break cycle, the session log and the observer
/// registry. Collaborators (board store, clock, notifier, stop prompt) are
/// injected.
pub struct TimerEngine {
    state: TimerState,
    phase: Phase,
    break_cycle: BreakCycle,
    active_break: Option<BreakKind>,
    active_board: Option<BoardId>,
    /// Resolved length of the current pomodoro or break.
    target_ms: u64,
    settings: Settings,
    settings_version: u64,
    log: SessionLog,
    store: Box<dyn BoardStore>,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn Notifier>,
    collector: Box<dyn ReasonCollector>,
    observers: Observers,
}

impl TimerEngine {
    /// Create an idle engine over `store`.
    pub fn new(store: impl BoardStore + 'static, settings: Settings) -> Self {
        Self {
            state: TimerState::default(),
            phase: Phase::Idle,
            break_cycle: BreakCycle::default(),
            active_break: None,
            active_board: None,
            target_ms: 0,
            settings,
            settings_version: 0,
            log: SessionLog::new(),
            store: Box::new(store),
            clock: Arc::new(SystemClock),
            notifier: Box::new(TracingNotifier),
            collector: Box::new(NoopCollector),
            observers: Observers::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_collector(mut self, collector: impl ReasonCollector + 'static) -> Self {
        self.collector = Box::new(collector);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_version(&self) -> u64 {
        self.settings_version
    }

    pub fn break_cycle(&self) -> BreakCycle {
        self.break_cycle
    }

    /// Fresh snapshot of every board in the store.
    pub fn boards(&self) -> Vec<Board> {
        self.store.boards()
    }

    /// The pending stop prompt, if any.
    pub fn pending_request(&self) -> Option<&ReasonRequest> {
        match &self.phase {
            Phase::AwaitingStopReason(pending) => Some(&pending.request),
            _ => None,
        }
    }

    /// True when running and, if given, in `mode` on `target`.
    pub fn is_running(&self, mode: Option<TimerMode>, target: Option<&ItemId>) -> bool {
        if !self.state.running {
            return false;
        }
        if mode.is_some_and(|m| m != self.state.mode) {
            return false;
        }
        if target.is_some_and(|t| self.state.target.as_ref() != Some(t)) {
            return false;
        }
        true
    }

    /// Banked time plus the live segment.
    pub fn elapsed_ms(&self) -> u64 {
        if !self.state.running {
            return self.state.accumulated_elapsed_ms;
        }
        let live = self.clock.now_ms().saturating_sub(self.state.start_epoch_ms).max(0);
        self.state.accumulated_elapsed_ms.saturating_add(live as u64)
    }

    /// Time left in a pomodoro or break; always 0 for the stopwatch.
    pub fn remaining_ms(&self) -> u64 {
        if !self.state.mode.is_timed() {
            return 0;
        }
        self.target_ms.saturating_sub(self.elapsed_ms())
    }

    /// Resolved length of the current pomodoro or break.
    pub fn target_ms(&self) -> u64 {
        self.target_ms
    }

    pub fn status(&self) -> TimerStatus {
        TimerStatus {
            running: self.state.running,
            awaiting_reason: matches!(self.phase, Phase::AwaitingStopReason(_)),
            mode: self.state.mode,
            target: self.state.target.clone(),
            board: self.active_board.clone(),
            break_kind: self.active_break,
            elapsed_ms: self.elapsed_ms(),
            remaining_ms: self.remaining_ms(),
            completed_pomodoros: self.break_cycle.completed(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start timing `target` in `mode`.
    ///
    /// Without a target (outside break mode) a notice is shown and nothing
    /// changes. Starting while already running is a no-op.
    pub fn start(
        &mut self,
        mode: TimerMode,
        target: Option<ItemId>,
    ) -> Result<StartOutcome, TimerError> {
        if matches!(self.phase, Phase::AwaitingStopReason(_)) {
            return Ok(StartOutcome::AwaitingDecision);
        }
        if target.is_none() && mode != TimerMode::Break {
            self.notifier.notice("Select a card before starting a timer");
            return Err(TimerError::NoTargetSelected);
        }
        if self.state.running {
            return Ok(StartOutcome::AlreadyRunning);
        }
        let break_kind = (mode == TimerMode::Break).then_some(BreakKind::Short);
        let now = self.clock.now_ms();
        self.begin(mode, target, break_kind, now);
        Ok(StartOutcome::Started)
    }

    /// Stop the running timer.
    ///
    /// The clock is banked first. With `ask_reason` the session waits for
    /// [`resolve_with_reason`](Self::resolve_with_reason) or
    /// [`resolve_cancelled`](Self::resolve_cancelled); without it the
    /// session is finalized immediately.
    pub fn stop(&mut self, ask_reason: bool) -> StopOutcome {
        match self.phase {
            Phase::AwaitingStopReason(_) => return StopOutcome::AlreadyAwaiting,
            Phase::Idle => return StopOutcome::NotRunning,
            Phase::Running => {}
        }
        let now = self.clock.now_ms();
        self.bank(now);

        if !ask_reason {
            return StopOutcome::Finalized(self.finalize(now));
        }

        let request = ReasonRequest {
            board: self.active_board.clone(),
            reasons: self.settings.stop_reasons_for(self.active_board.as_ref()),
        };
        self.phase = Phase::AwaitingStopReason(PendingStop {
            paused_at_ms: now,
            banked_elapsed_ms: self.state.accumulated_elapsed_ms,
            request: request.clone(),
        });
        self.observers.emit(TimerEvent::Change);
        self.collector.request(&request);
        StopOutcome::AwaitingReason(request)
    }

    /// Answer the stop prompt with a reason: the session is finalized.
    pub fn resolve_with_reason(&mut self, reason: &str) -> Result<FocusSession, TimerError> {
        let pending = self.take_pending()?;
        self.observers.emit(TimerEvent::Stop);
        self.notifier.notice(&format!("Stopped: {reason}"));
        tracing::info!(reason, "stop reason chosen");
        Ok(self.finalize(pending.paused_at_ms))
    }

    /// Dismiss the stop prompt: the session resumes from the banked time.
    pub fn resolve_cancelled(&mut self) -> Result<(), TimerError> {
        let pending = self.take_pending()?;
        self.state.accumulated_elapsed_ms = pending.banked_elapsed_ms;
        self.state.start_epoch_ms = self.clock.now_ms();
        self.state.running = true;
        self.phase = Phase::Running;
        tracing::debug!(banked_ms = pending.banked_elapsed_ms, "stop prompt dismissed; resuming");
        self.observers.emit(TimerEvent::Start);
        self.observers.emit(TimerEvent::Change);
        Ok(())
    }

    /// Stop if running (whatever item it runs on), otherwise start.
    pub fn toggle(
        &mut self,
        mode: TimerMode,
        target: Option<ItemId>,
    ) -> Result<Toggled, TimerError> {
        match self.phase {
            Phase::AwaitingStopReason(_) => Ok(Toggled::Stop(StopOutcome::AlreadyAwaiting)),
            Phase::Running => Ok(Toggled::Stop(self.stop(true))),
            Phase::Idle => self.start(mode, target).map(Toggled::Start),
        }
    }

    /// Log the current session without asking and restart the same item in
    /// the other mode (stopwatch <-> pomodoro; a break switches to pomodoro).
    pub fn switch_mode(&mut self) -> Result<StartOutcome, TimerError> {
        if matches!(self.phase, Phase::AwaitingStopReason(_)) {
            return Ok(StartOutcome::AwaitingDecision);
        }
        let next = match self.state.mode {
            TimerMode::Pomodoro => TimerMode::Stopwatch,
            TimerMode::Stopwatch | TimerMode::Break => TimerMode::Pomodoro,
        };
        let target = self.state.target.clone();
        self.stop(false);
        self.start(next, target)
    }

    /// Hard reset to idle with `mode` and `target` shown.
    pub fn reset(&mut self, mode: TimerMode, target: Option<ItemId>) {
        self.state = TimerState {
            running: false,
            mode,
            start_epoch_ms: 0,
            accumulated_elapsed_ms: 0,
            target,
        };
        self.phase = Phase::Idle;
        if mode != TimerMode::Break {
            self.active_break = None;
        }
        self.active_board = self.owner_board();
        self.target_ms = self.resolve_target_ms();
        self.observers.emit(TimerEvent::Change);
    }

    /// Advance the timer. Emits `tick` while running and completes a
    /// pomodoro or break whose time is up.
    pub fn tick(&mut self) -> Option<Completion> {
        if !self.state.running {
            return None;
        }
        self.observers.emit(TimerEvent::Tick);
        if !self.state.mode.is_timed() {
            return None;
        }
        let elapsed = self.elapsed_ms();
        if elapsed < self.target_ms {
            return None;
        }
        // Close the session at the instant it reached its length, not at
        // whenever this tick happened to run.
        let overshoot = (elapsed - self.target_ms).min(i64::MAX as u64) as i64;
        let due_at = self.clock.now_ms().saturating_sub(overshoot);
        match self.state.mode {
            TimerMode::Pomodoro => Some(self.complete_pomodoro(due_at)),
            TimerMode::Break => Some(self.complete_break(due_at)),
            TimerMode::Stopwatch => None,
        }
    }

    /// Tick until nothing more completes. After a long gap one call can
    /// close a pomodoro and the break that followed it.
    pub fn tick_until_idle(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Some(done) = self.tick() {
            completions.push(done);
        }
        completions
    }

    /// Replace the settings.
    ///
    /// `changed_board` names the board whose override changed, or `None`
    /// for a global change. The active session's length is re-resolved
    /// only when the change can affect it.
    pub fn apply_settings(&mut self, settings: Settings, changed_board: Option<&BoardId>) {
        self.settings = settings;
        self.settings_version += 1;
        let affects_active = match changed_board {
            None => true,
            Some(board) => self.active_board.as_ref() == Some(board),
        };
        if affects_active && self.state.target.is_some() {
            self.target_ms = self.resolve_target_ms();
            tracing::debug!(
                version = self.settings_version,
                target_ms = self.target_ms,
                "re-resolved session length"
            );
            self.observers.emit(TimerEvent::Change);
        }
    }

    // ── Observers ────────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(TimerEvent) + Send + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ── Session log ──────────────────────────────────────────────────

    /// All known sessions, parsing board text first if needed.
    pub fn sessions(&mut self) -> &[FocusSession] {
        self.ensure_parsed();
        self.log.sessions()
    }

    pub fn total_focused_ms(&mut self, item: &ItemId) -> u64 {
        stats::total_focused_ms(self.sessions(), item)
    }

    pub fn sessions_on(&mut self, date: NaiveDate) -> Vec<FocusSession> {
        stats::sessions_on(self.sessions(), date)
    }

    pub fn daily_totals(&mut self) -> BTreeMap<NaiveDate, u64> {
        stats::daily_totals(self.sessions())
    }

    pub fn item_totals(&mut self) -> BTreeMap<ItemId, u64> {
        stats::item_totals(self.sessions())
    }

    /// Parse all board text again now. Returns the number of new sessions.
    pub fn force_reparse(&mut self) -> usize {
        self.log.invalidate();
        let boards = self.store.boards();
        self.log.parse_boards(&boards)
    }

    // ── Persistence ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state.clone(),
            phase: self.phase.clone(),
            break_cycle: self.break_cycle,
            active_break: self.active_break,
            active_board: self.active_board.clone(),
            target_ms: self.target_ms,
        }
    }

    /// Restore a snapshot taken by [`snapshot`](Self::snapshot). No events
    /// are emitted.
    pub fn restore(&mut self, snapshot: EngineSnapshot) {
        self.state = snapshot.state;
        self.phase = snapshot.phase;
        self.break_cycle = snapshot.break_cycle;
        self.active_break = snapshot.active_break;
        self.active_board = snapshot.active_board;
        self.target_ms = snapshot.target_ms;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(
        &mut self,
        mode: TimerMode,
        target: Option<ItemId>,
        break_kind: Option<BreakKind>,
        at: i64,
    ) {
        self.state = TimerState {
            running: true,
            mode,
            start_epoch_ms: at,
            accumulated_elapsed_ms: 0,
            target,
        };
        self.phase = Phase::Running;
        self.active_break = break_kind;
        self.active_board = self.owner_board();
        self.target_ms = self.resolve_target_ms();
        tracing::info!(
            mode = mode.label(),
            target = ?self.state.target,
            target_ms = self.target_ms,
            "timer started"
        );
        self.observers.emit(TimerEvent::Start);
        self.observers.emit(TimerEvent::Change);
    }

    fn bank(&mut self, at: i64) {
        let segment = at.saturating_sub(self.state.start_epoch_ms).max(0) as u64;
        self.state.accumulated_elapsed_ms =
            self.state.accumulated_elapsed_ms.saturating_add(segment);
        self.state.running = false;
    }

    fn take_pending(&mut self) -> Result<PendingStop, TimerError> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingStopReason(pending) => Ok(pending),
            other => {
                self.phase = other;
                Err(TimerError::NoPendingDecision)
            }
        }
    }

    /// Record the banked session ending at `end`, write it to its item and
    /// return to idle on the same mode and item.
    fn finalize(&mut self, end: i64) -> FocusSession {
        let duration = self.state.accumulated_elapsed_ms.min(i64::MAX as u64) as i64;
        let start = end.saturating_sub(duration);
        let mode = self.state.mode;
        let target = self.state.target.clone();

        let title = target.as_ref().and_then(|id| {
            let boards = self.store.boards();
            let index = BoardIndex::build(&boards);
            find_title(&boards, &index, id)
        });
        let session = FocusSession::new(target.clone(), title, mode, start, end);

        self.log.record(session.clone());
        if let Err(e) = append_session(self.store.as_mut(), &session) {
            tracing::warn!(error = %e, "failed to write session line");
        }
        tracing::info!(
            mode = mode.label(),
            target = ?target,
            duration_ms = session.duration_ms,
            "session finalized"
        );
        self.observers.emit(TimerEvent::Log);
        self.reset(mode, target);
        session
    }

    fn complete_pomodoro(&mut self, at: i64) -> Completion {
        self.bank(at);
        let session = self.finalize(at);
        play_cue(self.notifier.as_mut(), &self.settings.sound, Cue::SessionEnd);
        self.notifier.notice("Pomodoro complete!");

        self.break_cycle.record_pomodoro();
        let interval =
            Durations::resolve(&self.settings, self.active_board.as_ref()).long_break_interval;
        let next_break = self.break_cycle.next_break(interval);

        let target = session.item_id.clone();
        self.begin(TimerMode::Break, target, Some(next_break), at);
        Completion::Pomodoro {
            session,
            next_break,
        }
    }

    fn complete_break(&mut self, at: i64) -> Completion {
        self.bank(at);
        let session = self.finalize(at);
        play_cue(self.notifier.as_mut(), &self.settings.sound, Cue::BreakEnd);
        self.notifier.notice("Break finished");
        Completion::Break { session }
    }

    fn owner_board(&self) -> Option<BoardId> {
        let target = self.state.target.as_ref()?;
        let boards = self.store.boards();
        BoardIndex::build(&boards).board_of(target).cloned()
    }

    fn resolve_target_ms(&self) -> u64 {
        let durations = Durations::resolve(&self.settings, self.active_board.as_ref());
        match self.state.mode {
            TimerMode::Pomodoro => durations.pomodoro_ms,
            TimerMode::Break => durations.break_ms(self.active_break.unwrap_or(BreakKind::Short)),
            TimerMode::Stopwatch => 0,
        }
    }

    fn ensure_parsed(&mut self) {
        let boards = self.store.boards();
        if self.log.needs_parse(boards.len()) {
            self.log.parse_boards(&boards);
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("break_cycle", &self.break_cycle)
            .field("target_ms", &self.target_ms)
            .field("settings_version", &self.settings_version)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
