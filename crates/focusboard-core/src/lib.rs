//! # Focusboard Core Library
//!
//! Focus timing for kanban-style boards. A user picks a card, runs a
//! stopwatch or a pomodoro against it, and every finished session is written
//! back into the card's text as a log line. Totals are rebuilt by reading
//! those lines back.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()` (see [`timer::ticker`])
//! - **Boards**: Immutable item trees behind the [`BoardStore`] trait, with an
//!   in-memory and a markdown-file implementation
//! - **Time Log**: The log line codec and the synchronizer that parses and
//!   appends session lines
//! - **Storage**: TOML settings and the persisted timer snapshot
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Settings`]: Application configuration management
//! - [`SessionLog`]: Deduplicated in-memory session history

pub mod board;
pub mod clock;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timelog;
pub mod timer;

pub use board::{Board, BoardId, BoardIndex, BoardStore, Item, ItemId, MemoryBoardStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BoardError, ConfigError, CoreError, CueError, TimerError};
pub use events::{Observers, SubscriptionId, TimerEvent};
pub use notify::{Cue, Notifier, ReasonCollector, ReasonRequest};
pub use session::{FocusSession, TimerMode};
pub use storage::{MarkdownBoardStore, Settings, TimerStateFile};
pub use timelog::{LogLine, Marker, SessionLog};
pub use timer::{
    BreakCycle, BreakKind, Completion, Durations, EngineSnapshot, Phase, StartOutcome,
    StopOutcome, TimerEngine, TimerState, TimerStatus, Toggled,
};
