pub mod board;
pub mod config;
pub mod log;
pub mod timer;

use std::error::Error;
use std::path::PathBuf;

use focusboard_core::notify::DesktopNotifier;
use focusboard_core::{MarkdownBoardStore, Settings, TimerEngine, TimerStateFile};

/// Settings, boards and the saved timer for one invocation.
pub struct Workspace {
    pub engine: TimerEngine,
    state: TimerStateFile,
}

impl Workspace {
    /// Load settings, open the boards (`--board` wins over the configured
    /// list) and restore the timer left by the previous invocation.
    pub fn open(boards: &[PathBuf]) -> Result<Self, Box<dyn Error>> {
        let settings = Settings::load()?;
        let paths = if boards.is_empty() {
            settings.boards.clone()
        } else {
            boards.to_vec()
        };
        let store = MarkdownBoardStore::open(&paths)?;
        let state = TimerStateFile::open_default()?;

        let mut engine = TimerEngine::new(store, settings).with_notifier(DesktopNotifier);
        if let Some(snapshot) = state.load()? {
            engine.restore(snapshot);
        }
        Ok(Self { engine, state })
    }

    pub fn from_parts(engine: TimerEngine, state: TimerStateFile) -> Self {
        Self { engine, state }
    }

    pub fn into_parts(self) -> (TimerEngine, TimerStateFile) {
        (self.engine, self.state)
    }

    /// Persist the timer for the next invocation.
    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        self.state.save(&self.engine.snapshot())?;
        Ok(())
    }
}
