use std::error::Error;
use std::path::PathBuf;

use clap::Subcommand;

use focusboard_core::{BoardId, MemoryBoardStore, Settings, TimerEngine, TimerStateFile};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.pomodoro_minutes", "sound.enabled")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Add a stop reason after the predefined ones
    AddReason {
        reason: String,
    },
    /// Add a board file to the default board list
    AddBoard {
        path: PathBuf,
    },
    /// Set or clear one board's pomodoro length
    SetBoard {
        /// Board id (the board file path as passed to --board)
        board: String,
        /// Minutes; omit to fall back to the global length
        minutes: Option<u32>,
    },
}

/// Let a saved timer pick up new lengths. A board-only change is applied
/// only when that board owns the running item.
fn notify_timer(
    settings: &Settings,
    changed_board: Option<&BoardId>,
) -> Result<(), Box<dyn Error>> {
    let state = TimerStateFile::open_default()?;
    let Some(snapshot) = state.load()? else {
        return Ok(());
    };
    let mut engine = TimerEngine::new(MemoryBoardStore::default(), settings.clone());
    engine.restore(snapshot);
    engine.apply_settings(settings.clone(), changed_board);
    state.save(&engine.snapshot())?;
    Ok(())
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn Error>> {
    match action {
        ConfigAction::Get { key } => {
            let settings = Settings::load()?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load()?;
            settings.set(&key, &value)?;
            settings.save()?;
            notify_timer(&settings, None)?;
            println!("ok");
        }
        ConfigAction::List => {
            let settings = Settings::load()?;
            let json = serde_json::to_string_pretty(&settings)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let settings = Settings::default();
            settings.save()?;
            notify_timer(&settings, None)?;
            println!("config reset to defaults");
        }
        ConfigAction::AddReason { reason } => {
            let mut settings = Settings::load()?;
            if settings.add_stop_reason(&reason) {
                settings.save()?;
                println!("ok");
            } else {
                println!("already present");
            }
        }
        ConfigAction::AddBoard { path } => {
            let mut settings = Settings::load()?;
            if !settings.boards.contains(&path) {
                settings.boards.push(path);
                settings.save()?;
            }
            println!("ok");
        }
        ConfigAction::SetBoard { board, minutes } => {
            let mut settings = Settings::load()?;
            let board = BoardId::from(board);
            settings.set_board_pomodoro(&board, minutes);
            settings.save()?;
            notify_timer(&settings, Some(&board))?;
            println!("ok");
        }
    }
    Ok(())
}
