mod config;
pub mod markdown;
pub mod timer_state;

pub use config::{
    BoardSettings, Settings, SoundSettings, TimerSettings, DEFAULT_LONG_BREAK_INTERVAL,
    DEFAULT_LONG_BREAK_MINUTES, DEFAULT_POMODORO_MINUTES, DEFAULT_SHORT_BREAK_MINUTES,
    DEFAULT_STOP_REASONS,
};
pub use markdown::MarkdownBoardStore;
pub use timer_state::TimerStateFile;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focusboard[-dev]/` based on FOCUSBOARD_ENV.
///
/// Set FOCUSBOARD_ENV=dev to use the development data directory.
/// FOCUSBOARD_HOME replaces the home directory, which keeps tests and
/// scripted runs away from the real configuration.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("FOCUSBOARD_HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let base_dir = home.join(".config");

    let env = std::env::var("FOCUSBOARD_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusboard-dev")
    } else {
        base_dir.join("focusboard")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
