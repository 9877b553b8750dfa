//! Core error types for focusboard-core.
//!
//! This module defines the error hierarchy using thiserror. Conditions the
//! timer treats as non-fatal (a missing owner board on append, a malformed
//! log line) never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusboard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Board store errors
    #[error("Board error: {0}")]
    Board(#[from] BoardError),

    /// Timer transition errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors raised by board stores.
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Board not found: {0}")]
    NotFound(String),

    #[error("Malformed board {path} at line {line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to access board {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Timer transition errors.
///
/// Both variants are recoverable: the engine state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("no target selected: pick a card before starting a timer")]
    NoTargetSelected,

    #[error("no stop decision is pending")]
    NoPendingDecision,
}

/// Sound cue playback errors.
#[derive(Error, Debug)]
pub enum CueError {
    #[error("Sound file not found: {0}")]
    Missing(PathBuf),

    #[error("Failed to play {path}: {message}")]
    Playback { path: PathBuf, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::InvalidValue {
            key: "<file>".into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
