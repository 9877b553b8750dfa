//! The timer snapshot kept between CLI invocations.

use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timer::EngineSnapshot;

/// `timer.json` next to `config.toml`.
#[derive(Debug, Clone)]
pub struct TimerStateFile {
    path: PathBuf,
}

impl TimerStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file in the data directory.
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(data_dir()?.join("timer.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved snapshot. A missing file means no timer was saved.
    pub fn load(&self) -> Result<Option<EngineSnapshot>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, snapshot: &EngineSnapshot) -> Result<()> {
        let content = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Forget the saved timer.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
