//! TOML-based application settings.
//!
//! Stores user preferences including:
//! - Pomodoro and break lengths, and the long-break interval
//! - Sound cue preferences
//! - Stop reasons offered when a timer is stopped by hand
//! - Board files to load and per-board overrides
//!
//! Settings are stored at `~/.config/focusboard/config.toml`.
//!
//! Numeric values are read leniently. A value that is not a positive number
//! is treated as unset, so lookups fall through to the next level instead
//! of failing the whole file.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::board::BoardId;
use crate::error::ConfigError;

pub const DEFAULT_POMODORO_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;
pub const DEFAULT_STOP_REASONS: [&str; 4] = ["Finished", "Interrupted", "Break", "Other"];

/// Global timer lengths. `None` means "use the built-in default" and is
/// written as `0`, since a missing key reads back as the default number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(
        default = "default_pomodoro",
        deserialize_with = "lenient_positive",
        serialize_with = "unset_as_zero"
    )]
    pub pomodoro_minutes: Option<u32>,
    #[serde(
        default = "default_short_break",
        deserialize_with = "lenient_positive",
        serialize_with = "unset_as_zero"
    )]
    pub short_break_minutes: Option<u32>,
    #[serde(
        default = "default_long_break",
        deserialize_with = "lenient_positive",
        serialize_with = "unset_as_zero"
    )]
    pub long_break_minutes: Option<u32>,
    #[serde(
        default = "default_interval",
        deserialize_with = "lenient_positive",
        serialize_with = "unset_as_zero"
    )]
    pub long_break_interval: Option<u32>,
}

/// Sound cue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path to a custom sound file played instead of the generated tone.
    #[serde(default)]
    pub custom_sound: Option<PathBuf>,
}

/// Overrides scoped to one board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSettings {
    #[serde(default, deserialize_with = "lenient_positive")]
    pub pomodoro_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_reasons: Vec<String>,
}

/// Application settings.
///
/// Serialized to/from TOML at `~/.config/focusboard/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Stop reasons offered globally. Empty means the built-in list.
    #[serde(default = "default_stop_reasons")]
    pub stop_reasons: Vec<String>,
    /// Markdown board files the CLI loads when none are given.
    #[serde(default)]
    pub boards: Vec<PathBuf>,
    #[serde(default)]
    pub timer: TimerSettings,
    #[serde(default)]
    pub sound: SoundSettings,
    /// Keyed by board id.
    #[serde(default)]
    pub board_overrides: BTreeMap<String, BoardSettings>,
}

fn default_pomodoro() -> Option<u32> {
    Some(DEFAULT_POMODORO_MINUTES)
}
fn default_short_break() -> Option<u32> {
    Some(DEFAULT_SHORT_BREAK_MINUTES)
}
fn default_long_break() -> Option<u32> {
    Some(DEFAULT_LONG_BREAK_MINUTES)
}
fn default_interval() -> Option<u32> {
    Some(DEFAULT_LONG_BREAK_INTERVAL)
}
fn default_true() -> bool {
    true
}
fn default_stop_reasons() -> Vec<String> {
    DEFAULT_STOP_REASONS.iter().map(|s| s.to_string()).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Unset(()),
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Accepts integers, floats and numeric strings. Anything that is not a
/// positive whole number of minutes becomes `None`; only `0`, the written
/// form of unset, does so without a warning.
fn lenient_positive<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Loose::deserialize(deserializer)? {
        Loose::Unset(()) => return Ok(None),
        Loose::Int(n) => u32::try_from(n).ok(),
        Loose::Float(f) if f.is_finite() && f.fract() == 0.0 && f > 0.0 => {
            u32::try_from(f as i64).ok()
        }
        Loose::Float(_) => None,
        Loose::Text(s) => s.trim().parse::<u32>().ok(),
        Loose::Other(_) => None,
    };
    match parsed {
        Some(0) => Ok(None),
        Some(n) => Ok(Some(n)),
        None => {
            tracing::warn!("ignoring non-positive or non-numeric minutes setting");
            Ok(None)
        }
    }
}

fn unset_as_zero<S>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u32(value.unwrap_or(0))
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            pomodoro_minutes: default_pomodoro(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
            long_break_interval: default_interval(),
        }
    }
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            custom_sound: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stop_reasons: default_stop_reasons(),
            boards: Vec::new(),
            timer: TimerSettings::default(),
            sound: SoundSettings::default(),
            board_overrides: BTreeMap::new(),
        }
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Unset optional: keep numbers numeric, everything else text.
                    serde_json::Value::Null => match value.parse::<u64>() {
                        Ok(n) => serde_json::Value::Number(n.into()),
                        Err(_) => serde_json::Value::String(value.into()),
                    },
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// defaults cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default settings");
            Self::default()
        })
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a value as a string by dot-separated key (`timer.pomodoro_minutes`).
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value has the wrong type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Override the pomodoro length for one board. `None` clears it.
    pub fn set_board_pomodoro(&mut self, board: &BoardId, minutes: Option<u32>) {
        let entry = self
            .board_overrides
            .entry(board.as_str().to_string())
            .or_default();
        entry.pomodoro_minutes = minutes.filter(|m| *m > 0);
        if entry == &BoardSettings::default() {
            self.board_overrides.remove(board.as_str());
        }
    }

    pub fn board(&self, board: &BoardId) -> Option<&BoardSettings> {
        self.board_overrides.get(board.as_str())
    }

    /// Append a user-defined stop reason to the global list.
    ///
    /// Returns `false` for blank or already-present reasons.
    pub fn add_stop_reason(&mut self, reason: &str) -> bool {
        let reason = reason.trim();
        if reason.is_empty() || self.stop_reasons.iter().any(|r| r == reason) {
            return false;
        }
        if self.stop_reasons.is_empty() {
            self.stop_reasons = default_stop_reasons();
        }
        self.stop_reasons.push(reason.to_string());
        true
    }

    /// Stop reasons for a board: its own list, else the global list, else
    /// the built-in one.
    pub fn stop_reasons_for(&self, board: Option<&BoardId>) -> Vec<String> {
        let local = board
            .and_then(|b| self.board(b))
            .map(|b| b.stop_reasons.as_slice())
            .filter(|r| !r.is_empty());
        match local {
            Some(reasons) => reasons.to_vec(),
            None if !self.stop_reasons.is_empty() => self.stop_reasons.clone(),
            None => default_stop_reasons(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_roundtrip() {
        let cfg = Settings::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Settings::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg = Settings::from_toml_str("").unwrap();
        assert_eq!(cfg.timer.pomodoro_minutes, Some(25));
        assert_eq!(cfg.timer.long_break_interval, Some(4));
        assert!(cfg.sound.enabled);
        assert_eq!(cfg.stop_reasons.len(), 4);
    }

    #[test]
    fn non_numeric_and_non_positive_minutes_become_unset() {
        let cfg = Settings::from_toml_str(
            r#"
            [timer]
            pomodoro_minutes = "soon"
            short_break_minutes = 0
            long_break_minutes = "20"
            long_break_interval = -3

            [board_overrides."work.md"]
            pomodoro_minutes = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.timer.pomodoro_minutes, None);
        assert_eq!(cfg.timer.short_break_minutes, None);
        assert_eq!(cfg.timer.long_break_minutes, Some(20));
        assert_eq!(cfg.timer.long_break_interval, None);
        assert_eq!(cfg.board_overrides["work.md"].pomodoro_minutes, None);
    }

    #[test]
    fn unset_global_length_stays_unset_after_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Settings::default();
        cfg.timer.pomodoro_minutes = None;
        cfg.set("timer.long_break_interval", "0").unwrap();
        assert_eq!(cfg.timer.long_break_interval, None);
        cfg.save_to(&path).unwrap();

        let loaded = Settings::from_toml_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.get("timer.pomodoro_minutes"), cfg.get("timer.pomodoro_minutes"));
        assert_eq!(loaded.timer.short_break_minutes, Some(DEFAULT_SHORT_BREAK_MINUTES));
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Settings::default();
        assert_eq!(cfg.get("timer.pomodoro_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("sound.enabled").as_deref(), Some("true"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Settings::default();
        cfg.set("timer.short_break_minutes", "7").unwrap();
        cfg.set("sound.enabled", "false").unwrap();
        assert_eq!(cfg.timer.short_break_minutes, Some(7));
        assert!(!cfg.sound.enabled);
    }

    #[test]
    fn set_fills_unset_optional() {
        let mut cfg = Settings::default();
        cfg.timer.pomodoro_minutes = None;
        assert_eq!(cfg.get("timer.pomodoro_minutes").as_deref(), Some("0"));
        cfg.set("timer.pomodoro_minutes", "30").unwrap();
        assert_eq!(cfg.timer.pomodoro_minutes, Some(30));
        cfg.set("sound.custom_sound", "/tmp/bell.wav").unwrap();
        assert_eq!(cfg.sound.custom_sound, Some(PathBuf::from("/tmp/bell.wav")));
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Settings::default();
        assert!(matches!(
            cfg.set("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("sound.enabled", "loud"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("timer.pomodoro_minutes", "many").is_err());
    }

    #[test]
    fn stop_reasons_prefer_board_list() {
        let mut cfg = Settings::default();
        let board = BoardId::from("work.md");
        assert_eq!(cfg.stop_reasons_for(Some(&board))[0], "Finished");

        cfg.board_overrides.insert(
            "work.md".into(),
            BoardSettings {
                pomodoro_minutes: None,
                stop_reasons: vec!["Meeting".into()],
            },
        );
        assert_eq!(cfg.stop_reasons_for(Some(&board)), vec!["Meeting"]);
        assert_eq!(cfg.stop_reasons_for(None)[0], "Finished");

        cfg.stop_reasons.clear();
        assert_eq!(cfg.stop_reasons_for(None).len(), 4);
    }

    #[test]
    fn add_stop_reason_appends_once() {
        let mut cfg = Settings::default();
        assert!(cfg.add_stop_reason("Lunch"));
        assert!(!cfg.add_stop_reason("Lunch"));
        assert!(!cfg.add_stop_reason("  "));
        assert_eq!(cfg.stop_reasons.last().map(String::as_str), Some("Lunch"));
    }

    #[test]
    fn set_board_pomodoro_clears_empty_override() {
        let mut cfg = Settings::default();
        let board = BoardId::from("work.md");
        cfg.set_board_pomodoro(&board, Some(50));
        assert_eq!(cfg.board(&board).unwrap().pomodoro_minutes, Some(50));
        cfg.set_board_pomodoro(&board, None);
        assert!(cfg.board(&board).is_none());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Settings::load_from(&path).unwrap();
        assert_eq!(cfg, Settings::default());
        assert!(path.exists());
    }
}
