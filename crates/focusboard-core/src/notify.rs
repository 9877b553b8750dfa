//! Collaborators the timer talks to but does not own: user notices, sound
//! cues and the "why did you stop?" prompt.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::BoardId;
use crate::error::CueError;
use crate::storage::SoundSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    SessionEnd,
    BreakEnd,
}

/// User-facing output: short notices and sound cues.
pub trait Notifier: Send {
    fn notice(&mut self, message: &str);

    /// Play a user-supplied sound file.
    fn play_file(&mut self, path: &Path) -> Result<(), CueError>;

    /// Play the generated fallback tone. Must not fail.
    fn play_tone(&mut self, cue: Cue);
}

/// Sends notices to the log and plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notice(&mut self, message: &str) {
        tracing::info!(notice = message);
    }

    fn play_file(&mut self, path: &Path) -> Result<(), CueError> {
        if !path.exists() {
            return Err(CueError::Missing(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "sound cue");
        Ok(())
    }

    fn play_tone(&mut self, cue: Cue) {
        tracing::debug!(?cue, "tone cue");
    }
}

/// Notices go to stderr with a terminal bell for tones; custom sound files
/// are handed to the system's default player.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notice(&mut self, message: &str) {
        tracing::info!(notice = message);
        eprintln!("{message}");
    }

    fn play_file(&mut self, path: &Path) -> Result<(), CueError> {
        if !path.exists() {
            return Err(CueError::Missing(path.to_path_buf()));
        }
        open::that(path).map_err(|e| CueError::Playback {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn play_tone(&mut self, cue: Cue) {
        tracing::debug!(?cue, "tone cue");
        eprint!("\x07");
    }
}

/// Play the cue for `cue` according to `sound`.
///
/// Silent when sound is disabled. A custom sound that fails is logged and
/// replaced by the generated tone.
pub fn play_cue(notifier: &mut dyn Notifier, sound: &SoundSettings, cue: Cue) {
    if !sound.enabled {
        return;
    }
    match sound.custom_sound.as_deref() {
        Some(path) => {
            if let Err(e) = notifier.play_file(path) {
                tracing::warn!(error = %e, "custom sound failed; using tone");
                notifier.play_tone(cue);
            }
        }
        None => notifier.play_tone(cue),
    }
}

/// What the stop prompt should offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonRequest {
    /// Board owning the stopped item, when known.
    pub board: Option<BoardId>,
    pub reasons: Vec<String>,
}

/// Shows the stop prompt.
///
/// The answer is delivered later through
/// [`TimerEngine::resolve_with_reason`](crate::TimerEngine::resolve_with_reason)
/// or [`TimerEngine::resolve_cancelled`](crate::TimerEngine::resolve_cancelled).
pub trait ReasonCollector: Send {
    fn request(&mut self, request: &ReasonRequest);
}

/// Collector for callers that poll the engine for the pending request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCollector;

impl ReasonCollector for NoopCollector {
    fn request(&mut self, _request: &ReasonRequest) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        tones: Vec<Cue>,
        files: Vec<PathBuf>,
        fail_files: bool,
    }

    impl Notifier for Recorder {
        fn notice(&mut self, _message: &str) {}

        fn play_file(&mut self, path: &Path) -> Result<(), CueError> {
            self.files.push(path.to_path_buf());
            if self.fail_files {
                Err(CueError::Playback {
                    path: path.to_path_buf(),
                    message: "unsupported format".into(),
                })
            } else {
                Ok(())
            }
        }

        fn play_tone(&mut self, cue: Cue) {
            self.tones.push(cue);
        }
    }

    #[test]
    fn disabled_sound_plays_nothing() {
        let mut rec = Recorder::default();
        let sound = SoundSettings {
            enabled: false,
            custom_sound: Some("bell.wav".into()),
        };
        play_cue(&mut rec, &sound, Cue::SessionEnd);
        assert!(rec.tones.is_empty() && rec.files.is_empty());
    }

    #[test]
    fn failing_custom_sound_falls_back_to_tone() {
        let mut rec = Recorder {
            fail_files: true,
            ..Recorder::default()
        };
        let sound = SoundSettings {
            enabled: true,
            custom_sound: Some("bell.xyz".into()),
        };
        play_cue(&mut rec, &sound, Cue::BreakEnd);
        assert_eq!(rec.files.len(), 1);
        assert_eq!(rec.tones, vec![Cue::BreakEnd]);
    }

    #[test]
    fn working_custom_sound_skips_tone() {
        let mut rec = Recorder::default();
        let sound = SoundSettings {
            enabled: true,
            custom_sound: Some("bell.wav".into()),
        };
        play_cue(&mut rec, &sound, Cue::SessionEnd);
        assert!(rec.tones.is_empty());
    }

    #[test]
    fn tracing_notifier_reports_missing_file() {
        let mut n = TracingNotifier;
        assert!(matches!(
            n.play_file(Path::new("/definitely/not/here.wav")),
            Err(CueError::Missing(_))
        ));
    }
}
