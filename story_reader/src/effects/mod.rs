//! Collaborators the reader notifies.
//!
//! None of these feed anything back into navigation. Every call is
//! best-effort: the reader logs a returned [`EffectError`] and carries on.

mod narrator;

pub use narrator::*;

use async_trait::async_trait;

use crate::errors::EffectError;

/// Screen-reader live region.
pub trait Announcer: Send + Sync {
    fn announce(&self, message: &str) -> Result<(), EffectError>;

    /// Announce progress such as "Story progress: 2 out of 5 complete".
    fn announce_progress(&self, current: usize, total: usize, label: &str) -> Result<(), EffectError> {
        self.announce(&format!("{label} progress: {current} out of {total} complete"))
    }
}

/// Text-to-speech engine.
#[async_trait]
pub trait Speech: Send + Sync {
    /// Speak `text`, resolving when the utterance ends.
    async fn speak(&self, text: &str) -> Result<(), EffectError>;

    /// Stop any utterance in progress.
    fn cancel(&self);
}

/// Sound effect player.
pub trait SoundPlayer: Send + Sync {
    fn load(&self, id: &str, url: &str) -> Result<(), EffectError>;
    fn play(&self, id: &str) -> Result<(), EffectError>;
}

/// Receives story completion events for achievement bookkeeping.
pub trait AchievementTracker: Send + Sync {
    fn story_completed(&self);
}

/// Announcer that writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, message: &str) -> Result<(), EffectError> {
        log::info!("[announce] {message}");
        Ok(())
    }
}

/// Speech engine for environments without speech synthesis.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeech;

#[async_trait]
impl Speech for SilentSpeech {
    async fn speak(&self, _text: &str) -> Result<(), EffectError> {
        Err(EffectError::SpeechUnavailable)
    }

    fn cancel(&self) {}
}

/// Sound player that only logs what it would play.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSoundPlayer;

impl SoundPlayer for LogSoundPlayer {
    fn load(&self, id: &str, url: &str) -> Result<(), EffectError> {
        log::debug!("[sound] load {id} from {url}");
        Ok(())
    }

    fn play(&self, id: &str) -> Result<(), EffectError> {
        log::debug!("[sound] play {id}");
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoAchievements;

impl AchievementTracker for NoAchievements {
    fn story_completed(&self) {}
}

/// Log a swallowed collaborator failure.
pub(crate) fn swallow(what: &str, result: Result<(), EffectError>) {
    if let Err(e) = result {
        log::warn!("{what} failed: {e}");
    }
}
