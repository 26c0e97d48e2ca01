//! Error types for the reader core.
//!
//! Only [`BrokenLinkError`] and [`ImageLoadFailure`] ever reach a caller of
//! the navigation or image APIs. [`EffectError`] and [`StoreError`] are
//! logged and swallowed at the collaborator boundary.

use story_content::StoryId;

use crate::images::ImageAttempt;

/// A choice pointed at a page the story does not have.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("story '{story_id}' has no page {target}")]
pub struct BrokenLinkError {
    pub story_id: StoryId,
    pub target: i64,
}

/// Every fallback tier for an image reference failed to load.
#[derive(Debug, thiserror::Error)]
#[error("image '{reference}' failed to load after {} attempts", .attempts.len())]
pub struct ImageLoadFailure {
    /// The reference as it was handed to the pipeline.
    pub reference: String,
    /// The attempts made, in order.
    pub attempts: Vec<ImageAttempt>,
}

/// A single image fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid image URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("unexpected content type '{content_type}' for {url}")]
    NotAnImage { url: String, content_type: String },
}

/// A collaborator (speech, sound, announcer) failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("speech synthesis unavailable")]
    SpeechUnavailable,

    #[error("speech synthesis failed: {0}")]
    Speech(String),

    #[error("sound '{0}' is not loaded")]
    SoundNotLoaded(String),

    #[error("sound playback failed: {0}")]
    Sound(String),

    #[error("announcement failed: {0}")]
    Announce(String),
}

/// Durable key-value store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config value {value} for '{key}' is out of range")]
    OutOfRange { key: &'static str, value: u64 },

    #[error("invalid asset origin '{value}': {source}")]
    AssetOrigin {
        value: String,
        #[source]
        source: url::ParseError,
    },
}
