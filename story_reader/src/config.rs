//! Reader configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::errors::ConfigError;

/// Environment variable holding the deployment base path.
pub const BASE_PATH_ENV: &str = "PUBLIC_URL";
/// Environment variable holding the origin assets are fetched from.
pub const ASSET_ORIGIN_ENV: &str = "KIDS_LEARN_ASSET_ORIGIN";

const DEFAULT_SPEECH_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_IMAGE_CACHE_KEY: &str = "kids-learn-image-cache";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
const DEFAULT_IMAGE_CACHE_MAX_AGE: Duration = Duration::from_secs(7 * SECONDS_PER_DAY);

/// Deployment prefix applied to root-relative asset paths (e.g. `/kids-learn`).
///
/// Always non-empty, never ends with `/`, and starts with `/` unless it is an
/// absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasePath(String);

impl BasePath {
    /// Normalize a raw base path. Returns `None` for empty or `/`-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return None;
        }

        if Url::parse(trimmed).is_ok() || trimmed.starts_with('/') {
            Some(Self(trimmed.to_string()))
        } else {
            Some(Self(format!("/{trimmed}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether `path` already starts with this prefix, on a segment boundary.
    pub fn is_prefix_of(&self, path: &str) -> bool {
        path.strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

impl std::fmt::Display for BasePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolved image cache configuration.
#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    /// Key the cache snapshot is stored under.
    pub storage_key: String,
    /// A persisted snapshot older than this is discarded at startup.
    pub max_age: Duration,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_IMAGE_CACHE_KEY.to_string(),
            max_age: DEFAULT_IMAGE_CACHE_MAX_AGE,
        }
    }
}

/// Main reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Deployment base path for asset URLs.
    pub base_path: Option<BasePath>,
    /// Origin relative asset URLs are fetched from.
    pub asset_origin: Option<Url>,
    /// Upper bound on a single narration before it is force-resolved.
    pub speech_timeout: Duration,
    pub image_cache: ImageCacheConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            asset_origin: None,
            speech_timeout: DEFAULT_SPEECH_TIMEOUT,
            image_cache: ImageCacheConfig::default(),
        }
    }
}

/// TOML layout of a config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_path: Option<String>,
    asset_origin: Option<String>,
    speech_timeout_secs: Option<u64>,
    image_cache_key: Option<String>,
    image_cache_max_age_days: Option<u64>,
}

impl ReaderConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        Self::from_lookup(lookup)
    }

    /// Build a configuration from any key lookup (environment-like).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.base_path = lookup(BASE_PATH_ENV).and_then(|raw| BasePath::parse(&raw));
        if let Some(origin) = lookup(ASSET_ORIGIN_ENV) {
            config.asset_origin = Some(parse_origin(&origin)?);
        }
        Ok(config)
    }

    /// Parse a TOML configuration; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        let mut config = Self::default();

        config.base_path = file.base_path.as_deref().and_then(BasePath::parse);
        if let Some(origin) = file.asset_origin {
            config.asset_origin = Some(parse_origin(&origin)?);
        }
        if let Some(secs) = file.speech_timeout_secs {
            config.speech_timeout = Duration::from_secs(secs);
        }
        if let Some(key) = file.image_cache_key {
            config.image_cache.storage_key = key;
        }
        if let Some(days) = file.image_cache_max_age_days {
            let secs = days
                .checked_mul(SECONDS_PER_DAY)
                .ok_or(ConfigError::OutOfRange {
                    key: "image_cache_max_age_days",
                    value: days,
                })?;
            config.image_cache.max_age = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Load a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn with_base_path(mut self, raw: &str) -> Self {
        self.base_path = BasePath::parse(raw);
        self
    }
}

fn parse_origin(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::AssetOrigin {
        value: value.to_string(),
        source,
    })
}
