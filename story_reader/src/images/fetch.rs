//! Fetching a single image URL.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::config::ReaderConfig;
use crate::errors::FetchError;

/// The body of an image that loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// The URL as it was attempted (before joining onto an asset origin).
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<LoadedImage, FetchError>;
}

/// HTTP GET via reqwest.
///
/// Root-relative URLs are joined onto the asset origin. Without an origin only
/// absolute URLs can be fetched.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    origin: Option<Url>,
}

impl HttpImageFetcher {
    pub fn new(origin: Option<Url>) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin,
        }
    }

    pub fn from_config(config: &ReaderConfig) -> Self {
        Self::new(config.asset_origin.clone())
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The URL a request for `url` goes to.
    pub fn request_url(&self, url: &str) -> Result<Url, FetchError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }

        let origin = self.origin.as_ref().ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "relative URL and no asset origin configured".to_string(),
        })?;

        origin.join(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<LoadedImage, FetchError> {
        let target = self.request_url(url)?;
        log::debug!("Fetching image {target}");

        let response = self.client.get(target.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(ct) = &content_type {
            if !is_image_type(ct) {
                return Err(FetchError::NotAnImage {
                    url: target.to_string(),
                    content_type: ct.clone(),
                });
            }
        }

        let bytes = response.bytes().await?.to_vec();
        Ok(LoadedImage {
            url: url.to_string(),
            content_type,
            bytes,
        })
    }
}

fn is_image_type(content_type: &str) -> bool {
    content_type
        .trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}
