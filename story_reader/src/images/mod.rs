//! Image resolution pipeline.
//!
//! Story and animal image references are authored as app-relative paths that
//! do not always match where the files are deployed. [`ImageResolver`] turns a
//! reference into the primary URL, and [`ImagePipeline`] walks a short chain
//! of fallback URLs until one loads.
//!
//! ```text
//! tier 0  resolve(reference)
//! tier 1  {base}/images/animals/{file name}
//! tier 2  /images/animals/{file name}     (only when tier 1 carried a base path)
//! ```

mod cache;
mod fetch;
mod rules;

pub use cache::*;
pub use fetch::*;
pub use rules::*;

use std::sync::Arc;

use crate::config::{BasePath, ReaderConfig};
use crate::errors::ImageLoadFailure;

/// One URL tried while loading an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageAttempt {
    pub url: String,
    /// Position in the fallback chain, 0 for the primary URL.
    pub tier: usize,
}

impl ImageAttempt {
    pub fn new(url: impl Into<String>, tier: usize) -> Self {
        Self {
            url: url.into(),
            tier,
        }
    }
}

/// Pure reference-to-URL resolution.
#[derive(Debug, Clone, Default)]
pub struct ImageResolver {
    base_path: Option<BasePath>,
}

impl ImageResolver {
    pub fn new(base_path: Option<BasePath>) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &ReaderConfig) -> Self {
        Self::new(config.base_path.clone())
    }

    pub fn base_path(&self) -> Option<&BasePath> {
        self.base_path.as_ref()
    }

    fn context(&self) -> RewriteContext<'_> {
        RewriteContext {
            base_path: self.base_path.as_ref(),
        }
    }

    /// The primary URL for `reference`.
    pub fn resolve(&self, reference: &str) -> String {
        rewrite(RESOLVE_RULES, reference, &self.context())
    }

    /// Every URL to try for `reference`, in order.
    pub fn fallback_chain(&self, reference: &str) -> Vec<ImageAttempt> {
        let mut chain = vec![ImageAttempt::new(self.resolve(reference), 0)];

        let Some(file_name) = file_name(reference) else {
            return chain;
        };

        let unprefixed = format!("/{IMAGES_SEGMENT}/{ANIMALS_SEGMENT}/{file_name}");
        let prefixed = match &self.base_path {
            Some(base) if !base.is_prefix_of(&unprefixed) => format!("{base}{unprefixed}"),
            _ => unprefixed.clone(),
        };

        let carried_base = prefixed != unprefixed;
        chain.push(ImageAttempt::new(prefixed, 1));
        if carried_base {
            chain.push(ImageAttempt::new(unprefixed, 2));
        }
        chain
    }
}

/// Last path segment of a reference, without query or fragment.
fn file_name(reference: &str) -> Option<&str> {
    let path = reference.split(['?', '#']).next()?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Resolves, fetches and remembers images.
pub struct ImagePipeline {
    resolver: ImageResolver,
    fetcher: Arc<dyn ImageFetcher>,
    cache: Arc<dyn ImageCache>,
}

impl ImagePipeline {
    pub fn new(
        resolver: ImageResolver,
        fetcher: Arc<dyn ImageFetcher>,
        cache: Arc<dyn ImageCache>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            cache,
        }
    }

    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<dyn ImageCache> {
        &self.cache
    }

    pub fn resolve(&self, reference: &str) -> String {
        self.resolver.resolve(reference)
    }

    /// Whether the primary URL for `reference` has loaded before.
    ///
    /// Fallback URLs are not consulted, so this can be false for a reference
    /// that did load through a later tier.
    pub fn is_cached(&self, reference: &str) -> bool {
        self.cache.has(&self.resolve(reference))
    }

    /// Try each URL in the fallback chain until one loads.
    pub async fn load_with_fallback(&self, reference: &str) -> Result<LoadedImage, ImageLoadFailure> {
        let attempts = self.resolver.fallback_chain(reference);

        for attempt in &attempts {
            match self.fetcher.fetch(&attempt.url).await {
                Ok(image) => {
                    if attempt.tier > 0 {
                        log::info!(
                            "Image '{reference}' loaded from fallback tier {}: {}",
                            attempt.tier,
                            attempt.url
                        );
                    }
                    self.cache.record(&attempt.url);
                    return Ok(image);
                }
                Err(e) => log::debug!("Image tier {} failed ({}): {e}", attempt.tier, attempt.url),
            }
        }

        log::error!("Failed to load image '{reference}'");
        Err(ImageLoadFailure {
            reference: reference.to_string(),
            attempts,
        })
    }
}

impl std::fmt::Debug for ImagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePipeline")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Text shown in place of an image that could not load: the subject's initial.
pub fn placeholder_initial(subject: &str) -> String {
    subject
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Serves only the URLs it was given and records every request.
    struct FakeFetcher {
        available: HashSet<String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn serving(urls: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                available: urls.iter().map(|u| u.to_string()).collect(),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<LoadedImage, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            if self.available.contains(url) {
                Ok(LoadedImage {
                    url: url.to_string(),
                    content_type: Some("image/png".to_string()),
                    bytes: vec![0x89, b'P', b'N', b'G'],
                })
            } else {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            }
        }
    }

    fn resolver(base: Option<&str>) -> ImageResolver {
        ImageResolver::new(base.and_then(BasePath::parse))
    }

    fn pipeline(base: Option<&str>, fetcher: Arc<FakeFetcher>) -> (ImagePipeline, Arc<InMemoryImageCache>) {
        let cache = Arc::new(InMemoryImageCache::new());
        (ImagePipeline::new(resolver(base), fetcher, cache.clone()), cache)
    }

    fn urls(chain: &[ImageAttempt]) -> Vec<&str> {
        chain.iter().map(|a| a.url.as_str()).collect()
    }

    #[test]
    fn test_resolve_with_base_path() {
        assert_eq!(
            resolver(Some("/kids-learn")).resolve("/animals/cat.png"),
            "/kids-learn/images/animals/cat.png"
        );
    }

    #[test]
    fn test_chain_without_base_path() {
        let chain = resolver(None).fallback_chain("/stories/cat.png");
        assert_eq!(urls(&chain), ["/stories/cat.png", "/images/animals/cat.png"]);
        assert_eq!(chain[1].tier, 1);
    }

    #[test]
    fn test_chain_with_base_path() {
        let chain = resolver(Some("/kids-learn")).fallback_chain("/stories/cat.png");
        assert_eq!(
            urls(&chain),
            [
                "/kids-learn/stories/cat.png",
                "/kids-learn/images/animals/cat.png",
                "/images/animals/cat.png",
            ]
        );
        assert_eq!(chain.iter().map(|a| a.tier).collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn test_chain_uses_file_name_only() {
        let chain = resolver(None).fallback_chain("https://cdn.example.com/a/b/fox.png?v=2");
        assert_eq!(
            urls(&chain),
            ["https://cdn.example.com/a/b/fox.png?v=2", "/images/animals/fox.png"]
        );
    }

    #[test]
    fn test_chain_without_file_name() {
        let chain = resolver(Some("/kids-learn")).fallback_chain("/images/");
        assert_eq!(chain.len(), 1);
    }

    #[tokio::test]
    async fn test_primary_url_loads() {
        let fetcher = FakeFetcher::serving(&["/kids-learn/images/animals/cat.png"]);
        let (pipeline, cache) = pipeline(Some("/kids-learn"), fetcher.clone());

        let image = pipeline.load_with_fallback("/animals/cat.png").await.unwrap();

        assert_eq!(image.url, "/kids-learn/images/animals/cat.png");
        assert_eq!(fetcher.requested().len(), 1);
        assert!(cache.has("/kids-learn/images/animals/cat.png"));
        assert!(pipeline.is_cached("/animals/cat.png"));
    }

    #[tokio::test]
    async fn test_falls_back_to_unprefixed_path() {
        let fetcher = FakeFetcher::serving(&["/images/animals/cat.png"]);
        let (pipeline, cache) = pipeline(Some("/kids-learn"), fetcher.clone());

        let image = pipeline.load_with_fallback("/stories/cat.png").await.unwrap();

        assert_eq!(image.url, "/images/animals/cat.png");
        assert_eq!(fetcher.requested().len(), 3);
        assert!(cache.has("/images/animals/cat.png"));
        // only the primary URL counts
        assert!(!pipeline.is_cached("/stories/cat.png"));
    }

    #[tokio::test]
    async fn test_all_tiers_fail() {
        let fetcher = FakeFetcher::serving(&[]);
        let (pipeline, cache) = pipeline(None, fetcher.clone());

        let failure = pipeline.load_with_fallback("/stories/ghost.png").await.unwrap_err();

        assert_eq!(failure.reference, "/stories/ghost.png");
        assert_eq!(urls(&failure.attempts), fetcher.requested());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_all_three_tiers_fail_with_base_path() {
        let fetcher = FakeFetcher::serving(&[]);
        let (pipeline, _cache) = pipeline(Some("/kids-learn"), fetcher.clone());

        let failure = pipeline.load_with_fallback("/stories/ghost.png").await.unwrap_err();

        assert_eq!(
            fetcher.requested(),
            [
                "/kids-learn/stories/ghost.png",
                "/kids-learn/images/animals/ghost.png",
                "/images/animals/ghost.png",
            ]
        );
        assert_eq!(failure.attempts.iter().map(|a| a.tier).collect::<Vec<_>>(), [0, 1, 2]);
        assert!(!pipeline.is_cached("/stories/ghost.png"));
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let resolver = resolver(Some("/kids-learn"));
        for reference in ["/animals/cat.png", "stories/cover.png", "https://cdn.example.com/x.png"] {
            let first = resolver.resolve(reference);
            assert_eq!(resolver.resolve(reference), first);
        }
    }

    #[test]
    fn test_placeholder_initial() {
        assert_eq!(placeholder_initial("elephant"), "E");
        assert_eq!(placeholder_initial("  owl"), "O");
        assert_eq!(placeholder_initial(""), "");
    }
}
