//! Record of image URLs known to have loaded.
//!
//! The cache only remembers URLs, never image bytes. It is a hint: a cached
//! URL is still fetched, and a miss says nothing about whether it would load.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::clock::Clock;
use crate::config::ImageCacheConfig;
use crate::errors::StoreError;
use crate::store::KeyValueStore;

pub trait ImageCache: Send + Sync {
    fn has(&self, url: &str) -> bool;

    /// Remember that `url` loaded.
    fn record(&self, url: &str);

    fn clear(&self);
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct InMemoryImageCache {
    urls: RwLock<BTreeSet<String>>,
}

impl InMemoryImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_urls(urls: impl IntoIterator<Item = String>) -> Self {
        Self {
            urls: RwLock::new(urls.into_iter().collect()),
        }
    }

    /// Insert `url`, returning whether it was new.
    fn insert(&self, url: &str) -> bool {
        self.urls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string())
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.urls.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageCache for InMemoryImageCache {
    fn has(&self, url: &str) -> bool {
        self.urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    fn record(&self, url: &str) {
        self.insert(url);
    }

    fn clear(&self) {
        self.urls.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Stored form of the cache.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    urls: Vec<String>,
    /// Unix millis of the last write.
    timestamp: u64,
}

/// Cache mirrored into a [`KeyValueStore`], expired wholesale once the
/// snapshot is older than the configured max age.
pub struct PersistentImageCache {
    memory: InMemoryImageCache,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
    /// Held across insert and write so snapshots land in order.
    writes: Mutex<()>,
}

impl PersistentImageCache {
    /// Restore the snapshot under the configured key, or drop it if it expired.
    pub fn initialize(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: &ImageCacheConfig,
    ) -> Self {
        let key = config.storage_key.clone();
        let max_age_ms = u64::try_from(config.max_age.as_millis()).unwrap_or(u64::MAX);

        let restored = match store.get_item(&key) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Snapshot>(&raw) {
                Ok(snapshot) if clock.now_millis().saturating_sub(snapshot.timestamp) < max_age_ms => {
                    log::info!("Restored {} cached image URLs", snapshot.urls.len());
                    snapshot.urls
                }
                Ok(_) => {
                    log::info!("Image cache expired");
                    discard(store.as_ref(), &key);
                    Vec::new()
                }
                Err(e) => {
                    log::warn!("Error initializing image cache: {e}");
                    discard(store.as_ref(), &key);
                    Vec::new()
                }
            },
        };

        Self {
            memory: InMemoryImageCache::with_urls(restored),
            store,
            clock,
            key,
            writes: Mutex::new(()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.memory.urls()
    }

    fn persist(&self) {
        let snapshot = Snapshot {
            urls: self.memory.urls(),
            timestamp: self.clock.now_millis(),
        };

        let saved = serde_json::to_string(&snapshot)
            .map_err(StoreError::from)
            .and_then(|json| self.store.set_item(&self.key, &json));

        if let Err(e) = saved {
            log::warn!("Error saving image cache: {e}");
        }
    }
}

fn discard(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove_item(key) {
        log::warn!("Error removing image cache: {e}");
    }
}

impl ImageCache for PersistentImageCache {
    fn has(&self, url: &str) -> bool {
        self.memory.has(url)
    }

    fn record(&self, url: &str) {
        let _writing = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        if self.memory.insert(url) {
            self.persist();
        }
    }

    fn clear(&self) {
        let _writing = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        self.memory.clear();
        discard(self.store.as_ref(), &self.key);
    }
}

impl std::fmt::Debug for PersistentImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentImageCache")
            .field("key", &self.key)
            .field("urls", &self.memory.len())
            .finish()
    }
}
