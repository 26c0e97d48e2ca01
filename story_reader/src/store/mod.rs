//! Durable key-value storage.
//!
//! The reader only persists one thing: the snapshot of image URLs known to
//! have loaded. [`KeyValueStore`] is the string-keyed interface that
//! snapshot is written through.
//!
//! - [`InMemoryStore`]: no persistence, for tests and private sessions.
//! - [`JsonFileStore`]: the whole store as one JSON object on disk.

mod in_memory;
mod json_file;

pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;

use crate::errors::StoreError;

/// Object-safe string key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Retrieves the value for `key`, or `None` if not present.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Sets the value for `key`, overwriting any existing value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys, sorted.
    fn keys(&self) -> Vec<String>;
}
