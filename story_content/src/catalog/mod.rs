//! Story catalog - the read-only content source the reader is fed from.
//!
//! Catalogs are loaded eagerly from TOML or JSON. The only structural
//! requirement is the one the reader needs: a readable story has at least
//! one page. Stories without pages still load so that opening them can
//! surface a "story not found" state.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::story::{Difficulty, Story, StoryId};

/// Errors raised while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

/// On-disk layout of a catalog file.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    stories: Vec<Story>,
}

/// The collection of all stories available to read.
#[derive(Debug, Clone, Default)]
pub struct StoryCatalog {
    stories: Vec<Arc<Story>>,
}

impl StoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already constructed stories.
    pub fn from_stories(stories: impl IntoIterator<Item = Story>) -> Self {
        Self {
            stories: stories.into_iter().map(Arc::new).collect(),
        }
    }

    /// Parse a TOML catalog (`[[stories]]` tables).
    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(source)?;
        Ok(Self::from_file(file))
    }

    /// Parse a JSON catalog, either `{"stories": [...]}` or a bare array.
    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value = serde_json::from_str(source)?;
        let file = if value.is_array() {
            CatalogFile {
                stories: serde_json::from_value(value)?,
            }
        } else {
            serde_json::from_value(value)?
        };
        Ok(Self::from_file(file))
    }

    /// Load a catalog file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let catalog = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source)?,
            Some("json") => Self::from_json_str(&source)?,
            other => {
                return Err(CatalogError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };

        log::info!(
            "Loaded {} stories from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    fn from_file(file: CatalogFile) -> Self {
        let catalog = Self::from_stories(file.stories);
        for story in catalog.stories.iter().filter(|s| !s.is_readable()) {
            log::warn!("Story '{}' has no pages", story.id);
        }
        catalog
    }

    /// Add a story to the catalog.
    pub fn add_story(&mut self, story: Story) -> StoryId {
        let id = story.id.clone();
        self.stories.push(Arc::new(story));
        id
    }

    /// Get a story by ID.
    pub fn get(&self, id: &str) -> Option<Arc<Story>> {
        self.stories.iter().find(|s| s.id.as_str() == id).cloned()
    }

    /// All stories in catalog order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<Story>> {
        self.stories.iter()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Find stories matching a predicate.
    pub fn find<F>(&self, predicate: F) -> Vec<Arc<Story>>
    where
        F: Fn(&Story) -> bool,
    {
        self.stories
            .iter()
            .filter(|s| predicate(s))
            .cloned()
            .collect()
    }

    /// Stories recommended for readers of the given age or younger.
    pub fn for_age(&self, age: u8) -> Vec<Arc<Story>> {
        self.find(|s| s.recommended_age <= age)
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> Vec<Arc<Story>> {
        self.find(|s| s.difficulty == difficulty)
    }

    pub fn by_category(&self, category: &str) -> Vec<Arc<Story>> {
        self.find(|s| s.category == category)
    }

    pub fn featured(&self) -> Vec<Arc<Story>> {
        self.find(|s| s.featured)
    }

    /// Case-insensitive search over title, description and category.
    pub fn search(&self, query: &str) -> Vec<Arc<Story>> {
        let query = query.to_lowercase();
        self.find(|s| {
            s.title.to_lowercase().contains(&query)
                || s
                    .description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
                || s.category.to_lowercase().contains(&query)
        })
    }

    /// Distinct categories in order of first appearance.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.stories
            .iter()
            .filter(|s| seen.insert(s.category.as_str()))
            .map(|s| s.category.clone())
            .collect()
    }
}
