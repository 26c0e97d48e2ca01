//! Story definitions - the pages and choices a reader moves through.

mod page;

pub use page::*;

use serde::{Deserialize, Serialize};

/// Unique identifier for stories (a slug such as `red-riding-hood`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub String);

impl StoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reading difficulty of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// A story: a title and an ordered sequence of pages.
///
/// Stories are immutable once loaded. Choice targets are not checked here;
/// the reader validates them when a choice is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,

    #[serde(default)]
    pub pages: Vec<Page>,

    #[serde(default, alias = "coverImage", skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,

    /// Oldest recommended reader age in years.
    #[serde(default, alias = "recommendedAge")]
    pub recommended_age: u8,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub featured: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Story {
    /// Create a new story with no pages.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: StoryId::new(id),
            title: title.into(),
            pages: Vec::new(),
            cover_image: None,
            recommended_age: 0,
            difficulty: Difficulty::Easy,
            category: String::new(),
            featured: false,
            description: None,
        }
    }

    /// Append a page.
    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    /// Append several pages.
    pub fn with_pages(mut self, pages: impl IntoIterator<Item = Page>) -> Self {
        self.pages.extend(pages);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_recommended_age(mut self, age: u8) -> Self {
        self.recommended_age = age;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    /// Get a page by index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Index of the last page, if there is one.
    pub fn last_index(&self) -> Option<usize> {
        self.pages.len().checked_sub(1)
    }

    /// Check whether `index` is a valid page index.
    pub fn contains_page(&self, index: i64) -> bool {
        usize::try_from(index).is_ok_and(|i| i < self.pages.len())
    }

    /// A story can only be read if it has at least one page.
    pub fn is_readable(&self) -> bool {
        !self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_pages() -> Story {
        Story::new("s3", "Three Pages").with_pages([
            Page::new("p0"),
            Page::new("p1"),
            Page::new("p2"),
        ])
    }

    #[test]
    fn test_new_story_is_not_readable() {
        let story = Story::new("empty", "Nothing Here");
        assert!(!story.is_readable());
        assert_eq!(story.page_count(), 0);
        assert!(story.last_index().is_none());
    }

    #[test]
    fn test_contains_page_bounds() {
        let story = three_pages();
        assert!(story.contains_page(0));
        assert!(story.contains_page(2));
        assert!(!story.contains_page(3));
        assert!(!story.contains_page(-1));
    }

    #[test]
    fn test_last_index() {
        assert_eq!(three_pages().last_index(), Some(2));
    }

    #[test]
    fn test_deserialize_camel_case_field_names() {
        let json = r#"{
            "id": "red-riding-hood",
            "title": "Little Red Riding Hood",
            "coverImage": "/images/stories/red-riding-hood-cover.png",
            "recommendedAge": 5,
            "difficulty": "easy",
            "category": "fairy-tale",
            "featured": true,
            "pages": [
                {
                    "text": "Once upon a time...",
                    "image": "/images/stories/red-riding-hood-1.png",
                    "soundUrl": "/sounds/stories/red-riding-hood-1.mp3",
                    "choices": [{ "text": "Short path", "nextPage": 2 }]
                }
            ]
        }"#;

        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.id.as_str(), "red-riding-hood");
        assert_eq!(story.recommended_age, 5);
        assert_eq!(story.difficulty, Difficulty::Easy);
        assert!(story.featured);
        assert_eq!(
            story.pages[0].sound.as_deref(),
            Some("/sounds/stories/red-riding-hood-1.mp3")
        );
        assert_eq!(story.pages[0].choices[0].target, 2);
    }

    #[test]
    fn test_out_of_range_targets_still_load() {
        let json = r#"{"id": "s1", "title": "S1", "pages": [
            {"text": "A", "choices": [{"text": "go", "target": 5}, {"text": "back", "target": -1}]}
        ]}"#;

        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.pages[0].choices[0].target, 5);
        assert_eq!(story.pages[0].choices[1].target, -1);
    }
}
