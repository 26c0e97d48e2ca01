//! Page and choice definitions.

use serde::{Deserialize, Serialize};

/// A labeled jump to another page of the same story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Label shown to the reader.
    pub text: String,

    /// Target page index. May point outside the story.
    #[serde(alias = "nextPage")]
    pub target: i64,
}

impl Choice {
    pub fn new(text: impl Into<String>, target: i64) -> Self {
        Self {
            text: text.into(),
            target,
        }
    }
}

/// One unit of story content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub text: String,

    /// Illustration reference (a path, not necessarily a resolved URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Narration or sound effect reference.
    #[serde(default, alias = "soundUrl", skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    /// Choices offered on a branch page; empty for linear pages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl Page {
    /// Create a linear page with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
            sound: None,
            choices: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Add a choice, turning this page into a branch page.
    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// A branch page requires a choice to move on.
    pub fn is_branch(&self) -> bool {
        !self.choices.is_empty()
    }

    pub fn is_linear(&self) -> bool {
        self.choices.is_empty()
    }
}
