//! Story navigation - the state machine a reader moves through.
//!
//! [`NavigationState`] is a tagged union with pure transition functions.
//! [`StorySession`] owns one state for one story and reports every applied
//! transition as a [`Transition`], which the effect layer turns into
//! announcements and sounds.
//!
//! ```text
//!            advance / choice / back
//!              ┌──────────────┐
//!              ▼              │
//! open ──► Reading(i, history) ──► Completed
//!   │          (advance on last page, complete)
//!   └──► NotFound   (missing or empty story)
//! ```

mod history;

pub use history::*;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use story_content::{Choice, Page, Story};
use uuid::Uuid;

use crate::errors::BrokenLinkError;

/// Unique identifier for reading sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a reader is within a story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    /// On a page. The current index is `history.current()`.
    Reading { history: PageHistory },
    /// Finished the story. Absorbing.
    Completed,
    /// The story was missing or had no pages. Absorbing.
    NotFound,
}

impl NavigationState {
    /// Initial state for a story.
    pub fn start(story: Option<&Story>) -> Self {
        match story {
            Some(story) if story.is_readable() => NavigationState::Reading {
                history: PageHistory::starting_at(0),
            },
            _ => NavigationState::NotFound,
        }
    }

    /// Current page index while reading.
    pub fn page_index(&self) -> Option<usize> {
        match self {
            NavigationState::Reading { history } => Some(history.current()),
            _ => None,
        }
    }

    /// Back stack while reading.
    pub fn history(&self) -> Option<&PageHistory> {
        match self {
            NavigationState::Reading { history } => Some(history),
            _ => None,
        }
    }

    /// Whether the reader is on a page.
    pub fn is_reading(&self) -> bool {
        matches!(self, NavigationState::Reading { .. })
    }

    /// Completed and NotFound are terminal.
    pub fn is_terminal(&self) -> bool {
        !self.is_reading()
    }

    /// Move to the next page of a linear page, or complete on the last page.
    ///
    /// No-op on branch pages and in terminal states.
    pub fn advance(&self, story: &Story) -> Self {
        let NavigationState::Reading { history } = self else {
            return self.clone();
        };

        let index = history.current();
        match story.page(index) {
            Some(page) if page.is_linear() => {
                let next = index + 1;
                if next < story.page_count() {
                    let mut history = history.clone();
                    history.push(next);
                    NavigationState::Reading { history }
                } else {
                    NavigationState::Completed
                }
            }
            _ => self.clone(),
        }
    }

    /// Jump to a choice's target page.
    ///
    /// An out-of-range target leaves the state unchanged and returns
    /// [`BrokenLinkError`]. No-op on linear pages and in terminal states.
    pub fn select_choice(&self, story: &Story, choice: &Choice) -> Result<Self, BrokenLinkError> {
        let NavigationState::Reading { history } = self else {
            return Ok(self.clone());
        };

        let on_branch_page = story
            .page(history.current())
            .is_some_and(Page::is_branch);
        if !on_branch_page {
            return Ok(self.clone());
        }

        if !story.contains_page(choice.target) {
            return Err(BrokenLinkError {
                story_id: story.id.clone(),
                target: choice.target,
            });
        }

        let mut history = history.clone();
        // contains_page guarantees 0 <= target < page_count
        history.push(choice.target as usize);
        Ok(NavigationState::Reading { history })
    }

    /// Return to the previously visited page. No-op at the first entry.
    pub fn go_back(&self) -> Self {
        match self {
            NavigationState::Reading { history } if history.can_go_back() => {
                let mut history = history.clone();
                history.pop();
                NavigationState::Reading { history }
            }
            _ => self.clone(),
        }
    }

    /// Finish the story. Idempotent.
    pub fn complete(&self) -> Self {
        match self {
            NavigationState::Reading { .. } => NavigationState::Completed,
            _ => self.clone(),
        }
    }
}

/// What caused a move between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Advance,
    Choice,
    Back,
}

/// Outcome of applying a navigation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Entered a page (possibly the same index via a self-link).
    Entered { page_index: usize, cause: MoveKind },
    /// Moved into the Completed state.
    Completed,
    /// Nothing happened.
    Unchanged,
}

/// Actions the reader may take on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actions<'a> {
    pub back: bool,
    pub next: bool,
    pub finish: bool,
    pub choices: &'a [Choice],
}

/// One reading session over one story.
#[derive(Debug, Clone)]
pub struct StorySession {
    id: SessionId,
    story: Option<Arc<Story>>,
    state: NavigationState,
}

impl StorySession {
    /// Open a session. A missing or empty story yields a NotFound session.
    pub fn open(story: Option<Arc<Story>>) -> Self {
        let state = NavigationState::start(story.as_deref());
        let session = Self {
            id: SessionId::new(),
            story,
            state,
        };

        match (&session.story, &session.state) {
            (Some(story), NavigationState::Reading { .. }) => log::info!(
                "Session {}: reading '{}' ({} pages)",
                session.id,
                story.id,
                story.page_count()
            ),
            (Some(story), _) => log::warn!("Session {}: story '{}' has no pages", session.id, story.id),
            (None, _) => log::warn!("Session {}: story not found", session.id),
        }

        session
    }

    /// Open a session over a story known to exist.
    pub fn new(story: Arc<Story>) -> Self {
        Self::open(Some(story))
    }

    /// Get the session ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The story being read, if it was found.
    pub fn story(&self) -> Option<&Story> {
        self.story.as_deref()
    }

    /// Current navigation state.
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Current page index while reading.
    pub fn page_index(&self) -> Option<usize> {
        self.state.page_index()
    }

    /// Back stack while reading.
    pub fn history(&self) -> Option<&PageHistory> {
        self.state.history()
    }

    /// Number of pages, 0 for a missing story.
    pub fn page_count(&self) -> usize {
        self.story.as_ref().map_or(0, |s| s.page_count())
    }

    /// The page being read, if any.
    pub fn current_page(&self) -> Option<&Page> {
        let index = self.state.page_index()?;
        self.story.as_ref()?.page(index)
    }

    /// Turn to the next page, or complete on the last one.
    pub fn advance(&mut self) -> Transition {
        let Some(story) = self.story.as_deref() else {
            return Transition::Unchanged;
        };
        let next = self.state.advance(story);
        self.apply(next, MoveKind::Advance)
    }

    /// Follow `choice` from the current branch page.
    pub fn select_choice(&mut self, choice: &Choice) -> Result<Transition, BrokenLinkError> {
        let Some(story) = self.story.as_deref() else {
            return Ok(Transition::Unchanged);
        };

        match self.state.select_choice(story, choice) {
            Ok(next) => Ok(self.apply(next, MoveKind::Choice)),
            Err(err) => {
                log::error!("Session {}: {}", self.id, err);
                Err(err)
            }
        }
    }

    /// Select the current page's choice at `choice_index`.
    pub fn select_choice_at(&mut self, choice_index: usize) -> Result<Transition, BrokenLinkError> {
        match self.current_page().and_then(|p| p.choices.get(choice_index)).cloned() {
            Some(choice) => self.select_choice(&choice),
            None => Ok(Transition::Unchanged),
        }
    }

    /// Return to the previously visited page.
    pub fn go_back(&mut self) -> Transition {
        let next = self.state.go_back();
        self.apply(next, MoveKind::Back)
    }

    /// Finish the story from any page.
    pub fn complete(&mut self) -> Transition {
        let next = self.state.complete();
        self.apply(next, MoveKind::Advance)
    }

    /// Legal actions for the current page.
    pub fn actions(&self) -> Actions<'_> {
        let (Some(page), Some(index)) = (self.current_page(), self.page_index()) else {
            return Actions::default();
        };

        let is_last = index + 1 == self.page_count();
        Actions {
            back: self.history().is_some_and(PageHistory::can_go_back),
            next: page.is_linear() && !is_last,
            finish: page.is_linear() && is_last,
            choices: &page.choices,
        }
    }

    fn apply(&mut self, next: NavigationState, cause: MoveKind) -> Transition {
        if next == self.state {
            return Transition::Unchanged;
        }

        self.state = next;
        match self.state.page_index() {
            Some(page_index) => {
                log::debug!("Session {}: {:?} to page {}", self.id, cause, page_index);
                Transition::Entered { page_index, cause }
            }
            None => {
                log::info!("Session {}: story completed", self.id);
                Transition::Completed
            }
        }
    }
}
