//! Page history - the back stack of a reading session.

/// Visited page indices, oldest first.
///
/// Never empty. The last entry is always the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHistory {
    entries: Vec<usize>,
}

impl PageHistory {
    /// Start a history at the given page.
    pub fn starting_at(index: usize) -> Self {
        Self {
            entries: vec![index],
        }
    }

    /// The current page index.
    pub fn current(&self) -> usize {
        // entries is never empty
        self.entries[self.entries.len() - 1]
    }

    /// Record a move to `index`.
    pub fn push(&mut self, index: usize) {
        self.entries.push(index);
    }

    /// Drop the current page and return the new current page.
    ///
    /// Returns `None` without changing anything when only the initial entry is left.
    pub fn pop(&mut self) -> Option<usize> {
        if self.entries.len() > 1 {
            self.entries.pop();
            Some(self.current())
        } else {
            None
        }
    }

    /// Whether there is a previous page to go back to.
    pub fn can_go_back(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A history is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.entries
    }
}
