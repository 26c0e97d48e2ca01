//! # Story Content
//!
//! The content crate for the Kids Learn story reader. It defines what a story
//! is and where stories come from, and contains no reading logic.
//!
//! - **story**: stories, pages and choices
//! - **catalog**: the read-only story catalog loaded from TOML or JSON
//! - **text**: rule-based text simplification for early readers

pub mod catalog;
pub mod story;
pub mod text;

pub use catalog::*;
pub use story::*;
pub use text::*;
