//! # Story Reader
//!
//! The reading core of Kids Learn. It walks a reader through a branching
//! story, tells the outside world what happened, and finds the pictures.
//!
//! ## Core Components
//!
//! - **navigation**: the page state machine and reading sessions
//! - **reader**: a session wired to announcer, sounds, speech and achievements
//! - **effects**: collaborator traits and the read-aloud narrator
//! - **images**: reference resolution, fallback loading and the loaded-image cache
//! - **store**: durable key-value storage for the image cache
//! - **config**: deployment base path, asset origin and timeouts
//!
//! Navigation never waits on an effect, and no effect can change where the
//! reader is.

pub mod clock;
pub mod config;
pub mod effects;
pub mod errors;
pub mod images;
pub mod navigation;
pub mod reader;
pub mod store;

pub use clock::*;
pub use config::*;
pub use effects::*;
pub use errors::*;
pub use images::*;
pub use navigation::*;
pub use reader::*;
pub use store::*;
