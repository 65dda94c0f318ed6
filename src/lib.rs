//! Viewport engine for a keyboard-driven photo triage tool.
//!
//! - `layout` - Windowed grid: which items to materialize for a scroll offset
//! - `preload` - Bounded-concurrency warm-up of the selection's neighbours
//! - `viewer` - Zoom, pan and pinch for the focused image
//! - `library` - Local listing, moving and deleting of photos
//! - `session` - Ties the above to one loaded directory and a selection

pub mod config;
pub mod error;
pub mod layout;
pub mod library;
pub mod models;
pub mod preload;
pub mod session;
pub mod viewer;

pub use config::ViewerConfig;
pub use error::{LoadError, Result, TriageError};
pub use session::{Bucket, Dispatched, Progress, TriageSession};
