//! Preload pipeline for the triage viewer.
//!
//! This module provides:
//! - `Preloader` - Bounded-concurrency warm-up queue keyed by image path
//! - `SourceCache` - Session-scoped path -> source map shared with the renderer
//! - `WarmStore` - Byte-budgeted LRU of prefetched source bytes
//! - `Loader` - The seam that performs the actual fetch (`FsLoader` for local files)

pub mod cache;
pub mod loader;
pub mod queue;
pub mod warm;

pub use cache::{SourceCache, SourceHandle};
pub use loader::{Completion, FsLoader, LoadOutcome, LoadRequest, Loader};
pub use queue::{PreloadState, PreloadStats, Preloader, DEFAULT_MAX_CONCURRENT};
pub use warm::{WarmStore, DEFAULT_PRELOAD_MB};
