//! Local photo library: listing, moving, deleting and file details.
//!
//! This module provides:
//! - `MediaService` - The file-management seam used by the triage session
//! - `LocalMediaService` - Filesystem implementation backed by walkdir and `image` headers
//! - `ScanConfig` - Recursive/flat listing options

pub mod file_ops;
pub mod metadata;
pub mod scanner;
pub mod service;

pub use file_ops::BatchMoveResult;
pub use metadata::{format_file_size, ExifSummary, Metadata};
pub use scanner::{ScanConfig, DEFAULT_MAX_DEPTH};
pub use service::{LocalMediaService, MediaService};
