use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::library::file_ops::{self, BatchMoveResult};
use crate::library::metadata::{self, Metadata};
use crate::library::scanner::{self, ScanConfig};
use crate::models::MediaItem;

/// File-management operations the triage session depends on.
///
/// `LocalMediaService` is the filesystem implementation; tests and other hosts
/// can substitute their own.
pub trait MediaService {
    fn list_items(
        &self,
        dir: &Path,
        recursive: bool,
        max_depth: usize,
    ) -> Result<Vec<MediaItem>>;

    /// Create `dir` (and parents) if it does not exist.
    fn ensure_dir(&self, dir: &Path) -> Result<()>;

    /// Move `src` into `dest_dir`, returning the new path.
    fn move_item(&self, src: &Path, dest_dir: &Path) -> Result<PathBuf>;

    fn batch_move(&self, files: &[PathBuf], dest_dir: &Path) -> Result<BatchMoveResult>;

    fn delete_item(&self, path: &Path) -> Result<()>;

    fn read_metadata(&self, path: &Path) -> Option<Metadata>;

    fn count_items(&self, dir: &Path) -> Result<usize>;
}

#[derive(Debug, Clone, Default)]
pub struct LocalMediaService {
    follow_symlinks: bool,
}

impl LocalMediaService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service whose listings follow symbolic links when `follow_symlinks`.
    pub fn with_symlinks(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }
}

impl MediaService for LocalMediaService {
    fn list_items(
        &self,
        dir: &Path,
        recursive: bool,
        max_depth: usize,
    ) -> Result<Vec<MediaItem>> {
        let config = ScanConfig {
            recursive,
            max_depth,
            follow_symlinks: self.follow_symlinks,
        };
        scanner::list_items(dir, &config)
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        file_ops::ensure_dir(dir)
    }

    fn move_item(&self, src: &Path, dest_dir: &Path) -> Result<PathBuf> {
        file_ops::move_item(src, dest_dir)
    }

    fn batch_move(&self, files: &[PathBuf], dest_dir: &Path) -> Result<BatchMoveResult> {
        file_ops::batch_move(files, dest_dir)
    }

    fn delete_item(&self, path: &Path) -> Result<()> {
        file_ops::delete_item(path)
    }

    fn read_metadata(&self, path: &Path) -> Option<Metadata> {
        metadata::read_metadata(path)
    }

    fn count_items(&self, dir: &Path) -> Result<usize> {
        scanner::count_items(dir)
    }
}
