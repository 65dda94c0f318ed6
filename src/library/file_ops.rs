//! Move and delete operations behind the triage buckets.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, TriageError};

/// Outcome of moving several files into one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchMoveResult {
    /// Source paths that were moved.
    pub success: Vec<PathBuf>,
    /// Source paths that could not be moved.
    pub failed: Vec<PathBuf>,
}

impl BatchMoveResult {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

fn map_io(path: &Path, e: std::io::Error) -> TriageError {
    if e.kind() == ErrorKind::NotFound {
        TriageError::NotFound(path.to_path_buf())
    } else {
        TriageError::io(path, e)
    }
}

// Never replaces an existing file. Rename first; a cross-device rename fails,
// so fall back to copy + remove.
fn relocate(src: &Path, dest: &Path) -> std::io::Result<()> {
    if dest.exists() {
        return Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("{:?} already exists", dest),
        ));
    }
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(e),
        Err(e) => {
            debug!("Rename {:?} -> {:?} failed ({}), copying instead", src, dest, e);
            fs::copy(src, dest)?;
            fs::remove_file(src)
        }
    }
}

/// Create `dir` and any missing parents.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| TriageError::io(dir, e))?;
    debug!("Ensured directory {:?}", dir);
    Ok(())
}

/// Move `src` into `dest_dir`, creating the directory if needed.
///
/// Returns the new path of the file. A file of the same name already in
/// `dest_dir` is left alone and reported as `AlreadyExists`.
pub fn move_item(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = src
        .file_name()
        .ok_or_else(|| TriageError::InvalidPath(src.to_path_buf()))?;
    if !src.is_file() {
        return Err(TriageError::NotFound(src.to_path_buf()));
    }

    ensure_dir(dest_dir)?;

    let dest = dest_dir.join(file_name);
    relocate(src, &dest).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => TriageError::AlreadyExists(dest.clone()),
        _ => map_io(src, e),
    })?;

    info!("Moved {:?} -> {:?}", src, dest);
    Ok(dest)
}

/// Move each file into `dest_dir`, collecting per-file outcomes.
///
/// Only a failure to create `dest_dir` fails the whole batch.
pub fn batch_move(files: &[PathBuf], dest_dir: &Path) -> Result<BatchMoveResult> {
    ensure_dir(dest_dir)?;

    let mut result = BatchMoveResult::default();
    for src in files {
        let moved = match src.file_name() {
            Some(name) => relocate(src, &dest_dir.join(name)),
            None => Err(std::io::Error::new(ErrorKind::InvalidInput, "no file name")),
        };

        match moved {
            Ok(()) => result.success.push(src.clone()),
            Err(e) => {
                warn!("Failed to move {:?}: {}", src, e);
                result.failed.push(src.clone());
            }
        }
    }

    info!(
        "Batch move to {:?}: {} moved, {} failed",
        dest_dir,
        result.success.len(),
        result.failed.len()
    );
    Ok(result)
}

/// Delete a file. Missing files are reported as `NotFound`.
pub fn delete_item(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(TriageError::NotFound(path.to_path_buf()));
    }
    fs::remove_file(path).map_err(|e| map_io(path, e))?;
    info!("Deleted {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_move_item_creates_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("photo.jpg");
        fs::write(&src, b"data").unwrap();

        let dest_dir = dir.path().join("Landscape");
        let moved = move_item(&src, &dest_dir).unwrap();

        assert_eq!(moved, dest_dir.join("photo.jpg"));
        assert!(!src.exists());
        assert_eq!(fs::read(&moved).unwrap(), b"data");
    }

    #[test]
    fn test_move_item_missing_source() {
        let dir = tempdir().unwrap();
        let result = move_item(&dir.path().join("gone.jpg"), dir.path());
        assert!(matches!(result, Err(TriageError::NotFound(_))));
    }

    #[test]
    fn test_batch_move_partial() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        fs::write(&a, b"a").unwrap();
        let dest = dir.path().join("Reject");

        let result = batch_move(&[a.clone(), b.clone()], &dest).unwrap();
        assert_eq!(result.success, vec![a]);
        assert_eq!(result.failed, vec![b]);
        assert!(!result.is_complete());
        assert!(dest.join("a.png").exists());
    }

    #[test]
    fn test_move_item_keeps_existing_destination() {
        let dir = tempdir().unwrap();
        let dest_dir = dir.path().join("Portrait");
        fs::create_dir(&dest_dir).unwrap();
        fs::write(dest_dir.join("photo.jpg"), b"already sorted").unwrap();
        let src = dir.path().join("photo.jpg");
        fs::write(&src, b"new").unwrap();

        match move_item(&src, &dest_dir) {
            Err(TriageError::AlreadyExists(p)) => assert_eq!(p, dest_dir.join("photo.jpg")),
            other => panic!("expected AlreadyExists, got {:?}", other),
        }
        assert_eq!(fs::read(&src).unwrap(), b"new");
        assert_eq!(fs::read(dest_dir.join("photo.jpg")).unwrap(), b"already sorted");

        let batch = batch_move(&[src.clone()], &dest_dir).unwrap();
        assert_eq!(batch.failed, vec![src.clone()]);
        assert!(src.exists());
    }

    #[test]
    fn test_delete_item() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.png");
        fs::write(&path, b"x").unwrap();

        delete_item(&path).unwrap();
        assert!(!path.exists());
        assert!(matches!(delete_item(&path), Err(TriageError::NotFound(_))));
    }
}
