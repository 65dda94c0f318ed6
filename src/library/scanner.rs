//! Directory listing for the triage flow.
//!
//! Walks a directory with walkdir, keeps files with a supported photo
//! extension, and reads only the image header for dimensions. Files whose
//! header cannot be read are skipped rather than failing the listing.

use std::fs;
use std::path::Path;

use image::ImageReader;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::error::{Result, TriageError};
use crate::models::{is_supported_image, sort_for_display, MediaItem};

/// Depth used by recursive listings when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Configuration for directory listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Whether to descend into subdirectories.
    pub recursive: bool,
    /// Maximum walk depth for recursive listings (the top level is depth 1).
    pub max_depth: usize,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            max_depth: DEFAULT_MAX_DEPTH,
            follow_symlinks: false,
        }
    }
}

impl ScanConfig {
    /// Effective walkdir depth: 1 for flat listings.
    pub fn walk_depth(&self) -> usize {
        if self.recursive {
            self.max_depth.max(1)
        } else {
            1
        }
    }
}

fn ensure_directory(dir: &Path) -> Result<()> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(TriageError::InvalidPath(dir.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TriageError::NotFound(dir.to_path_buf()))
        }
        Err(e) => Err(TriageError::io(dir, e)),
    }
}

/// Read image dimensions from the file header without decoding pixels.
///
/// Returns `None` for unreadable files and for zero-sized headers.
pub fn read_dimensions(path: &Path) -> Option<(u32, u32)> {
    let reader = match ImageReader::open(path) {
        Ok(reader) => reader,
        Err(e) => {
            warn!("Failed to open image {:?}: {}", path, e);
            return None;
        }
    };

    match reader.into_dimensions() {
        Ok((width, height)) if width > 0 && height > 0 => {
            trace!("Got dimensions {}x{} for {:?}", width, height, path);
            Some((width, height))
        }
        Ok(_) => None,
        Err(e) => {
            debug!("Failed to read image dimensions for {:?}: {}", path, e);
            None
        }
    }
}

/// List supported photos under `dir`, sorted for display.
pub fn list_items(dir: &Path, config: &ScanConfig) -> Result<Vec<MediaItem>> {
    ensure_directory(dir)?;

    let walker = WalkDir::new(dir)
        .max_depth(config.walk_depth())
        .follow_links(config.follow_symlinks);

    let mut items = Vec::new();
    let mut skipped = 0usize;

    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_supported_image(path) {
            continue;
        }

        match read_dimensions(path) {
            Some((width, height)) => items.push(MediaItem::new(path.to_path_buf(), width, height)),
            None => skipped += 1,
        }
    }

    sort_for_display(&mut items);

    info!(
        "Listed {} photos in {:?} ({} unreadable skipped)",
        items.len(),
        dir,
        skipped
    );

    Ok(items)
}

/// Count supported photos in the top level of `dir` without reading headers.
pub fn count_items(dir: &Path) -> Result<usize> {
    let entries = fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TriageError::NotFound(dir.to_path_buf())
        } else {
            TriageError::io(dir, e)
        }
    })?;

    Ok(entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_supported_image(p))
        .count())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Orientation;
    use std::fs::File;
    use tempfile::tempdir;

    pub(crate) fn create_test_image(path: &Path, width: u32, height: u32) {
        image::RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_scan_config_default() {
        let config = ScanConfig::default();
        assert!(!config.recursive);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.walk_depth(), 1);

        let recursive = ScanConfig {
            recursive: true,
            max_depth: 0,
            ..Default::default()
        };
        assert_eq!(recursive.walk_depth(), 1);
    }

    #[test]
    fn test_list_items_empty_dir() {
        let dir = tempdir().unwrap();
        let items = list_items(dir.path(), &ScanConfig::default()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_list_items_reads_header_dimensions() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("wide.png"), 8, 4);
        create_test_image(&dir.path().join("tall.png"), 3, 9);
        create_test_image(&dir.path().join("square.png"), 5, 5);
        File::create(dir.path().join("notes.txt")).unwrap();

        let items = list_items(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(items.len(), 3);

        let by_name = |name: &str| items.iter().find(|i| i.file_name() == name).unwrap();
        assert_eq!(by_name("wide.png").orientation, Orientation::Landscape);
        assert_eq!(by_name("tall.png").orientation, Orientation::Portrait);
        assert_eq!(by_name("square.png").orientation, Orientation::Square);
        assert_eq!((by_name("tall.png").width, by_name("tall.png").height), (3, 9));
    }

    #[test]
    fn test_list_items_skips_unreadable() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("good.png"), 2, 1);
        std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let items = list_items(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].file_name(), "good.png");
    }

    #[test]
    fn test_list_items_natural_order() {
        let dir = tempdir().unwrap();
        for name in ["img10.png", "img2.png", "IMG1.png"] {
            create_test_image(&dir.path().join(name), 1, 1);
        }

        let items = list_items(dir.path(), &ScanConfig::default()).unwrap();
        let names: Vec<String> = items.iter().map(|i| i.file_name()).collect();
        assert_eq!(names, vec!["IMG1.png", "img2.png", "img10.png"]);
    }

    #[test]
    fn test_list_items_recursive_depth() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&nested).unwrap();
        create_test_image(&dir.path().join("top.png"), 1, 1);
        create_test_image(&dir.path().join("a").join("one.png"), 1, 1);
        create_test_image(&dir.path().join("a").join("b").join("two.png"), 1, 1);
        create_test_image(&nested.join("three.png"), 1, 1);

        let flat = list_items(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(flat.len(), 1);

        let recursive = ScanConfig {
            recursive: true,
            ..Default::default()
        };
        let items = list_items(dir.path(), &recursive).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.file_name() != "three.png"));
    }

    #[test]
    fn test_list_items_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            list_items(&missing, &ScanConfig::default()),
            Err(TriageError::NotFound(_))
        ));

        let file = dir.path().join("file.png");
        create_test_image(&file, 1, 1);
        assert!(matches!(
            list_items(&file, &ScanConfig::default()),
            Err(TriageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_count_items() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("a.png"), 1, 1);
        std::fs::write(dir.path().join("b.JPG"), b"unchecked").unwrap();
        File::create(dir.path().join("c.txt")).unwrap();
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        assert_eq!(count_items(dir.path()).unwrap(), 2);
        assert!(count_items(&dir.path().join("nope")).is_err());
    }
}
