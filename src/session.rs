//! Triage session: one loaded directory, the grid over it, the preloader
//! warming the selection's neighbours, and the focused zoom view.
//!
//! The session owns the selection index. Every selection change scrolls the
//! grid to keep the item visible and enqueues the lookahead window, current
//! item first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::{Result, TriageError};
use crate::layout::WindowedList;
use crate::library::{Metadata, MediaService};
use crate::models::{sort_for_display, MediaItem, ViewWindow};
use crate::preload::{Loader, Preloader, SourceCache, SourceHandle, WarmStore};
use crate::viewer::{InputEvent, Response, TriageAction, ZoomController};

/// Destination folders created under the loaded directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Landscape,
    Portrait,
    Reject,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Landscape, Bucket::Portrait, Bucket::Reject];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Landscape => "Landscape",
            Self::Portrait => "Portrait",
            Self::Reject => "Reject",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A move that `undo` can reverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub original: PathBuf,
    pub moved_to: PathBuf,
    pub bucket: Bucket,
}

/// Position through the current directory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// 1-based position of the selection; 0 when empty.
    pub position: usize,
    pub total: usize,
    /// Share of items from the selection to the end, in `0.0..=1.0`.
    pub remaining: f64,
}

/// What `dispatch` did with an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatched {
    /// Routed to the focused view.
    Zoom(Response),
    /// Interpreted as a grid-level triage action.
    Triage(TriageAction),
    Ignored,
}

pub struct TriageSession<S: MediaService> {
    service: S,
    config: ViewerConfig,
    base_dir: Option<PathBuf>,
    items: Vec<MediaItem>,
    index: usize,
    grid: WindowedList,
    cache: SourceCache,
    preloader: Preloader,
    zoom: ZoomController,
    history: Vec<MoveRecord>,
}

impl<S: MediaService> TriageSession<S> {
    pub fn new(service: S, loader: impl Loader + 'static, config: ViewerConfig) -> Self {
        let cache = SourceCache::new();
        let warm = WarmStore::new(config.preload.warm_budget_bytes());
        let preloader = Preloader::new(loader, cache.clone(), config.preload.max_concurrent)
            .with_warm_store(warm);
        let grid = WindowedList::new(config.grid.row_height, 1);
        let zoom = ZoomController::new(config.zoom);

        Self {
            service,
            config,
            base_dir: None,
            items: Vec::new(),
            index: 0,
            grid,
            cache,
            preloader,
            zoom,
            history: Vec::new(),
        }
    }

    /// Load a directory: create the bucket folders, list its photos and reset
    /// selection, grid, preloader and cache.
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize> {
        let items = self.list(dir)?;
        for bucket in Bucket::ALL {
            self.service.ensure_dir(&dir.join(bucket.dir_name()))?;
        }

        self.preloader.clear();
        self.cache.clear();
        self.zoom.close();
        self.history.clear();

        self.base_dir = Some(dir.to_path_buf());
        self.items = items;
        self.index = 0;
        self.grid.set_item_count(self.items.len());
        self.grid.set_scroll_offset(0.0);

        info!("Loaded {:?}: {} photos", dir, self.items.len());
        self.select(0);
        Ok(self.items.len())
    }

    fn list(&self, dir: &Path) -> Result<Vec<MediaItem>> {
        let scan = &self.config.scan;
        self.service.list_items(dir, scan.recursive, scan.max_depth)
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.items.get(self.index)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn grid(&self) -> &WindowedList {
        &self.grid
    }

    pub fn preloader(&self) -> &Preloader {
        &self.preloader
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Items the grid should currently materialize.
    pub fn window(&self) -> ViewWindow {
        self.grid.window()
    }

    pub fn visible_items(&self) -> &[MediaItem] {
        self.grid.window().slice(&self.items)
    }

    /// Resize the grid. Columns follow the width; the selection stays visible.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        let columns = self.config.grid.columns_for_width(width);
        self.grid.set_columns_per_row(columns);
        self.grid.set_viewport_height(height);
        if !self.items.is_empty() {
            self.grid.scroll_to_index(self.index);
        }
        debug!(width, height, columns, "Viewport resized");
    }

    /// Host scroll events.
    pub fn scroll_to(&mut self, offset: f64) {
        self.grid.set_scroll_offset(offset);
    }

    /// Select `index` (clamped to the list). Returns false when the list is empty.
    pub fn select(&mut self, index: usize) -> bool {
        if self.items.is_empty() {
            self.index = 0;
            return false;
        }
        self.index = index.min(self.items.len() - 1);
        self.grid.scroll_to_index(self.index);
        self.enqueue_lookahead();
        true
    }

    pub fn next(&mut self) -> bool {
        if self.index + 1 >= self.items.len() {
            return false;
        }
        self.select(self.index + 1)
    }

    pub fn previous(&mut self) -> bool {
        if self.index == 0 || self.items.is_empty() {
            return false;
        }
        self.select(self.index - 1)
    }

    /// Leave the current photo where it is and advance.
    pub fn skip(&mut self) -> bool {
        self.next()
    }

    fn enqueue_lookahead(&mut self) {
        let ahead = self.config.preload.lookahead_ahead;
        let behind = self.config.preload.lookahead_behind;
        let last = self.items.len().saturating_sub(1);
        let index = self.index;

        let forward = (index + 1)..=index.saturating_add(ahead).min(last);
        let backward = (index.saturating_sub(behind)..index).rev();
        let keys: Vec<String> = std::iter::once(index)
            .chain(forward)
            .chain(backward)
            .filter_map(|i| self.items.get(i).map(MediaItem::key))
            .collect();

        self.preloader.retain_window(keys.iter().cloned());
        self.preloader.enqueue(keys);
    }

    fn remove_current(&mut self) -> MediaItem {
        let item = self.items.remove(self.index);
        self.grid.set_item_count(self.items.len());
        if self.items.is_empty() {
            self.index = 0;
            self.zoom.close();
        } else {
            let index = self.index.min(self.items.len() - 1);
            self.select(index);
        }
        item
    }

    /// Move the selected photo into `bucket`. Returns its new path, or `None`
    /// when nothing is selected.
    pub fn move_current(&mut self, bucket: Bucket) -> Result<Option<PathBuf>> {
        let base = self.base_dir.clone().ok_or(TriageError::NoDirectory)?;
        let Some(item) = self.current() else {
            return Ok(None);
        };

        let original = item.path.clone();
        let moved_to = self
            .service
            .move_item(&original, &base.join(bucket.dir_name()))?;

        self.history.push(MoveRecord {
            original,
            moved_to: moved_to.clone(),
            bucket,
        });
        self.remove_current();
        Ok(Some(moved_to))
    }

    /// Reverse the most recent move and re-list the directory, selecting the
    /// restored photo.
    pub fn undo(&mut self) -> Result<Option<PathBuf>> {
        let base = self.base_dir.clone().ok_or(TriageError::NoDirectory)?;
        let Some(record) = self.history.pop() else {
            return Ok(None);
        };

        let restore_dir = record
            .original
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| base.clone());
        let restored = match self.service.move_item(&record.moved_to, &restore_dir) {
            Ok(path) => path,
            Err(e) => {
                warn!("Undo of {:?} failed: {}", record.moved_to, e);
                self.history.push(record);
                return Err(e);
            }
        };

        match self.list(&base) {
            Ok(items) => self.items = items,
            Err(e) => {
                // The file is already back; keep the old list plus the restored item.
                warn!("Re-listing {:?} after undo failed: {}", base, e);
                if !self.items.iter().any(|i| i.path == restored) {
                    let (width, height) = self
                        .service
                        .read_metadata(&restored)
                        .and_then(|m| m.dimensions)
                        .unwrap_or((0, 0));
                    self.items.push(MediaItem::new(restored.clone(), width, height));
                    sort_for_display(&mut self.items);
                }
            }
        }
        self.grid.set_item_count(self.items.len());
        let index = self
            .items
            .iter()
            .position(|i| i.path == restored)
            .unwrap_or(self.index);
        self.select(index);

        info!("Undid move of {:?} to {}", restored, record.bucket);
        Ok(Some(restored))
    }

    /// Delete the selected photo. Deletions are not undoable.
    pub fn delete_current(&mut self) -> Result<Option<PathBuf>> {
        let Some(item) = self.current() else {
            return Ok(None);
        };
        let path = item.path.clone();
        self.service.delete_item(&path)?;
        self.remove_current();
        Ok(Some(path))
    }

    pub fn current_metadata(&self) -> Option<Metadata> {
        self.current()
            .and_then(|item| self.service.read_metadata(&item.path))
    }

    /// Open the focused view on the selected photo.
    pub fn open_focus(&mut self) -> bool {
        let Some(key) = self.current().map(MediaItem::key) else {
            return false;
        };
        self.zoom.open(key);
        true
    }

    pub fn close_focus(&mut self) {
        self.zoom.close();
    }

    pub fn is_focused(&self) -> bool {
        self.zoom.is_open()
    }

    /// Route an input event: to the zoom controller while focused, otherwise
    /// keys drive triage actions.
    pub fn dispatch(&mut self, event: &InputEvent) -> Result<Dispatched> {
        if self.zoom.is_open() {
            return Ok(Dispatched::Zoom(self.zoom.handle(event)));
        }

        let InputEvent::Key(key) = event else {
            return Ok(Dispatched::Ignored);
        };
        let Some(action) = TriageAction::for_key(*key) else {
            return Ok(Dispatched::Ignored);
        };

        match action {
            TriageAction::Next => {
                self.next();
            }
            TriageAction::Previous => {
                self.previous();
            }
            TriageAction::Skip => {
                self.skip();
            }
            TriageAction::MoveTo(bucket) => {
                self.move_current(bucket)?;
            }
            TriageAction::Undo => {
                self.undo()?;
            }
            TriageAction::OpenFocus => {
                self.open_focus();
            }
        }
        Ok(Dispatched::Triage(action))
    }

    pub fn progress(&self) -> Progress {
        let total = self.items.len();
        if total == 0 {
            return Progress {
                position: 0,
                total: 0,
                remaining: 0.0,
            };
        }
        Progress {
            position: self.index + 1,
            total,
            remaining: (total - self.index) as f64 / total as f64,
        }
    }

    /// Renderer-side source lookup, sharing whatever the preloader has resolved.
    pub fn resolve_source(&self, path: &Path) -> SourceHandle {
        self.cache.get_or_resolve(path)
    }

    /// Prefetched bytes for `path`, if it is inside the warm window.
    pub fn warm_source(&self, path: &Path) -> Option<Arc<[u8]>> {
        self.preloader.warm().get(&path.to_string_lossy())
    }

    /// Apply completions that have already arrived. Returns how many.
    pub fn pump(&mut self) -> usize {
        self.preloader.pump()
    }

    /// Drive preloads until nothing is queued or in flight.
    pub async fn settle_preloads(&mut self) {
        self.preloader.run_until_idle().await;
    }
}

impl<S: MediaService + std::fmt::Debug> std::fmt::Debug for TriageSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageSession")
            .field("service", &self.service)
            .field("base_dir", &self.base_dir)
            .field("items", &self.items.len())
            .field("index", &self.index)
            .field("grid", &self.grid)
            .field("preloader", &self.preloader)
            .field("focused", &self.zoom.focused_key())
            .finish()
    }
}
