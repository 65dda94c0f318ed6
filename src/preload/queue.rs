//! Bounded-concurrency preload queue.
//!
//! - FIFO of pending keys with set semantics (no key queued twice)
//! - At most `max_concurrent` loads in flight; every completion refills the slot
//! - Completions arrive over a flume channel and are applied on the owner's thread
//! - `clear()` bumps an epoch so late completions from before the clear are ignored
//! - Fetched bytes go to a budgeted `WarmStore`; only keys inside the retained
//!   window stay warm, the rest are released and may be warmed again later

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use flume::{Receiver, Sender};
use tracing::{debug, trace};

use super::cache::{SourceCache, SourceHandle};
use super::loader::{Completion, LoadRequest, Loader};
use super::warm::WarmStore;

/// Default number of simultaneous loads.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Where a key currently stands in the preloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadState {
    Queued,
    InFlight,
    Loaded,
    /// Last attempt failed. Not sticky: enqueueing the key again retries it.
    Failed,
}

/// Counters for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadStats {
    pub queued: usize,
    pub in_flight: usize,
    pub loaded: usize,
    pub failed: usize,
    pub dispatched_total: u64,
    pub discarded_total: u64,
}

/// Warms image sources ahead of navigation with a cap on concurrent loads.
pub struct Preloader {
    max_concurrent: usize,
    queue: VecDeque<String>,
    queued: HashSet<String>,
    in_flight: HashSet<String>,
    loaded: HashSet<String>,
    failed: HashSet<String>,
    /// Loaded keys whose bytes are no longer warm.
    released: HashSet<String>,
    /// Keys allowed to hold warm bytes. `None` means no restriction.
    window: Option<HashSet<String>>,
    /// Incremented by `clear()`; completions from older epochs are discarded.
    epoch: u64,
    loader: Box<dyn Loader>,
    cache: SourceCache,
    warm: WarmStore,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    dispatched_total: u64,
    discarded_total: u64,
}

impl Preloader {
    /// Create a preloader. `max_concurrent` is raised to at least 1.
    pub fn new(loader: impl Loader + 'static, cache: SourceCache, max_concurrent: usize) -> Self {
        let (completion_tx, completion_rx) = flume::unbounded();
        let max_concurrent = max_concurrent.max(1);
        debug!(max_concurrent, "Created preloader");

        Self {
            max_concurrent,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            in_flight: HashSet::new(),
            loaded: HashSet::new(),
            failed: HashSet::new(),
            released: HashSet::new(),
            window: None,
            epoch: 0,
            loader: Box::new(loader),
            cache,
            warm: WarmStore::default(),
            completion_tx,
            completion_rx,
            dispatched_total: 0,
            discarded_total: 0,
        }
    }

    /// Use `warm` for fetched bytes instead of the default-sized store.
    pub fn with_warm_store(mut self, warm: WarmStore) -> Self {
        self.warm = warm;
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn warm(&self) -> &WarmStore {
        &self.warm
    }

    /// Queue keys for loading, preserving their order.
    ///
    /// Keys already queued, in flight or loaded are skipped, unless a loaded
    /// key's bytes have been released. Returns how many keys were actually
    /// added.
    pub fn enqueue<I, K>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut added = 0;
        for key in keys {
            let key = key.into();
            if self.queued.contains(&key)
                || self.in_flight.contains(&key)
                || (self.loaded.contains(&key) && !self.released.contains(&key))
            {
                trace!(key = %key, "Preload already tracked");
                continue;
            }
            self.queued.insert(key.clone());
            self.queue.push_back(key);
            added += 1;
        }

        if added > 0 {
            trace!(added, queued = self.queue.len(), "Enqueued preload keys");
        }
        self.dispatch();
        added
    }

    /// Whether a load for `key` has completed successfully this session.
    pub fn is_loaded(&self, key: &str) -> bool {
        self.loaded.contains(key)
    }

    pub fn state(&self, key: &str) -> Option<PreloadState> {
        if self.in_flight.contains(key) {
            Some(PreloadState::InFlight)
        } else if self.queued.contains(key) {
            Some(PreloadState::Queued)
        } else if self.loaded.contains(key) {
            Some(PreloadState::Loaded)
        } else if self.failed.contains(key) {
            Some(PreloadState::Failed)
        } else {
            None
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// True when nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }

    pub fn stats(&self) -> PreloadStats {
        PreloadStats {
            queued: self.queue.len(),
            in_flight: self.in_flight.len(),
            loaded: self.loaded.len(),
            failed: self.failed.len(),
            dispatched_total: self.dispatched_total,
            discarded_total: self.discarded_total,
        }
    }

    /// Restrict warm bytes to `keys`.
    ///
    /// Queued keys outside the window are dropped and warm bytes outside it are
    /// released. Loads already in flight finish, but their bytes are only kept
    /// if the key is inside the window when they arrive.
    pub fn retain_window<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let window: HashSet<String> = keys.into_iter().map(Into::into).collect();

        let before = self.queue.len();
        self.queue.retain(|k| window.contains(k));
        self.queued.retain(|k| window.contains(k));
        let dropped = before - self.queue.len();

        let mut released = 0;
        for key in self.warm.keys() {
            if !window.contains(&key) && self.warm.remove(&key) {
                self.released.insert(key);
                released += 1;
            }
        }

        if dropped > 0 || released > 0 {
            trace!(
                dropped,
                released,
                warm_bytes = self.warm.current_bytes(),
                "Moved preload window"
            );
        }
        self.window = Some(window);
    }

    /// Forget all queued and tracked keys and drop every warm byte.
    ///
    /// Loads already started keep running; their completions carry the old
    /// epoch and are dropped when they arrive.
    pub fn clear(&mut self) {
        let abandoned = self.in_flight.len();
        self.queue.clear();
        self.queued.clear();
        self.in_flight.clear();
        self.loaded.clear();
        self.failed.clear();
        self.released.clear();
        self.window = None;
        self.warm.clear();
        self.epoch = self.epoch.wrapping_add(1);
        debug!(epoch = self.epoch, abandoned, "Cleared preloader");
    }

    /// Apply every completion that has already arrived (non-blocking).
    ///
    /// Returns the number of completions processed. Frame-driven hosts call
    /// this once per tick.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.settle(completion);
            processed += 1;
        }
        processed
    }

    /// Wait for the next completion and apply it.
    ///
    /// Returns `None` without waiting when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.in_flight.is_empty() && self.completion_rx.is_empty() {
            return None;
        }
        let completion = self.completion_rx.recv_async().await.ok()?;
        self.settle(completion.clone());
        Some(completion)
    }

    /// Drive completions until nothing is queued or in flight.
    pub async fn run_until_idle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    /// Apply one completion and refill the freed slot.
    pub fn settle(&mut self, completion: Completion) {
        if completion.epoch != self.epoch || !self.in_flight.remove(&completion.key) {
            self.discarded_total += 1;
            trace!(
                key = %completion.key,
                epoch = completion.epoch,
                current = self.epoch,
                "Discarded stale preload completion"
            );
            return;
        }

        match completion.result {
            Ok(bytes) => {
                let key = completion.key;
                trace!(key = %key, "Preloaded");
                self.failed.remove(&key);
                self.cache
                    .insert_if_absent(&key, SourceHandle::from_path(Path::new(&key)));
                if let Some(bytes) = bytes {
                    self.released.remove(&key);
                    if self.in_window(&key) {
                        self.released.extend(self.warm.insert(&key, bytes));
                    } else {
                        self.released.insert(key.clone());
                    }
                }
                self.loaded.insert(key);
            }
            Err(e) => {
                debug!(key = %completion.key, error = %e, "Preload failed");
                self.failed.insert(completion.key);
            }
        }

        self.dispatch();
    }

    fn in_window(&self, key: &str) -> bool {
        self.window.as_ref().map_or(true, |w| w.contains(key))
    }

    fn dispatch(&mut self) {
        while self.in_flight.len() < self.max_concurrent {
            let Some(key) = self.queue.pop_front() else {
                break;
            };
            self.queued.remove(&key);
            self.in_flight.insert(key.clone());
            self.dispatched_total += 1;
            trace!(key = %key, in_flight = self.in_flight.len(), "Dispatching preload");
            self.loader
                .start(LoadRequest::new(key, self.epoch, self.completion_tx.clone()));
        }
    }
}

impl std::fmt::Debug for Preloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preloader")
            .field("max_concurrent", &self.max_concurrent)
            .field("epoch", &self.epoch)
            .field("stats", &self.stats())
            .field("loader", &"<loader>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Loader that parks requests so tests decide when and how they finish.
    #[derive(Clone, Default)]
    struct ManualLoader {
        pending: Rc<RefCell<Vec<LoadRequest>>>,
        started: Rc<RefCell<Vec<String>>>,
    }

    impl ManualLoader {
        fn take(&self, key: &str) -> LoadRequest {
            let mut pending = self.pending.borrow_mut();
            let pos = pending
                .iter()
                .position(|r| r.key() == key)
                .expect("request not pending");
            pending.remove(pos)
        }

        fn succeed(&self, key: &str) {
            self.take(key).succeed(vec![7; 4]);
        }

        fn fail(&self, key: &str) {
            self.take(key).fail(LoadError::Read {
                key: key.to_string(),
                reason: "boom".into(),
            });
        }

        fn started(&self) -> Vec<String> {
            self.started.borrow().clone()
        }
    }

    impl Loader for ManualLoader {
        fn start(&self, request: LoadRequest) {
            self.started.borrow_mut().push(request.key().to_string());
            self.pending.borrow_mut().push(request);
        }
    }

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("/photos/{}.jpg", i)).collect()
    }

    fn preloader() -> (Preloader, ManualLoader, SourceCache) {
        let loader = ManualLoader::default();
        let cache = SourceCache::new();
        let preloader = Preloader::new(loader.clone(), cache.clone(), DEFAULT_MAX_CONCURRENT);
        (preloader, loader, cache)
    }

    #[test]
    fn test_ten_keys_three_slots() {
        let (mut preloader, loader, _) = preloader();
        let keys = keys(10);
        assert_eq!(preloader.enqueue(keys.clone()), 10);

        assert_eq!(preloader.in_flight_count(), 3);
        assert_eq!(preloader.queued_count(), 7);
        assert_eq!(loader.started(), keys[..3].to_vec());

        loader.succeed(&keys[1]);
        assert_eq!(preloader.pump(), 1);
        assert_eq!(preloader.in_flight_count(), 3);
        assert_eq!(loader.started()[3], keys[3]);
        assert!(preloader.is_loaded(&keys[1]));
    }

    #[test]
    fn test_duplicate_keys_fetch_once() {
        let (mut preloader, loader, _) = preloader();
        preloader.enqueue(["/a.jpg", "/a.jpg"]);
        preloader.enqueue(["/a.jpg"]);
        assert_eq!(loader.started(), vec!["/a.jpg".to_string()]);

        loader.succeed("/a.jpg");
        preloader.pump();
        assert_eq!(preloader.enqueue(["/a.jpg"]), 0);
        assert_eq!(loader.started().len(), 1);
    }

    #[test]
    fn test_in_flight_never_exceeds_limit() {
        let (mut preloader, loader, _) = preloader();
        let keys = keys(25);
        preloader.enqueue(keys.iter().take(12).cloned());
        assert!(preloader.in_flight_count() <= 3);

        let mut step = 0;
        while !preloader.is_idle() {
            let next = loader.pending.borrow().first().map(|r| r.key().to_string());
            let key = next.unwrap();
            if step % 4 == 0 {
                loader.fail(&key);
            } else {
                loader.succeed(&key);
            }
            if step == 3 {
                preloader.enqueue(keys.iter().skip(12).cloned());
            }
            preloader.pump();
            assert!(preloader.in_flight_count() <= preloader.max_concurrent());
            step += 1;
        }
        assert_eq!(step, 25);
    }

    #[test]
    fn test_loaded_matches_successes() {
        let (mut preloader, loader, cache) = preloader();
        let keys = keys(6);
        preloader.enqueue(keys.clone());

        let mut expected = HashSet::new();
        for (i, key) in keys.iter().enumerate() {
            if i % 2 == 0 {
                loader.succeed(key);
                expected.insert(key.clone());
            } else {
                loader.fail(key);
            }
            preloader.pump();
        }

        assert!(preloader.is_idle());
        let loaded: HashSet<String> = keys
            .iter()
            .filter(|k| preloader.is_loaded(k))
            .cloned()
            .collect();
        assert_eq!(loaded, expected);
        assert_eq!(cache.len(), 3);
        assert_eq!(preloader.state(&keys[1]), Some(PreloadState::Failed));
    }

    #[test]
    fn test_failed_key_can_be_retried() {
        let (mut preloader, loader, _) = preloader();
        preloader.enqueue(["/retry.jpg"]);
        loader.fail("/retry.jpg");
        preloader.pump();
        assert!(!preloader.is_loaded("/retry.jpg"));

        assert_eq!(preloader.enqueue(["/retry.jpg"]), 1);
        assert_eq!(loader.started().len(), 2);
        loader.succeed("/retry.jpg");
        preloader.pump();
        assert_eq!(preloader.state("/retry.jpg"), Some(PreloadState::Loaded));
    }

    #[test]
    fn test_clear_discards_late_completions() {
        let (mut preloader, loader, cache) = preloader();
        preloader.enqueue(keys(5));
        preloader.clear();
        assert!(preloader.is_idle());

        loader.succeed("/photos/0.jpg");
        preloader.pump();
        assert!(!preloader.is_loaded("/photos/0.jpg"));
        assert!(cache.is_empty());
        assert_eq!(preloader.stats().discarded_total, 1);

        // A re-enqueued key after clear gets a fresh load.
        preloader.enqueue(["/photos/1.jpg"]);
        loader.succeed("/photos/1.jpg"); // old epoch request
        preloader.pump();
        assert_eq!(preloader.state("/photos/1.jpg"), Some(PreloadState::InFlight));
        loader.succeed("/photos/1.jpg"); // current request
        preloader.pump();
        assert!(preloader.is_loaded("/photos/1.jpg"));
    }

    #[test]
    fn test_abandoned_request_frees_slot() {
        let (mut preloader, loader, _) = preloader();
        preloader.enqueue(keys(4));
        drop(loader.take("/photos/0.jpg"));
        preloader.pump();
        assert_eq!(preloader.in_flight_count(), 3);
        assert_eq!(preloader.state("/photos/0.jpg"), Some(PreloadState::Failed));
    }

    #[test]
    fn test_zero_concurrency_is_raised() {
        let preloader = Preloader::new(|_req: LoadRequest| {}, SourceCache::new(), 0);
        assert_eq!(preloader.max_concurrent(), 1);
    }

    #[tokio::test]
    async fn test_run_until_idle_with_fs_loader() {
        use crate::preload::loader::FsLoader;

        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..7 {
            let path = dir.path().join(format!("{}.jpg", i));
            std::fs::write(&path, vec![0u8; 10 + i]).unwrap();
            paths.push(path.to_string_lossy().into_owned());
        }
        paths.push(dir.path().join("missing.jpg").to_string_lossy().into_owned());

        let cache = SourceCache::new();
        let mut preloader = Preloader::new(FsLoader::current().unwrap(), cache.clone(), 3);
        preloader.enqueue(paths.clone());
        preloader.run_until_idle().await;

        assert!(preloader.is_idle());
        assert_eq!(preloader.loaded_count(), 7);
        assert!(!preloader.is_loaded(&paths[7]));
        assert_eq!(cache.len(), 7);
        assert_eq!(preloader.warm().current_bytes(), (10..17).sum::<usize>());
    }

    #[test]
    fn test_warm_bytes_follow_window() {
        let (mut preloader, loader, _) = preloader();
        preloader.retain_window(["/a.jpg", "/b.jpg"]);
        preloader.enqueue(["/a.jpg", "/b.jpg"]);
        loader.succeed("/a.jpg");
        loader.succeed("/b.jpg");
        preloader.pump();
        assert_eq!(preloader.warm().len(), 2);

        preloader.retain_window(["/b.jpg", "/c.jpg"]);
        assert!(!preloader.warm().contains("/a.jpg"));
        assert!(preloader.warm().contains("/b.jpg"));
        assert!(preloader.is_loaded("/a.jpg"));
        // b is still warm, so only c is fetched.
        assert_eq!(preloader.enqueue(["/b.jpg", "/c.jpg"]), 1);
        loader.succeed("/c.jpg");
        preloader.pump();
        assert_eq!(preloader.warm().current_bytes(), 8);

        // Coming back to a warms it again.
        preloader.retain_window(["/a.jpg", "/b.jpg"]);
        assert_eq!(preloader.enqueue(["/a.jpg", "/b.jpg"]), 1);
        loader.succeed("/a.jpg");
        preloader.pump();
        assert!(preloader.warm().contains("/a.jpg"));
        assert_eq!(loader.started().len(), 4);
    }

    #[test]
    fn test_window_drops_stale_queue_and_late_bytes() {
        let (mut preloader, loader, cache) = preloader();
        preloader.enqueue(keys(5));
        preloader.retain_window(["/photos/1.jpg"]);
        assert_eq!(preloader.queued_count(), 0);
        assert_eq!(preloader.state("/photos/3.jpg"), None);

        // In flight before the move: counts as loaded but keeps no bytes.
        loader.succeed("/photos/0.jpg");
        preloader.pump();
        assert!(preloader.is_loaded("/photos/0.jpg"));
        assert!(cache.contains("/photos/0.jpg"));
        assert!(preloader.warm().is_empty());
    }

    #[test]
    fn test_warm_budget_releases_oldest() {
        let loader = ManualLoader::default();
        let mut preloader = Preloader::new(loader.clone(), SourceCache::new(), 3)
            .with_warm_store(WarmStore::new(8));
        let keys = keys(3);
        preloader.enqueue(keys.clone());
        for key in &keys {
            loader.succeed(key);
            preloader.pump();
        }

        assert_eq!(preloader.warm().current_bytes(), 8);
        assert!(!preloader.warm().contains(&keys[0]));
        assert_eq!(preloader.enqueue(keys.clone()), 1);
        assert_eq!(loader.started().last(), Some(&keys[0]));
    }

    #[test]
    fn test_clear_drops_warm_bytes() {
        let (mut preloader, loader, _) = preloader();
        preloader.enqueue(["/a.jpg"]);
        loader.succeed("/a.jpg");
        preloader.pump();
        assert_eq!(preloader.warm().current_bytes(), 4);

        preloader.clear();
        assert!(preloader.warm().is_empty());
    }
}
