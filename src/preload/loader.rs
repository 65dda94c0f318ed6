//! The seam between the preloader and whatever actually fetches a resource.
//!
//! A `Loader` is handed a `LoadRequest` and must eventually complete it; the
//! completion travels back over the preloader's channel and is applied on the
//! preloader's own thread. Requests dropped without completion report
//! themselves as abandoned so no in-flight slot is ever leaked.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use flume::Sender;
use tokio::runtime::Handle;
use tracing::{trace, warn};

use crate::error::LoadError;

/// What a successful load produced: the fetched bytes, or nothing when the
/// loader only confirms the source is reachable.
pub type LoadOutcome = std::result::Result<Option<Arc<[u8]>>, LoadError>;

/// Outcome of one load, tagged with the epoch it was dispatched in.
#[derive(Debug, Clone)]
pub struct Completion {
    pub key: String,
    pub epoch: u64,
    pub result: LoadOutcome,
}

/// A single dispatched load. Complete it exactly once.
#[derive(Debug)]
pub struct LoadRequest {
    key: String,
    epoch: u64,
    reply: Option<Sender<Completion>>,
}

impl LoadRequest {
    pub(crate) fn new(key: String, epoch: u64, reply: Sender<Completion>) -> Self {
        Self {
            key,
            epoch,
            reply: Some(reply),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.key)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Complete with the fetched bytes.
    pub fn succeed(self, bytes: Vec<u8>) {
        self.complete(Ok(Some(Arc::from(bytes))));
    }

    /// Complete without bytes; the host will open the source by URI.
    pub fn resolve(self) {
        self.complete(Ok(None));
    }

    pub fn fail(self, error: LoadError) {
        self.complete(Err(error));
    }

    pub fn complete(mut self, result: LoadOutcome) {
        self.send(result);
    }

    fn send(&mut self, result: LoadOutcome) {
        let Some(reply) = self.reply.take() else {
            return;
        };
        let completion = Completion {
            key: std::mem::take(&mut self.key),
            epoch: self.epoch,
            result,
        };
        if reply.send(completion).is_err() {
            // The preloader is gone; nobody is waiting for this result.
            trace!("Dropped completion for closed preloader");
        }
    }
}

impl Drop for LoadRequest {
    fn drop(&mut self) {
        if self.reply.is_some() {
            let key = self.key.clone();
            self.send(Err(LoadError::Abandoned(key)));
        }
    }
}

/// Starts asynchronous loads on behalf of the preloader.
///
/// `start` must not block; it hands the request to some asynchronous
/// machinery that completes it later.
pub trait Loader {
    fn start(&self, request: LoadRequest);
}

impl<F> Loader for F
where
    F: Fn(LoadRequest),
{
    fn start(&self, request: LoadRequest) {
        self(request)
    }
}

/// Loader that reads the source file into memory on a tokio runtime.
///
/// Bytes are not decoded; the host's image loader does that from the warm
/// store or the source URI.
#[derive(Debug, Clone)]
pub struct FsLoader {
    runtime: Handle,
}

impl FsLoader {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Build a loader bound to the runtime the caller is running in.
    pub fn current() -> Result<Self> {
        let runtime = Handle::try_current().context("FsLoader requires a tokio runtime")?;
        Ok(Self::new(runtime))
    }
}

impl Loader for FsLoader {
    fn start(&self, request: LoadRequest) {
        self.runtime.spawn(async move {
            let path = request.path();
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    trace!(?path, bytes = bytes.len(), "Read source");
                    request.succeed(bytes);
                }
                Err(e) => {
                    warn!(?path, error = ?e, "Failed to read source");
                    let key = request.key().to_string();
                    request.fail(LoadError::Read {
                        key,
                        reason: e.to_string(),
                    });
                }
            }
        });
    }
}
