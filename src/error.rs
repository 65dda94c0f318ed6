//! Error types shared by the library collaborator and the preloader.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by the file-management collaborator.
///
/// These are the only errors in the crate that reach the user; everything in
/// the viewport core recovers locally.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("invalid path: {0:?}")]
    InvalidPath(PathBuf),

    #[error("destination already exists: {0:?}")]
    AlreadyExists(PathBuf),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no directory loaded")]
    NoDirectory,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TriageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;

/// Why a single preload did not produce a resource.
///
/// Carried inside completions only; the preloader logs it and drops the key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to read {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("load of {0} was abandoned before it finished")]
    Abandoned(String),
}
