use std::path::PathBuf;

use thiserror::Error;

/// Failure modes of the on-disk fingerprint and similarity-graph caches.
/// `CacheCorrupt` and `GraphHeaderMismatch` are both recovered by the caller
/// discarding the on-disk artifact and rebuilding from scratch.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache file at {path} is corrupt: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("similarity graph header at {path} does not match the requested parameters")]
    GraphHeaderMismatch { path: PathBuf },

    #[error("IO error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CacheResult<T> = Result<T, CacheError>;
