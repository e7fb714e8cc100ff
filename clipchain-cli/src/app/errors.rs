use thiserror::Error;

/// Aggregates every crate-local error enum behind one type so `run()` can
/// return a single `Result`; unexpected failures are still surfaced through
/// `eyre` at the very top level so they print a readable chain instead of a
/// panic.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] clipchain_core::CoreError),

    #[error(transparent)]
    Cache(#[from] clipchain_cache::CacheError),

    #[error(transparent)]
    Ffmpeg(#[from] clipchain_ffmpeg::FfmpegError),

    #[error("{0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
