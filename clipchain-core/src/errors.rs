use thiserror::Error;

pub use clipchain_ffmpeg::FfmpegError;

/// Errors raised by the fingerprinting, graph-construction, chain-discovery
/// and chain-assembly subsystems.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// The media toolchain itself is not installed/reachable. Distinct from
    /// `FrameUnavailable` because it indicates every subsequent call will
    /// also fail, not just this one clip.
    #[error("ffmpeg/ffprobe toolchain unavailable")]
    ToolchainMissing,

    /// A frame could not be decoded from a clip at a requested timestamp.
    #[error(transparent)]
    FrameUnavailable(#[from] FfmpegError),

    /// Duration of a clip could not be determined; the clip is skipped.
    #[error("duration unavailable for clip")]
    DurationUnavailable,

    /// Construction-time configuration error: refused before any partial
    /// state is created.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A chain-assembly request failed; any partial output has already been
    /// deleted by the time this is returned.
    #[error("assembly failed: {0}")]
    AssemblyFailed(String),

    /// A cooperative cancellation token was observed between iterations.
    #[error("operation was cancelled")]
    Cancelled,
}

impl CoreError {
    pub(crate) fn from_ffmpeg(e: FfmpegError) -> Self {
        match e {
            FfmpegError::ToolchainMissing => Self::ToolchainMissing,
            FfmpegError::DurationUnavailable(_) => Self::DurationUnavailable,
            other => Self::FrameUnavailable(other),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
