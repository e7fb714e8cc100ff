use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure modes of the external media toolchain wrapper.
///
/// `FrameUnavailable` and `DurationUnavailable` are recovered locally at the
/// Fingerprinter boundary: the affected clip is skipped and logged.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FfmpegError {
    /// `ffmpeg`/`ffprobe` could not be found on the command line.
    #[error("ffmpeg/ffprobe not found. Install ffmpeg and make sure it is on PATH")]
    ToolchainMissing,

    /// `ffprobe` ran but duration could not be determined.
    #[error("could not determine duration of {0}")]
    DurationUnavailable(PathBuf),

    /// `ffmpeg` ran but no frame could be decoded at the requested timestamp.
    #[error("no frame available from {path} at {timestamp_secs}s")]
    FrameUnavailable { path: PathBuf, timestamp_secs: f64 },

    /// The subprocess exceeded its wall-clock budget and was killed.
    #[error("{command} on {path} exceeded its {timeout_secs}s timeout")]
    Timeout {
        command: &'static str,
        path: PathBuf,
        timeout_secs: u64,
    },

    /// The subprocess exited nonzero. Ffmpeg error text is sometimes very
    /// long, so this is truncated.
    #[error("{command} failed: {stderr}")]
    ToolchainFailed { command: &'static str, stderr: String },

    /// An IO error while spawning or communicating with the subprocess.
    #[error("IO error running {command}: {source}")]
    Io {
        command: &'static str,
        source: String,
    },
}
