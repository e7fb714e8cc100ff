use std::{
    io::Read,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Duration,
};

use image::RgbImage;
use wait_timeout::ChildExt;

use crate::errors::FfmpegError;

/// Per-call wall-clock budget for both frame extraction and duration queries.
pub const EXTRACT_TIMEOUT: Duration = Duration::from_secs(10);

/// Invokes the external media toolchain to pull still frames and query
/// clip duration. Owns no state; every call spawns and reaps its own
/// subprocess.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameExtractor;

impl FrameExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Duration of the clip at `path`, in seconds.
    pub fn duration(&self, path: &Path) -> Result<f64, FfmpegError> {
        let args = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ];

        let stdout = run_with_timeout("ffprobe", "ffprobe", &args, Some(path), EXTRACT_TIMEOUT)?;

        std::str::from_utf8(&stdout)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| FfmpegError::DurationUnavailable(path.to_path_buf()))
    }

    /// Decodes a single RGB frame at `timestamp_secs` seconds into the clip.
    pub fn extract_frame(&self, path: &Path, timestamp_secs: f64) -> Result<RgbImage, FfmpegError> {
        let tmp = tempfile::Builder::new()
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| FfmpegError::Io {
                command: "ffmpeg",
                source: e.to_string(),
            })?;
        let tmp_path = tmp.path().to_path_buf();
        // Close our handle; ffmpeg will reopen the path with -y.
        drop(tmp);

        let result = self.extract_frame_to(path, timestamp_secs, &tmp_path);

        let image = result.and_then(|()| {
            image::open(&tmp_path)
                .map(|img| img.to_rgb8())
                .map_err(|_| FfmpegError::FrameUnavailable {
                    path: path.to_path_buf(),
                    timestamp_secs,
                })
        });

        let _ = std::fs::remove_file(&tmp_path);

        image
    }

    fn extract_frame_to(
        &self,
        path: &Path,
        timestamp_secs: f64,
        out_path: &Path,
    ) -> Result<(), FfmpegError> {
        let ts = format!("{timestamp_secs}");
        let out = out_path.to_string_lossy().into_owned();

        // "-i <path>" is inserted by run_with_timeout right after "-ss <t>",
        // to keep argument order exactly per the documented CLI contract:
        // ffmpeg -ss <t> -i <path> -vframes 1 -q:v 2 -y <out.jpg>
        let args = ["-ss", &ts, "-vframes", "1", "-q:v", "2", "-y", &out];

        run_with_timeout("ffmpeg", "ffmpeg", &args, Some(path), EXTRACT_TIMEOUT).map(|_| ())
    }
}

/// Runs `command` with `args`, inserting `-i <path>` immediately after the
/// leading args (matching `ffmpeg -ss <t> -i <path> -vframes 1 ...` /
/// `ffprobe ... <path>` argument shapes), waits up to `timeout`, and returns
/// stdout on success.
fn run_with_timeout(
    command: &'static str,
    program: &str,
    leading_args: &[&str],
    path: Option<&Path>,
    timeout: Duration,
) -> Result<Vec<u8>, FfmpegError> {
    let mut cmd = Command::new(program);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // ffprobe's path argument comes last; ffmpeg's comes right after -ss.
    if command == "ffprobe" {
        cmd.args(leading_args);
        if let Some(path) = path {
            cmd.arg(path);
        }
    } else {
        // args: ["-ss", t, "-vframes", "1", "-q:v", "2", "-y", out]
        cmd.arg(leading_args[0]);
        cmd.arg(leading_args[1]);
        if let Some(path) = path {
            cmd.arg("-i").arg(path);
        }
        cmd.args(&leading_args[2..]);
    }

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FfmpegError::ToolchainMissing,
        _ => FfmpegError::Io {
            command,
            source: e.to_string(),
        },
    })?;

    let status = child
        .wait_timeout(timeout)
        .map_err(|e| FfmpegError::Io {
            command,
            source: e.to_string(),
        })?;

    let status = match status {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(FfmpegError::Timeout {
                command,
                path: path.map(Path::to_path_buf).unwrap_or_default(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    // The child has already been reaped by wait_timeout above; read its
    // pipes directly rather than waiting again, which would hit ECHILD.
    let mut stdout_buf = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        let _ = stdout.read_to_end(&mut stdout_buf);
    }

    if !status.success() {
        let mut stderr_buf = Vec::new();
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_end(&mut stderr_buf);
        }
        let stderr = String::from_utf8_lossy(&stderr_buf)
            .chars()
            .take(500)
            .collect::<String>();
        return Err(FfmpegError::ToolchainFailed { command, stderr });
    }

    Ok(stdout_buf)
}
