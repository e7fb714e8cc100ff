use std::{
    io::Read,
    path::Path,
    process::{Command, Stdio},
    time::Duration,
};

use image::RgbImage;
use wait_timeout::ChildExt;

use crate::errors::FfmpegError;

/// Wall-clock budget for encoding a short synthesized frame sequence.
pub const ENCODE_TIMEOUT: Duration = Duration::from_secs(60);

/// Encodes an ordered sequence of RGB frames into a short H.264 clip at
/// `fps`, used to render synthesized transition segments before they are
/// spliced back in alongside source footage.
pub fn encode_frames(frames: &[RgbImage], fps: u32, out_path: &Path) -> Result<(), FfmpegError> {
    if frames.is_empty() {
        return Err(FfmpegError::ToolchainFailed {
            command: "ffmpeg",
            stderr: "no frames to encode".to_string(),
        });
    }

    let dir = tempfile::tempdir().map_err(|e| FfmpegError::Io {
        command: "ffmpeg",
        source: e.to_string(),
    })?;

    for (i, frame) in frames.iter().enumerate() {
        let frame_path = dir.path().join(format!("frame-{i:06}.png"));
        frame.save(&frame_path).map_err(|e| FfmpegError::Io {
            command: "ffmpeg",
            source: e.to_string(),
        })?;
    }

    let pattern = dir.path().join("frame-%06d.png");
    let fps_str = fps.to_string();
    let out_str = out_path.to_string_lossy().into_owned();

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-framerate", &fps_str, "-i"])
        .arg(&pattern)
        .args([
            "-c:v", "libx264", "-pix_fmt", "yuv420p", "-y", &out_str,
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FfmpegError::ToolchainMissing,
        _ => FfmpegError::Io {
            command: "ffmpeg",
            source: e.to_string(),
        },
    })?;

    let status = child
        .wait_timeout(ENCODE_TIMEOUT)
        .map_err(|e| FfmpegError::Io {
            command: "ffmpeg",
            source: e.to_string(),
        })?;

    let status = match status {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(FfmpegError::Timeout {
                command: "ffmpeg",
                path: out_path.to_path_buf(),
                timeout_secs: ENCODE_TIMEOUT.as_secs(),
            });
        }
    };

    if !status.success() {
        let mut stderr_buf = Vec::new();
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_end(&mut stderr_buf);
        }
        let stderr = String::from_utf8_lossy(&stderr_buf)
            .chars()
            .take(500)
            .collect::<String>();
        return Err(FfmpegError::ToolchainFailed {
            command: "ffmpeg",
            stderr,
        });
    }

    Ok(())
}
