use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Duration,
};

use wait_timeout::ChildExt;

use crate::errors::FfmpegError;

/// Wall-clock budget for the stream-copy / re-encode assembly step.
pub const ASSEMBLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Concatenates `clip_paths` in order into `out_path` using the ffmpeg
/// concat demuxer with stream copy (`-c copy`), per the documented CLI
/// contract. All clips must share codec and resolution for this to succeed;
/// callers are responsible for falling back to the smooth path otherwise.
pub fn concat_copy(clip_paths: &[PathBuf], out_path: &Path) -> Result<(), FfmpegError> {
    let manifest = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .map_err(|e| FfmpegError::Io {
            command: "ffmpeg",
            source: e.to_string(),
        })?;

    {
        let mut f = manifest.as_file();
        for clip in clip_paths {
            let escaped = clip.to_string_lossy().replace('\'', "'\\''");
            writeln!(f, "file '{escaped}'").map_err(|e| FfmpegError::Io {
                command: "ffmpeg",
                source: e.to_string(),
            })?;
        }
        f.sync_all().map_err(|e| FfmpegError::Io {
            command: "ffmpeg",
            source: e.to_string(),
        })?;
    }

    let manifest_path = manifest.path();
    let out_str = out_path.to_string_lossy().into_owned();

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-f", "concat", "-safe", "0", "-i"])
        .arg(manifest_path)
        .args(["-c", "copy", "-y", &out_str])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    run_and_check(cmd, ASSEMBLE_TIMEOUT)
}

/// Concatenates `clip_paths` in order into `out_path`, re-encoding to H.264
/// at `output_fps` rather than stream-copying. Used by the smooth assembly
/// path, where synthesized transition segments cannot share an exact codec
/// profile with stream-copied source footage.
pub fn concat_reencode(
    clip_paths: &[PathBuf],
    out_path: &Path,
    output_fps: u32,
) -> Result<(), FfmpegError> {
    let manifest = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .map_err(|e| FfmpegError::Io {
            command: "ffmpeg",
            source: e.to_string(),
        })?;

    {
        let mut f = manifest.as_file();
        for clip in clip_paths {
            let escaped = clip.to_string_lossy().replace('\'', "'\\''");
            writeln!(f, "file '{escaped}'").map_err(|e| FfmpegError::Io {
                command: "ffmpeg",
                source: e.to_string(),
            })?;
        }
        f.sync_all().map_err(|e| FfmpegError::Io {
            command: "ffmpeg",
            source: e.to_string(),
        })?;
    }

    let manifest_path = manifest.path();
    let out_str = out_path.to_string_lossy().into_owned();
    let fps = output_fps.to_string();

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-f", "concat", "-safe", "0", "-i"])
        .arg(manifest_path)
        .args([
            "-c:v", "libx264", "-pix_fmt", "yuv420p", "-r", &fps, "-y", &out_str,
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    run_and_check(cmd, ASSEMBLE_TIMEOUT)
}

fn run_and_check(mut cmd: Command, timeout: Duration) -> Result<(), FfmpegError> {
    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FfmpegError::ToolchainMissing,
        _ => FfmpegError::Io {
            command: "ffmpeg",
            source: e.to_string(),
        },
    })?;

    let status = child.wait_timeout(timeout).map_err(|e| FfmpegError::Io {
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
                path: PathBuf::new(),
                timeout_secs: timeout.as_secs(),
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
