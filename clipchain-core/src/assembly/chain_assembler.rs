use std::path::{Path, PathBuf};
use std::sync::Arc;

use clipchain_ffmpeg::{concat_copy, concat_reencode, encode_frames, FrameExtractor};
use image::imageops::FilterType;
use log::warn;

use crate::assembly::FrameInterpolator;
use crate::errors::{CoreError, CoreResult};
use crate::ClipId;

/// Options controlling how a chain is rendered to an output file.
#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions {
    pub use_transitions: bool,
    /// Number of synthesized frames per junction, in `0..=30`.
    pub transition_frames: u32,
    /// Output frame rate for the smooth path, in `15..=60`.
    pub output_fps: u32,
}

/// Renders an ordered chain of clips into a single output file, either by
/// fast stream-copy concatenation or, when requested or when the fast path
/// fails, by synthesizing interpolated transition frames at each junction.
pub struct ChainAssembler {
    extractor: FrameExtractor,
    interpolator: Arc<dyn FrameInterpolator>,
}

impl ChainAssembler {
    #[must_use]
    pub fn new(interpolator: Arc<dyn FrameInterpolator>) -> Self {
        Self {
            extractor: FrameExtractor::new(),
            interpolator,
        }
    }

    /// Assembles `clips` (relative to `media_root`, in chain order) into
    /// `out_path`. On any failure the partial output file is removed before
    /// the error is returned.
    pub fn assemble(
        &self,
        media_root: &Path,
        clips: &[ClipId],
        out_path: &Path,
        options: AssembleOptions,
    ) -> CoreResult<PathBuf> {
        if clips.len() < 2 {
            return Err(CoreError::AssemblyFailed(
                "a chain needs at least two clips".to_string(),
            ));
        }

        let absolute: Vec<PathBuf> = clips.iter().map(|c| media_root.join(c)).collect();

        let result = if options.use_transitions && options.transition_frames > 0 {
            self.assemble_smooth(&absolute, out_path, options)
        } else {
            self.assemble_fast(&absolute, out_path, options)
        };

        if result.is_err() {
            let _ = std::fs::remove_file(out_path);
        }

        result.map(|()| out_path.to_path_buf())
    }

    fn assemble_fast(
        &self,
        absolute: &[PathBuf],
        out_path: &Path,
        options: AssembleOptions,
    ) -> CoreResult<()> {
        match concat_copy(absolute, out_path) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("stream-copy concat failed ({e}); falling back to smooth assembly");
                self.assemble_smooth(absolute, out_path, options)
            }
        }
    }

    fn assemble_smooth(
        &self,
        absolute: &[PathBuf],
        out_path: &Path,
        options: AssembleOptions,
    ) -> CoreResult<()> {
        let mut segments: Vec<PathBuf> = Vec::new();
        let temp_dir = tempfile::tempdir().map_err(|e| {
            CoreError::AssemblyFailed(format!("could not create temp directory: {e}"))
        })?;

        segments.push(absolute[0].clone());

        for (i, pair) in absolute.windows(2).enumerate() {
            let (left, right) = (&pair[0], &pair[1]);

            match self.build_transition(left, right, options, temp_dir.path(), i) {
                Ok(Some(transition_path)) => segments.push(transition_path),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "transition synthesis failed between clip {i} and {} (falling back to a direct cut at this junction): {e}",
                        i + 1
                    );
                }
            }

            segments.push(right.clone());
        }

        concat_reencode(&segments, out_path, options.output_fps).map_err(|e| {
            CoreError::AssemblyFailed(format!("final assembly encode failed: {e}"))
        })
    }

    /// Extracts the boundary frames for one junction, interpolates the
    /// requested number of transition frames, and encodes them into a short
    /// clip. Returns `Ok(None)` if there is nothing to synthesize.
    fn build_transition(
        &self,
        left: &Path,
        right: &Path,
        options: AssembleOptions,
        temp_dir: &Path,
        junction_index: usize,
    ) -> CoreResult<Option<PathBuf>> {
        let left_duration = self
            .extractor
            .duration(left)
            .map_err(CoreError::from_ffmpeg)?;
        let last_frame_ts = (left_duration - 0.1).max(0.0);

        let last_of_left = self
            .extractor
            .extract_frame(left, last_frame_ts)
            .map_err(CoreError::from_ffmpeg)?;
        let first_of_right = self
            .extractor
            .extract_frame(right, 0.0)
            .map_err(CoreError::from_ffmpeg)?;

        let first_of_right = if first_of_right.dimensions() != last_of_left.dimensions() {
            let (w, h) = last_of_left.dimensions();
            image::imageops::resize(&first_of_right, w, h, FilterType::Triangle)
        } else {
            first_of_right
        };

        let transition_frames =
            self.interpolator
                .interpolate(&last_of_left, &first_of_right, options.transition_frames as usize);

        if transition_frames.is_empty() {
            return Ok(None);
        }

        let transition_path = temp_dir.join(format!("transition-{junction_index:04}.mp4"));
        encode_frames(&transition_frames, options.output_fps, &transition_path)
            .map_err(CoreError::from_ffmpeg)?;

        Ok(Some(transition_path))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assembly::LinearBlendInterpolator;

    #[test]
    fn rejects_single_clip_chain() {
        let assembler = ChainAssembler::new(Arc::new(LinearBlendInterpolator));
        let result = assembler.assemble(
            Path::new("/media"),
            &[ClipId::from("only.mp4")],
            Path::new("/tmp/out.mp4"),
            AssembleOptions {
                use_transitions: false,
                transition_frames: 0,
                output_fps: 30,
            },
        );
        assert!(result.is_err());
    }
}
