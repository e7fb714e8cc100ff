use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::definitions::{
    COLOR_WEIGHT, DEFAULT_BRANCH_CAP, DEFAULT_BUCKET_BITS, DEFAULT_HASH_GRID_SIZE,
    DEFAULT_HIST_BINS, DEFAULT_MAX_FANOUT, DEFAULT_MAX_STARTS, DEFAULT_MIN_LENGTH,
    DEFAULT_MIN_SCORE, DEFAULT_OUTPUT_FPS, DEFAULT_TOP_K, DEFAULT_TRANSITION_FRAMES,
    FRAME_WEIGHT, MOTION_WEIGHT, SEMANTIC_WEIGHT,
};
use crate::errors::{CoreError, CoreResult};

/// The four component weights used when combining a `ScorePair`. Must sum to
/// 1.0; validated once at construction rather than on every scored pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub frame: f64,
    pub semantic: f64,
    pub color: f64,
    pub motion: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            frame: FRAME_WEIGHT,
            semantic: SEMANTIC_WEIGHT,
            color: COLOR_WEIGHT,
            motion: MOTION_WEIGHT,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> CoreResult<()> {
        let sum = self.frame + self.semantic + self.color + self.motion;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(CoreError::ConfigInvalid(format!(
                "component weights must sum to 1.0, got {sum}"
            )));
        }
        if [self.frame, self.semantic, self.color, self.motion]
            .iter()
            .any(|w| *w < 0.0)
        {
            return Err(CoreError::ConfigInvalid(
                "component weights must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single structured configuration consumed by every stage of the
/// pipeline. Constructed once, validated at construction time, and shared
/// immutably thereafter.
#[derive(Debug, Clone)]
pub struct ClipChainConfig {
    pub media_root: PathBuf,
    pub cache_path: PathBuf,
    pub graph_path: PathBuf,

    pub hash_size: u32,
    pub hist_bins: usize,
    pub weights: ScoreWeights,

    pub min_score: f64,
    pub max_fanout: usize,
    pub bucket_bits: u32,

    pub min_length: usize,
    pub max_starts: usize,
    pub branch_cap: usize,
    pub top_k: usize,

    pub use_transitions: bool,
    pub transition_frames: u32,
    pub output_fps: u32,

    pub worker_count: usize,
}

impl ClipChainConfig {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        let media_root = media_root.into();
        Self {
            cache_path: media_root.join("fingerprints.json"),
            graph_path: media_root.join("similarity_graph.json"),
            media_root,
            hash_size: DEFAULT_HASH_GRID_SIZE,
            hist_bins: DEFAULT_HIST_BINS,
            weights: ScoreWeights::default(),
            min_score: DEFAULT_MIN_SCORE,
            max_fanout: DEFAULT_MAX_FANOUT,
            bucket_bits: DEFAULT_BUCKET_BITS,
            min_length: DEFAULT_MIN_LENGTH,
            max_starts: DEFAULT_MAX_STARTS,
            branch_cap: DEFAULT_BRANCH_CAP,
            top_k: DEFAULT_TOP_K,
            use_transitions: false,
            transition_frames: DEFAULT_TRANSITION_FRAMES,
            output_fps: DEFAULT_OUTPUT_FPS,
            worker_count: 0,
        }
    }

    /// Validates the configuration, refusing construction rather than
    /// creating any partial state. Mirrors the `ConfigInvalid` error kind.
    pub fn validate(&self) -> CoreResult<()> {
        self.weights.validate()?;

        if self.hash_size == 0 || self.hash_size > crate::definitions::MAX_HASH_GRID_SIZE {
            return Err(CoreError::ConfigInvalid(format!(
                "hash_size must be in 1..={}, got {}",
                crate::definitions::MAX_HASH_GRID_SIZE,
                self.hash_size
            )));
        }

        if self.hist_bins == 0 {
            return Err(CoreError::ConfigInvalid(
                "hist_bins must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(CoreError::ConfigInvalid(
                "min_score must be within 0.0..=1.0".to_string(),
            ));
        }

        if self.max_fanout == 0 {
            return Err(CoreError::ConfigInvalid(
                "max_fanout must be positive".to_string(),
            ));
        }

        if self.min_length < 2 {
            return Err(CoreError::ConfigInvalid(
                "min_length must be at least 2".to_string(),
            ));
        }

        if self.branch_cap == 0 {
            return Err(CoreError::ConfigInvalid(
                "branch_cap must be positive".to_string(),
            ));
        }

        if self.transition_frames > 30 {
            return Err(CoreError::ConfigInvalid(
                "transition_frames must be within 0..=30".to_string(),
            ));
        }

        if !(15..=60).contains(&self.output_fps) {
            return Err(CoreError::ConfigInvalid(
                "output_fps must be within 15..=60".to_string(),
            ));
        }

        Ok(())
    }
}
