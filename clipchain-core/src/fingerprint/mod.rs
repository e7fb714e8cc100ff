mod color_histogram;
mod embedding;
mod fingerprinter;
mod perceptual_hash;

pub use color_histogram::ColorHistogram;
pub use embedding::Embedding;
pub use fingerprinter::{EmbeddingEncoder, Fingerprinter};
pub use perceptual_hash::PerceptualHash;

use serde::{Deserialize, Serialize};

use crate::ClipId;

/// Everything derived from a single clip and used for boundary-compatibility
/// scoring. Created once by `Fingerprinter` and immutable once written to a
/// `FingerprintStore`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClipFingerprint {
    pub clip_id: ClipId,
    pub duration_secs: f64,
    pub file_size_bytes: u64,

    pub first_hash: PerceptualHash,
    pub middle_hash: Option<PerceptualHash>,
    pub last_hash: PerceptualHash,

    pub first_hist: ColorHistogram,
    pub last_hist: ColorHistogram,

    pub first_embedding: Option<Embedding>,
    pub last_embedding: Option<Embedding>,

    /// Normalized scene-activity score in `[0, 1]`.
    pub motion_score: f64,

    /// Timestamps, in seconds, of the first scene cuts detected.
    pub scene_cuts: Vec<f64>,
}
