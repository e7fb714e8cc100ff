use std::path::Path;
use std::sync::Arc;

use clipchain_ffmpeg::FrameExtractor;
use image::RgbImage;
use log::warn;

use crate::errors::{CoreError, CoreResult};
use crate::fingerprint::{ClipFingerprint, ColorHistogram, Embedding, PerceptualHash};
use crate::ClipId;

/// Scan-cut timestamps beyond this count are not reported, per the
/// "first 5 scene cuts" contract.
const MAX_SCENE_CUTS: usize = 5;

/// A hard-cut is declared when adjacent sampled frames differ by more than
/// half the hash's bit length.
const HARD_CUT_FRACTION: f64 = 0.5;

/// Number of evenly spaced samples used by the scene-cut heuristic.
const SCENE_CUT_SAMPLES: usize = 12;

/// Produces semantic embeddings for a single frame. No implementation ships
/// by default: callers that have a semantic encoder available wire it in via
/// `Fingerprinter::with_embedding_encoder`; fingerprints built without one
/// simply carry `None` embeddings, which scoring tolerates by redistributing
/// weight.
pub trait EmbeddingEncoder: Send + Sync {
    fn encode(&self, frame: &RgbImage) -> Option<Embedding>;
}

/// Extracts frames, hashes, histograms, motion score and scene cuts from a
/// clip file and assembles a `ClipFingerprint`.
pub struct Fingerprinter {
    extractor: FrameExtractor,
    hash_size: u32,
    hist_bins: usize,
    embedding_encoder: Option<Arc<dyn EmbeddingEncoder>>,
}

impl Fingerprinter {
    #[must_use]
    pub fn new(hash_size: u32, hist_bins: usize) -> Self {
        Self {
            extractor: FrameExtractor::new(),
            hash_size,
            hist_bins,
            embedding_encoder: None,
        }
    }

    #[must_use]
    pub fn with_embedding_encoder(mut self, encoder: Arc<dyn EmbeddingEncoder>) -> Self {
        self.embedding_encoder = Some(encoder);
        self
    }

    /// Fingerprints a single clip. Any missing-duration or missing-first/last
    /// frame error aborts the clip entirely; a missing middle frame or a
    /// missing embedding degrades gracefully instead.
    pub fn fingerprint(&self, media_root: &Path, clip_id: &ClipId) -> CoreResult<ClipFingerprint> {
        let path = media_root.join(clip_id);

        let duration_secs = self
            .extractor
            .duration(&path)
            .map_err(CoreError::from_ffmpeg)?;

        let file_size_bytes = std::fs::metadata(&path)
            .map(|meta| meta.len())
            .unwrap_or(0);

        let last_ts = (duration_secs - 0.1).max(0.0);

        let first_frame = self
            .extractor
            .extract_frame(&path, 0.0)
            .map_err(CoreError::from_ffmpeg)?;
        let last_frame = self
            .extractor
            .extract_frame(&path, last_ts)
            .map_err(CoreError::from_ffmpeg)?;

        let middle_frame = if duration_secs >= 2.0 / 25.0 {
            self.extractor.extract_frame(&path, duration_secs / 2.0).ok()
        } else {
            None
        };

        let first_hash = PerceptualHash::from_frame(&first_frame, self.hash_size);
        let last_hash = PerceptualHash::from_frame(&last_frame, self.hash_size);
        let middle_hash = middle_frame
            .as_ref()
            .map(|frame| PerceptualHash::from_frame(frame, self.hash_size));

        let first_hist = ColorHistogram::from_frame(&first_frame, self.hist_bins);
        let last_hist = ColorHistogram::from_frame(&last_frame, self.hist_bins);

        let first_embedding = self.encode_embedding(&first_frame);
        let last_embedding = self.encode_embedding(&last_frame);

        let motion_score = self.motion_score(&path, duration_secs);
        let scene_cuts = self.scene_cuts(&path, duration_secs);

        Ok(ClipFingerprint {
            clip_id: clip_id.clone(),
            duration_secs,
            file_size_bytes,
            first_hash,
            middle_hash,
            last_hash,
            first_hist,
            last_hist,
            first_embedding,
            last_embedding,
            motion_score,
            scene_cuts,
        })
    }

    fn encode_embedding(&self, frame: &RgbImage) -> Option<Embedding> {
        self.embedding_encoder.as_ref().and_then(|encoder| {
            let embedding = encoder.encode(frame);
            if embedding.is_none() {
                warn!("semantic embedding unavailable for a frame; continuing without it");
            }
            embedding
        })
    }

    /// Samples frames at 25/50/75% of duration and averages the Hamming
    /// distance between consecutive pairs, normalized by the hash's own bit
    /// length (`hash_size^2 / 2`) rather than a constant tied to a fixed grid.
    fn motion_score(&self, path: &Path, duration_secs: f64) -> f64 {
        let fractions = [0.25, 0.5, 0.75];
        let hashes: Vec<PerceptualHash> = fractions
            .iter()
            .filter_map(|f| {
                self.extractor
                    .extract_frame(path, duration_secs * f)
                    .ok()
                    .map(|frame| PerceptualHash::from_frame(&frame, self.hash_size))
            })
            .collect();

        if hashes.len() < 2 {
            return 0.0;
        }

        let distances: Vec<u32> = hashes
            .windows(2)
            .map(|pair| pair[0].hamming_distance(&pair[1]))
            .collect();

        let avg = distances.iter().sum::<u32>() as f64 / distances.len() as f64;
        let half_range = f64::from(self.hash_size * self.hash_size) / 2.0;

        (avg / half_range).min(1.0)
    }

    /// A cheap, dependency-free stand-in for a real scene-cut detector:
    /// samples frames at a regular stride and reports timestamps where
    /// consecutive hashes differ by more than half the bit length.
    fn scene_cuts(&self, path: &Path, duration_secs: f64) -> Vec<f64> {
        let bit_len = f64::from(self.hash_size * self.hash_size);
        let cut_threshold = (bit_len * HARD_CUT_FRACTION) as u32;

        let timestamps: Vec<f64> = (0..SCENE_CUT_SAMPLES)
            .map(|i| duration_secs * (i as f64) / (SCENE_CUT_SAMPLES as f64 - 1.0).max(1.0))
            .collect();

        let mut prev: Option<(f64, PerceptualHash)> = None;
        let mut cuts = Vec::new();

        for ts in timestamps {
            let Ok(frame) = self.extractor.extract_frame(path, ts) else {
                continue;
            };
            let hash = PerceptualHash::from_frame(&frame, self.hash_size);

            if let Some((_, prev_hash)) = &prev {
                if prev_hash.hamming_distance(&hash) > cut_threshold {
                    cuts.push(ts);
                    if cuts.len() >= MAX_SCENE_CUTS {
                        break;
                    }
                }
            }
            prev = Some((ts, hash));
        }

        cuts
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn motion_score_is_bounded() {
        let fp = Fingerprinter::new(16, 32);
        // Can't drive extract_frame without ffmpeg; exercise the pure math
        // path via PerceptualHash directly instead.
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let a = PerceptualHash::random_hash(&mut rng);
        let b = PerceptualHash::random_hash(&mut rng);
        let dist = f64::from(a.hamming_distance(&b));
        let half_range = f64::from(fp.hash_size * fp.hash_size) / 2.0;
        let normalized = (dist / half_range).min(1.0);
        assert!((0.0..=1.0).contains(&normalized));
    }
}
