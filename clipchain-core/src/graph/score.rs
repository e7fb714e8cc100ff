use serde::{Deserialize, Serialize};

use crate::config::ScoreWeights;
use crate::fingerprint::ClipFingerprint;

/// The four component scores and their weighted combination for an ordered
/// pair of clips. All components and `final_score` lie in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScorePair {
    pub frame: f64,
    pub semantic: f64,
    pub color: f64,
    pub motion: f64,
    pub final_score: f64,
}

/// Scores an ordered pair `(a -> b)`: how well `a`'s last frame sets up
/// `b`'s first frame. When either side lacks an embedding, the semantic
/// component is scored as 0 and its configured weight is redistributed
/// proportionally over the remaining three components, rather than treated
/// as a penalty.
#[must_use]
pub fn score_pair(a: &ClipFingerprint, b: &ClipFingerprint, weights: &ScoreWeights) -> ScorePair {
    let bit_len = a.last_hash.bit_len().min(b.first_hash.bit_len()).max(1) as f64;
    let frame = 1.0 - f64::from(a.last_hash.hamming_distance(&b.first_hash)) / bit_len;

    let semantic = match (&a.last_embedding, &b.first_embedding) {
        (Some(a_emb), Some(b_emb)) => Some(a_emb.similarity(b_emb)),
        _ => None,
    };

    let color = 1.0 / (1.0 + a.last_hist.chi_square(&b.first_hist));
    let motion = 1.0 - (a.motion_score - b.motion_score).abs();

    let (effective_weights, semantic_value) = match semantic {
        Some(value) => (*weights, value),
        None => (redistribute(weights), 0.0),
    };

    let final_score = effective_weights.frame * frame
        + effective_weights.semantic * semantic_value
        + effective_weights.color * color
        + effective_weights.motion * motion;

    ScorePair {
        frame,
        semantic: semantic_value,
        color,
        motion,
        final_score,
    }
}

/// Redistributes the semantic weight proportionally over frame/color/motion.
fn redistribute(weights: &ScoreWeights) -> ScoreWeights {
    let remaining = weights.frame + weights.color + weights.motion;
    if remaining <= 0.0 {
        return ScoreWeights {
            frame: 0.0,
            semantic: 0.0,
            color: 0.0,
            motion: 0.0,
        };
    }
    let scale = (remaining + weights.semantic) / remaining;
    ScoreWeights {
        frame: weights.frame * scale,
        semantic: 0.0,
        color: weights.color * scale,
        motion: weights.motion * scale,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fingerprint::{ColorHistogram, Embedding, PerceptualHash};

    fn fingerprint_with(
        last_hash: PerceptualHash,
        first_hash: PerceptualHash,
        embedding: Option<Embedding>,
        motion: f64,
    ) -> ClipFingerprint {
        ClipFingerprint {
            clip_id: "clip".into(),
            duration_secs: 10.0,
            file_size_bytes: 0,
            first_hash: first_hash.clone(),
            middle_hash: None,
            last_hash,
            first_hist: ColorHistogram::uniform(32),
            last_hist: ColorHistogram::uniform(32),
            first_embedding: embedding.clone(),
            last_embedding: embedding,
            motion_score: motion,
            scene_cuts: Vec::new(),
        }
    }

    #[test]
    fn components_and_final_are_bounded() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        let weights = ScoreWeights::default();

        for _ in 0..200 {
            let a = fingerprint_with(
                PerceptualHash::random_hash(&mut rng),
                PerceptualHash::random_hash(&mut rng),
                None,
                rng.random_range(0.0..1.0),
            );
            let b = fingerprint_with(
                PerceptualHash::random_hash(&mut rng),
                PerceptualHash::random_hash(&mut rng),
                None,
                rng.random_range(0.0..1.0),
            );
            let pair = score_pair(&a, &b, &weights);
            assert!((0.0..=1.0).contains(&pair.frame));
            assert!((0.0..=1.0).contains(&pair.color));
            assert!((0.0..=1.0).contains(&pair.motion));
            assert!((0.0..=1.0).contains(&pair.final_score));
        }
    }

    #[test]
    fn weighted_sum_matches_final() {
        let weights = ScoreWeights::default();
        let a = fingerprint_with(
            PerceptualHash::empty_hash(),
            PerceptualHash::empty_hash(),
            None,
            0.2,
        );
        let b = fingerprint_with(
            PerceptualHash::empty_hash(),
            PerceptualHash::empty_hash(),
            None,
            0.3,
        );
        let pair = score_pair(&a, &b, &weights);
        let redistributed = redistribute(&weights);
        let expected = redistributed.frame * pair.frame
            + redistributed.color * pair.color
            + redistributed.motion * pair.motion;
        assert!((pair.final_score - expected).abs() < 1e-9);
    }

    #[test]
    fn missing_embeddings_redistribute_weight() {
        let weights = ScoreWeights::default();
        let redistributed = redistribute(&weights);
        assert!((redistributed.frame - 0.571_428_571_428_571_4).abs() < 1e-6);
        assert_eq!(redistributed.semantic, 0.0);
        assert!((redistributed.color - 0.214_285_714_285_714_3).abs() < 1e-6);
        assert!((redistributed.motion - 0.214_285_714_285_714_3).abs() < 1e-6);
    }

    #[test]
    fn identical_boundaries_score_near_one() {
        let weights = ScoreWeights::default();
        let emb = Embedding::from_raw(vec![1.0, 0.0, 0.0]);
        let a = fingerprint_with(
            PerceptualHash::empty_hash(),
            PerceptualHash::empty_hash(),
            emb.clone(),
            0.5,
        );
        let b = fingerprint_with(
            PerceptualHash::empty_hash(),
            PerceptualHash::empty_hash(),
            emb,
            0.5,
        );
        let pair = score_pair(&a, &b, &weights);
        assert!((pair.final_score - 1.0).abs() < 1e-6);
    }
}
