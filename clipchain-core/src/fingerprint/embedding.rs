/// A unit-norm semantic embedding vector. Absence is represented by the
/// caller holding `Option<Embedding>` rather than a zero vector, so scoring
/// can redistribute weight instead of treating a missing embedding as
/// maximally dissimilar.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Builds an `Embedding` from a raw vector, L2-normalizing it. Returns
    /// `None` if the vector is empty or has zero magnitude, since neither
    /// can be normalized to unit length.
    #[must_use]
    pub fn from_raw(values: Vec<f32>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        Some(Self(values.iter().map(|v| v / norm).collect()))
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.0
    }

    /// Cosine similarity with another embedding, normalized into `[0, 1]`
    /// via `(cos + 1) / 2`. Both vectors are assumed unit-norm.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> f64 {
        let dot: f32 = self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum();
        (f64::from(dot) + 1.0) / 2.0
    }
}

#[cfg(test)]
mod test {
    use super::Embedding;

    #[test]
    fn from_raw_normalizes_to_unit_length() {
        let emb = Embedding::from_raw(vec![3.0, 4.0]).unwrap();
        let norm: f32 = emb.values().iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_vector_has_no_embedding() {
        assert!(Embedding::from_raw(vec![0.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn empty_vector_has_no_embedding() {
        assert!(Embedding::from_raw(vec![]).is_none());
    }

    #[test]
    fn identical_vectors_have_similarity_one() {
        let a = Embedding::from_raw(vec![1.0, 2.0, 3.0]).unwrap();
        let b = a.clone();
        assert!((a.similarity(&b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn opposite_vectors_have_similarity_zero() {
        let a = Embedding::from_raw(vec![1.0, 0.0]).unwrap();
        let b = Embedding::from_raw(vec![-1.0, 0.0]).unwrap();
        assert!(a.similarity(&b).abs() < 1e-5);
    }
}
