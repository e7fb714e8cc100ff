use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cancellation::Cancellation;
use crate::config::ScoreWeights;
use crate::definitions::SCHEMA_VERSION;
use crate::fingerprint::ClipFingerprint;
use crate::graph::score::score_pair;
use crate::graph::ScorePair;
use crate::ClipId;

/// A directed, weighted edge from one clip's outgoing adjacency list.
///
/// `source` is redundant with the adjacency map's own key and is not part of
/// the persisted wire format (each edge is written as a `[dest_id,
/// score_pair]` pair); it is kept in memory because callers handed a bare
/// `&[GraphEdge]` slice (e.g. `ChainFinder`) still need to know which clip an
/// edge starts from without threading the source id alongside it.
#[derive(Clone, Debug)]
pub struct GraphEdge {
    pub source: ClipId,
    pub destination: ClipId,
    pub score: ScorePair,
}

/// Parameters that fully determine a `SimilarityGraph`'s validity. Two
/// graphs built with an identical header are guaranteed to be identical;
/// any mismatch invalidates a persisted graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphHeader {
    pub min_score: f64,
    pub num_videos: usize,
    pub weights: ScoreWeights,
    pub bucket_bits: u32,
    pub schema_version: u32,
}

/// A pruned directed graph over clip identifiers: each source maps to a
/// score-sorted, fanout-capped list of outgoing edges above `min_score`.
///
/// Serializes as `{"_header": {...}, "graph": {clip_id: [[dest_id,
/// score_pair], ...]}}` rather than deriving `Serialize`/`Deserialize`
/// directly, since the persisted edge shape (a 2-element pair) differs from
/// `GraphEdge`'s in-memory shape (which also carries a redundant `source`).
#[derive(Clone, Debug)]
pub struct SimilarityGraph {
    header: GraphHeader,
    adjacency: HashMap<ClipId, Vec<GraphEdge>>,
}

/// On-disk representation of a `SimilarityGraph`: top-level keys `_header`
/// and `graph`, edges as `[dest_id, score_pair]` tuples.
#[derive(Serialize, Deserialize)]
struct WireGraph<'a> {
    #[serde(rename = "_header")]
    header: std::borrow::Cow<'a, GraphHeader>,
    graph: HashMap<ClipId, Vec<(ClipId, ScorePair)>>,
}

impl Serialize for SimilarityGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let graph = self
            .adjacency
            .iter()
            .map(|(source, edges)| {
                let pairs = edges
                    .iter()
                    .map(|edge| (edge.destination.clone(), edge.score))
                    .collect();
                (source.clone(), pairs)
            })
            .collect();

        WireGraph {
            header: std::borrow::Cow::Borrowed(&self.header),
            graph,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SimilarityGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireGraph::deserialize(deserializer)?;

        let adjacency = wire
            .graph
            .into_iter()
            .map(|(source, pairs)| {
                let edges = pairs
                    .into_iter()
                    .map(|(destination, score)| GraphEdge {
                        source: source.clone(),
                        destination,
                        score,
                    })
                    .collect();
                (source, edges)
            })
            .collect();

        Ok(Self {
            header: wire.header.into_owned(),
            adjacency,
        })
    }
}

impl SimilarityGraph {
    /// Builds the graph from scratch over every fingerprint in `fingerprints`.
    ///
    /// Candidate pruning: fingerprints are bucketed by the high-order
    /// `bucket_bits` of `first_hash`; a source only considers destinations
    /// whose `first_hash` prefix is within Hamming distance 1 of the
    /// source's `last_hash` prefix. Set `bucket_bits = 0` to disable pruning
    /// and score every ordered pair.
    #[must_use]
    pub fn build(
        fingerprints: &[ClipFingerprint],
        min_score: f64,
        max_fanout: usize,
        bucket_bits: u32,
        weights: ScoreWeights,
    ) -> Self {
        Self::build_cancellable(
            fingerprints,
            min_score,
            max_fanout,
            bucket_bits,
            weights,
            &Cancellation::none(),
        )
    }

    /// As `build`, but checks `cancel` between sources and returns whatever
    /// adjacency has been built so far if it becomes set. Per the shared
    /// cancellation contract, a cancelled build's partial result is
    /// discarded by the caller rather than persisted.
    #[must_use]
    pub fn build_cancellable(
        fingerprints: &[ClipFingerprint],
        min_score: f64,
        max_fanout: usize,
        bucket_bits: u32,
        weights: ScoreWeights,
        cancel: &Cancellation,
    ) -> Self {
        let header = GraphHeader {
            min_score,
            num_videos: fingerprints.len(),
            weights,
            bucket_bits,
            schema_version: SCHEMA_VERSION,
        };

        let buckets = if bucket_bits > 0 {
            Some(bucket_by_prefix(fingerprints, bucket_bits))
        } else {
            None
        };

        // Pairwise scoring of every source against its candidate set is the
        // expensive, embarrassingly-parallel part of a build: each source is
        // scored independently, so the outer loop runs across the pool and
        // bails out per-item once `cancel` is observed rather than via a
        // sequential break.
        let adjacency: HashMap<ClipId, Vec<GraphEdge>> = fingerprints
            .par_iter()
            .filter_map(|a| {
                if cancel.is_cancelled() {
                    return None;
                }

                let candidates: Vec<&ClipFingerprint> = match &buckets {
                    Some(buckets) => candidate_set(a, fingerprints, buckets, bucket_bits),
                    None => fingerprints.iter().collect(),
                };

                let mut edges: Vec<GraphEdge> = candidates
                    .into_iter()
                    .filter(|b| b.clip_id != a.clip_id)
                    .filter_map(|b| {
                        let score = score_pair(a, b, &weights);
                        if score.final_score >= min_score {
                            Some(GraphEdge {
                                source: a.clip_id.clone(),
                                destination: b.clip_id.clone(),
                                score,
                            })
                        } else {
                            None
                        }
                    })
                    .collect();

                edges.sort_by(|x, y| {
                    y.score
                        .final_score
                        .partial_cmp(&x.score.final_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| x.destination.cmp(&y.destination))
                });
                edges.truncate(max_fanout);

                if edges.is_empty() {
                    None
                } else {
                    Some((a.clip_id.clone(), edges))
                }
            })
            .collect();

        Self { header, adjacency }
    }

    #[must_use]
    pub fn header(&self) -> &GraphHeader {
        &self.header
    }

    #[must_use]
    pub fn edges_from(&self, clip_id: &ClipId) -> &[GraphEdge] {
        self.adjacency
            .get(clip_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn out_degree(&self, clip_id: &ClipId) -> usize {
        self.edges_from(clip_id).len()
    }

    /// All clip ids with at least one outgoing edge, ordered by out-degree
    /// descending and then lexicographically, for deterministic downstream
    /// use as chain-discovery starting points.
    #[must_use]
    pub fn sources_by_out_degree(&self) -> Vec<ClipId> {
        let mut sources: Vec<ClipId> = self.adjacency.keys().cloned().collect();
        sources.sort_by(|a, b| {
            self.out_degree(b)
                .cmp(&self.out_degree(a))
                .then_with(|| a.cmp(b))
        });
        sources
    }
}

fn bucket_by_prefix(
    fingerprints: &[ClipFingerprint],
    bucket_bits: u32,
) -> HashMap<u32, Vec<usize>> {
    let mut buckets: HashMap<u32, Vec<usize>> = HashMap::new();
    for (idx, fp) in fingerprints.iter().enumerate() {
        let prefix = fp.first_hash.prefix(bucket_bits);
        buckets.entry(prefix).or_default().push(idx);
    }
    buckets
}

fn candidate_set<'a>(
    a: &ClipFingerprint,
    fingerprints: &'a [ClipFingerprint],
    buckets: &HashMap<u32, Vec<usize>>,
    bucket_bits: u32,
) -> Vec<&'a ClipFingerprint> {
    let source_prefix = a.last_hash.prefix(bucket_bits);
    let mut indices = Vec::new();

    for bit in 0..bucket_bits {
        let flipped = source_prefix ^ (1 << bit);
        if let Some(bucket) = buckets.get(&flipped) {
            indices.extend(bucket.iter().copied());
        }
    }
    if let Some(bucket) = buckets.get(&source_prefix) {
        indices.extend(bucket.iter().copied());
    }

    indices.sort_unstable();
    indices.dedup();
    indices.into_iter().map(|i| &fingerprints[i]).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fingerprint::{ColorHistogram, PerceptualHash};

    fn fp(id: &str, last: PerceptualHash, first: PerceptualHash) -> ClipFingerprint {
        ClipFingerprint {
            clip_id: id.into(),
            duration_secs: 10.0,
            file_size_bytes: 0,
            first_hash: first,
            middle_hash: None,
            last_hash: last,
            first_hist: ColorHistogram::uniform(32),
            last_hist: ColorHistogram::uniform(32),
            first_embedding: None,
            last_embedding: None,
            motion_score: 0.1,
            scene_cuts: Vec::new(),
        }
    }

    #[test]
    fn fanout_never_exceeds_cap() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        use rand::SeedableRng;
        let shared = PerceptualHash::empty_hash();
        let fingerprints: Vec<ClipFingerprint> = (0..50)
            .map(|i| {
                let _ = &mut rng;
                fp(&format!("clip-{i}"), shared.clone(), shared.clone())
            })
            .collect();

        let graph = SimilarityGraph::build(&fingerprints, 0.0, 20, 0, ScoreWeights::default());
        for source in graph.sources_by_out_degree() {
            assert!(graph.out_degree(&source) <= 20);
        }
    }

    #[test]
    fn raising_threshold_never_adds_edges() {
        let shared = PerceptualHash::empty_hash();
        let far = PerceptualHash::full_hash();
        let fingerprints = vec![fp("a", shared.clone(), shared.clone()), fp("b", far, shared)];

        let loose = SimilarityGraph::build(&fingerprints, 0.1, 20, 0, ScoreWeights::default());
        let strict = SimilarityGraph::build(&fingerprints, 0.9, 20, 0, ScoreWeights::default());

        for source in loose.sources_by_out_degree() {
            assert!(strict.out_degree(&source) <= loose.out_degree(&source));
        }
    }

    #[test]
    fn header_mismatch_is_detectable() {
        let fingerprints = vec![fp(
            "a",
            PerceptualHash::empty_hash(),
            PerceptualHash::empty_hash(),
        )];
        let a = SimilarityGraph::build(&fingerprints, 0.5, 20, 8, ScoreWeights::default());
        let b = SimilarityGraph::build(&fingerprints, 0.6, 20, 8, ScoreWeights::default());
        assert_ne!(a.header(), b.header());
    }

    #[test]
    fn no_self_loops() {
        let fingerprints = vec![fp(
            "a",
            PerceptualHash::empty_hash(),
            PerceptualHash::empty_hash(),
        )];
        let graph = SimilarityGraph::build(&fingerprints, 0.0, 20, 0, ScoreWeights::default());
        for edge in graph.edges_from(&"a".into()) {
            assert_ne!(edge.source, edge.destination);
        }
    }
}
