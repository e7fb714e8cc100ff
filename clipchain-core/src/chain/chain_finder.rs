use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::cancellation::Cancellation;
use crate::fingerprint::PerceptualHash;
use crate::graph::{GraphEdge, ScorePair, SimilarityGraph};
use crate::ClipId;

/// An ordered sequence of clips intended for concatenation, together with
/// the boundary score between each consecutive pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chain {
    pub clips: Vec<ClipId>,
    pub edge_scores: Vec<ScorePair>,
    pub avg_quality: f64,
}

impl Chain {
    fn new(clips: Vec<ClipId>, edge_scores: Vec<ScorePair>) -> Self {
        let avg_quality = if edge_scores.is_empty() {
            0.0
        } else {
            edge_scores.iter().map(|s| s.final_score).sum::<f64>() / edge_scores.len() as f64
        };
        Self {
            clips,
            edge_scores,
            avg_quality,
        }
    }

    fn len(&self) -> usize {
        self.clips.len()
    }
}

/// Ordering used by the bounded top-K heap: worst chain first, so the
/// smallest element can be evicted in O(log k) as better chains arrive.
struct RankedChain(Chain);

impl RankedChain {
    fn rank_key(&self) -> (f64, usize) {
        (self.0.avg_quality, self.0.len())
    }
}

impl PartialEq for RankedChain {
    fn eq(&self, other: &Self) -> bool {
        self.rank_key() == other.rank_key()
    }
}
impl Eq for RankedChain {}

impl PartialOrd for RankedChain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedChain {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that `BinaryHeap` (a max-heap) keeps the worst chain
        // on top, ready to be evicted when a better one arrives.
        let (my_quality, my_len) = self.rank_key();
        let (other_quality, other_len) = other.rank_key();
        other_quality
            .partial_cmp(&my_quality)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other_len.cmp(&my_len))
    }
}

/// One level of the explicit DFS stack: the node currently being explored,
/// its branch-capped candidate edges, and how far through them we've got.
struct Frame {
    candidates: Vec<GraphEdge>,
    next_idx: usize,
}

/// Enumerates high-scoring chains over a `SimilarityGraph` via bounded,
/// depth-first traversal from the most-connected clips.
pub struct ChainFinder;

impl ChainFinder {
    /// Runs bounded DFS from the `max_starts` highest out-degree clips,
    /// branching into at most `branch_cap` highest-scoring outgoing edges per
    /// node, and keeps the `top_k` best chains of length `>= min_length`
    /// ranked by `(avg_quality desc, length desc)`.
    ///
    /// When `start_hashes` is provided, diversity sampling groups emitted
    /// chains by the starting clip's `first_hash` and keeps only the longest
    /// chain per bucket before ranking — this is frame-based diversity, not
    /// applied when `start_hashes` is `None` (smart-score mode).
    #[must_use]
    pub fn find_chains(
        graph: &SimilarityGraph,
        min_length: usize,
        max_starts: usize,
        branch_cap: usize,
        top_k: usize,
        start_hashes: Option<&HashMap<ClipId, PerceptualHash>>,
    ) -> Vec<Chain> {
        Self::find_chains_cancellable(
            graph,
            min_length,
            max_starts,
            branch_cap,
            top_k,
            start_hashes,
            &Cancellation::none(),
        )
    }

    /// As `find_chains`, but checks `cancel` between starting points and
    /// returns whatever complete chains have already been emitted if it
    /// becomes set. A chain is only ever recorded in full; cancellation
    /// never yields a partial chain.
    #[must_use]
    pub fn find_chains_cancellable(
        graph: &SimilarityGraph,
        min_length: usize,
        max_starts: usize,
        branch_cap: usize,
        top_k: usize,
        start_hashes: Option<&HashMap<ClipId, PerceptualHash>>,
        cancel: &Cancellation,
    ) -> Vec<Chain> {
        let starts: Vec<ClipId> = graph
            .sources_by_out_degree()
            .into_iter()
            .take(max_starts)
            .collect();

        let mut heap: BinaryHeap<RankedChain> = BinaryHeap::new();
        let mut all_chains: Vec<Chain> = Vec::new();

        for start in starts {
            if cancel.is_cancelled() {
                break;
            }
            let chains = Self::enumerate_from(graph, &start, branch_cap, min_length);
            if start_hashes.is_some() {
                all_chains.extend(chains);
            } else {
                for chain in chains {
                    push_bounded(&mut heap, chain, top_k);
                }
            }
        }

        if let Some(hashes) = start_hashes {
            let diverse = diversity_sample(all_chains, hashes);
            let mut heap: BinaryHeap<RankedChain> = BinaryHeap::new();
            for chain in diverse {
                push_bounded(&mut heap, chain, top_k);
            }
            return sorted_output(heap);
        }

        sorted_output(heap)
    }

    /// Explicit-stack DFS from a single starting clip. Bounded at
    /// `min_length * branch_cap` stack depth in the worst case since each
    /// frame only ever explores `branch_cap` candidates before popping.
    fn enumerate_from(
        graph: &SimilarityGraph,
        start: &ClipId,
        branch_cap: usize,
        min_length: usize,
    ) -> Vec<Chain> {
        let mut results = Vec::new();

        let mut path: Vec<ClipId> = vec![start.clone()];
        let mut path_scores: Vec<ScorePair> = Vec::new();
        let mut visited: HashSet<ClipId> = HashSet::new();
        visited.insert(start.clone());

        let mut stack: Vec<Frame> = vec![Frame {
            candidates: top_candidates(graph, start, branch_cap),
            next_idx: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let mut next_edge = None;
            while frame.next_idx < frame.candidates.len() {
                let edge = frame.candidates[frame.next_idx].clone();
                frame.next_idx += 1;
                if !visited.contains(&edge.destination) {
                    next_edge = Some(edge);
                    break;
                }
            }

            if let Some(edge) = next_edge {
                path.push(edge.destination.clone());
                path_scores.push(edge.score);
                visited.insert(edge.destination.clone());

                let candidates = top_candidates(graph, &edge.destination, branch_cap);
                stack.push(Frame {
                    candidates,
                    next_idx: 0,
                });
                continue;
            }

            if path.len() >= min_length {
                results.push(Chain::new(path.clone(), path_scores.clone()));
            }

            stack.pop();
            if let Some(last) = path.pop() {
                visited.remove(&last);
            }
            path_scores.pop();
        }

        results
    }
}

/// Returns the top `branch_cap` outgoing edges of `node`, already sorted by
/// score descending as maintained by `SimilarityGraph::build`.
fn top_candidates(graph: &SimilarityGraph, node: &ClipId, branch_cap: usize) -> Vec<GraphEdge> {
    graph
        .edges_from(node)
        .iter()
        .take(branch_cap)
        .cloned()
        .collect()
}

fn push_bounded(heap: &mut BinaryHeap<RankedChain>, chain: Chain, top_k: usize) {
    if heap.len() < top_k {
        heap.push(RankedChain(chain));
    } else if let Some(worst) = heap.peek() {
        if RankedChain(chain.clone()) < *worst {
            heap.pop();
            heap.push(RankedChain(chain));
        }
    }
}

fn sorted_output(heap: BinaryHeap<RankedChain>) -> Vec<Chain> {
    let mut chains: Vec<Chain> = heap.into_iter().map(|ranked| ranked.0).collect();
    chains.sort_by(|a, b| {
        b.avg_quality
            .partial_cmp(&a.avg_quality)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.len().cmp(&a.len()))
    });
    chains
}

/// Groups chains by the `first_hash` of their starting clip and keeps only
/// the longest chain per bucket.
fn diversity_sample(
    chains: Vec<Chain>,
    start_hashes: &HashMap<ClipId, PerceptualHash>,
) -> Vec<Chain> {
    let mut best_per_bucket: HashMap<PerceptualHash, Chain> = HashMap::new();

    for chain in chains {
        let Some(start) = chain.clips.first() else {
            continue;
        };
        let Some(hash) = start_hashes.get(start) else {
            continue;
        };

        best_per_bucket
            .entry(hash.clone())
            .and_modify(|existing| {
                if chain.len() > existing.len() {
                    *existing = chain.clone();
                }
            })
            .or_insert(chain);
    }

    best_per_bucket.into_values().collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ScoreWeights;
    use crate::fingerprint::{ClipFingerprint, ColorHistogram};

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
    fn three_clip_trivial_chain() {
        // Chosen so every *unwanted* ordered pair lands at maximal Hamming
        // distance (frame_similarity = 0), while the two intended boundary
        // matches land at distance 0 (frame_similarity = 1).
        let empty = PerceptualHash::empty_hash();
        let full = PerceptualHash::full_hash();

        let c1 = fp("c1", empty.clone(), empty.clone());
        let c2 = fp("c2", full.clone(), empty.clone());
        let c3 = fp("c3", full.clone(), full.clone());

        let fingerprints = vec![c1, c2, c3];
        let graph = SimilarityGraph::build(&fingerprints, 0.6, 20, 0, ScoreWeights::default());

        let chains = ChainFinder::find_chains(&graph, 2, 500, 5, 100, None);
        let full = chains.iter().find(|c| c.len() == 3);
        assert!(full.is_some());
        let full = full.unwrap();
        assert_eq!(full.clips, vec!["c1", "c2", "c3"].into_iter().map(Into::into).collect::<Vec<_>>());
        assert!((full.avg_quality - 1.0).abs() < 1e-6);
    }

    #[test]
    fn branch_cap_limits_fanout_exploration() {
        let shared = PerceptualHash::empty_hash();
        let far = PerceptualHash::full_hash();

        let c1 = fp("seed", shared.clone(), far.clone());
        let mut fingerprints = vec![c1];
        for i in 0..3 {
            fingerprints.push(fp(&format!("dest-{i}"), far.clone(), shared.clone()));
        }

        let graph = SimilarityGraph::build(&fingerprints, 0.6, 20, 0, ScoreWeights::default());

        let one = ChainFinder::find_chains(&graph, 2, 500, 1, 100, None);
        let starting_at_seed: Vec<_> = one
            .iter()
            .filter(|c| c.clips.first().map(|p| p.to_str()) == Some(Some("seed")))
            .collect();
        assert_eq!(starting_at_seed.len(), 1);

        let three = ChainFinder::find_chains(&graph, 2, 500, 3, 100, None);
        let starting_at_seed: Vec<_> = three
            .iter()
            .filter(|c| c.clips.first().map(|p| p.to_str()) == Some(Some("seed")))
            .collect();
        assert_eq!(starting_at_seed.len(), 3);
    }

    #[test]
    fn ranking_is_quality_then_length_descending() {
        let chains = vec![
            Chain::new(vec!["a".into(), "b".into()], vec![ScorePair {
                frame: 0.9,
                semantic: 0.0,
                color: 0.9,
                motion: 0.9,
                final_score: 0.8,
            }]),
            Chain::new(
                vec!["c".into(), "d".into(), "e".into()],
                vec![
                    ScorePair {
                        frame: 0.9,
                        semantic: 0.0,
                        color: 0.9,
                        motion: 0.9,
                        final_score: 0.8,
                    },
                    ScorePair {
                        frame: 0.9,
                        semantic: 0.0,
                        color: 0.9,
                        motion: 0.9,
                        final_score: 0.8,
                    },
                ],
            ),
        ];
        let mut heap = BinaryHeap::new();
        for chain in chains {
            push_bounded(&mut heap, chain, 10);
        }
        let sorted = sorted_output(heap);
        assert_eq!(sorted[0].len(), 3);
    }
}
