mod score;
mod similarity_graph;

pub use crate::definitions::SCHEMA_VERSION;
pub use score::{score_pair, ScorePair};
pub use similarity_graph::{GraphEdge, GraphHeader, SimilarityGraph};
