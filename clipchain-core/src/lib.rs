#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

//! Fingerprinting, similarity-graph construction, bounded chain discovery and
//! chain assembly for stitching short video clips end-to-end.
//!
//! ```ignore
//! use clipchain_core::{ClipChainConfig, Fingerprinter};
//!
//! let config = ClipChainConfig::new("/media/clips");
//! config.validate()?;
//! let fingerprinter = Fingerprinter::new(config.hash_size, config.hist_bins);
//! # Ok::<(), clipchain_core::CoreError>(())
//! ```
//!
//! How it works: each clip is reduced to a handful of perceptual hashes,
//! color histograms, a motion score and optionally a semantic embedding.
//! Ordered pairs of clips are scored on how well the end of one resembles the
//! start of the other, pruned into a sparse directed graph, and that graph is
//! searched for long, high-quality chains. A chain can then be rendered out
//! either by raw concatenation or with synthesized transition frames.
//!
//! Requires the `ffmpeg`/`ffprobe` binaries on `PATH`; see
//! `clipchain-ffmpeg` for the subprocess contract.

pub mod assembly;
pub mod cancellation;
pub mod chain;
mod config;
mod definitions;
mod errors;
pub mod fingerprint;
pub mod graph;

use std::path::PathBuf;

pub use assembly::{
    AssembleOptions, ChainAssembler, FrameInterpolator, LearnedInterpolator, LinearBlendInterpolator,
};
pub use cancellation::Cancellation;
pub use chain::{Chain, ChainFinder};
pub use config::{ClipChainConfig, ScoreWeights};
pub use errors::{CoreError, CoreResult};
pub use fingerprint::{ClipFingerprint, ColorHistogram, Embedding, EmbeddingEncoder, Fingerprinter, PerceptualHash};
pub use graph::{GraphEdge, ScorePair, SimilarityGraph};

/// Identity of a clip: its path relative to a configured media root. Stable
/// across runs as long as the clip is not moved.
pub type ClipId = PathBuf;
