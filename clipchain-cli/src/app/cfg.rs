use std::path::PathBuf;

use clipchain_core::ClipChainConfig;

/// Controls the minimum `log` level wired up by `configure_logs`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Normal,
    Json,
}

/// Parsed global flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalCfg {
    pub verbosity: ReportVerbosity,
    /// Number of rayon worker threads; `0` means "use all cores".
    pub worker_count: usize,
}

#[derive(Debug, Clone)]
pub struct FingerprintCfg {
    pub media_root: PathBuf,
    pub cache_path: PathBuf,
    pub hash_size: u32,
    pub hist_bins: usize,
    pub reload_all: bool,
}

impl FingerprintCfg {
    /// Reconstructs a `ClipChainConfig` covering the fields this subcommand
    /// touches, for `validate()` to check before any fingerprinting begins.
    pub fn to_clip_chain_config(&self) -> ClipChainConfig {
        let mut config = ClipChainConfig::new(&self.media_root);
        config.cache_path = self.cache_path.clone();
        config.hash_size = self.hash_size;
        config.hist_bins = self.hist_bins;
        config
    }
}

#[derive(Debug, Clone)]
pub struct GraphCfg {
    pub media_root: PathBuf,
    pub cache_path: PathBuf,
    pub graph_path: PathBuf,
    pub min_score: f64,
    pub max_fanout: usize,
    pub bucket_bits: u32,
}

impl GraphCfg {
    pub fn to_clip_chain_config(&self) -> ClipChainConfig {
        let mut config = ClipChainConfig::new(&self.media_root);
        config.cache_path = self.cache_path.clone();
        config.graph_path = self.graph_path.clone();
        config.min_score = self.min_score;
        config.max_fanout = self.max_fanout;
        config.bucket_bits = self.bucket_bits;
        config
    }
}

#[derive(Debug, Clone)]
pub struct ChainsCfg {
    pub graph_path: PathBuf,
    pub cache_path: PathBuf,
    pub min_length: usize,
    pub max_starts: usize,
    pub branch_cap: usize,
    pub top_k: usize,
    pub diverse: bool,
    pub format: OutputFormat,
}

impl ChainsCfg {
    /// This subcommand has no `--media-root`, so the base config is rooted
    /// at `.` purely to supply defaults for the fields it doesn't override.
    pub fn to_clip_chain_config(&self) -> ClipChainConfig {
        let mut config = ClipChainConfig::new(".");
        config.graph_path = self.graph_path.clone();
        config.cache_path = self.cache_path.clone();
        config.min_length = self.min_length;
        config.max_starts = self.max_starts;
        config.branch_cap = self.branch_cap;
        config.top_k = self.top_k;
        config
    }
}

#[derive(Debug, Clone)]
pub struct AssembleCfg {
    pub media_root: PathBuf,
    pub chain: Vec<PathBuf>,
    pub out: PathBuf,
    pub use_transitions: bool,
    pub transition_frames: u32,
    pub output_fps: u32,
    pub interpolator_weights: Option<PathBuf>,
}

impl AssembleCfg {
    pub fn to_clip_chain_config(&self) -> ClipChainConfig {
        let mut config = ClipChainConfig::new(&self.media_root);
        config.transition_frames = self.transition_frames;
        config.output_fps = self.output_fps;
        config
    }
}
