use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clipchain_core::ClipChainConfig;

use crate::app::cfg::{
    AssembleCfg, ChainsCfg, FingerprintCfg, GlobalCfg, GraphCfg, OutputFormat, ReportVerbosity,
};

#[derive(Parser, Debug)]
#[command(name = "clipchain", version, about = "Chain short video clips into longer sequences")]
struct Cli {
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[arg(long, global = true)]
    verbose: bool,

    /// Number of worker threads; 0 uses all available cores.
    #[arg(long, global = true, default_value_t = 0)]
    worker_count: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fingerprint every clip under a media root, updating the fingerprint cache.
    Fingerprint {
        #[arg(long)]
        media_root: PathBuf,
        #[arg(long)]
        cache_path: Option<PathBuf>,
        #[arg(long)]
        hash_size: Option<u32>,
        #[arg(long)]
        hist_bins: Option<usize>,
        /// Re-fingerprint every clip, ignoring any existing cache entries.
        #[arg(long)]
        reload_all: bool,
    },
    /// Build or rebuild the similarity graph from a fingerprint cache.
    Graph {
        #[arg(long)]
        media_root: PathBuf,
        #[arg(long)]
        cache_path: Option<PathBuf>,
        #[arg(long)]
        graph_path: Option<PathBuf>,
        #[arg(long)]
        min_score: Option<f64>,
        #[arg(long)]
        max_fanout: Option<usize>,
        #[arg(long)]
        bucket_bits: Option<u32>,
    },
    /// Discover and print ranked chains over a similarity graph.
    Chains {
        #[arg(long)]
        graph_path: PathBuf,
        #[arg(long)]
        cache_path: Option<PathBuf>,
        #[arg(long)]
        min_length: Option<usize>,
        #[arg(long)]
        max_starts: Option<usize>,
        #[arg(long)]
        branch_cap: Option<usize>,
        #[arg(long)]
        top_k: Option<usize>,
        /// Group chains by starting clip and keep only the longest per group.
        #[arg(long)]
        diverse: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Normal)]
        format: OutputFormat,
    },
    /// Render an ordered chain of clips into a single output file.
    Assemble {
        #[arg(long)]
        media_root: PathBuf,
        /// Comma-separated clip paths, relative to `media_root`, in chain order.
        #[arg(long, value_delimiter = ',')]
        chain: Vec<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        use_transitions: bool,
        #[arg(long)]
        transition_frames: Option<u32>,
        #[arg(long)]
        output_fps: Option<u32>,
        /// Optional weights file for a learned frame interpolator; falls
        /// back to linear blending when absent or unusable.
        #[arg(long)]
        interpolator_weights: Option<PathBuf>,
    },
}

pub enum ParsedCommand {
    Fingerprint(FingerprintCfg),
    Graph(GraphCfg),
    Chains(ChainsCfg),
    Assemble(AssembleCfg),
}

pub fn parse_args() -> (GlobalCfg, ParsedCommand) {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        ReportVerbosity::Quiet
    } else if cli.verbose {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let global = GlobalCfg {
        verbosity,
        worker_count: cli.worker_count,
    };

    let command = match cli.command {
        Command::Fingerprint {
            media_root,
            cache_path,
            hash_size,
            hist_bins,
            reload_all,
        } => {
            let defaults = ClipChainConfig::new(&media_root);
            ParsedCommand::Fingerprint(FingerprintCfg {
                cache_path: cache_path.unwrap_or(defaults.cache_path),
                hash_size: hash_size.unwrap_or(defaults.hash_size),
                hist_bins: hist_bins.unwrap_or(defaults.hist_bins),
                media_root,
                reload_all,
            })
        }
        Command::Graph {
            media_root,
            cache_path,
            graph_path,
            min_score,
            max_fanout,
            bucket_bits,
        } => {
            let defaults = ClipChainConfig::new(&media_root);
            ParsedCommand::Graph(GraphCfg {
                cache_path: cache_path.unwrap_or(defaults.cache_path),
                graph_path: graph_path.unwrap_or(defaults.graph_path),
                min_score: min_score.unwrap_or(defaults.min_score),
                max_fanout: max_fanout.unwrap_or(defaults.max_fanout),
                bucket_bits: bucket_bits.unwrap_or(defaults.bucket_bits),
                media_root,
            })
        }
        Command::Chains {
            graph_path,
            cache_path,
            min_length,
            max_starts,
            branch_cap,
            top_k,
            diverse,
            format,
        } => {
            let defaults = ClipChainConfig::new(".");
            ParsedCommand::Chains(ChainsCfg {
                cache_path: cache_path.unwrap_or_else(|| graph_path.with_file_name("fingerprints.json")),
                min_length: min_length.unwrap_or(defaults.min_length),
                max_starts: max_starts.unwrap_or(defaults.max_starts),
                branch_cap: branch_cap.unwrap_or(defaults.branch_cap),
                top_k: top_k.unwrap_or(defaults.top_k),
                graph_path,
                diverse,
                format,
            })
        }
        Command::Assemble {
            media_root,
            chain,
            out,
            use_transitions,
            transition_frames,
            output_fps,
            interpolator_weights,
        } => {
            let defaults = ClipChainConfig::new(&media_root);
            ParsedCommand::Assemble(AssembleCfg {
                transition_frames: transition_frames.unwrap_or(defaults.transition_frames),
                output_fps: output_fps.unwrap_or(defaults.output_fps),
                media_root,
                chain,
                out,
                use_transitions,
                interpolator_weights,
            })
        }
    };

    (global, command)
}
