use std::path::{Path, PathBuf};
use std::sync::Arc;

use clipchain_cache::FingerprintStore;
use clipchain_core::{
    AssembleOptions, ChainAssembler, ChainFinder, ClipFingerprint, Fingerprinter,
    LearnedInterpolator, LinearBlendInterpolator, ScoreWeights, SimilarityGraph,
};
use log::{error, info, warn};
use rayon::prelude::*;

use crate::app::arg_parse::{self, ParsedCommand};
use crate::app::cfg::{AssembleCfg, ChainsCfg, FingerprintCfg, GlobalCfg, GraphCfg, OutputFormat, ReportVerbosity};
use crate::app::errors::{AppError, AppResult};
use crate::app::progress::ProgressReporter;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm", "m4v"];

pub fn run_app() -> i32 {
    let (global, command) = arg_parse::parse_args();
    configure_logs(global.verbosity);

    match run_app_inner(&global, command) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(&fatal_error);
            1
        }
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    TermLogger::init(
        min_loglevel,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("TermLogger failed to initialize");
}

fn print_fatal_err(err: &eyre::Report) {
    error!("{err}");
    for cause in err.chain().skip(1) {
        error!("    caused by: {cause}");
    }
}

fn run_app_inner(global: &GlobalCfg, command: ParsedCommand) -> eyre::Result<()> {
    build_thread_pool(global.worker_count)?;

    match command {
        ParsedCommand::Fingerprint(cfg) => fingerprint_cmd(&cfg)?,
        ParsedCommand::Graph(cfg) => graph_cmd(&cfg)?,
        ParsedCommand::Chains(cfg) => chains_cmd(&cfg)?,
        ParsedCommand::Assemble(cfg) => assemble_cmd(&cfg)?,
    }

    Ok(())
}

fn build_thread_pool(worker_count: usize) -> eyre::Result<()> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if worker_count > 0 {
        builder = builder.num_threads(worker_count);
    }
    builder
        .build_global()
        .map_err(|e| eyre::Report::msg(e.to_string()))
}

fn discover_clips(media_root: &Path) -> AppResult<Vec<PathBuf>> {
    let mut clips = Vec::new();
    for entry in walkdir::WalkDir::new(media_root)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_video = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !is_video {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(media_root)
            .map_err(|e| AppError::Other(e.to_string()))?;
        clips.push(relative.to_path_buf());
    }
    clips.sort();
    Ok(clips)
}

fn fingerprint_cmd(cfg: &FingerprintCfg) -> AppResult<()> {
    cfg.to_clip_chain_config().validate()?;

    let clips = discover_clips(&cfg.media_root)?;
    info!("found {} candidate clips under {}", clips.len(), cfg.media_root.display());

    let store = FingerprintStore::load(&cfg.cache_path)?;

    if cfg.reload_all {
        info!("reload-all requested; re-fingerprinting every clip");
    }

    let pending: Vec<PathBuf> = clips
        .iter()
        .filter(|c| cfg.reload_all || !store.contains(c))
        .cloned()
        .collect();

    if pending.is_empty() {
        info!("every clip already fingerprinted; nothing to do");
        store.save_atomic()?;
        return Ok(());
    }

    let fingerprinter = Fingerprinter::new(cfg.hash_size, cfg.hist_bins);
    let progress = ProgressReporter::new("fingerprinting", pending.len());

    let results: Vec<(PathBuf, Option<ClipFingerprint>)> = pending
        .par_iter()
        .map(|clip_id| {
            let result = fingerprinter.fingerprint(&cfg.media_root, clip_id);
            progress.tick();
            match result {
                Ok(fp) => (clip_id.clone(), Some(fp)),
                Err(e) => {
                    warn!("skipping {}: {e}", clip_id.display());
                    (clip_id.clone(), None)
                }
            }
        })
        .collect();

    for (clip_id, fingerprint) in results {
        if let Some(fingerprint) = fingerprint {
            store.put(clip_id, fingerprint);
        }
    }

    store.save_atomic()?;
    info!("fingerprint cache now holds {} clips", store.len());

    Ok(())
}

fn graph_cmd(cfg: &GraphCfg) -> AppResult<()> {
    cfg.to_clip_chain_config().validate()?;

    let store = FingerprintStore::load(&cfg.cache_path)?;
    let fingerprints = store.all();

    if fingerprints.is_empty() {
        return Err(AppError::Other(format!(
            "no fingerprints found at {}; run `clipchain fingerprint` first",
            cfg.cache_path.display()
        )));
    }

    let weights = ScoreWeights::default();
    let expected_header = clipchain_core::graph::GraphHeader {
        min_score: cfg.min_score,
        num_videos: fingerprints.len(),
        weights,
        bucket_bits: cfg.bucket_bits,
        schema_version: clipchain_core::graph::SCHEMA_VERSION,
    };

    match clipchain_cache::load_graph(&cfg.graph_path, &expected_header) {
        Ok(Some(_)) => {
            info!("existing similarity graph at {} is already up to date", cfg.graph_path.display());
            return Ok(());
        }
        Ok(None) => {}
        Err(clipchain_cache::CacheError::GraphHeaderMismatch { .. }) => {
            info!("similarity graph parameters changed; rebuilding");
        }
        Err(e) => return Err(e.into()),
    }

    info!("building similarity graph over {} clips", fingerprints.len());
    let started_at = std::time::Instant::now();
    let graph = SimilarityGraph::build(&fingerprints, cfg.min_score, cfg.max_fanout, cfg.bucket_bits, weights);
    info!(
        "graph build: {}/{} clips processed in {:.1}s",
        fingerprints.len(),
        fingerprints.len(),
        started_at.elapsed().as_secs_f64()
    );

    clipchain_cache::save_graph(&cfg.graph_path, &graph)?;
    info!("similarity graph saved to {}", cfg.graph_path.display());

    Ok(())
}

fn chains_cmd(cfg: &ChainsCfg) -> AppResult<()> {
    cfg.to_clip_chain_config().validate()?;

    let file = std::fs::File::open(&cfg.graph_path)
        .map_err(|e| AppError::Other(format!("cannot open {}: {e}", cfg.graph_path.display())))?;
    let graph: SimilarityGraph = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::Other(format!("cannot parse {}: {e}", cfg.graph_path.display())))?;

    let start_hashes = if cfg.diverse {
        let store = FingerprintStore::load(&cfg.cache_path)?;
        let map = store
            .all()
            .into_iter()
            .map(|fp| (fp.clip_id, fp.first_hash))
            .collect::<std::collections::HashMap<_, _>>();
        Some(map)
    } else {
        None
    };

    info!(
        "searching for chains from up to {} starting points",
        cfg.max_starts
    );

    let chains = ChainFinder::find_chains(
        &graph,
        cfg.min_length,
        cfg.max_starts,
        cfg.branch_cap,
        cfg.top_k,
        start_hashes.as_ref(),
    );

    info!("found {} chains", chains.len());
    print_chains(&chains, cfg.format);

    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_chains(chains: &[clipchain_core::Chain], format: OutputFormat) {
    match format {
        OutputFormat::Normal => {
            for chain in chains {
                let path_str = chain
                    .clips
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                println!("[{:.3}] {}", chain.avg_quality, path_str);
            }
        }
        OutputFormat::Json => {
            let stdout = std::io::BufWriter::new(std::io::stdout());
            let _ = serde_json::to_writer_pretty(stdout, chains);
            println!();
        }
    }
}

fn assemble_cmd(cfg: &AssembleCfg) -> AppResult<()> {
    cfg.to_clip_chain_config().validate()?;

    if cfg.chain.len() < 2 {
        return Err(AppError::Other("--chain needs at least two clips".to_string()));
    }

    let interpolator: Arc<dyn clipchain_core::FrameInterpolator> = match &cfg.interpolator_weights {
        Some(path) => Arc::new(LearnedInterpolator::new(path.clone())),
        None => Arc::new(LinearBlendInterpolator),
    };

    let assembler = ChainAssembler::new(interpolator);
    let options = AssembleOptions {
        use_transitions: cfg.use_transitions,
        transition_frames: cfg.transition_frames,
        output_fps: cfg.output_fps,
    };

    let out = assembler.assemble(&cfg.media_root, &cfg.chain, &cfg.out, options)?;
    info!("assembled chain written to {}", out.display());

    Ok(())
}
