use std::path::Path;

use clipchain_core::SimilarityGraph;
use log::{info, warn};

use crate::errors::{CacheError, CacheResult};

/// Loads a persisted `SimilarityGraph` from `path` and checks its header
/// against `expected_header`. A missing file or a mismatched header both
/// signal the caller to rebuild the graph; only a mismatch is reported back
/// as an error rather than treated as equivalent to "absent".
pub fn load_graph(path: &Path, expected_header: &clipchain_core::graph::GraphHeader) -> CacheResult<Option<SimilarityGraph>> {
    if !path.exists() {
        info!("no similarity graph found at {}; will rebuild", path.display());
        return Ok(None);
    }

    let file = std::fs::File::open(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);

    let graph: SimilarityGraph = serde_json::from_reader(reader).map_err(|e| CacheError::CacheCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if graph.header() != expected_header {
        warn!(
            "similarity graph at {} has a stale header; discarding",
            path.display()
        );
        return Err(CacheError::GraphHeaderMismatch {
            path: path.to_path_buf(),
        });
    }

    info!("loaded similarity graph at {}", path.display());
    Ok(Some(graph))
}

/// Writes `graph` to a temp file alongside `path`, `sync_all`s it, then
/// renames it into place.
pub fn save_graph(path: &Path, graph: &SimilarityGraph) -> CacheResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    let temp_path = path.with_extension("json.tmp");

    {
        let file = std::fs::File::create(&temp_path).map_err(|source| CacheError::Io {
            path: temp_path.clone(),
            source,
        })?;
        let writer = std::io::BufWriter::new(&file);
        serde_json::to_writer_pretty(writer, graph).map_err(|e| CacheError::CacheCorrupt {
            path: temp_path.clone(),
            reason: e.to_string(),
        })?;
        file.sync_all().map_err(|source| CacheError::Io {
            path: temp_path.clone(),
            source,
        })?;
    }

    std::fs::rename(&temp_path, path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("saved similarity graph at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use clipchain_core::{ClipFingerprint, ColorHistogram, PerceptualHash, ScoreWeights};

    fn fp(id: &str) -> ClipFingerprint {
        ClipFingerprint {
            clip_id: id.into(),
            duration_secs: 10.0,
            file_size_bytes: 0,
            first_hash: PerceptualHash::empty_hash(),
            middle_hash: None,
            last_hash: PerceptualHash::empty_hash(),
            first_hist: ColorHistogram::uniform(32),
            last_hist: ColorHistogram::uniform(32),
            first_embedding: None,
            last_embedding: None,
            motion_score: 0.0,
            scene_cuts: Vec::new(),
        }
    }

    #[test]
    fn missing_graph_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let expected = clipchain_core::graph::GraphHeader {
            min_score: 0.5,
            num_videos: 0,
            weights: ScoreWeights::default(),
            bucket_bits: 8,
            schema_version: 1,
        };
        let result = load_graph(&dir.path().join("similarity_graph.json"), &expected).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn round_trips_and_detects_header_drift() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity_graph.json");
        let fingerprints = vec![fp("a"), fp("b")];
        let graph = SimilarityGraph::build(&fingerprints, 0.0, 20, 0, ScoreWeights::default());

        save_graph(&path, &graph).unwrap();

        let matching_header = graph.header().clone();
        let reloaded = load_graph(&path, &matching_header).unwrap();
        assert!(reloaded.is_some());

        let mut drifted_header = graph.header().clone();
        drifted_header.min_score += 0.2;
        let err = load_graph(&path, &drifted_header).unwrap_err();
        assert!(matches!(err, CacheError::GraphHeaderMismatch { .. }));
    }
}
