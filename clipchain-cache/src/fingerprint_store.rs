use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clipchain_core::{ClipFingerprint, ClipId};
use log::info;
use parking_lot::{Mutex, RwLock};

use crate::errors::{CacheError, CacheResult};

/// Content-keyed, on-disk cache of `ClipFingerprint` records, keyed by clip
/// path relative to the configured media root.
///
/// Fingerprints are write-once per clip: `put` is a no-op when a record
/// already exists, so concurrent fingerprinting workers that race on the
/// same clip never clobber each other's work. All writes (`put`,
/// `save_atomic`) serialize through a single writer lock; reads (`get`) do
/// not contend with each other.
pub struct FingerprintStore {
    cache_path: PathBuf,
    records: RwLock<HashMap<ClipId, ClipFingerprint>>,
    writer_lock: Mutex<()>,
}

impl FingerprintStore {
    /// Loads the store from `cache_path` if it exists; an absent file is not
    /// an error and yields an empty store.
    pub fn load(cache_path: impl Into<PathBuf>) -> CacheResult<Self> {
        let cache_path = cache_path.into();

        if !cache_path.exists() {
            info!("no fingerprint cache found at {}; starting empty", cache_path.display());
            return Ok(Self {
                cache_path,
                records: RwLock::new(HashMap::new()),
                writer_lock: Mutex::new(()),
            });
        }

        let file = std::fs::File::open(&cache_path).map_err(|source| CacheError::Io {
            path: cache_path.clone(),
            source,
        })?;
        let reader = std::io::BufReader::new(file);

        let records: HashMap<ClipId, ClipFingerprint> =
            serde_json::from_reader(reader).map_err(|e| CacheError::CacheCorrupt {
                path: cache_path.clone(),
                reason: e.to_string(),
            })?;

        info!(
            "loaded fingerprint cache at {} ({} records)",
            cache_path.display(),
            records.len()
        );

        Ok(Self {
            cache_path,
            records: RwLock::new(records),
            writer_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn get(&self, clip_id: &ClipId) -> Option<ClipFingerprint> {
        self.records.read().get(clip_id).cloned()
    }

    #[must_use]
    pub fn contains(&self, clip_id: &ClipId) -> bool {
        self.records.read().contains_key(clip_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    #[must_use]
    pub fn all(&self) -> Vec<ClipFingerprint> {
        self.records.read().values().cloned().collect()
    }

    /// Inserts `fingerprint` under `clip_id` if no record already exists for
    /// it. Returns whether the insert happened (`false` means a prior writer
    /// already has this clip recorded, per write-once-per-clip semantics).
    pub fn put(&self, clip_id: ClipId, fingerprint: ClipFingerprint) -> bool {
        let _guard = self.writer_lock.lock();
        let mut records = self.records.write();
        if records.contains_key(&clip_id) {
            return false;
        }
        records.insert(clip_id, fingerprint);
        true
    }

    /// Writes the store to a temp file in the same directory, `sync_all`s
    /// it, then renames it over `cache_path`.
    pub fn save_atomic(&self) -> CacheResult<()> {
        let _guard = self.writer_lock.lock();
        self.save_inner()
    }

    fn save_inner(&self) -> CacheResult<()> {
        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                    path: self.cache_path.clone(),
                    source,
                })?;
            }
        }

        let temp_path = self.cache_path.with_extension("json.tmp");

        {
            let file = std::fs::File::create(&temp_path).map_err(|source| CacheError::Io {
                path: temp_path.clone(),
                source,
            })?;
            let writer = std::io::BufWriter::new(&file);
            let records = self.records.read();
            serde_json::to_writer_pretty(writer, &*records).map_err(|e| {
                CacheError::CacheCorrupt {
                    path: temp_path.clone(),
                    reason: e.to_string(),
                }
            })?;
            file.sync_all().map_err(|source| CacheError::Io {
                path: temp_path.clone(),
                source,
            })?;
        }

        std::fs::rename(&temp_path, &self.cache_path).map_err(|source| CacheError::Io {
            path: self.cache_path.clone(),
            source,
        })?;

        info!(
            "saved fingerprint cache at {} ({} records)",
            self.cache_path.display(),
            self.records.read().len()
        );

        Ok(())
    }

    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clipchain_core::{ColorHistogram, PerceptualHash};

    fn sample(id: &str) -> ClipFingerprint {
        ClipFingerprint {
            clip_id: id.into(),
            duration_secs: 10.0,
            file_size_bytes: 100,
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
    fn put_is_write_once_per_clip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::load(dir.path().join("fingerprints.json")).unwrap();

        let first_write = store.put("a.mp4".into(), sample("a.mp4"));
        assert!(first_write);

        let mut second = sample("a.mp4");
        second.duration_secs = 999.0;
        let second_write = store.put("a.mp4".into(), second);
        assert!(!second_write);
        assert_eq!(store.get(&"a.mp4".into()).unwrap().duration_secs, 10.0);
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.json");

        let store = FingerprintStore::load(&path).unwrap();
        store.put("a.mp4".into(), sample("a.mp4"));
        store.save_atomic().unwrap();

        let reloaded = FingerprintStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains(&"a.mp4".into()));
    }

    #[test]
    fn missing_cache_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::load(dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn running_fingerprinting_twice_adds_no_duplicate_work() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::load(dir.path().join("fingerprints.json")).unwrap();
        store.put("a.mp4".into(), sample("a.mp4"));
        store.put("a.mp4".into(), sample("a.mp4"));
        assert_eq!(store.len(), 1);
    }
}
