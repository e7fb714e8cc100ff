#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

//! Atomic, content-keyed on-disk caches backing the fingerprinting and
//! graph-building stages: a `fingerprints.json` keyed by clip path, and a
//! `similarity_graph.json` whose header is validated against the parameters
//! a run was invoked with before it is trusted.
//!
//! Both caches write through a temp-file-then-rename sequence with an
//! explicit `sync_all` before the rename, so a crash mid-write never leaves
//! a torn file in the cache's place.

mod errors;
mod fingerprint_store;
mod graph_cache;

pub use errors::{CacheError, CacheResult};
pub use fingerprint_store::FingerprintStore;
pub use graph_cache::{load_graph, save_graph};
