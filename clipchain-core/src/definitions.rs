/// Size of the average-hash sampling grid used when no other size is
/// requested. A 16x16 grid yields a 256-bit hash.
pub const DEFAULT_HASH_GRID_SIZE: u32 = 16;

/// Upper bound on the hash grid size. `PerceptualHash` storage is sized for
/// this at compile time; `hash_size` in configuration must not exceed it.
pub const MAX_HASH_GRID_SIZE: u32 = 16;

pub const HASH_BITS: usize = (MAX_HASH_GRID_SIZE * MAX_HASH_GRID_SIZE) as usize;
pub const HASH_WORDS: usize = HASH_BITS.div_ceil(usize::BITS as usize);

/// Color histogram bins per channel.
pub const DEFAULT_HIST_BINS: usize = 32;

pub const DEFAULT_MIN_SCORE: f64 = 0.6;
pub const DEFAULT_MAX_FANOUT: usize = 20;
pub const DEFAULT_BUCKET_BITS: u32 = 8;

pub const DEFAULT_MIN_LENGTH: usize = 2;
pub const DEFAULT_MAX_STARTS: usize = 500;
pub const DEFAULT_BRANCH_CAP: usize = 5;
pub const DEFAULT_TOP_K: usize = 100;

pub const DEFAULT_TRANSITION_FRAMES: u32 = 4;
pub const DEFAULT_OUTPUT_FPS: u32 = 30;

pub const FRAME_WEIGHT: f64 = 0.40;
pub const SEMANTIC_WEIGHT: f64 = 0.30;
pub const COLOR_WEIGHT: f64 = 0.15;
pub const MOTION_WEIGHT: f64 = 0.15;

pub const CHI_SQUARE_EPSILON: f64 = 1e-10;

pub const SCHEMA_VERSION: u32 = 1;
