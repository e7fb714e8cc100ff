mod chain_assembler;
mod frame_interpolator;

pub use chain_assembler::{AssembleOptions, ChainAssembler};
pub use frame_interpolator::{FrameInterpolator, LearnedInterpolator, LinearBlendInterpolator};
