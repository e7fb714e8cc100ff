mod chain_finder;

pub use chain_finder::{Chain, ChainFinder};
