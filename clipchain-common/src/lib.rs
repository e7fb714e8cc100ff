#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

//! Shared image utilities used by `clipchain-core`. Kept separate from the
//! core crate so it can be reused by any future collaborator that needs the
//! same frame-resizing primitives without pulling in the scoring/graph/chain
//! machinery.

mod resize;

pub use resize::{resize_to_gray_square, resize_to_rgb_square};
