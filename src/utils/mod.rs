//! Shared helpers: dense bit sets, Graphviz escaping and graph algorithms.

mod bitset;
mod dot;
pub mod graph;

pub use bitset::{BitSet, BitSetIter};
pub use dot::escape_dot;
