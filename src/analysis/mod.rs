//! Block-level analyses that run before circuit construction.
//!
//! - [`cfg`] - boundary discovery, the block graph, pruning and dominance
//! - [`ssa`] - phi placement at iterated dominance frontiers

pub mod cfg;
pub mod ssa;

pub use cfg::{BlockLayout, BlockSplitter, BytecodeGraph, BytecodeRegion, EdgeKind, PredEdge};
pub use ssa::insert_phis;
