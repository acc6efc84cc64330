//! Graph algorithms for control-flow analysis.
//!
//! - [`dfs`] / [`postorder`] / [`reverse_postorder`] - traversals
//! - [`compute_dominators`] - iterative dominator sets and immediate dominators
//! - [`compute_dominance_frontiers`] - Cytron et al. frontiers for phi placement
//!
//! # Examples
//!
//! ```rust,ignore
//! use bytecircuit::utils::graph::algorithms;
//!
//! let tree = algorithms::compute_dominators(&graph);
//! let frontiers = algorithms::compute_dominance_frontiers(&graph, &tree);
//! ```

mod dominators;
mod traversal;

pub use dominators::{compute_dominance_frontiers, compute_dominators, DominatorTree};
pub use traversal::{dfs, postorder, reverse_postorder, DfsIterator};
