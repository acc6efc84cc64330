//! Graph abstractions used by the control-flow analyses.
//!
//! The block graph implements [`GraphBase`], [`Successors`], [`Predecessors`]
//! and [`RootedGraph`]; the algorithms in
//! [`algorithms`] only see node ids and adjacency iterators, so they can be
//! tested against small hand-written graphs.

pub mod algorithms;
mod node;
mod traits;

pub use node::NodeId;
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};
