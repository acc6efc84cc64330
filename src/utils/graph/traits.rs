//! Adjacency traits the graph algorithms are written against.

use crate::utils::graph::NodeId;

/// Node count and node enumeration.
pub trait GraphBase {
    /// Number of nodes; valid ids are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// All node ids in ascending order.
    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_count()).map(NodeId::new)
    }
}

/// Outgoing edges.
pub trait Successors: GraphBase {
    /// Nodes reachable over one outgoing edge of `node`.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Incoming edges.
pub trait Predecessors: GraphBase {
    /// Nodes with an edge into `node`.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// A graph with a designated entry node.
pub trait RootedGraph: Successors + Predecessors {
    /// The entry node.
    fn entry(&self) -> NodeId;
}
