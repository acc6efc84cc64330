//! Dense node identifiers.

use std::fmt;

/// Identifier of a node in a graph, a plain index into the owning arena.
///
/// Blocks of a method are numbered `0..n` in pc order; block 0 is the entry.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// The raw index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl From<NodeId> for usize {
    #[inline]
    fn from(node: NodeId) -> Self {
        node.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_roundtrip() {
        let node: NodeId = 7usize.into();
        assert_eq!(node.index(), 7);
        assert_eq!(usize::from(node), 7);
        assert!(NodeId::new(1) < NodeId::new(2));
    }

    #[test]
    fn test_node_id_format() {
        assert_eq!(format!("{:?}", NodeId::new(42)), "NodeId(42)");
        assert_eq!(NodeId::new(42).to_string(), "B42");
    }
}
