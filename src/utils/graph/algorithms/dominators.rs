//! Dominator sets, immediate dominators and dominance frontiers.
//!
//! A node `d` **dominates** `n` if every path from the entry to `n` passes
//! through `d`. Dominator sets are computed with the classic iterative data-flow
//! formulation:
//!
//! ```text
//! dom(entry) = {entry}
//! dom(n)     = {n} ∪ ⋂ dom(p)   for every reachable predecessor p of n
//! ```
//!
//! iterated until no set changes. Unlike a single pass over a loop nest, the
//! fixpoint is exact on irreducible graphs too.
//!
//! The **immediate dominator** of `n` is the member of `dom(n) \ {n}` with the
//! latest depth-first timestamp: dominators of `n` form a chain and each one is
//! necessarily visited before the ones it dominates.
//!
//! Nodes not reachable from the entry get no timestamp, an empty dominator set
//! and no immediate dominator. They never appear in any frontier.

use std::collections::BTreeSet;

use crate::utils::{
    graph::{
        algorithms::traversal::{dfs, reverse_postorder},
        NodeId, RootedGraph,
    },
    BitSet,
};

/// Result of [`compute_dominators`].
#[derive(Debug, Clone)]
pub struct DominatorTree {
    entry: NodeId,
    idom: Vec<Option<NodeId>>,
    timestamps: Vec<Option<usize>>,
    sets: Vec<BitSet>,
}

impl DominatorTree {
    /// The entry node.
    #[inline]
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Number of nodes the tree was computed over, reachable or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.idom.len()
    }

    /// Returns `true` if `node` is reachable from the entry.
    #[must_use]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.timestamp(node).is_some()
    }

    /// Depth-first pre-order timestamp of `node`; the entry is 0.
    #[must_use]
    pub fn timestamp(&self, node: NodeId) -> Option<usize> {
        self.timestamps.get(node.index()).copied().flatten()
    }

    /// Immediate dominator of `node`. `None` for the entry and unreachable nodes.
    #[inline]
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.idom.get(node.index()).copied().flatten()
    }

    /// Returns `true` if `a` dominates `b`. Every reachable node dominates itself.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        self.sets
            .get(b.index())
            .is_some_and(|set| set.contains(a.index()))
    }

    /// Returns `true` if `a` dominates `b` and `a != b`.
    #[inline]
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// The full dominator set of `node`, in ascending id order.
    pub fn dominators(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.sets
            .get(node.index())
            .into_iter()
            .flat_map(BitSet::iter)
            .map(NodeId::new)
    }

    /// Nodes whose immediate dominator is `node`, in ascending id order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.idom
            .iter()
            .enumerate()
            .filter(|(_, idom)| **idom == Some(node))
            .map(|(index, _)| NodeId::new(index))
            .collect()
    }
}

/// Computes dominators of every node reachable from `graph.entry()`.
///
/// Predecessors that are not reachable are ignored, so unreachable code
/// never weakens the dominance relation of live code.
pub fn compute_dominators<G: RootedGraph>(graph: &G) -> DominatorTree {
    let node_count = graph.node_count();
    let entry = graph.entry();

    let mut timestamps = vec![None; node_count];
    let mut reachable = BitSet::new(node_count);
    for (stamp, node) in dfs(graph, entry).enumerate() {
        timestamps[node.index()] = Some(stamp);
        reachable.insert(node.index());
    }

    if reachable.is_empty() {
        return DominatorTree {
            entry,
            idom: vec![None; node_count],
            timestamps,
            sets: vec![BitSet::new(node_count); node_count],
        };
    }

    let mut sets: Vec<BitSet> = (0..node_count)
        .map(|index| {
            if index == entry.index() {
                BitSet::singleton(node_count, index)
            } else if reachable.contains(index) {
                reachable.clone()
            } else {
                BitSet::new(node_count)
            }
        })
        .collect();

    let order = reverse_postorder(graph, entry);
    let mut changed = true;
    while changed {
        changed = false;
        for &node in &order {
            if node == entry {
                continue;
            }

            let mut next = reachable.clone();
            for pred in graph.predecessors(node) {
                if reachable.contains(pred.index()) {
                    next.intersect_with(&sets[pred.index()]);
                }
            }
            next.insert(node.index());

            if next != sets[node.index()] {
                sets[node.index()] = next;
                changed = true;
            }
        }
    }

    let idom = (0..node_count)
        .map(|index| {
            if index == entry.index() || !reachable.contains(index) {
                return None;
            }
            sets[index]
                .iter()
                .filter(|&member| member != index)
                .max_by_key(|&member| timestamps[member])
                .map(NodeId::new)
        })
        .collect();

    DominatorTree {
        entry,
        idom,
        timestamps,
        sets,
    }
}

/// Computes the dominance frontier of every node (Cytron et al.).
///
/// For each join node (two or more distinct reachable predecessors), every
/// predecessor walks up its immediate-dominator chain, adding the join node
/// to each frontier on the way, and stops at the join node's own immediate
/// dominator. The entry counts one extra incoming edge from outside the
/// graph, so an entry that is the target of a back-edge is a join node whose
/// walk runs up to and including the entry itself.
#[must_use]
pub fn compute_dominance_frontiers<G: RootedGraph>(
    graph: &G,
    tree: &DominatorTree,
) -> Vec<BTreeSet<NodeId>> {
    let mut frontiers = vec![BTreeSet::new(); graph.node_count()];

    for node in graph.node_ids() {
        if !tree.is_reachable(node) {
            continue;
        }

        let mut preds: Vec<NodeId> = graph
            .predecessors(node)
            .filter(|pred| tree.is_reachable(*pred))
            .collect();
        preds.sort_unstable();
        preds.dedup();

        let incoming = preds.len() + usize::from(node == tree.entry());
        if incoming < 2 {
            continue;
        }

        let stop = tree.immediate_dominator(node);
        for pred in preds {
            let mut runner = Some(pred);
            while let Some(current) = runner {
                if Some(current) == stop {
                    break;
                }
                frontiers[current.index()].insert(node);
                runner = tree.immediate_dominator(current);
            }
        }
    }

    frontiers
}
