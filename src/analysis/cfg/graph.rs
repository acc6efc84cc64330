//! The block graph of one method.
//!
//! [`BytecodeGraph`] owns the [`BytecodeRegion`]s built from a [`BlockLayout`]
//! and runs the block-level analyses on them in place:
//!
//! 1. [`BytecodeGraph::build`] - one region per marker pair, normal edges from
//!    the end markers, catch links from the try ranges
//! 2. [`BytecodeGraph::analyze_dominance`] - prune unreachable blocks, compute
//!    dominators and frontiers, store them on the regions
//! 3. [`BytecodeGraph::compute_expected_preds`] - count the incoming control
//!    edges the circuit builder has to wire into every block
//!
//! For the graph algorithms the block graph exposes normal edges plus one
//! exception edge from every block that may throw to its first handler,
//! matching the edges the circuit actually wires.

use std::fmt::Write;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    analysis::cfg::{
        region::BytecodeRegion,
        splitter::{BlockLayout, SplitKind, TryRange},
    },
    assembly::{FlowType, InstructionStream},
    utils::{
        escape_dot,
        graph::{
            algorithms::{compute_dominance_frontiers, compute_dominators},
            GraphBase, NodeId, Predecessors, RootedGraph, Successors,
        },
    },
    Result,
};

/// Blocks of one method with their control-flow links.
#[derive(Debug, Clone)]
pub struct BytecodeGraph {
    regions: Vec<BytecodeRegion>,
    start_index: FxHashMap<u32, NodeId>,
    try_ranges: Vec<TryRange>,
}

impl BytecodeGraph {
    /// Materialize the blocks described by `layout`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvariantViolation`] if a successor pc does not start a
    /// block or a marker does not sit on an instruction.
    pub fn build(layout: &BlockLayout, stream: &InstructionStream) -> Result<Self> {
        let mut regions = Vec::with_capacity(layout.block_count());
        let mut start_index = FxHashMap::default();

        for (index, (start, end)) in layout.pairs().enumerate() {
            let id = NodeId::new(index);
            let first = stream.index_of(start.pc).ok_or_else(|| {
                invariant_error!(id, start.pc, "block start is not an instruction")
            })?;
            let last = stream
                .index_of(end.pc)
                .ok_or_else(|| invariant_error!(id, end.pc, "block end is not an instruction"))?;

            let mut region = BytecodeRegion::new(id, start.pc, end.pc, first..last + 1);
            region.may_throw = stream
                .slice(region.instructions.clone())
                .iter()
                .any(|instr| instr.flow().is_general());
            start_index.insert(start.pc, id);
            regions.push(region);
        }

        let mut graph = BytecodeGraph {
            regions,
            start_index,
            try_ranges: layout.try_ranges.clone(),
        };

        for ((_, end), index) in layout.pairs().zip(0..) {
            debug_assert_eq!(end.kind, SplitKind::End);
            let from = NodeId::new(index);
            for &succ_pc in &end.succs {
                let to = graph.block_at(succ_pc).ok_or_else(|| {
                    invariant_error!(from, end.pc, "successor pc {:#x} starts no block", succ_pc)
                })?;
                graph.add_edge(from, to);
            }
        }

        graph.link_handlers()?;
        Ok(graph)
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let succs = &mut self.regions[from.index()].succs;
        if !succs.contains(&to) {
            succs.push(to);
        }
        let preds = &mut self.regions[to.index()].preds;
        if !preds.contains(&from) {
            preds.push(from);
        }
    }

    fn link_handlers(&mut self) -> Result<()> {
        for index in 0..self.regions.len() {
            let id = NodeId::new(index);
            let start = self.regions[index].start;

            let mut covering: Vec<&TryRange> = self
                .try_ranges
                .iter()
                .filter(|range| range.covers(start))
                .collect();
            // innermost first
            covering.sort_by(|a, b| b.start.cmp(&a.start).then(a.end.cmp(&b.end)));

            let mut catches: Vec<NodeId> = Vec::new();
            for range in covering {
                for &handler_pc in &range.handlers {
                    let handler = self.start_index.get(&handler_pc).copied().ok_or_else(|| {
                        invariant_error!(id, handler_pc, "handler pc does not start a block")
                    })?;
                    if !catches.contains(&handler) {
                        catches.push(handler);
                    }
                }
            }

            for &handler in &catches {
                self.regions[handler.index()].try_preds.push(id);
            }
            self.regions[index].catches = catches;
        }
        Ok(())
    }

    /// All blocks in id order, dead ones included.
    #[must_use]
    pub fn blocks(&self) -> &[BytecodeRegion] {
        &self.regions
    }

    /// Block by id.
    #[must_use]
    pub fn block(&self, id: NodeId) -> Option<&BytecodeRegion> {
        self.regions.get(id.index())
    }

    pub(crate) fn block_mut(&mut self, id: NodeId) -> Option<&mut BytecodeRegion> {
        self.regions.get_mut(id.index())
    }

    /// Block starting at `pc`.
    #[must_use]
    pub fn block_at(&self, pc: u32) -> Option<NodeId> {
        self.start_index.get(&pc).copied()
    }

    /// Number of blocks, dead ones included.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.regions.len()
    }

    /// Blocks reachable from the entry.
    pub fn live_blocks(&self) -> impl Iterator<Item = &BytecodeRegion> {
        self.regions.iter().filter(|region| !region.dead)
    }

    /// Number of blocks reachable from the entry.
    #[must_use]
    pub fn live_block_count(&self) -> usize {
        self.live_blocks().count()
    }

    /// Try ranges, sorted by `(start, end)`.
    #[must_use]
    pub fn try_ranges(&self) -> &[TryRange] {
        &self.try_ranges
    }

    /// Mark blocks unreachable from the entry as dead and detach them.
    ///
    /// Dead blocks lose all their edges and disappear from the edge lists of
    /// live blocks. Returns the number of blocks pruned.
    pub fn prune_unreachable(&mut self) -> usize {
        let tree = compute_dominators(&*self);
        let dead: Vec<NodeId> = self
            .node_ids()
            .filter(|node| !tree.is_reachable(*node))
            .collect();

        for region in &mut self.regions {
            region.preds.retain(|pred| !dead.contains(pred));
            region.try_preds.retain(|pred| !dead.contains(pred));
            region.catches.retain(|handler| !dead.contains(handler));
        }
        for &node in &dead {
            let region = &mut self.regions[node.index()];
            region.dead = true;
            region.succs.clear();
            region.catches.clear();
            region.preds.clear();
            region.try_preds.clear();
            region.may_throw = false;
        }

        if !dead.is_empty() {
            debug!(pruned = dead.len(), "removed unreachable blocks");
        }
        dead.len()
    }

    /// Prune unreachable blocks, then compute and store immediate dominators,
    /// dominator-tree children, DFS timestamps and dominance frontiers.
    pub fn analyze_dominance(&mut self) {
        self.prune_unreachable();

        let tree = compute_dominators(&*self);
        let frontiers = compute_dominance_frontiers(&*self, &tree);

        for (region, frontier) in self.regions.iter_mut().zip(frontiers) {
            if region.dead {
                continue;
            }
            region.idom = tree.immediate_dominator(region.id);
            region.dominated = tree.children(region.id);
            region.timestamp = tree.timestamp(region.id);
            region.frontier = frontier;
        }
    }

    /// Count the incoming control edges of every live block.
    ///
    /// - every normal transfer (jump, each branch projection, fall-through)
    ///   counts once, a conditional jump whose targets coincide counts twice
    /// - every instruction that may throw inside a protected block counts one
    ///   exception edge into the block's first handler
    /// - an entry block with predecessors counts the method entry once more
    ///
    /// # Errors
    ///
    /// [`crate::Error::Malformed`] if the last block falls off the end of the
    /// code.
    pub fn compute_expected_preds(&mut self, stream: &InstructionStream) -> Result<()> {
        let mut expected = vec![0usize; self.regions.len()];
        let mut exceptions = vec![0usize; self.regions.len()];

        for region in self.live_blocks() {
            let instructions = stream.slice(region.instructions.clone());

            if let Some(handler) = region.exception_target() {
                let throwing = instructions
                    .iter()
                    .filter(|instr| instr.flow().is_general())
                    .count();
                expected[handler.index()] += throwing;
                exceptions[handler.index()] += throwing;
            }

            let Some(last) = instructions.last() else {
                continue;
            };
            let mut count_edge = |pc: u32| -> Result<()> {
                let target = self.block_at(pc).ok_or_else(|| {
                    invariant_error!(region.id, last.pc, "edge target {:#x} starts no block", pc)
                })?;
                expected[target.index()] += 1;
                Ok(())
            };

            match last.flow() {
                FlowType::Jump => {
                    if let Some(target) = last.jump_target {
                        count_edge(target)?;
                    }
                }
                FlowType::CondJump => {
                    if let Some(target) = last.jump_target {
                        count_edge(target)?;
                    }
                    count_edge(last.next_pc())?;
                }
                FlowType::Return | FlowType::ReturnUndefined | FlowType::Throw => {}
                FlowType::Sequential | FlowType::Move | FlowType::Constant => {
                    if last.next_pc() >= stream.code_len() {
                        return Err(malformed_error!(
                            "Instruction at pc {:#x} falls off the end of the code",
                            last.pc
                        ));
                    }
                    count_edge(last.next_pc())?;
                }
            }
        }

        let entry = self.entry();
        for (region, (count, exception_count)) in self
            .regions
            .iter_mut()
            .zip(expected.into_iter().zip(exceptions))
        {
            region.expected_preds = count;
            region.exception_edges = exception_count;
            if region.id == entry && count > 0 {
                region.expected_preds += 1;
            }
        }
        Ok(())
    }

    /// Text dump of every block.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "blocks ({} live of {}):",
            self.live_block_count(),
            self.block_count()
        );
        for region in &self.regions {
            let _ = writeln!(out, "  {region}");
        }
        out
    }

    /// Graphviz rendering of the live blocks and their instructions.
    #[must_use]
    pub fn to_dot(&self, stream: &InstructionStream) -> String {
        let mut dot = String::new();
        dot.push_str("digraph BytecodeGraph {\n");
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n");
        dot.push_str("    edge [fontname=\"Courier\", fontsize=9];\n\n");

        for region in self.live_blocks() {
            let mut label = format!("{} [{:04x}..{:04x}]\\l", region.id, region.start, region.end);
            for instr in stream.slice(region.instructions.clone()) {
                label.push_str(&escape_dot(&instr.to_string()));
                label.push_str("\\l");
            }
            let style = if region.id == self.entry() {
                ", style=filled, fillcolor=lightgreen"
            } else if region.is_catch_handler() {
                ", style=filled, fillcolor=lightyellow"
            } else {
                ""
            };
            let _ = writeln!(dot, "    {} [label=\"{label}\"{style}];", region.id);
        }
        dot.push('\n');

        for region in self.live_blocks() {
            for succ in &region.succs {
                let _ = writeln!(dot, "    {} -> {};", region.id, succ);
            }
            if let Some(handler) = region.exception_target() {
                let _ = writeln!(
                    dot,
                    "    {} -> {} [style=dashed, color=red];",
                    region.id, handler
                );
            }
        }

        dot.push_str("}\n");
        dot
    }
}

impl GraphBase for BytecodeGraph {
    fn node_count(&self) -> usize {
        self.regions.len()
    }
}

impl Successors for BytecodeGraph {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        let region = &self.regions[node.index()];
        region
            .succs
            .iter()
            .copied()
            .chain(region.exception_target())
    }
}

impl Predecessors for BytecodeGraph {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        let region = &self.regions[node.index()];
        let exceptional = region.try_preds.iter().copied().filter(move |pred| {
            self.regions[pred.index()].exception_target() == Some(node)
                && !region.preds.contains(pred)
        });
        region.preds.iter().copied().chain(exceptional)
    }
}

impl RootedGraph for BytecodeGraph {
    fn entry(&self) -> NodeId {
        NodeId::new(0)
    }
}
