//! Phi placement at iterated dominance frontiers.
//!
//! Registers are flagged, not renamed: a set flag on a block only tells the
//! circuit builder that a value selector for that register may be needed
//! there. Selectors are materialized lazily when a use actually resolves to
//! the block.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::{
    analysis::cfg::BytecodeGraph,
    assembly::InstructionStream,
    utils::graph::NodeId,
};

/// Blocks defining each virtual register, from the `outputs` of every live
/// instruction. Moves count as definitions.
#[must_use]
pub fn collect_def_sites(
    graph: &BytecodeGraph,
    stream: &InstructionStream,
) -> BTreeMap<u16, BTreeSet<NodeId>> {
    let mut defs: BTreeMap<u16, BTreeSet<NodeId>> = BTreeMap::new();
    for region in graph.live_blocks() {
        for instr in stream.slice(region.instructions.clone()) {
            for &output in &instr.outputs {
                defs.entry(output).or_default().insert(region.id);
            }
        }
    }
    defs
}

/// Flag the blocks that need value selectors.
///
/// For every written register the classic worklist runs over the dominance
/// frontiers of its definition blocks: each frontier block not yet flagged is
/// flagged, and pushed unless it already defines the register itself.
///
/// The handler of a defining block is flagged as well: the value it observes
/// depends on which instruction threw, so it is selected per exception edge.
///
/// The accumulator is flagged on every block with more than one incoming edge
/// and on every catch handler, whose entry implicitly writes the exception.
pub fn insert_phis(graph: &mut BytecodeGraph, stream: &InstructionStream) {
    let defs = collect_def_sites(graph, stream);

    let mut placements: Vec<(NodeId, u16)> = Vec::new();
    for (&register, def_blocks) in &defs {
        let mut flagged: BTreeSet<NodeId> = BTreeSet::new();
        let mut worklist: Vec<NodeId> = def_blocks.iter().copied().collect();

        for block in def_blocks {
            let handler = graph.block(*block).and_then(|region| region.exception_target());
            if let Some(handler) = handler {
                if flagged.insert(handler) && !def_blocks.contains(&handler) {
                    worklist.push(handler);
                }
            }
        }

        while let Some(block) = worklist.pop() {
            let Some(region) = graph.block(block) else {
                continue;
            };
            for &frontier in &region.frontier {
                if flagged.insert(frontier) && !def_blocks.contains(&frontier) {
                    worklist.push(frontier);
                }
            }
        }

        placements.extend(flagged.into_iter().map(|block| (block, register)));
    }

    for (block, register) in placements {
        if let Some(region) = graph.block_mut(block) {
            region.phi_registers.insert(register);
        }
    }

    let ids: Vec<NodeId> = graph.live_blocks().map(|region| region.id).collect();
    for id in ids {
        if let Some(region) = graph.block_mut(id) {
            region.phi_acc = region.expected_preds > 1 || region.is_catch_handler();
            if region.phi_acc || !region.phi_registers.is_empty() {
                trace!(
                    block = %id,
                    acc = region.phi_acc,
                    registers = ?region.phi_registers,
                    "phi flags"
                );
            }
        }
    }
}
