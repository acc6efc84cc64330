//! Basic block records.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::Range,
};

use strum::Display;

use crate::{
    assembly::Register,
    circuit::GateId,
    utils::graph::NodeId,
};

/// How control reaches a block over one expanded incoming edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EdgeKind {
    /// Jump, branch projection or fall-through from a predecessor block
    Normal,
    /// Exception raised by a protected instruction
    Exception,
    /// Entry into the method from the caller
    FunctionEntry,
}

/// One wired incoming control edge, in wiring order.
///
/// Value selectors of a block have one input per expanded predecessor, input
/// `i` carrying the value flowing in over `expanded_preds[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PredEdge {
    /// Source block; the block itself for [`EdgeKind::FunctionEntry`]
    pub block: NodeId,
    /// Pc of the transferring instruction
    pub pc: u32,
    /// Edge classification
    pub kind: EdgeKind,
}

/// A maximal straight-line run of instructions.
///
/// Created by [`super::BytecodeGraph::build`], annotated with dominance data
/// and phi flags by the later analyses, and carries the selector gate caches
/// the circuit builder fills while resolving operands.
#[derive(Debug, Clone)]
pub struct BytecodeRegion {
    /// Block id, equal to the block's position in pc order
    pub id: NodeId,
    /// Pc of the first instruction
    pub start: u32,
    /// Pc of the last instruction
    pub end: u32,
    /// Index range of the block's instructions in the decoded stream
    pub instructions: Range<usize>,
    /// Blocks with a normal edge into this one
    pub preds: Vec<NodeId>,
    /// Normal successors
    pub succs: Vec<NodeId>,
    /// Handlers protecting this block, innermost try first
    pub catches: Vec<NodeId>,
    /// Blocks listing this block as a handler
    pub try_preds: Vec<NodeId>,
    /// Contains an instruction that can raise an exception
    pub may_throw: bool,
    /// Immediate dominator, `None` for the entry and dead blocks
    pub idom: Option<NodeId>,
    /// Blocks immediately dominated by this one
    pub dominated: Vec<NodeId>,
    /// Dominance frontier
    pub frontier: BTreeSet<NodeId>,
    /// Depth-first pre-order visit number
    pub timestamp: Option<usize>,
    /// Virtual registers that need a value selector at entry
    pub phi_registers: BTreeSet<u16>,
    /// The accumulator needs a value selector at entry
    pub phi_acc: bool,
    /// Memoized register selectors
    pub register_selectors: BTreeMap<u16, GateId>,
    /// Memoized accumulator selector
    pub acc_selector: Option<GateId>,
    /// Structurally expected number of incoming control edges
    pub expected_preds: usize,
    /// How many of the expected edges are exception edges
    pub exception_edges: usize,
    /// Incoming edges as they were wired
    pub expanded_preds: Vec<PredEdge>,
    /// Not reachable from the entry
    pub dead: bool,
}

impl BytecodeRegion {
    pub(crate) fn new(id: NodeId, start: u32, end: u32, instructions: Range<usize>) -> Self {
        BytecodeRegion {
            id,
            start,
            end,
            instructions,
            preds: Vec::new(),
            succs: Vec::new(),
            catches: Vec::new(),
            try_preds: Vec::new(),
            may_throw: false,
            idom: None,
            dominated: Vec::new(),
            frontier: BTreeSet::new(),
            timestamp: None,
            phi_registers: BTreeSet::new(),
            phi_acc: false,
            register_selectors: BTreeMap::new(),
            acc_selector: None,
            expected_preds: 0,
            exception_edges: 0,
            expanded_preds: Vec::new(),
            dead: false,
        }
    }

    /// Returns `true` if some protected block lists this block as a handler.
    #[must_use]
    pub fn is_catch_handler(&self) -> bool {
        !self.try_preds.is_empty()
    }

    /// The handler receiving this block's exception edges.
    #[must_use]
    pub fn exception_target(&self) -> Option<NodeId> {
        if self.may_throw {
            self.catches.first().copied()
        } else {
            None
        }
    }

    /// Returns `true` if `register` needs a value selector at entry.
    #[must_use]
    pub fn needs_phi(&self, register: Register) -> bool {
        match register {
            Register::Accumulator => self.phi_acc,
            Register::Virtual(index) => self.phi_registers.contains(&index),
        }
    }

    /// Memoized selector for `register`.
    #[must_use]
    pub fn selector(&self, register: Register) -> Option<GateId> {
        match register {
            Register::Accumulator => self.acc_selector,
            Register::Virtual(index) => self.register_selectors.get(&index).copied(),
        }
    }

    pub(crate) fn cache_selector(&mut self, register: Register, gate: GateId) {
        match register {
            Register::Accumulator => self.acc_selector = Some(gate),
            Register::Virtual(index) => {
                self.register_selectors.insert(index, gate);
            }
        }
    }

    /// Number of instructions in the block.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }
}

fn write_ids(f: &mut fmt::Formatter<'_>, ids: impl IntoIterator<Item = NodeId>) -> fmt::Result {
    write!(f, "[")?;
    for (i, id) in ids.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{id}")?;
    }
    write!(f, "]")
}

impl fmt::Display for BytecodeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:04x}..{:04x}]", self.id, self.start, self.end)?;
        if self.dead {
            return write!(f, " dead");
        }
        write!(f, " preds ")?;
        write_ids(f, self.preds.iter().copied())?;
        write!(f, " succs ")?;
        write_ids(f, self.succs.iter().copied())?;
        if !self.catches.is_empty() {
            write!(f, " catches ")?;
            write_ids(f, self.catches.iter().copied())?;
        }
        if !self.try_preds.is_empty() {
            write!(f, " try_preds ")?;
            write_ids(f, self.try_preds.iter().copied())?;
        }
        match self.idom {
            Some(idom) => write!(f, " idom {idom}")?,
            None => write!(f, " idom -")?,
        }
        write!(f, " frontier ")?;
        write_ids(f, self.frontier.iter().copied())?;
        write!(f, " expected {}", self.expected_preds)?;
        if self.phi_acc || !self.phi_registers.is_empty() {
            write!(f, " phis {{")?;
            let mut first = true;
            if self.phi_acc {
                write!(f, "acc")?;
                first = false;
            }
            for reg in &self.phi_registers {
                write!(f, "{}v{reg}", if first { "" } else { ", " })?;
                first = false;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_cache() {
        let mut region = BytecodeRegion::new(NodeId::new(1), 4, 9, 2..5);
        assert_eq!(region.instruction_count(), 3);
        assert_eq!(region.selector(Register::Accumulator), None);

        region.cache_selector(Register::Accumulator, GateId::new(7));
        region.cache_selector(Register::Virtual(3), GateId::new(8));
        assert_eq!(region.selector(Register::Accumulator), Some(GateId::new(7)));
        assert_eq!(region.selector(Register::Virtual(3)), Some(GateId::new(8)));
        assert_eq!(region.selector(Register::Virtual(4)), None);
    }

    #[test]
    fn test_exception_target_requires_throwing_code() {
        let mut region = BytecodeRegion::new(NodeId::new(0), 0, 0, 0..1);
        region.catches = vec![NodeId::new(3), NodeId::new(5)];
        assert_eq!(region.exception_target(), None);
        region.may_throw = true;
        assert_eq!(region.exception_target(), Some(NodeId::new(3)));
    }

    #[test]
    fn test_display() {
        let mut region = BytecodeRegion::new(NodeId::new(2), 0x10, 0x14, 3..5);
        region.preds = vec![NodeId::new(0), NodeId::new(1)];
        region.idom = Some(NodeId::new(0));
        region.expected_preds = 2;
        region.phi_acc = true;
        region.phi_registers.insert(1);
        assert_eq!(
            region.to_string(),
            "B2 [0010..0014] preds [B0, B1] succs [] idom B0 frontier [] expected 2 phis {acc, v1}"
        );
    }
}
