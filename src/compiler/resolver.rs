//! Operand resolution.
//!
//! A register read at a use point resolves to the gate that defines it on every
//! path reaching that point. The search walks the dominator tree upward:
//!
//! 1. scan the current block backward; moves forward the search to their source
//! 2. the accumulator of a catch handler entered only by exception edges is
//!    its get-exception gate
//! 3. a block flagged for a phi, or a handler with mixed incoming edges, gets
//!    one value selector
//! 4. the entry block maps registers onto argument gates
//! 5. otherwise continue at the end of the immediate dominator
//!
//! Selectors are cached on the block when created and their inputs are queued
//! on a worklist instead of being resolved on the spot. Resolving a queued input
//! may queue more, but never creates a second selector for the same block and
//! register, so draining the worklist terminates without growing the stack.

use tracing::trace;

use crate::{
    analysis::EdgeKind,
    assembly::Register,
    circuit::{GateId, GateOp, MachineType},
    compiler::builder::{CircuitBuilder, SelectorInput},
    metadata::TypeSite,
    utils::graph::{NodeId, RootedGraph},
    Error, Result,
};

impl CircuitBuilder<'_> {
    /// Resolve `register` as read in `block` before instruction `upto`
    /// (`None` for the end of the block).
    ///
    /// Selectors created on the way are returned with their inputs queued;
    /// call [`Self::fill_selectors`] before relying on them.
    pub(crate) fn resolve(
        &mut self,
        block: NodeId,
        upto: Option<usize>,
        register: Register,
    ) -> Result<GateId> {
        let entry = self.graph.entry();
        let stream = self.stream;
        let mut block = block;
        let mut upto = upto;
        let mut register = register;

        loop {
            let region = self
                .graph
                .block(block)
                .ok_or_else(|| invariant_error!(block, 0, "resolution reached unknown block"))?;
            if region.dead {
                return Err(invariant_error!(
                    block,
                    region.start,
                    "resolution reached a dead block"
                ));
            }

            let range = region.instructions.clone();
            let end = upto.map_or(range.end, |index| index.min(range.end));
            for index in (range.start..end).rev() {
                let Some(instr) = stream.get(index) else {
                    continue;
                };
                if !instr.writes(register) {
                    continue;
                }
                if let Some(source) = instr.move_source() {
                    register = source;
                    continue;
                }
                return self.byte_code_to_gate.get(&instr.pc).copied().ok_or_else(|| {
                    invariant_error!(
                        block,
                        instr.pc,
                        "{} defines {} without a gate",
                        instr.mnemonic(),
                        register
                    )
                });
            }

            let start = region.start;
            if register == Register::Accumulator && region.is_catch_handler() {
                let only_exceptional = region
                    .expanded_preds
                    .iter()
                    .all(|edge| edge.kind == EdgeKind::Exception);
                if only_exceptional {
                    return self.exception_value(block, start);
                }
                return self.selector(block, register);
            }

            if region.needs_phi(register) {
                return self.selector(block, register);
            }

            if block == entry {
                return self.argument(block, start, register);
            }

            let Some(idom) = region.idom else {
                return Err(invariant_error!(
                    block,
                    start,
                    "no immediate dominator while resolving {}",
                    register
                ));
            };
            block = idom;
            upto = None;
        }
    }

    /// Resolve queued selector inputs until none is left.
    pub(crate) fn fill_selectors(&mut self) -> Result<()> {
        while let Some(input) = self.selector_inputs.pop() {
            let value = self.selector_input(input)?;
            self.circuit.set_value_input(input.gate, input.slot, value)?;
        }
        Ok(())
    }

    fn selector_input(&mut self, input: SelectorInput) -> Result<GateId> {
        let SelectorInput {
            block,
            start,
            edge,
            register,
            ..
        } = input;
        match edge.kind {
            EdgeKind::Normal => self.resolve(edge.block, None, register),
            // The accumulator carries the thrown value into the handler.
            EdgeKind::Exception if register == Register::Accumulator => {
                self.exception_value(block, start)
            }
            EdgeKind::Exception => {
                let index = self.stream.index_of(edge.pc).ok_or_else(|| {
                    invariant_error!(edge.block, edge.pc, "exception edge from a non-boundary")
                })?;
                self.resolve(edge.block, Some(index), register)
            }
            EdgeKind::FunctionEntry => self.argument(block, start, register),
        }
    }

    fn exception_value(&self, block: NodeId, pc: u32) -> Result<GateId> {
        self.get_exception
            .get(&block)
            .copied()
            .ok_or_else(|| invariant_error!(block, pc, "catch handler without get-exception gate"))
    }

    fn argument(&self, block: NodeId, pc: u32, register: Register) -> Result<GateId> {
        self.method
            .argument_slot(register)
            .and_then(|slot| self.argument_gates.get(usize::from(slot)).copied())
            .ok_or(Error::UndefinedRegister {
                register,
                block,
                pc,
            })
    }

    fn selector(&mut self, block: NodeId, register: Register) -> Result<GateId> {
        let region = self
            .graph
            .block(block)
            .ok_or_else(|| invariant_error!(block, 0, "selector for unknown block"))?;
        if let Some(gate) = region.selector(register) {
            return Ok(gate);
        }

        let start = region.start;
        let preds = region.expanded_preds.clone();
        let head = self.heads[block.index()]
            .ok_or_else(|| invariant_error!(block, start, "selector in a block without head"))?;

        let gate = self.circuit.new_gate(
            GateOp::ValueSelector,
            MachineType::Tagged,
            1,
            0,
            preds.len(),
        );
        self.circuit.set_state_input(gate, 0, head.state)?;
        let ty = self.oracle.type_of(TypeSite::Selector { block, register });
        self.circuit.set_type(gate, ty);
        self.gate_origins.insert(gate, (block, start));
        if let Some(region) = self.graph.block_mut(block) {
            region.cache_selector(register, gate);
        }
        trace!(%block, %register, %gate, inputs = preds.len(), "selector");

        // Reversed so the worklist pops slot 0 first.
        for (slot, edge) in preds.into_iter().enumerate().rev() {
            self.selector_inputs.push(SelectorInput {
                gate,
                slot,
                block,
                start,
                edge,
                register,
            });
        }
        Ok(gate)
    }
}
