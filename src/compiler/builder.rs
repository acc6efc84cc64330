//! Gate emission for one method.
//!
//! [`CircuitBuilder`] walks the live blocks in id order and emits:
//!
//! - a block head sized by the block's expected incoming edges: the entry
//!   roots for the entry without predecessors, an ordinary block plus depend
//!   relay for one edge, a merge plus depend selector for more
//! - a get-exception gate at the head of every catch handler
//! - one gate per general operation with success and exception projections
//! - branch projections for conditional jumps and return gates for exits
//!
//! Control and effect edges are wired during emission. Register operands are
//! recorded as pending uses and resolved once every block head is complete,
//! since a use may need a selector whose inputs come from blocks emitted later.
//! Selector inputs are queued and filled after each pending use.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{
    analysis::{BytecodeGraph, EdgeKind, PredEdge},
    assembly::{BytecodeInfo, FlowType, Immediate, InstructionStream, Literal, Operand, Register},
    circuit::{Circuit, ConstantValue, GateId, GateOp, MachineType, RootKind},
    compiler::BuilderOptions,
    metadata::{ImplicitArgument, MethodBody, TypeOracle, TypeSite},
    utils::graph::{NodeId, RootedGraph},
    Result,
};

/// Control and effect entry of a block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockHead {
    /// Merge, ordinary block or the state entry root
    pub(crate) state: GateId,
    /// Depend selector, depend relay or the depend entry root
    pub(crate) depend: GateId,
    /// Incoming edges wired so far
    pub(crate) wired: usize,
}

/// A value input waiting for operand resolution.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingUse {
    pub(crate) gate: GateId,
    pub(crate) slot: usize,
    pub(crate) block: NodeId,
    /// Index of the consuming instruction; definitions are searched before it
    pub(crate) index: usize,
    pub(crate) register: Register,
}

/// A value selector input waiting for operand resolution.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SelectorInput {
    pub(crate) gate: GateId,
    pub(crate) slot: usize,
    /// Block owning the selector
    pub(crate) block: NodeId,
    pub(crate) start: u32,
    /// Incoming edge feeding this slot
    pub(crate) edge: PredEdge,
    pub(crate) register: Register,
}

/// Everything a finished build hands back to the pipeline.
pub(crate) struct BuildOutput {
    pub(crate) circuit: Circuit,
    pub(crate) graph: BytecodeGraph,
    pub(crate) gate_origins: BTreeMap<GateId, (NodeId, u32)>,
    pub(crate) argument_gates: Vec<GateId>,
    pub(crate) bytecode_gates: BTreeMap<u32, GateId>,
}

/// Emits the circuit of one analyzed method.
pub(crate) struct CircuitBuilder<'a> {
    pub(crate) method: &'a MethodBody,
    pub(crate) stream: &'a InstructionStream,
    pub(crate) graph: BytecodeGraph,
    pub(crate) oracle: &'a dyn TypeOracle,
    pub(crate) options: &'a BuilderOptions,
    pub(crate) circuit: Circuit,
    pub(crate) heads: Vec<Option<BlockHead>>,
    pub(crate) get_exception: FxHashMap<NodeId, GateId>,
    pub(crate) byte_code_to_gate: FxHashMap<u32, GateId>,
    pub(crate) argument_gates: Vec<GateId>,
    pub(crate) gate_origins: BTreeMap<GateId, (NodeId, u32)>,
    pub(crate) pending: Vec<PendingUse>,
    pub(crate) selector_inputs: Vec<SelectorInput>,
}

impl<'a> CircuitBuilder<'a> {
    pub(crate) fn new(
        method: &'a MethodBody,
        stream: &'a InstructionStream,
        graph: BytecodeGraph,
        oracle: &'a dyn TypeOracle,
        options: &'a BuilderOptions,
    ) -> Self {
        let block_count = graph.block_count();
        CircuitBuilder {
            method,
            stream,
            graph,
            oracle,
            options,
            circuit: Circuit::new(),
            heads: vec![None; block_count],
            get_exception: FxHashMap::default(),
            byte_code_to_gate: FxHashMap::default(),
            argument_gates: Vec::new(),
            gate_origins: BTreeMap::new(),
            pending: Vec::new(),
            selector_inputs: Vec::new(),
        }
    }

    /// Emit every gate, wire every edge and resolve every operand.
    pub(crate) fn run(mut self) -> Result<BuildOutput> {
        self.create_arguments()?;
        self.create_block_heads()?;

        let live: Vec<NodeId> = self.graph.live_blocks().map(|region| region.id).collect();
        for &block in &live {
            self.emit_block(block)?;
        }

        self.check_edge_counts()?;
        self.resolve_pending()?;

        let mut bytecode_gates: BTreeMap<u32, GateId> = BTreeMap::new();
        bytecode_gates.extend(self.byte_code_to_gate.iter().map(|(pc, gate)| (*pc, *gate)));

        Ok(BuildOutput {
            circuit: self.circuit,
            graph: self.graph,
            gate_origins: self.gate_origins,
            argument_gates: self.argument_gates,
            bytecode_gates,
        })
    }

    fn annotate(&mut self, gate: GateId, site: TypeSite) {
        let ty = self.oracle.type_of(site);
        self.circuit.set_type(gate, ty);
    }

    fn create_arguments(&mut self) -> Result<()> {
        let count = self.method.argument_count();
        for index in 0..count {
            let slot = u16::try_from(index).map_err(|_| {
                malformed_error!("{} arguments exceed the 16-bit register space", count)
            })?;
            let machine_type = if slot == ImplicitArgument::ActualArgc.slot() {
                MachineType::Int64
            } else {
                MachineType::Tagged
            };
            let gate = self.circuit.new_rooted_gate(
                GateOp::Arg(slot),
                machine_type,
                RootKind::ArgList,
                0,
                0,
                0,
            );
            self.annotate(gate, TypeSite::Argument { slot });
            self.argument_gates.push(gate);
        }
        Ok(())
    }

    fn create_block_heads(&mut self) -> Result<()> {
        let entry = self.graph.entry();
        let live: Vec<(NodeId, usize, u32, bool)> = self
            .graph
            .live_blocks()
            .map(|r| (r.id, r.expected_preds, r.start, r.is_catch_handler()))
            .collect();

        for (block, expected, start, is_handler) in live {
            let head = match expected {
                0 if block == entry => BlockHead {
                    state: self.circuit.root(RootKind::StateEntry),
                    depend: self.circuit.root(RootKind::DependEntry),
                    wired: 0,
                },
                0 => {
                    return Err(invariant_error!(
                        block,
                        start,
                        "live block has no incoming edges"
                    ))
                }
                1 => {
                    let state = self
                        .circuit
                        .new_gate(GateOp::OrdinaryBlock, MachineType::NoValue, 1, 0, 0);
                    let depend = self
                        .circuit
                        .new_gate(GateOp::DependRelay, MachineType::NoValue, 1, 1, 0);
                    self.circuit.set_state_input(depend, 0, state)?;
                    BlockHead {
                        state,
                        depend,
                        wired: 0,
                    }
                }
                count => {
                    let state = self
                        .circuit
                        .new_gate(GateOp::Merge, MachineType::NoValue, count, 0, 0);
                    let depend = self.circuit.new_gate(
                        GateOp::DependSelector,
                        MachineType::NoValue,
                        1,
                        count,
                        0,
                    );
                    self.circuit.set_state_input(depend, 0, state)?;
                    BlockHead {
                        state,
                        depend,
                        wired: 0,
                    }
                }
            };
            if expected > 0 {
                self.gate_origins.insert(head.state, (block, start));
                self.gate_origins.insert(head.depend, (block, start));
            }
            self.heads[block.index()] = Some(head);

            if is_handler {
                let gate = self
                    .circuit
                    .new_gate(GateOp::GetException, MachineType::Tagged, 1, 1, 0);
                self.circuit.set_state_input(gate, 0, head.state)?;
                self.circuit.set_depend_input(gate, 0, head.depend)?;
                self.annotate(gate, TypeSite::Exception { block });
                self.gate_origins.insert(gate, (block, start));
                self.get_exception.insert(block, gate);
            }
        }

        let has_back_edge = self
            .graph
            .block(entry)
            .is_some_and(|region| region.expected_preds > 0);
        if has_back_edge {
            let state = self.circuit.root(RootKind::StateEntry);
            let depend = self.circuit.root(RootKind::DependEntry);
            self.connect(
                entry,
                state,
                depend,
                PredEdge {
                    block: entry,
                    pc: 0,
                    kind: EdgeKind::FunctionEntry,
                },
            )?;
        }
        Ok(())
    }

    /// Wire one incoming edge into the head of `target`.
    pub(crate) fn connect(
        &mut self,
        target: NodeId,
        state: GateId,
        depend: GateId,
        edge: PredEdge,
    ) -> Result<()> {
        let region = self.graph.block_mut(target).ok_or_else(|| {
            invariant_error!(target, edge.pc, "edge from {} into unknown block", edge.block)
        })?;
        let head = self.heads[target.index()].as_mut().ok_or_else(|| {
            invariant_error!(target, edge.pc, "edge from {} into a dead block", edge.block)
        })?;

        if head.wired >= region.expected_preds {
            return Err(invariant_error!(
                target,
                edge.pc,
                "block expects {} incoming edges, got another from {}",
                region.expected_preds,
                edge.block
            ));
        }

        let slot = head.wired;
        head.wired += 1;
        region.expanded_preds.push(edge);
        let (state_gate, depend_gate) = (head.state, head.depend);

        self.circuit.set_state_input(state_gate, slot, state)?;
        self.circuit.set_depend_input(depend_gate, slot, depend)?;
        trace!(from = %edge.block, to = %target, pc = edge.pc, kind = %edge.kind, "edge");
        Ok(())
    }

    fn block_at(&self, pc: u32, from: NodeId) -> Result<NodeId> {
        self.graph
            .block_at(pc)
            .ok_or_else(|| invariant_error!(from, pc, "no block starts at {:#x}", pc))
    }

    fn emit_block(&mut self, block: NodeId) -> Result<()> {
        let Some(region) = self.graph.block(block) else {
            return Ok(());
        };
        let range = region.instructions.clone();
        let exception_target = region.exception_target();
        let head = self.heads[block.index()]
            .ok_or_else(|| invariant_error!(block, region.start, "block has no head"))?;

        let mut state = head.state;
        let mut depend = self
            .get_exception
            .get(&block)
            .copied()
            .unwrap_or(head.depend);
        let mut last_pc = region.start;

        for index in range {
            let stream = self.stream;
            let Some(instr) = stream.get(index) else {
                return Err(invariant_error!(block, last_pc, "instruction {} missing", index));
            };
            last_pc = instr.pc;

            match instr.flow() {
                FlowType::Move => {}
                FlowType::Constant => {
                    let value = Self::literal_value(instr)?;
                    let gate = self.constant(value, block, instr.pc);
                    self.byte_code_to_gate.insert(instr.pc, gate);
                }
                FlowType::Sequential | FlowType::Throw => {
                    let gate = self.bytecode_gate(instr, block, index, state, depend)?;

                    let if_exception =
                        self.projection(GateOp::IfException, gate, block, instr.pc)?;
                    match exception_target {
                        Some(handler) => self.connect(
                            handler,
                            if_exception,
                            gate,
                            PredEdge {
                                block,
                                pc: instr.pc,
                                kind: EdgeKind::Exception,
                            },
                        )?,
                        None => {
                            let sentinel = self.constant(ConstantValue::Exception, block, instr.pc);
                            self.return_gate(if_exception, gate, sentinel, block, instr.pc)?;
                        }
                    }

                    if instr.flow() == FlowType::Throw {
                        return Ok(());
                    }

                    state = self.projection(GateOp::IfSuccess, gate, block, instr.pc)?;
                    depend = gate;
                }
                FlowType::Jump => {
                    let target = Self::jump_target(instr, block)?;
                    let target = self.block_at(target, block)?;
                    return self.connect(
                        target,
                        state,
                        depend,
                        PredEdge {
                            block,
                            pc: instr.pc,
                            kind: EdgeKind::Normal,
                        },
                    );
                }
                FlowType::CondJump => {
                    let gate = self.bytecode_gate(instr, block, index, state, depend)?;
                    let taken = self.block_at(Self::jump_target(instr, block)?, block)?;
                    let fallthrough = self.block_at(instr.next_pc(), block)?;
                    let edge = PredEdge {
                        block,
                        pc: instr.pc,
                        kind: EdgeKind::Normal,
                    };

                    let if_true = self.projection(GateOp::IfTrue, gate, block, instr.pc)?;
                    self.connect(taken, if_true, gate, edge)?;
                    let if_false = self.projection(GateOp::IfFalse, gate, block, instr.pc)?;
                    return self.connect(fallthrough, if_false, gate, edge);
                }
                FlowType::Return => {
                    self.return_gate_pending(state, depend, block, index, instr.pc)?;
                    return Ok(());
                }
                FlowType::ReturnUndefined => {
                    let undefined = self.constant(ConstantValue::Undefined, block, instr.pc);
                    self.return_gate(state, depend, undefined, block, instr.pc)?;
                    return Ok(());
                }
            }
        }

        let next_pc = self
            .stream
            .at(last_pc)
            .map_or(last_pc, BytecodeInfo::next_pc);
        let next = self.block_at(next_pc, block)?;
        self.connect(
            next,
            state,
            depend,
            PredEdge {
                block,
                pc: last_pc,
                kind: EdgeKind::Normal,
            },
        )
    }

    fn jump_target(instr: &BytecodeInfo, block: NodeId) -> Result<u32> {
        instr
            .jump_target
            .ok_or_else(|| invariant_error!(block, instr.pc, "jump without target"))
    }

    fn literal_value(instr: &BytecodeInfo) -> Result<ConstantValue> {
        let literal = instr.info.literal.ok_or_else(|| {
            malformed_error!(
                "{} at pc {:#x} is not a literal",
                instr.mnemonic(),
                instr.pc
            )
        })?;
        let value = match literal {
            Literal::Undefined => ConstantValue::Undefined,
            Literal::Null => ConstantValue::Null,
            Literal::True => ConstantValue::Boolean(true),
            Literal::False => ConstantValue::Boolean(false),
            Literal::NaN => ConstantValue::double(f64::NAN),
            Literal::Infinity => ConstantValue::double(f64::INFINITY),
            Literal::Hole => ConstantValue::Hole,
            Literal::FromOperand => match instr.operands.first() {
                Some(operand) => Self::operand_value(*operand).ok_or_else(|| {
                    malformed_error!("{} at pc {:#x} loads a register", instr.mnemonic(), instr.pc)
                })?,
                None => {
                    return Err(malformed_error!(
                        "{} at pc {:#x} has no operand",
                        instr.mnemonic(),
                        instr.pc
                    ))
                }
            },
        };
        Ok(value)
    }

    /// Constant for an inline operand, `None` for registers.
    fn operand_value(operand: Operand) -> Option<ConstantValue> {
        match operand {
            Operand::VirtualRegister(_) => None,
            Operand::Immediate(Immediate::Int8(v)) => Some(ConstantValue::Int(i64::from(v))),
            Operand::Immediate(Immediate::Int16(v)) => Some(ConstantValue::Int(i64::from(v))),
            Operand::Immediate(Immediate::Int32(v)) => Some(ConstantValue::Int(i64::from(v))),
            Operand::Immediate(Immediate::Int64(v)) => Some(ConstantValue::Int(v)),
            Operand::Immediate(Immediate::Float64(v)) => Some(ConstantValue::double(v)),
            Operand::StringId(id) => Some(ConstantValue::String(id)),
            Operand::MethodId(id) => Some(ConstantValue::Method(id)),
        }
    }

    fn constant(&mut self, value: ConstantValue, block: NodeId, pc: u32) -> GateId {
        let machine_type = match value {
            ConstantValue::Double(_) => MachineType::Float64,
            _ => MachineType::Tagged,
        };
        let gate = self.circuit.new_rooted_gate(
            GateOp::Constant(value),
            machine_type,
            RootKind::ConstantList,
            0,
            0,
            0,
        );
        self.circuit.set_type(gate, value.static_type());
        self.gate_origins.insert(gate, (block, pc));
        gate
    }

    /// Gate for a general operation or conditional jump. Inline operands become
    /// constants, registers and the accumulator become pending uses.
    fn bytecode_gate(
        &mut self,
        instr: &BytecodeInfo,
        block: NodeId,
        index: usize,
        state: GateId,
        depend: GateId,
    ) -> Result<GateId> {
        let values = instr.operands.len() + usize::from(instr.acc_in());
        let machine_type = if instr.acc_out() || !instr.outputs.is_empty() {
            MachineType::Tagged
        } else {
            MachineType::NoValue
        };
        let gate = self.circuit.new_gate(
            GateOp::Bytecode {
                opcode: instr.opcode(),
                pc: instr.pc,
            },
            machine_type,
            1,
            1,
            values,
        );
        self.circuit.set_state_input(gate, 0, state)?;
        self.circuit.set_depend_input(gate, 0, depend)?;

        for (slot, operand) in instr.operands.iter().enumerate() {
            match Self::operand_value(*operand) {
                Some(value) => {
                    let constant = self.constant(value, block, instr.pc);
                    self.circuit.set_value_input(gate, slot, constant)?;
                }
                None => {
                    if let Operand::VirtualRegister(reg) = operand {
                        self.pending.push(PendingUse {
                            gate,
                            slot,
                            block,
                            index,
                            register: Register::Virtual(*reg),
                        });
                    }
                }
            }
        }
        if instr.acc_in() {
            self.pending.push(PendingUse {
                gate,
                slot: instr.operands.len(),
                block,
                index,
                register: Register::Accumulator,
            });
        }

        self.annotate(gate, TypeSite::Bytecode { pc: instr.pc });
        self.gate_origins.insert(gate, (block, instr.pc));
        self.byte_code_to_gate.insert(instr.pc, gate);
        Ok(gate)
    }

    fn projection(&mut self, op: GateOp, gate: GateId, block: NodeId, pc: u32) -> Result<GateId> {
        let projection = self.circuit.new_gate(op, MachineType::NoValue, 1, 0, 0);
        self.circuit.set_state_input(projection, 0, gate)?;
        self.gate_origins.insert(projection, (block, pc));
        Ok(projection)
    }

    fn return_gate(
        &mut self,
        state: GateId,
        depend: GateId,
        value: GateId,
        block: NodeId,
        pc: u32,
    ) -> Result<GateId> {
        let gate = self.circuit.new_rooted_gate(
            GateOp::Return,
            MachineType::NoValue,
            RootKind::ReturnList,
            1,
            1,
            1,
        );
        self.circuit.set_state_input(gate, 0, state)?;
        self.circuit.set_depend_input(gate, 0, depend)?;
        self.circuit.set_value_input(gate, 0, value)?;
        self.gate_origins.insert(gate, (block, pc));
        Ok(gate)
    }

    /// Return gate whose value is the accumulator at the return.
    fn return_gate_pending(
        &mut self,
        state: GateId,
        depend: GateId,
        block: NodeId,
        index: usize,
        pc: u32,
    ) -> Result<GateId> {
        let gate = self.circuit.new_rooted_gate(
            GateOp::Return,
            MachineType::NoValue,
            RootKind::ReturnList,
            1,
            1,
            1,
        );
        self.circuit.set_state_input(gate, 0, state)?;
        self.circuit.set_depend_input(gate, 0, depend)?;
        self.pending.push(PendingUse {
            gate,
            slot: 0,
            block,
            index,
            register: Register::Accumulator,
        });
        self.gate_origins.insert(gate, (block, pc));
        Ok(gate)
    }

    fn check_edge_counts(&self) -> Result<()> {
        for region in self.graph.live_blocks() {
            let wired = self.heads[region.id.index()].map_or(0, |head| head.wired);
            if wired != region.expected_preds {
                return Err(invariant_error!(
                    region.id,
                    region.start,
                    "wired {} incoming edges, expected {}",
                    wired,
                    region.expected_preds
                ));
            }
        }
        Ok(())
    }

    fn resolve_pending(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        for used in pending {
            let input = self.resolve(used.block, Some(used.index), used.register)?;
            self.circuit.set_value_input(used.gate, used.slot, input)?;
            self.fill_selectors()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        assembly::BytecodeAssembler,
        circuit::{ConstantValue, GateId, GateOp, MachineType, RootKind},
        metadata::{GateType, MethodBody, TryBlock},
        translate,
        utils::graph::NodeId,
        Error, Translation,
    };

    fn translate_asm(
        asm: BytecodeAssembler,
        num_vregs: u16,
        try_blocks: &[TryBlock],
    ) -> Translation {
        let mut method = MethodBody::new(asm.finish().expect("finishes"), num_vregs, 1);
        method.try_blocks = try_blocks.to_vec();
        translate(&method).expect("translates")
    }

    fn value_input(translation: &Translation, gate: GateId, slot: usize) -> GateId {
        translation.circuit().gate(gate).expect("gate").value_inputs()[slot].expect("wired")
    }

    fn return_values(translation: &Translation) -> Vec<GateOp> {
        let circuit = translation.circuit();
        circuit
            .gates_where(|op| matches!(op, GateOp::Return))
            .map(|gate| {
                let value = value_input(translation, gate, 0);
                circuit.gate(value).expect("gate").op()
            })
            .collect()
    }

    #[test]
    fn test_move_chain_is_transparent() {
        let mut asm = BytecodeAssembler::new();
        asm.ldai(7)
            .and_then(|a| a.sta(0))
            .and_then(|a| a.mov(1, 0))
            .and_then(|a| a.lda(1))
            .and_then(|a| a.ret())
            .expect("assembles");
        let translation = translate_asm(asm, 2, &[]);

        assert_eq!(
            return_values(&translation),
            vec![GateOp::Constant(ConstantValue::Int(7))]
        );
        assert!(translation.bytecode_gate(5).is_none());
    }

    #[test]
    fn test_literal_constants_are_typed() {
        let mut asm = BytecodeAssembler::new();
        asm.fldai(1.5)
            .and_then(|a| a.sta(0))
            .and_then(|a| a.ldtrue())
            .and_then(|a| a.add2(0))
            .and_then(|a| a.ret())
            .expect("assembles");
        let translation = translate_asm(asm, 1, &[]);
        let circuit = translation.circuit();

        let add = translation.bytecode_gate(12).expect("add2 gate");
        let double = circuit.gate(value_input(&translation, add, 0)).expect("gate");
        assert_eq!(double.op(), GateOp::Constant(ConstantValue::double(1.5)));
        assert_eq!(double.machine_type(), MachineType::Float64);
        assert_eq!(double.gate_type(), Some(GateType::NUMBER));
        assert_eq!(double.root(), Some(circuit.root(RootKind::ConstantList)));

        let boolean = circuit.gate(value_input(&translation, add, 1)).expect("gate");
        assert_eq!(boolean.op(), GateOp::Constant(ConstantValue::Boolean(true)));
        assert_eq!(boolean.gate_type(), Some(GateType::BOOLEAN));
    }

    #[test]
    fn test_return_undefined_injects_constant() {
        let mut asm = BytecodeAssembler::new();
        asm.returnundefined().expect("assembles");
        let translation = translate_asm(asm, 0, &[]);

        assert_eq!(
            return_values(&translation),
            vec![GateOp::Constant(ConstantValue::Undefined)]
        );
    }

    #[test]
    fn test_entry_block_uses_entry_roots() {
        let mut asm = BytecodeAssembler::new();
        asm.lda(4)
            .and_then(|a| a.inc())
            .and_then(|a| a.ret())
            .expect("assembles");
        let translation = translate_asm(asm, 0, &[]);
        let circuit = translation.circuit();

        let inc = circuit
            .gate(translation.bytecode_gate(2).expect("inc gate"))
            .expect("gate");
        assert_eq!(inc.state_inputs(), &[Some(circuit.root(RootKind::StateEntry))]);
        assert_eq!(inc.depend_inputs(), &[Some(circuit.root(RootKind::DependEntry))]);
        assert_eq!(inc.value_inputs(), &[Some(translation.argument_gates()[4])]);
    }

    #[test]
    fn test_arguments_hang_off_arg_list() {
        let mut asm = BytecodeAssembler::new();
        asm.returnundefined().expect("assembles");
        let translation = translate_asm(asm, 0, &[]);
        let circuit = translation.circuit();

        assert_eq!(translation.argument_gates().len(), 5);
        for (slot, gate) in translation.argument_gates().iter().enumerate() {
            let gate = circuit.gate(*gate).expect("gate");
            assert_eq!(gate.op(), GateOp::Arg(u16::try_from(slot).expect("slot")));
            assert_eq!(gate.root(), Some(circuit.root(RootKind::ArgList)));
        }
        let argc = circuit.gate(translation.argument_gates()[3]).expect("gate");
        assert_eq!(argc.machine_type(), MachineType::Int64);
    }

    #[test]
    fn test_argument_slots_must_fit_registers() {
        let mut asm = BytecodeAssembler::new();
        asm.returnundefined().expect("assembles");
        let method = MethodBody::new(asm.finish().expect("finishes"), 0, u16::MAX);

        assert!(matches!(translate(&method), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_return_records_its_origin() {
        let mut asm = BytecodeAssembler::new();
        asm.ldai(1)
            .and_then(|a| a.ret())
            .expect("assembles");
        let translation = translate_asm(asm, 0, &[]);

        let ret = translation
            .circuit()
            .gates_where(|op| matches!(op, GateOp::Return))
            .next()
            .expect("return gate");
        assert_eq!(translation.origin(ret), Some((NodeId::new(0), 5)));
    }

    #[test]
    fn test_handler_effects_start_at_get_exception() {
        let mut asm = BytecodeAssembler::new();
        asm.lda(4)
            .and_then(|a| a.callarg1(4))
            .and_then(|a| a.ret())
            .and_then(|a| a.inc())
            .and_then(|a| a.ret())
            .expect("assembles");
        let translation = translate_asm(asm, 0, &[TryBlock::new(2, 4, vec![5])]);
        let circuit = translation.circuit();

        let inc = circuit
            .gate(translation.bytecode_gate(5).expect("inc gate"))
            .expect("gate");
        let depend = inc.depend_inputs()[0].expect("wired");
        assert_eq!(circuit.gate(depend).expect("gate").op(), GateOp::GetException);
        assert_eq!(inc.value_inputs(), &[Some(depend)]);
    }

    #[test]
    fn test_register_range_reads_every_register() {
        let mut asm = BytecodeAssembler::new();
        asm.ldai(1)
            .and_then(|a| a.sta(0))
            .and_then(|a| a.ldai(2))
            .and_then(|a| a.sta(1))
            .and_then(|a| a.lda(6))
            .and_then(|a| a.callirange(2, 0))
            .and_then(|a| a.ret())
            .expect("assembles");
        let translation = translate_asm(asm, 2, &[]);
        let circuit = translation.circuit();

        let call = translation.bytecode_gate(16).expect("call gate");
        let ops: Vec<GateOp> = circuit
            .gate(call)
            .expect("gate")
            .value_inputs()
            .iter()
            .map(|input| circuit.gate(input.expect("wired")).expect("gate").op())
            .collect();
        assert_eq!(
            ops,
            vec![
                GateOp::Constant(ConstantValue::Int(1)),
                GateOp::Constant(ConstantValue::Int(2)),
                GateOp::Arg(4),
            ]
        );
    }
}
