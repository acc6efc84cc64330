//! Translation entry points.

use std::{collections::BTreeMap, fmt::Write};

use rayon::prelude::*;
use tracing::debug;

use crate::{
    analysis::{insert_phis, BlockSplitter, BytecodeGraph},
    assembly::InstructionStream,
    circuit::{Circuit, GateId},
    compiler::{builder::CircuitBuilder, BuilderOptions},
    metadata::{MethodBody, NoTypes, TypeOracle},
    utils::graph::NodeId,
    Result,
};

/// Translates one method into a circuit.
///
/// Phases run strictly in order: decode, block splitting, graph construction,
/// dominance, expected edge counts, phi placement, gate emission and operand
/// resolution, verification.
pub struct BytecodeCircuitBuilder<'a> {
    method: &'a MethodBody,
    oracle: &'a dyn TypeOracle,
    options: BuilderOptions,
}

impl<'a> BytecodeCircuitBuilder<'a> {
    /// Create a builder for `method`.
    #[must_use]
    pub fn new(
        method: &'a MethodBody,
        oracle: &'a dyn TypeOracle,
        options: BuilderOptions,
    ) -> Self {
        BytecodeCircuitBuilder {
            method,
            oracle,
            options,
        }
    }

    /// Run the whole translation.
    ///
    /// # Errors
    ///
    /// Any malformed input or failed structural check aborts the translation;
    /// no partial circuit is returned.
    pub fn build(&self) -> Result<Translation> {
        let stream = InstructionStream::decode(&self.method.code)?;
        debug!(instructions = stream.len(), bytes = stream.code_len(), "decoded");

        let layout = BlockSplitter::split(&stream, &self.method.try_blocks)?;
        debug!(blocks = layout.block_count(), "split");
        if self.options.trace {
            debug!("markers:\n{}", layout.dump());
        }

        let mut graph = BytecodeGraph::build(&layout, &stream)?;
        graph.analyze_dominance();
        graph.compute_expected_preds(&stream)?;
        insert_phis(&mut graph, &stream);
        debug!(live = graph.live_block_count(), "analyzed");
        if self.options.trace {
            debug!("blocks:\n{}", graph.dump());
        }

        let output =
            CircuitBuilder::new(self.method, &stream, graph, self.oracle, &self.options).run()?;
        if self.options.verify {
            output.circuit.verify()?;
        }
        debug!(gates = output.circuit.len(), "built");

        let translation = Translation {
            circuit: output.circuit,
            graph: output.graph,
            gate_origins: output.gate_origins,
            argument_gates: output.argument_gates,
            bytecode_gates: output.bytecode_gates,
            stream,
        };
        if self.options.trace {
            debug!("gates:\n{}", translation.dump_bytecode_gates());
        }
        Ok(translation)
    }
}

/// The result of translating one method.
#[derive(Debug)]
pub struct Translation {
    circuit: Circuit,
    graph: BytecodeGraph,
    gate_origins: BTreeMap<GateId, (NodeId, u32)>,
    argument_gates: Vec<GateId>,
    bytecode_gates: BTreeMap<u32, GateId>,
    stream: InstructionStream,
}

impl Translation {
    /// The finished circuit.
    #[must_use]
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// The analyzed block graph.
    #[must_use]
    pub fn graph(&self) -> &BytecodeGraph {
        &self.graph
    }

    /// The decoded instructions.
    #[must_use]
    pub fn stream(&self) -> &InstructionStream {
        &self.stream
    }

    /// Block and pc a gate was emitted for. Roots and argument gates have none.
    #[must_use]
    pub fn origin(&self, gate: GateId) -> Option<(NodeId, u32)> {
        self.gate_origins.get(&gate).copied()
    }

    /// Argument gates in slot order, implicit arguments first.
    #[must_use]
    pub fn argument_gates(&self) -> &[GateId] {
        &self.argument_gates
    }

    /// Gate emitted for the instruction at `pc`; moves and jumps have none.
    #[must_use]
    pub fn bytecode_gate(&self, pc: u32) -> Option<GateId> {
        self.bytecode_gates.get(&pc).copied()
    }

    /// Per-block listing of every instruction and the gate it produced.
    #[must_use]
    pub fn dump_bytecode_gates(&self) -> String {
        let mut out = String::new();
        for region in self.graph.live_blocks() {
            let _ = writeln!(out, "{}:", region.id);
            for instr in self.stream.slice(region.instructions.clone()) {
                match self.bytecode_gate(instr.pc) {
                    Some(gate) => {
                        let _ = writeln!(out, "  {instr}  => {gate}");
                    }
                    None => {
                        let _ = writeln!(out, "  {instr}");
                    }
                }
            }
        }
        out
    }
}

/// Translate `method` with default options and no type information.
///
/// # Errors
///
/// See [`BytecodeCircuitBuilder::build`].
///
/// # Examples
///
/// ```rust
/// use bytecircuit::{assembly::BytecodeAssembler, metadata::MethodBody, translate};
///
/// let mut asm = BytecodeAssembler::new();
/// asm.ldai(1)?.sta(0)?.lda(0)?.inc()?.ret()?;
/// let method = MethodBody::new(asm.finish()?, 1, 0);
///
/// let translation = translate(&method)?;
/// assert_eq!(translation.graph().live_block_count(), 1);
/// # Ok::<(), bytecircuit::Error>(())
/// ```
pub fn translate(method: &MethodBody) -> Result<Translation> {
    BytecodeCircuitBuilder::new(method, &NoTypes, BuilderOptions::default()).build()
}

/// Translate many methods in parallel. Translations share nothing, so results
/// are the same as translating one by one and come back in input order.
#[must_use]
pub fn translate_all(
    methods: &[MethodBody],
    oracle: &dyn TypeOracle,
    options: &BuilderOptions,
) -> Vec<Result<Translation>> {
    methods
        .par_iter()
        .map(|method| BytecodeCircuitBuilder::new(method, oracle, *options).build())
        .collect()
}
