//! The gate arena.

use std::fmt::Write;

use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::{
    circuit::gate::{Gate, GateId, GateOp, MachineType},
    metadata::GateType,
    utils::escape_dot,
    Error::GraphError,
    Result,
};

/// The fixed root gates every circuit starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum RootKind {
    /// Root of the whole circuit
    Circuit,
    /// Control state at method entry
    StateEntry,
    /// Effect dependency at method entry
    DependEntry,
    /// Anchor of return gates
    ReturnList,
    /// Anchor of constant gates
    ConstantList,
    /// Anchor of argument gates
    ArgList,
}

impl RootKind {
    fn op(self) -> GateOp {
        match self {
            RootKind::Circuit => GateOp::CircuitRoot,
            RootKind::StateEntry => GateOp::StateEntry,
            RootKind::DependEntry => GateOp::DependEntry,
            RootKind::ReturnList => GateOp::ReturnList,
            RootKind::ConstantList => GateOp::ConstantList,
            RootKind::ArgList => GateOp::ArgList,
        }
    }
}

/// A sea-of-nodes graph: gates with explicit state, depend and value edges.
#[derive(Debug, Clone)]
pub struct Circuit {
    gates: Vec<Gate>,
    roots: [GateId; RootKind::COUNT],
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Create a circuit holding only the root gates.
    #[must_use]
    pub fn new() -> Self {
        let mut circuit = Circuit {
            gates: Vec::new(),
            roots: [GateId::new(0); RootKind::COUNT],
        };
        for (index, kind) in RootKind::iter().enumerate() {
            let root = (kind != RootKind::Circuit).then_some(GateId::new(0));
            let id = circuit.push(kind.op(), MachineType::NoValue, 0, 0, 0, root);
            circuit.roots[index] = id;
        }
        circuit
    }

    fn push(
        &mut self,
        op: GateOp,
        machine_type: MachineType,
        states: usize,
        depends: usize,
        values: usize,
        root: Option<GateId>,
    ) -> GateId {
        let id = GateId::new(self.gates.len());
        self.gates.push(Gate {
            op,
            machine_type,
            state_inputs: vec![None; states],
            depend_inputs: vec![None; depends],
            value_inputs: vec![None; values],
            root,
            ty: None,
        });
        id
    }

    /// The root gate of `kind`.
    #[must_use]
    pub fn root(&self, kind: RootKind) -> GateId {
        self.roots[kind as usize]
    }

    /// Allocate a gate with empty input slots.
    pub fn new_gate(
        &mut self,
        op: GateOp,
        machine_type: MachineType,
        states: usize,
        depends: usize,
        values: usize,
    ) -> GateId {
        self.push(op, machine_type, states, depends, values, None)
    }

    /// Allocate a gate hanging off one of the root lists.
    pub fn new_rooted_gate(
        &mut self,
        op: GateOp,
        machine_type: MachineType,
        list: RootKind,
        states: usize,
        depends: usize,
        values: usize,
    ) -> GateId {
        let root = self.root(list);
        self.push(op, machine_type, states, depends, values, Some(root))
    }

    fn slot(
        &mut self,
        gate: GateId,
        index: usize,
        select: fn(&mut Gate) -> &mut Vec<Option<GateId>>,
        input: GateId,
    ) -> Result<()> {
        if input.index() >= self.gates.len() {
            return Err(GraphError(format!(
                "{gate} input {index} refers to unknown gate {input}"
            )));
        }
        let target = self
            .gates
            .get_mut(gate.index())
            .ok_or_else(|| GraphError(format!("unknown gate {gate}")))?;
        let slots = select(target);
        let slot = slots
            .get_mut(index)
            .ok_or_else(|| GraphError(format!("{gate} has no input slot {index}")))?;
        *slot = Some(input);
        Ok(())
    }

    /// Wire control input `index` of `gate`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::GraphError`] if either gate or the slot does not exist.
    pub fn set_state_input(&mut self, gate: GateId, index: usize, input: GateId) -> Result<()> {
        self.slot(gate, index, |g| &mut g.state_inputs, input)
    }

    /// Wire effect input `index` of `gate`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::GraphError`] if either gate or the slot does not exist.
    pub fn set_depend_input(&mut self, gate: GateId, index: usize, input: GateId) -> Result<()> {
        self.slot(gate, index, |g| &mut g.depend_inputs, input)
    }

    /// Wire value input `index` of `gate`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::GraphError`] if either gate or the slot does not exist.
    pub fn set_value_input(&mut self, gate: GateId, index: usize, input: GateId) -> Result<()> {
        self.slot(gate, index, |g| &mut g.value_inputs, input)
    }

    /// Record the advisory type of `gate`.
    pub fn set_type(&mut self, gate: GateId, ty: Option<GateType>) {
        if let Some(target) = self.gates.get_mut(gate.index()) {
            target.ty = ty;
        }
    }

    /// Gate by id.
    #[must_use]
    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.gates.get(id.index())
    }

    /// All gates with their ids, in allocation order.
    pub fn gates(&self) -> impl Iterator<Item = (GateId, &Gate)> {
        self.gates
            .iter()
            .enumerate()
            .map(|(index, gate)| (GateId::new(index), gate))
    }

    /// Number of gates, roots included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Returns `true` if the circuit has no gates; never the case after [`Circuit::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Gates whose opcode satisfies `pred`.
    pub fn gates_where<'a>(
        &'a self,
        pred: impl Fn(&GateOp) -> bool + 'a,
    ) -> impl Iterator<Item = GateId> + 'a {
        self.gates()
            .filter(move |(_, gate)| pred(&gate.op))
            .map(|(id, _)| id)
    }

    /// Gates using `gate` as an input or as their root list.
    #[must_use]
    pub fn users(&self, gate: GateId) -> Vec<GateId> {
        self.gates()
            .filter(|(_, g)| g.inputs().any(|input| input == gate) || g.root == Some(gate))
            .map(|(id, _)| id)
            .collect()
    }

    /// Check that every input slot of every gate has been wired.
    ///
    /// # Errors
    ///
    /// [`crate::Error::GraphError`] naming the first gate with an empty slot.
    pub fn verify(&self) -> Result<()> {
        for (id, gate) in self.gates() {
            let kinds = [
                ("state", &gate.state_inputs),
                ("depend", &gate.depend_inputs),
                ("value", &gate.value_inputs),
            ];
            for (kind, slots) in kinds {
                if let Some(index) = slots.iter().position(Option::is_none) {
                    return Err(GraphError(format!(
                        "{id} ({}) has an unwired {kind} input {index}",
                        gate.op.name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// One line per gate.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (id, gate) in self.gates() {
            let _ = writeln!(out, "{id} = {gate}");
        }
        out
    }

    /// Graphviz rendering; control edges solid, depend edges dashed, value
    /// edges dotted.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        dot.push_str("digraph Circuit {\n");
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n");
        dot.push_str("    edge [fontname=\"Courier\", fontsize=9];\n\n");

        for (id, gate) in self.gates() {
            let mut label = format!("{id} {}", gate.op.name());
            match gate.op {
                GateOp::Bytecode { pc, .. } => {
                    let _ = write!(label, " @{pc:04x}");
                }
                GateOp::Constant(value) => {
                    let _ = write!(label, " {value}");
                }
                GateOp::Arg(slot) => {
                    let _ = write!(label, " #{slot}");
                }
                _ => {}
            }
            let _ = writeln!(dot, "    {id} [label=\"{}\"];", escape_dot(&label));
        }
        dot.push('\n');

        for (id, gate) in self.gates() {
            for input in gate.state_inputs.iter().flatten() {
                let _ = writeln!(dot, "    {input} -> {id};");
            }
            for input in gate.depend_inputs.iter().flatten() {
                let _ = writeln!(dot, "    {input} -> {id} [style=dashed];");
            }
            for input in gate.value_inputs.iter().flatten() {
                let _ = writeln!(dot, "    {input} -> {id} [style=dotted];");
            }
        }

        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{circuit::ConstantValue, Error};

    #[test]
    fn test_roots() {
        let circuit = Circuit::new();
        assert_eq!(circuit.len(), RootKind::COUNT);
        let root = circuit.root(RootKind::Circuit);
        assert_eq!(circuit.gate(root).expect("root").op(), GateOp::CircuitRoot);
        let list = circuit.root(RootKind::ConstantList);
        assert_eq!(circuit.gate(list).expect("list").root(), Some(root));
        assert!(circuit.verify().is_ok());
    }

    #[test]
    fn test_wiring_and_verify() {
        let mut circuit = Circuit::new();
        let entry = circuit.root(RootKind::StateEntry);
        let merge = circuit.new_gate(GateOp::Merge, MachineType::NoValue, 2, 0, 0);
        circuit.set_state_input(merge, 0, entry).expect("slot 0");
        assert!(matches!(circuit.verify(), Err(Error::GraphError(_))));

        circuit.set_state_input(merge, 1, entry).expect("slot 1");
        assert!(circuit.verify().is_ok());
        assert!(circuit.set_state_input(merge, 2, entry).is_err());
        assert!(circuit.set_value_input(merge, 0, entry).is_err());
        assert!(circuit
            .set_state_input(merge, 0, GateId::new(1000))
            .is_err());
        assert_eq!(circuit.users(entry), vec![merge]);
    }

    #[test]
    fn test_rooted_gates_and_dot() {
        let mut circuit = Circuit::new();
        let constant = circuit.new_rooted_gate(
            GateOp::Constant(ConstantValue::Int(4)),
            MachineType::Tagged,
            RootKind::ConstantList,
            0,
            0,
            0,
        );
        circuit.set_type(constant, ConstantValue::Int(4).static_type());

        let list = circuit.root(RootKind::ConstantList);
        assert_eq!(circuit.users(list), vec![constant]);
        assert_eq!(
            circuit
                .gates_where(|op| matches!(op, GateOp::Constant(_)))
                .collect::<Vec<_>>(),
            vec![constant]
        );
        assert!(circuit.to_dot().contains("CONSTANT 4"));
        assert!(circuit.dump().contains(": number"));
    }
}
