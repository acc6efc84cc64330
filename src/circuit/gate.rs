//! Gate definitions.

use std::fmt;

use strum::{EnumIter, IntoStaticStr};

use crate::metadata::GateType;

/// Identifier of a gate, an index into the circuit's gate arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateId(pub(crate) usize);

impl GateId {
    /// Creates a `GateId` from a raw index.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        GateId(index)
    }

    /// The raw index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GateId({})", self.0)
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A literal value carried by a constant gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    /// Integer immediate
    Int(i64),
    /// Floating-point immediate, stored as raw bits
    Double(u64),
    /// String table index
    String(u32),
    /// Method table index
    Method(u16),
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// The hole marker
    Hole,
    /// Sentinel returned when an exception leaves the method
    Exception,
}

impl ConstantValue {
    /// Floating-point constant.
    #[must_use]
    pub fn double(value: f64) -> Self {
        ConstantValue::Double(value.to_bits())
    }

    /// Statically known type of the constant, if any.
    #[must_use]
    pub fn static_type(self) -> Option<GateType> {
        match self {
            ConstantValue::Int(_) | ConstantValue::Double(_) => Some(GateType::NUMBER),
            ConstantValue::String(_) => Some(GateType::STRING),
            ConstantValue::Method(_) => Some(GateType::FUNCTION),
            ConstantValue::Undefined => Some(GateType::UNDEFINED),
            ConstantValue::Null => Some(GateType::NULL),
            ConstantValue::Boolean(_) => Some(GateType::BOOLEAN),
            ConstantValue::Hole => Some(GateType::HOLE),
            ConstantValue::Exception => None,
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int(value) => write!(f, "{value}"),
            ConstantValue::Double(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            ConstantValue::String(id) => write!(f, "str#{id}"),
            ConstantValue::Method(id) => write!(f, "method#{id}"),
            ConstantValue::Undefined => write!(f, "undefined"),
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Boolean(value) => write!(f, "{value}"),
            ConstantValue::Hole => write!(f, "hole"),
            ConstantValue::Exception => write!(f, "exception"),
        }
    }
}

/// Gate opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GateOp {
    /// Root of the whole circuit
    CircuitRoot,
    /// Control state at method entry
    StateEntry,
    /// Effect dependency at method entry
    DependEntry,
    /// Anchor of all return gates
    ReturnList,
    /// Anchor of all constant gates
    ConstantList,
    /// Anchor of all argument gates
    ArgList,
    /// Control join of several incoming edges
    Merge,
    /// Control entry of a block with exactly one incoming edge
    OrdinaryBlock,
    /// Effect join paired with a merge
    DependSelector,
    /// Effect pass-through paired with an ordinary block
    DependRelay,
    /// Data join (phi) paired with a merge or ordinary block
    ValueSelector,
    /// Taken projection of a conditional jump
    IfTrue,
    /// Fall-through projection of a conditional jump
    IfFalse,
    /// Normal completion projection of an operation that may throw
    IfSuccess,
    /// Exceptional completion projection of an operation that may throw
    IfException,
    /// Method exit
    Return,
    /// A general bytecode operation
    Bytecode {
        /// Opcode value
        opcode: u16,
        /// Pc of the instruction
        pc: u32,
    },
    /// A literal
    Constant(ConstantValue),
    /// An incoming argument, by slot
    Arg(u16),
    /// The exception caught by a handler
    GetException,
}

impl GateOp {
    /// Opcode name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Returns `true` for the fixed root gates.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(
            self,
            GateOp::CircuitRoot
                | GateOp::StateEntry
                | GateOp::DependEntry
                | GateOp::ReturnList
                | GateOp::ConstantList
                | GateOp::ArgList
        )
    }

    /// Returns `true` for gates a register use may resolve to.
    #[must_use]
    pub fn is_value_definition(&self) -> bool {
        matches!(
            self,
            GateOp::Constant(_)
                | GateOp::Arg(_)
                | GateOp::Bytecode { .. }
                | GateOp::GetException
                | GateOp::ValueSelector
        )
    }
}

/// Representation of the value a gate produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum MachineType {
    /// Control or effect only
    NoValue,
    /// A tagged language value
    Tagged,
    /// A raw 64-bit integer
    Int64,
    /// A raw 64-bit float
    Float64,
}

/// A node of the circuit.
///
/// Inputs are fixed-size slot lists allocated when the gate is created and
/// filled while the circuit is built; an unfilled slot is a construction bug
/// caught by [`super::Circuit::verify`].
#[derive(Debug, Clone)]
pub struct Gate {
    pub(crate) op: GateOp,
    pub(crate) machine_type: MachineType,
    pub(crate) state_inputs: Vec<Option<GateId>>,
    pub(crate) depend_inputs: Vec<Option<GateId>>,
    pub(crate) value_inputs: Vec<Option<GateId>>,
    pub(crate) root: Option<GateId>,
    pub(crate) ty: Option<GateType>,
}

impl Gate {
    /// Opcode.
    #[must_use]
    pub fn op(&self) -> GateOp {
        self.op
    }

    /// Machine type of the produced value.
    #[must_use]
    pub fn machine_type(&self) -> MachineType {
        self.machine_type
    }

    /// Control inputs; `None` marks a slot not yet wired.
    #[must_use]
    pub fn state_inputs(&self) -> &[Option<GateId>] {
        &self.state_inputs
    }

    /// Effect-order inputs.
    #[must_use]
    pub fn depend_inputs(&self) -> &[Option<GateId>] {
        &self.depend_inputs
    }

    /// Data inputs.
    #[must_use]
    pub fn value_inputs(&self) -> &[Option<GateId>] {
        &self.value_inputs
    }

    /// Root list the gate hangs off, for constants, arguments and returns.
    #[must_use]
    pub fn root(&self) -> Option<GateId> {
        self.root
    }

    /// Advisory static type.
    #[must_use]
    pub fn gate_type(&self) -> Option<GateType> {
        self.ty
    }

    /// Every wired input, state first, then depend, then value.
    pub fn inputs(&self) -> impl Iterator<Item = GateId> + '_ {
        self.state_inputs
            .iter()
            .chain(&self.depend_inputs)
            .chain(&self.value_inputs)
            .flatten()
            .copied()
    }
}

fn write_slots(f: &mut fmt::Formatter<'_>, slots: &[Option<GateId>]) -> fmt::Result {
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match slot {
            Some(gate) => write!(f, "{gate}")?,
            None => write!(f, "_")?,
        }
    }
    Ok(())
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op.name())?;
        match self.op {
            GateOp::Bytecode { opcode, pc } => write!(f, "[{opcode:#x}@{pc:04x}]")?,
            GateOp::Constant(value) => write!(f, "[{value}]")?,
            GateOp::Arg(slot) => write!(f, "[{slot}]")?,
            _ => {}
        }
        write!(f, "(s: ")?;
        write_slots(f, &self.state_inputs)?;
        write!(f, " | d: ")?;
        write_slots(f, &self.depend_inputs)?;
        write!(f, " | v: ")?;
        write_slots(f, &self.value_inputs)?;
        write!(f, ")")?;
        if let Some(ty) = self.ty {
            write!(f, " : {ty}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_op_names() {
        assert_eq!(GateOp::DependSelector.name(), "DEPEND_SELECTOR");
        assert_eq!(GateOp::Bytecode { opcode: 0x30, pc: 4 }.name(), "BYTECODE");
        assert_eq!(GateOp::Constant(ConstantValue::Null).name(), "CONSTANT");
        assert!(GateOp::ArgList.is_root());
        assert!(!GateOp::Merge.is_root());
        assert!(GateOp::GetException.is_value_definition());
        assert!(!GateOp::IfSuccess.is_value_definition());
    }

    #[test]
    fn test_constant_types() {
        assert_eq!(ConstantValue::Int(3).static_type(), Some(GateType::NUMBER));
        assert_eq!(ConstantValue::double(0.5).static_type(), Some(GateType::NUMBER));
        assert_eq!(ConstantValue::String(1).static_type(), Some(GateType::STRING));
        assert_eq!(ConstantValue::Exception.static_type(), None);
        assert_eq!(ConstantValue::double(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_gate_display() {
        let gate = Gate {
            op: GateOp::Bytecode {
                opcode: 0x30,
                pc: 4,
            },
            machine_type: MachineType::Tagged,
            state_inputs: vec![Some(GateId::new(1))],
            depend_inputs: vec![Some(GateId::new(2))],
            value_inputs: vec![Some(GateId::new(5)), None],
            root: None,
            ty: Some(GateType::NUMBER),
        };
        assert_eq!(
            gate.to_string(),
            "BYTECODE[0x30@0004](s: g1 | d: g2 | v: g5, _) : number"
        );
        assert_eq!(gate.inputs().count(), 3);
    }
}
