//! Decoded instruction representation.
//!
//! This module defines the shape of a decoded instruction and the vocabulary used
//! to describe instruction formats:
//!
//! - [`BytecodeInfo`] - one decoded instruction: pc, length, operands and outputs
//! - [`InstructionInfo`] - static per-opcode metadata (mnemonic, layout, flow, flags)
//! - [`Operand`] / [`Immediate`] - the closed set of operand kinds
//! - [`Register`] - a virtual register or the accumulator
//! - [`FlowType`] - how an instruction affects control flow
//!
//! Only the control-flow and data-flow *shape* of an instruction is modelled. What
//! an `add2` computes is irrelevant here; that it reads a register and the
//! accumulator, writes the accumulator and may throw is all the builder needs.

use std::fmt;

use bitflags::bitflags;
use strum::{Display, EnumIter};

/// A storage location visible to bytecode: a virtual register or the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Register {
    /// The implicit single-valued accumulator
    Accumulator,
    /// A numbered register-file slot
    Virtual(u16),
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Accumulator => write!(f, "acc"),
            Register::Virtual(index) => write!(f, "v{index}"),
        }
    }
}

/// Immediate operand values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// 8-bit signed immediate
    Int8(i8),
    /// 16-bit signed immediate
    Int16(i16),
    /// 32-bit signed immediate
    Int32(i32),
    /// 64-bit signed immediate
    Int64(i64),
    /// 64-bit floating point immediate
    Float64(f64),
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int8(v) => write!(f, "{v}"),
            Immediate::Int16(v) => write!(f, "{v}"),
            Immediate::Int32(v) => write!(f, "{v}"),
            Immediate::Int64(v) => write!(f, "{v}"),
            Immediate::Float64(v) => write!(f, "{v:?}"),
        }
    }
}

/// An instruction operand.
///
/// The set is closed: the operand shapes are fixed by the bytecode format.
/// Jump offsets are not operands, they are decoded into
/// [`BytecodeInfo::jump_target`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// A register read by the instruction
    VirtualRegister(u16),
    /// An inline literal
    Immediate(Immediate),
    /// Index into the string table
    StringId(u32),
    /// Index into the method table
    MethodId(u16),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::VirtualRegister(reg) => write!(f, "v{reg}"),
            Operand::Immediate(imm) => write!(f, "{imm}"),
            Operand::StringId(id) => write!(f, "string_id:{id:#x}"),
            Operand::MethodId(id) => write!(f, "method_id:{id:#x}"),
        }
    }
}

/// One field of an instruction's encoding, in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum OperandSlot {
    /// One byte holding two 4-bit registers: low nibble destination, high nibble source
    RegPair4,
    /// 8-bit register that is read
    RegIn8,
    /// 8-bit register that is written
    RegOut8,
    /// 16-bit register that is read
    RegIn16,
    /// 16-bit register that is written
    RegOut16,
    /// 8-bit signed immediate
    Imm8,
    /// 16-bit signed immediate
    Imm16,
    /// 32-bit signed immediate
    Imm32,
    /// 64-bit signed immediate
    Imm64,
    /// 64-bit float immediate
    Float64,
    /// 32-bit string table index
    StringId32,
    /// 16-bit method table index
    MethodId16,
    /// 8-bit signed jump offset
    Offset8,
    /// 16-bit signed jump offset
    Offset16,
    /// 32-bit signed jump offset
    Offset32,
    /// 8-bit register count followed by an 8-bit first register; reads `count`
    /// consecutive registers
    Range8,
}

impl OperandSlot {
    /// Encoded width of the slot in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            OperandSlot::RegPair4
            | OperandSlot::RegIn8
            | OperandSlot::RegOut8
            | OperandSlot::Imm8
            | OperandSlot::Offset8 => 1,
            OperandSlot::RegIn16
            | OperandSlot::RegOut16
            | OperandSlot::Imm16
            | OperandSlot::MethodId16
            | OperandSlot::Offset16
            | OperandSlot::Range8 => 2,
            OperandSlot::Imm32 | OperandSlot::StringId32 | OperandSlot::Offset32 => 4,
            OperandSlot::Imm64 | OperandSlot::Float64 => 8,
        }
    }

    /// Returns `true` for jump offset slots.
    #[must_use]
    pub const fn is_offset(self) -> bool {
        matches!(
            self,
            OperandSlot::Offset8 | OperandSlot::Offset16 | OperandSlot::Offset32
        )
    }
}

/// Control-flow family of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum FlowType {
    /// A general operation: produces a gate, may throw, falls through
    Sequential,
    /// Register/accumulator copy, transparent to data flow
    Move,
    /// Loads a literal into the accumulator
    Constant,
    /// Unconditional jump
    Jump,
    /// Two-way jump on the accumulator
    CondJump,
    /// Returns the accumulator
    Return,
    /// Returns `undefined`
    ReturnUndefined,
    /// Raises an exception, never falls through
    Throw,
}

impl FlowType {
    /// Returns `true` if execution can continue at the next instruction.
    #[must_use]
    pub const fn falls_through(self) -> bool {
        matches!(
            self,
            FlowType::Sequential | FlowType::Move | FlowType::Constant
        )
    }

    /// Returns `true` if the instruction ends its basic block.
    #[must_use]
    pub const fn is_terminator(self) -> bool {
        !self.falls_through()
    }

    /// Returns `true` for operations emitted as a bytecode gate with
    /// success/exception projections.
    #[must_use]
    pub const fn is_general(self) -> bool {
        matches!(self, FlowType::Sequential | FlowType::Throw)
    }

    /// Returns `true` for jumps that name a target.
    #[must_use]
    pub const fn is_jump(self) -> bool {
        matches!(self, FlowType::Jump | FlowType::CondJump)
    }
}

bitflags! {
    /// Accumulator usage of an instruction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InstructionFlags: u8 {
        /// Reads the accumulator
        const ACC_IN = 0x01;
        /// Writes the accumulator
        const ACC_OUT = 0x02;
    }
}

/// Literal produced by a [`FlowType::Constant`] instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literal {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// `NaN`
    NaN,
    /// `Infinity`
    Infinity,
    /// The hole marker
    Hole,
    /// The value of the instruction's first operand
    FromOperand,
}

/// Static metadata describing one opcode.
#[derive(Debug)]
pub struct InstructionInfo {
    /// Opcode value; prefixed opcodes are `(prefix << 8) | second_byte`
    pub opcode: u16,
    /// Assembly mnemonic
    pub mnemonic: &'static str,
    /// Operand fields in encoding order
    pub layout: &'static [OperandSlot],
    /// Control-flow family
    pub flow: FlowType,
    /// Accumulator usage
    pub flags: InstructionFlags,
    /// Literal loaded by constant instructions
    pub literal: Option<Literal>,
}

impl InstructionInfo {
    /// Returns `true` if the opcode is encoded behind the prefix byte.
    #[must_use]
    pub const fn is_prefixed(&self) -> bool {
        self.opcode > 0xFF
    }

    /// Encoded length of the whole instruction (opcode bytes plus operands),
    /// before range expansion.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let opcode_len = if self.is_prefixed() { 2 } else { 1 };
        opcode_len + self.layout.iter().map(|slot| slot.width()).sum::<usize>()
    }
}

/// A decoded instruction.
///
/// Operands appear in encoding order, registers that are written go to
/// [`BytecodeInfo::outputs`] instead. The accumulator is never an operand, its
/// use is described by [`BytecodeInfo::acc_in`] / [`BytecodeInfo::acc_out`].
#[derive(Debug, Clone)]
pub struct BytecodeInfo {
    /// Program counter (byte offset in the method code)
    pub pc: u32,
    /// Encoded length in bytes
    pub length: u32,
    /// Static metadata of the opcode
    pub info: &'static InstructionInfo,
    /// Values read by the instruction, in encoding order
    pub operands: Vec<Operand>,
    /// Registers written by the instruction
    pub outputs: Vec<u16>,
    /// Absolute jump target for jumps
    pub jump_target: Option<u32>,
}

impl BytecodeInfo {
    /// Opcode value.
    #[must_use]
    pub fn opcode(&self) -> u16 {
        self.info.opcode
    }

    /// Mnemonic of the opcode.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        self.info.mnemonic
    }

    /// Control-flow family.
    #[must_use]
    pub fn flow(&self) -> FlowType {
        self.info.flow
    }

    /// Reads the accumulator.
    #[must_use]
    pub fn acc_in(&self) -> bool {
        self.info.flags.contains(InstructionFlags::ACC_IN)
    }

    /// Writes the accumulator.
    #[must_use]
    pub fn acc_out(&self) -> bool {
        self.info.flags.contains(InstructionFlags::ACC_OUT)
    }

    /// Program counter of the instruction that follows in the code.
    #[must_use]
    pub fn next_pc(&self) -> u32 {
        self.pc + self.length
    }

    /// Returns `true` if the instruction writes `register`.
    #[must_use]
    pub fn writes(&self, register: Register) -> bool {
        match register {
            Register::Accumulator => self.acc_out(),
            Register::Virtual(index) => self.outputs.contains(&index),
        }
    }

    /// The location a move copies from, `None` for anything but moves.
    #[must_use]
    pub fn move_source(&self) -> Option<Register> {
        if self.flow() != FlowType::Move {
            return None;
        }
        if self.acc_in() {
            return Some(Register::Accumulator);
        }
        match self.operands.first() {
            Some(Operand::VirtualRegister(reg)) => Some(Register::Virtual(*reg)),
            _ => None,
        }
    }

    /// Registers read by the instruction, in operand order.
    pub fn register_inputs(&self) -> impl Iterator<Item = u16> + '_ {
        self.operands.iter().filter_map(|operand| match operand {
            Operand::VirtualRegister(reg) => Some(*reg),
            _ => None,
        })
    }
}

impl fmt::Display for BytecodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}: {}", self.pc, self.mnemonic())?;

        let mut first = true;
        for output in &self.outputs {
            write!(f, "{} v{output}", if first { "" } else { "," })?;
            first = false;
        }
        for operand in &self.operands {
            write!(f, "{} {operand}", if first { "" } else { "," })?;
            first = false;
        }
        if let Some(target) = self.jump_target {
            write!(f, "{} -> {target:04x}", if first { "" } else { "," })?;
        }
        Ok(())
    }
}
