//! Bytecode format: opcode table, decoding and assembly.
//!
//! # Key Components
//!
//! - [`InstructionStream`] - a decoded method with pc-based navigation
//! - [`BytecodeInfo`] - one decoded instruction
//! - [`INSTRUCTIONS`] - the static opcode table
//! - [`BytecodeAssembler`] - fluent assembler with label resolution
//!
//! # Encoding
//!
//! One opcode byte, or [`opcodes::PREFIX`] followed by a second opcode byte,
//! then the operand fields listed in the opcode's layout, all little-endian.
//! Registers are numbered from `v0`; the accumulator is implicit.

mod assembler;
mod decoder;
mod instruction;
mod instructions;
pub mod opcodes;

pub use assembler::BytecodeAssembler;
pub use decoder::{decode_instruction, InstructionStream};
pub use instruction::{
    BytecodeInfo, FlowType, Immediate, InstructionFlags, InstructionInfo, Literal, Operand,
    OperandSlot, Register,
};
pub use instructions::{lookup_mnemonic, lookup_opcode, INSTRUCTIONS};
