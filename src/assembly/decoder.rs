//! Instruction decoding.
//!
//! [`decode_instruction`] decodes a single instruction at the parser's position
//! using the static opcode table; [`InstructionStream`] decodes a whole method
//! once and serves pc-based lookups (`prev`/`next` pc, instruction index) to the
//! block splitter and the circuit builder.
//!
//! Decoding is strict. An unknown opcode, a truncated operand, or a jump whose
//! target is not the first byte of an instruction is reported as
//! [`crate::Error::Malformed`].

use std::ops::Range;

use rustc_hash::FxHashMap;

use crate::{
    assembly::{
        instruction::{BytecodeInfo, Immediate, Operand, OperandSlot},
        instructions::lookup_opcode,
        opcodes,
    },
    file::Parser,
    Error, Result,
};

/// Decode the instruction at the parser's current position.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for unknown opcodes or jump targets
/// outside the 32-bit pc space, and [`crate::Error::OutOfBounds`] if an operand is
/// truncated.
pub fn decode_instruction(parser: &mut Parser) -> Result<BytecodeInfo> {
    let start = parser.pos();
    let pc = u32::try_from(start).map_err(|_| malformed_error!("pc {} exceeds u32", start))?;

    let first = parser.read_le::<u8>()?;
    let opcode = if first == opcodes::PREFIX {
        let second = parser.read_le::<u8>()?;
        (u16::from(first) << 8) | u16::from(second)
    } else {
        u16::from(first)
    };

    let Some(info) = lookup_opcode(opcode) else {
        return Err(malformed_error!(
            "Invalid opcode {:#06x} at pc {:#x}",
            opcode,
            pc
        ));
    };

    let mut operands = Vec::new();
    let mut outputs = Vec::new();
    let mut offset = None;

    for slot in info.layout {
        match slot {
            OperandSlot::RegPair4 => {
                let packed = parser.read_le::<u8>()?;
                outputs.push(u16::from(packed & 0x0F));
                operands.push(Operand::VirtualRegister(u16::from(packed >> 4)));
            }
            OperandSlot::RegIn8 => {
                operands.push(Operand::VirtualRegister(u16::from(parser.read_le::<u8>()?)));
            }
            OperandSlot::RegOut8 => outputs.push(u16::from(parser.read_le::<u8>()?)),
            OperandSlot::RegIn16 => {
                operands.push(Operand::VirtualRegister(parser.read_le::<u16>()?));
            }
            OperandSlot::RegOut16 => outputs.push(parser.read_le::<u16>()?),
            OperandSlot::Imm8 => {
                operands.push(Operand::Immediate(Immediate::Int8(parser.read_le::<i8>()?)));
            }
            OperandSlot::Imm16 => {
                operands.push(Operand::Immediate(Immediate::Int16(parser.read_le::<i16>()?)));
            }
            OperandSlot::Imm32 => {
                operands.push(Operand::Immediate(Immediate::Int32(parser.read_le::<i32>()?)));
            }
            OperandSlot::Imm64 => {
                operands.push(Operand::Immediate(Immediate::Int64(parser.read_le::<i64>()?)));
            }
            OperandSlot::Float64 => {
                operands.push(Operand::Immediate(Immediate::Float64(
                    parser.read_le::<f64>()?,
                )));
            }
            OperandSlot::StringId32 => operands.push(Operand::StringId(parser.read_le::<u32>()?)),
            OperandSlot::MethodId16 => operands.push(Operand::MethodId(parser.read_le::<u16>()?)),
            OperandSlot::Offset8 => offset = Some(i64::from(parser.read_le::<i8>()?)),
            OperandSlot::Offset16 => offset = Some(i64::from(parser.read_le::<i16>()?)),
            OperandSlot::Offset32 => offset = Some(i64::from(parser.read_le::<i32>()?)),
            OperandSlot::Range8 => {
                let count = u16::from(parser.read_le::<u8>()?);
                let first_reg = u16::from(parser.read_le::<u8>()?);
                for reg in first_reg..first_reg + count {
                    operands.push(Operand::VirtualRegister(reg));
                }
            }
        }
    }

    let jump_target = match offset {
        Some(delta) => {
            let target = i64::from(pc) + delta;
            Some(u32::try_from(target).map_err(|_| {
                malformed_error!("Jump at pc {:#x} targets negative pc {}", pc, target)
            })?)
        }
        None => None,
    };

    let length = u32::try_from(parser.pos() - start)
        .map_err(|_| malformed_error!("Instruction at pc {:#x} is too long", pc))?;

    Ok(BytecodeInfo {
        pc,
        length,
        info,
        operands,
        outputs,
        jump_target,
    })
}

/// The fully decoded code of one method with pc-indexed navigation.
#[derive(Debug, Clone)]
pub struct InstructionStream {
    instructions: Vec<BytecodeInfo>,
    index_of_pc: FxHashMap<u32, usize>,
    code_len: u32,
}

impl InstructionStream {
    /// Decode every instruction of `code`.
    ///
    /// Jump targets are validated against the decoded instruction boundaries.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Empty`] if `code` is empty
    /// - [`crate::Error::Malformed`] on unknown opcodes or jumps that do not land on
    ///   an instruction
    /// - [`crate::Error::OutOfBounds`] if the last instruction is truncated
    pub fn decode(code: &[u8]) -> Result<Self> {
        if code.is_empty() {
            return Err(Error::Empty);
        }
        let code_len = u32::try_from(code.len())
            .map_err(|_| malformed_error!("Method code of {} bytes is too large", code.len()))?;

        let mut parser = Parser::new(code);
        let mut instructions = Vec::new();
        let mut index_of_pc = FxHashMap::default();

        while parser.has_more_data() {
            let instruction = decode_instruction(&mut parser)?;
            index_of_pc.insert(instruction.pc, instructions.len());
            instructions.push(instruction);
        }

        let stream = InstructionStream {
            instructions,
            index_of_pc,
            code_len,
        };

        for instruction in &stream.instructions {
            if let Some(target) = instruction.jump_target {
                if stream.index_of(target).is_none() {
                    return Err(malformed_error!(
                        "Jump at pc {:#x} targets {:#x}, which is not an instruction boundary",
                        instruction.pc,
                        target
                    ));
                }
            }
        }

        Ok(stream)
    }

    /// Number of decoded instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if no instruction was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Size of the method code in bytes, the pc one past the last instruction.
    #[must_use]
    pub fn code_len(&self) -> u32 {
        self.code_len
    }

    /// All instructions in pc order.
    #[must_use]
    pub fn instructions(&self) -> &[BytecodeInfo] {
        &self.instructions
    }

    /// Instruction at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&BytecodeInfo> {
        self.instructions.get(index)
    }

    /// Instructions in an index range.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> &[BytecodeInfo] {
        &self.instructions[range]
    }

    /// Index of the instruction starting at `pc`.
    #[must_use]
    pub fn index_of(&self, pc: u32) -> Option<usize> {
        self.index_of_pc.get(&pc).copied()
    }

    /// Instruction starting at `pc`.
    #[must_use]
    pub fn at(&self, pc: u32) -> Option<&BytecodeInfo> {
        self.index_of(pc).map(|index| &self.instructions[index])
    }

    /// Returns `true` if `pc` is the first byte of an instruction.
    #[must_use]
    pub fn is_boundary(&self, pc: u32) -> bool {
        self.index_of_pc.contains_key(&pc)
    }

    /// Pc of the instruction before the one at `pc`.
    ///
    /// `pc` may also be [`Self::code_len`], in which case the last instruction
    /// is returned. The first instruction has no predecessor.
    #[must_use]
    pub fn prev_pc(&self, pc: u32) -> Option<u32> {
        let index = if pc == self.code_len {
            self.instructions.len()
        } else {
            self.index_of(pc)?
        };
        index
            .checked_sub(1)
            .map(|prev| self.instructions[prev].pc)
    }

    /// Pc of the instruction after the one at `pc`, `None` for the last one.
    #[must_use]
    pub fn next_pc(&self, pc: u32) -> Option<u32> {
        let next = self.at(pc)?.next_pc();
        (next < self.code_len).then_some(next)
    }

    /// Pc of the last instruction.
    #[must_use]
    pub fn last_pc(&self) -> u32 {
        self.instructions.last().map_or(0, |instr| instr.pc)
    }
}
