//! Label-aware bytecode assembler.
//!
//! [`BytecodeAssembler`] emits instructions by mnemonic with a fluent API and
//! resolves named labels when the method is finished. Jump offsets are relative
//! to the pc of the jump instruction itself.
//!
//! # Examples
//!
//! ```rust
//! use bytecircuit::assembly::BytecodeAssembler;
//!
//! let mut asm = BytecodeAssembler::new();
//! asm.lda(0)?
//!     .jeqz("else")?
//!     .ldai(1)?
//!     .jmp("end")?
//!     .label("else")?
//!     .ldai(2)?
//!     .label("end")?
//!     .ret()?;
//! let code = asm.finish()?;
//! assert_eq!(code.len(), 19);
//! # Ok::<(), bytecircuit::Error>(())
//! ```

use std::collections::HashMap;

use crate::{
    assembly::{
        instruction::{InstructionInfo, OperandSlot},
        instructions::lookup_mnemonic,
        opcodes,
    },
    file::io::{write_le_at, CodeIO},
    Error, Result,
};

/// A branch whose offset is patched once its label is known.
#[derive(Debug, Clone)]
struct LabelFixup {
    /// The target label name to resolve
    label: String,
    /// Position in the bytecode where the offset is written
    fixup_position: usize,
    /// Slot describing the width of the offset field
    slot: OperandSlot,
    /// Position of the branch instruction; offsets are relative to it
    instruction_position: usize,
}

/// Fluent bytecode assembler.
#[derive(Debug, Default)]
pub struct BytecodeAssembler {
    bytecode: Vec<u8>,
    labels: HashMap<String, u32>,
    fixups: Vec<LabelFixup>,
}

fn narrow<T: TryFrom<i64>>(value: i64, mnemonic: &str) -> Result<T> {
    T::try_from(value)
        .map_err(|_| malformed_error!("operand {} out of range for '{}'", value, mnemonic))
}

impl BytecodeAssembler {
    /// Create an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pc the next instruction will be emitted at.
    #[must_use]
    pub fn current_pc(&self) -> u32 {
        u32::try_from(self.bytecode.len()).unwrap_or(u32::MAX)
    }

    fn emit_opcode(&mut self, info: &InstructionInfo) {
        if info.is_prefixed() {
            self.bytecode.push(opcodes::PREFIX);
        }
        self.bytecode.push((info.opcode & 0xFF) as u8);
    }

    fn lookup(mnemonic: &str) -> Result<&'static InstructionInfo> {
        lookup_mnemonic(mnemonic).ok_or_else(|| Error::InvalidMnemonic(mnemonic.to_string()))
    }

    /// Emit a non-branch instruction.
    ///
    /// `args` supplies one value per layout slot in encoding order, except
    /// [`OperandSlot::RegPair4`] and [`OperandSlot::Range8`] which take two
    /// (destination and source, count and first register). Float operands are
    /// passed as their IEEE-754 bit pattern.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidMnemonic`] for unknown mnemonics,
    /// [`crate::Error::InvalidBranch`] for jumps, and [`crate::Error::Malformed`]
    /// if the argument count or a value does not fit the layout.
    pub fn emit_instruction(&mut self, mnemonic: &str, args: &[i64]) -> Result<&mut Self> {
        let info = Self::lookup(mnemonic)?;
        if info.flow.is_jump() {
            return Err(Error::InvalidBranch(format!(
                "'{mnemonic}' needs a label, use emit_branch"
            )));
        }

        let expected: usize = info
            .layout
            .iter()
            .map(|slot| match slot {
                OperandSlot::RegPair4 | OperandSlot::Range8 => 2,
                _ => 1,
            })
            .sum();
        if args.len() != expected {
            return Err(malformed_error!(
                "'{}' takes {} operands, got {}",
                mnemonic,
                expected,
                args.len()
            ));
        }

        let mut encoded = Vec::new();
        let mut args = args.iter().copied();
        let mut next = || args.next().unwrap_or_default();
        for slot in info.layout {
            match slot {
                OperandSlot::RegPair4 => {
                    let dst: u8 = narrow(next(), mnemonic)?;
                    let src: u8 = narrow(next(), mnemonic)?;
                    if dst > 0x0F || src > 0x0F {
                        return Err(malformed_error!("'{}' takes 4-bit registers", mnemonic));
                    }
                    encoded.push(dst | (src << 4));
                }
                OperandSlot::RegIn8 | OperandSlot::RegOut8 => {
                    narrow::<u8>(next(), mnemonic)?.write_le(&mut encoded);
                }
                OperandSlot::RegIn16 | OperandSlot::RegOut16 | OperandSlot::MethodId16 => {
                    narrow::<u16>(next(), mnemonic)?.write_le(&mut encoded);
                }
                OperandSlot::Imm8 => narrow::<i8>(next(), mnemonic)?.write_le(&mut encoded),
                OperandSlot::Imm16 => narrow::<i16>(next(), mnemonic)?.write_le(&mut encoded),
                OperandSlot::Imm32 => narrow::<i32>(next(), mnemonic)?.write_le(&mut encoded),
                OperandSlot::Imm64 | OperandSlot::Float64 => next().write_le(&mut encoded),
                OperandSlot::StringId32 => {
                    narrow::<u32>(next(), mnemonic)?.write_le(&mut encoded);
                }
                OperandSlot::Range8 => {
                    let count: u8 = narrow(next(), mnemonic)?;
                    let first: u8 = narrow(next(), mnemonic)?;
                    if usize::from(first) + usize::from(count) > 0x100 {
                        return Err(malformed_error!("'{}' range exceeds v255", mnemonic));
                    }
                    encoded.push(count);
                    encoded.push(first);
                }
                OperandSlot::Offset8 | OperandSlot::Offset16 | OperandSlot::Offset32 => {
                    return Err(Error::InvalidBranch(format!(
                        "'{mnemonic}' has an offset slot"
                    )));
                }
            }
        }

        self.emit_opcode(info);
        self.bytecode.extend_from_slice(&encoded);
        Ok(self)
    }

    /// Emit a jump to `label`, resolved in [`Self::finish`].
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidMnemonic`] for unknown mnemonics and
    /// [`crate::Error::InvalidBranch`] if `mnemonic` is not a jump.
    pub fn emit_branch(&mut self, mnemonic: &str, label: &str) -> Result<&mut Self> {
        let info = Self::lookup(mnemonic)?;
        let Some(slot) = info.layout.iter().copied().find(|slot| slot.is_offset()) else {
            return Err(Error::InvalidBranch(format!(
                "instruction '{mnemonic}' is not a branch instruction"
            )));
        };

        let instruction_position = self.bytecode.len();
        self.emit_opcode(info);
        self.fixups.push(LabelFixup {
            label: label.to_string(),
            fixup_position: self.bytecode.len(),
            slot,
            instruction_position,
        });
        self.bytecode
            .resize(self.bytecode.len() + slot.width(), 0);
        Ok(self)
    }

    /// Define `name` at the current pc.
    ///
    /// # Errors
    ///
    /// [`crate::Error::DuplicateLabel`] if the label already exists.
    pub fn label(&mut self, name: &str) -> Result<&mut Self> {
        if self.labels.contains_key(name) {
            return Err(Error::DuplicateLabel(name.to_string()));
        }
        let pc = self.current_pc();
        self.labels.insert(name.to_string(), pc);
        Ok(self)
    }

    /// Pc of a defined label.
    #[must_use]
    pub fn label_pc(&self, name: &str) -> Option<u32> {
        self.labels.get(name).copied()
    }

    /// Resolve all fixups and return the code.
    ///
    /// # Errors
    ///
    /// [`crate::Error::UndefinedLabel`] for unresolved labels and
    /// [`crate::Error::InvalidBranch`] if an offset does not fit its field.
    pub fn finish(self) -> Result<Vec<u8>> {
        self.finish_with_labels().map(|(code, _)| code)
    }

    /// Like [`Self::finish`], also returning the label positions.
    ///
    /// # Errors
    ///
    /// See [`Self::finish`].
    pub fn finish_with_labels(mut self) -> Result<(Vec<u8>, HashMap<String, u32>)> {
        let fixups = std::mem::take(&mut self.fixups);
        for fixup in &fixups {
            let target = self
                .labels
                .get(&fixup.label)
                .ok_or_else(|| Error::UndefinedLabel(fixup.label.clone()))?;

            let offset = i64::from(*target) - i64::try_from(fixup.instruction_position)
                .map_err(|_| malformed_error!("Instruction position exceeds i64 range"))?;
            let out_of_range = || {
                Error::InvalidBranch(format!(
                    "offset {offset} to '{}' out of range for {:?}",
                    fixup.label, fixup.slot
                ))
            };

            match fixup.slot {
                OperandSlot::Offset8 => write_le_at(
                    &mut self.bytecode,
                    fixup.fixup_position,
                    i8::try_from(offset).map_err(|_| out_of_range())?,
                )?,
                OperandSlot::Offset16 => write_le_at(
                    &mut self.bytecode,
                    fixup.fixup_position,
                    i16::try_from(offset).map_err(|_| out_of_range())?,
                )?,
                _ => write_le_at(
                    &mut self.bytecode,
                    fixup.fixup_position,
                    i32::try_from(offset).map_err(|_| out_of_range())?,
                )?,
            }
        }

        Ok((self.bytecode, self.labels))
    }

    /// `mov` using the narrowest encoding that fits both registers.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn mov(&mut self, dst: u16, src: u16) -> Result<&mut Self> {
        let mnemonic = match dst.max(src) {
            0..=0x0F => "mov.4",
            0x10..=0xFF => "mov.8",
            _ => "mov.16",
        };
        self.emit_instruction(mnemonic, &[i64::from(dst), i64::from(src)])
    }

    /// `lda v`: accumulator = register.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn lda(&mut self, reg: u16) -> Result<&mut Self> {
        self.emit_instruction("lda", &[i64::from(reg)])
    }

    /// `sta v`: register = accumulator.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn sta(&mut self, reg: u16) -> Result<&mut Self> {
        self.emit_instruction("sta", &[i64::from(reg)])
    }

    /// `ldai imm32`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn ldai(&mut self, value: i32) -> Result<&mut Self> {
        self.emit_instruction("ldai", &[i64::from(value)])
    }

    /// `fldai f64`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn fldai(&mut self, value: f64) -> Result<&mut Self> {
        #[allow(clippy::cast_possible_wrap)]
        let bits = value.to_bits() as i64;
        self.emit_instruction("fldai", &[bits])
    }

    /// `lda.str string_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn lda_str(&mut self, string_id: u32) -> Result<&mut Self> {
        self.emit_instruction("lda.str", &[i64::from(string_id)])
    }

    /// `jmp` to a label (16-bit offset).
    ///
    /// # Errors
    ///
    /// See [`Self::emit_branch`].
    pub fn jmp(&mut self, label: &str) -> Result<&mut Self> {
        self.emit_branch("jmp.16", label)
    }

    /// `jeqz` to a label (16-bit offset), taken when the accumulator is zero.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_branch`].
    pub fn jeqz(&mut self, label: &str) -> Result<&mut Self> {
        self.emit_branch("jeqz.16", label)
    }

    /// `jnez` to a label (16-bit offset).
    ///
    /// # Errors
    ///
    /// See [`Self::emit_branch`].
    pub fn jnez(&mut self, label: &str) -> Result<&mut Self> {
        self.emit_branch("jnez.16", label)
    }

    /// `add2 v`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn add2(&mut self, reg: u16) -> Result<&mut Self> {
        self.emit_instruction("add2", &[i64::from(reg)])
    }

    /// `sub2 v`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn sub2(&mut self, reg: u16) -> Result<&mut Self> {
        self.emit_instruction("sub2", &[i64::from(reg)])
    }

    /// `less v`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn less(&mut self, reg: u16) -> Result<&mut Self> {
        self.emit_instruction("less", &[i64::from(reg)])
    }

    /// `inc`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn inc(&mut self) -> Result<&mut Self> {
        self.emit_instruction("inc", &[])
    }

    /// `callarg1 v`: calls the accumulator with one argument.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn callarg1(&mut self, reg: u16) -> Result<&mut Self> {
        self.emit_instruction("callarg1", &[i64::from(reg)])
    }

    /// `callirange count, first`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn callirange(&mut self, count: u8, first: u16) -> Result<&mut Self> {
        self.emit_instruction("callirange", &[i64::from(count), i64::from(first)])
    }

    /// `ldundefined`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn ldundefined(&mut self) -> Result<&mut Self> {
        self.emit_instruction("ldundefined", &[])
    }

    /// `ldtrue`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn ldtrue(&mut self) -> Result<&mut Self> {
        self.emit_instruction("ldtrue", &[])
    }

    /// `return`: returns the accumulator.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn ret(&mut self) -> Result<&mut Self> {
        self.emit_instruction("return", &[])
    }

    /// `returnundefined`.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn returnundefined(&mut self) -> Result<&mut Self> {
        self.emit_instruction("returnundefined", &[])
    }

    /// `throw`: throws the accumulator.
    ///
    /// # Errors
    ///
    /// See [`Self::emit_instruction`].
    pub fn throw(&mut self) -> Result<&mut Self> {
        self.emit_instruction("throw", &[])
    }
}
