//! Static opcode table.
//!
//! Every opcode the decoder accepts is described by exactly one
//! [`InstructionInfo`] entry in [`INSTRUCTIONS`]. Lookups by opcode value and by
//! mnemonic are served from maps built once on first use.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::assembly::{
    instruction::{FlowType, InstructionFlags, InstructionInfo, Literal, OperandSlot},
    opcodes,
};

use OperandSlot::{
    Float64, Imm32, Imm8, MethodId16, Offset16, Offset32, Offset8, Range8, RegIn16, RegIn8,
    RegOut16, RegOut8, RegPair4, StringId32,
};

const NONE: InstructionFlags = InstructionFlags::empty();
const IN: InstructionFlags = InstructionFlags::ACC_IN;
const OUT: InstructionFlags = InstructionFlags::ACC_OUT;
const IN_OUT: InstructionFlags = InstructionFlags::ACC_IN.union(InstructionFlags::ACC_OUT);

const fn op(
    opcode: u8,
    mnemonic: &'static str,
    layout: &'static [OperandSlot],
    flow: FlowType,
    flags: InstructionFlags,
) -> InstructionInfo {
    InstructionInfo {
        opcode: opcode as u16,
        mnemonic,
        layout,
        flow,
        flags,
        literal: None,
    }
}

const fn prefixed(
    opcode: u8,
    mnemonic: &'static str,
    layout: &'static [OperandSlot],
    flow: FlowType,
    flags: InstructionFlags,
) -> InstructionInfo {
    InstructionInfo {
        opcode: ((opcodes::PREFIX as u16) << 8) | opcode as u16,
        mnemonic,
        layout,
        flow,
        flags,
        literal: None,
    }
}

const fn literal(
    opcode: u8,
    mnemonic: &'static str,
    layout: &'static [OperandSlot],
    literal: Literal,
) -> InstructionInfo {
    InstructionInfo {
        opcode: opcode as u16,
        mnemonic,
        layout,
        flow: FlowType::Constant,
        flags: OUT,
        literal: Some(literal),
    }
}

/// All known opcodes.
pub static INSTRUCTIONS: &[InstructionInfo] = &[
    literal(opcodes::LDUNDEFINED, "ldundefined", &[], Literal::Undefined),
    literal(opcodes::LDNULL, "ldnull", &[], Literal::Null),
    literal(opcodes::LDTRUE, "ldtrue", &[], Literal::True),
    literal(opcodes::LDFALSE, "ldfalse", &[], Literal::False),
    literal(opcodes::LDNAN, "ldnan", &[], Literal::NaN),
    literal(opcodes::LDINFINITY, "ldinfinity", &[], Literal::Infinity),
    literal(opcodes::LDHOLE, "ldhole", &[], Literal::Hole),
    op(opcodes::MOV_V4, "mov.4", &[RegPair4], FlowType::Move, NONE),
    op(opcodes::MOV_V8, "mov.8", &[RegOut8, RegIn8], FlowType::Move, NONE),
    op(opcodes::MOV_V16, "mov.16", &[RegOut16, RegIn16], FlowType::Move, NONE),
    op(opcodes::LDA, "lda", &[RegIn8], FlowType::Move, OUT),
    op(opcodes::STA, "sta", &[RegOut8], FlowType::Move, IN),
    literal(opcodes::LDAI, "ldai", &[Imm32], Literal::FromOperand),
    literal(opcodes::FLDAI, "fldai", &[Float64], Literal::FromOperand),
    literal(opcodes::LDA_STR, "lda.str", &[StringId32], Literal::FromOperand),
    op(opcodes::JMP_IMM8, "jmp.8", &[Offset8], FlowType::Jump, NONE),
    op(opcodes::JMP_IMM16, "jmp.16", &[Offset16], FlowType::Jump, NONE),
    op(opcodes::JMP_IMM32, "jmp.32", &[Offset32], FlowType::Jump, NONE),
    op(opcodes::JEQZ_IMM8, "jeqz.8", &[Offset8], FlowType::CondJump, IN),
    op(opcodes::JEQZ_IMM16, "jeqz.16", &[Offset16], FlowType::CondJump, IN),
    op(opcodes::JNEZ_IMM8, "jnez.8", &[Offset8], FlowType::CondJump, IN),
    op(opcodes::JNEZ_IMM16, "jnez.16", &[Offset16], FlowType::CondJump, IN),
    op(opcodes::ADD2, "add2", &[RegIn8], FlowType::Sequential, IN_OUT),
    op(opcodes::SUB2, "sub2", &[RegIn8], FlowType::Sequential, IN_OUT),
    op(opcodes::MUL2, "mul2", &[RegIn8], FlowType::Sequential, IN_OUT),
    op(opcodes::LESS, "less", &[RegIn8], FlowType::Sequential, IN_OUT),
    op(opcodes::EQ, "eq", &[RegIn8], FlowType::Sequential, IN_OUT),
    op(opcodes::INC, "inc", &[], FlowType::Sequential, IN_OUT),
    op(opcodes::TONUMBER, "tonumber", &[], FlowType::Sequential, IN_OUT),
    op(opcodes::TYPEOF, "typeof", &[], FlowType::Sequential, IN_OUT),
    op(opcodes::CALLARG0, "callarg0", &[], FlowType::Sequential, IN_OUT),
    op(opcodes::CALLARG1, "callarg1", &[RegIn8], FlowType::Sequential, IN_OUT),
    op(opcodes::CALLARGS2, "callargs2", &[RegIn8, RegIn8], FlowType::Sequential, IN_OUT),
    op(opcodes::CALLIRANGE, "callirange", &[Range8], FlowType::Sequential, IN_OUT),
    op(opcodes::LDOBJBYNAME, "ldobjbyname", &[StringId32], FlowType::Sequential, IN_OUT),
    op(opcodes::STOBJBYNAME, "stobjbyname", &[StringId32, RegIn8], FlowType::Sequential, IN),
    op(opcodes::DEFINEFUNC, "definefunc", &[MethodId16, Imm8], FlowType::Sequential, OUT),
    op(opcodes::CREATEEMPTYOBJECT, "createemptyobject", &[], FlowType::Sequential, OUT),
    op(opcodes::RETURN, "return", &[], FlowType::Return, IN),
    op(opcodes::RETURNUNDEFINED, "returnundefined", &[], FlowType::ReturnUndefined, NONE),
    op(opcodes::THROW, "throw", &[], FlowType::Throw, IN),
    prefixed(opcodes::P_THROW_NOTEXISTS, "throw.notexists", &[], FlowType::Throw, NONE),
    prefixed(
        opcodes::P_THROW_UNDEFINEDIFHOLE,
        "throw.undefinedifhole",
        &[RegIn8, RegIn8],
        FlowType::Sequential,
        NONE,
    ),
    prefixed(opcodes::P_GETITERATOR, "getiterator", &[], FlowType::Sequential, IN_OUT),
    prefixed(opcodes::P_DEBUGGER, "debugger", &[], FlowType::Sequential, NONE),
    prefixed(opcodes::P_LDLEXVAR, "ldlexvar", &[Imm8, Imm8], FlowType::Sequential, OUT),
    prefixed(opcodes::P_STLEXVAR, "stlexvar", &[Imm8, Imm8], FlowType::Sequential, IN),
];

fn opcode_map() -> &'static FxHashMap<u16, &'static InstructionInfo> {
    static MAP: OnceLock<FxHashMap<u16, &'static InstructionInfo>> = OnceLock::new();
    MAP.get_or_init(|| INSTRUCTIONS.iter().map(|info| (info.opcode, info)).collect())
}

fn mnemonic_map() -> &'static FxHashMap<&'static str, &'static InstructionInfo> {
    static MAP: OnceLock<FxHashMap<&'static str, &'static InstructionInfo>> = OnceLock::new();
    MAP.get_or_init(|| {
        INSTRUCTIONS
            .iter()
            .map(|info| (info.mnemonic, info))
            .collect()
    })
}

/// Look up an opcode; prefixed opcodes are `(prefix << 8) | second_byte`.
#[must_use]
pub fn lookup_opcode(opcode: u16) -> Option<&'static InstructionInfo> {
    opcode_map().get(&opcode).copied()
}

/// Look up an opcode by its mnemonic.
#[must_use]
pub fn lookup_mnemonic(mnemonic: &str) -> Option<&'static InstructionInfo> {
    mnemonic_map().get(mnemonic).copied()
}
