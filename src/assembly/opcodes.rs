//! Opcode byte constants.
//!
//! Single-byte opcodes are named after their mnemonic (e.g. [`LDA`] = `0x13`).
//! Opcodes behind the [`PREFIX`] byte have their second byte stored with a
//! `P_` prefix (e.g. [`P_LDLEXVAR`] = `0x04` for `ldlexvar`, encoded `0xFD 0x04`).
#![allow(missing_docs)]

// Special value loaders
pub const LDUNDEFINED: u8 = 0x00;
pub const LDNULL: u8 = 0x01;
pub const LDTRUE: u8 = 0x02;
pub const LDFALSE: u8 = 0x03;
pub const LDNAN: u8 = 0x04;
pub const LDINFINITY: u8 = 0x05;
pub const LDHOLE: u8 = 0x06;

// Register and accumulator moves
pub const MOV_V4: u8 = 0x10;
pub const MOV_V8: u8 = 0x11;
pub const MOV_V16: u8 = 0x12;
pub const LDA: u8 = 0x13;
pub const STA: u8 = 0x14;

// Literal loaders
pub const LDAI: u8 = 0x15;
pub const FLDAI: u8 = 0x16;
pub const LDA_STR: u8 = 0x17;

// Jumps, offsets are relative to the jump instruction itself
pub const JMP_IMM8: u8 = 0x20;
pub const JMP_IMM16: u8 = 0x21;
pub const JMP_IMM32: u8 = 0x22;
pub const JEQZ_IMM8: u8 = 0x23;
pub const JEQZ_IMM16: u8 = 0x24;
pub const JNEZ_IMM8: u8 = 0x25;
pub const JNEZ_IMM16: u8 = 0x26;

// Arithmetic and comparison, accumulator in and out
pub const ADD2: u8 = 0x30;
pub const SUB2: u8 = 0x31;
pub const MUL2: u8 = 0x32;
pub const LESS: u8 = 0x33;
pub const EQ: u8 = 0x34;
pub const INC: u8 = 0x35;
pub const TONUMBER: u8 = 0x36;
pub const TYPEOF: u8 = 0x37;

// Calls and objects
pub const CALLARG0: u8 = 0x40;
pub const CALLARG1: u8 = 0x41;
pub const CALLARGS2: u8 = 0x42;
pub const CALLIRANGE: u8 = 0x43;
pub const LDOBJBYNAME: u8 = 0x44;
pub const STOBJBYNAME: u8 = 0x45;
pub const DEFINEFUNC: u8 = 0x46;
pub const CREATEEMPTYOBJECT: u8 = 0x47;

// Method exits
pub const RETURN: u8 = 0x50;
pub const RETURNUNDEFINED: u8 = 0x51;
pub const THROW: u8 = 0x52;

/// First byte of every two-byte opcode.
pub const PREFIX: u8 = 0xFD;

pub const P_THROW_NOTEXISTS: u8 = 0x00;
pub const P_THROW_UNDEFINEDIFHOLE: u8 = 0x01;
pub const P_GETITERATOR: u8 = 0x02;
pub const P_DEBUGGER: u8 = 0x03;
pub const P_LDLEXVAR: u8 = 0x04;
pub const P_STLEXVAR: u8 = 0x05;
