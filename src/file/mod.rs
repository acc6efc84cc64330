//! Byte-level access to method code.
//!
//! - [`Parser`] - bounds-checked cursor over a code slice
//! - [`io`] - little-endian primitive reads and writes shared by the decoder and assembler

pub mod io;
pub mod parser;

pub use parser::Parser;
