use thiserror::Error;

use crate::{assembly::Register, utils::graph::NodeId};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

macro_rules! invariant_error {
    ($block:expr, $pc:expr, $($arg:tt)*) => {
        crate::Error::InvariantViolation {
            block: $block,
            pc: $pc,
            message: format!($($arg)*),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Malformed Input
/// - [`Error::Malformed`] - Unknown opcode, truncated operand, inconsistent try table
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the code
/// - [`Error::Empty`] - A method without any instruction
/// - [`Error::UndefinedRegister`] - A register is read on a path where it was never written
///
/// ## Internal Invariants
/// - [`Error::InvariantViolation`] - A structural check failed, carries block and pc context
/// - [`Error::GraphError`] - The finished circuit failed verification
///
/// ## Assembler
/// - [`Error::InvalidMnemonic`], [`Error::UndefinedLabel`], [`Error::DuplicateLabel`],
///   [`Error::InvalidBranch`]
///
/// Every variant is fatal for the method being translated.
#[derive(Error, Debug)]
pub enum Error {
    /// The bytecode is damaged and could not be decoded.
    ///
    /// The error includes the source location where the malformation was
    /// detected for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// A structural invariant of the translation did not hold.
    ///
    /// This signals a bug in the builder or input that slipped past verification.
    /// `block` and `pc` locate the point at which the check failed.
    #[error("Invariant violated in block {block} at pc {pc:#x}: {message}")]
    InvariantViolation {
        /// Block being processed
        block: NodeId,
        /// Program counter being processed
        pc: u32,
        /// What went wrong
        message: String,
    },

    /// A register was read without any reaching definition.
    #[error("Register {register} has no definition reaching block {block} at pc {pc:#x}")]
    UndefinedRegister {
        /// The register or accumulator that could not be resolved
        register: Register,
        /// Block in which resolution gave up
        block: NodeId,
        /// Program counter of the use
        pc: u32,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// The circuit or block graph is structurally inconsistent.
    #[error("{0}")]
    GraphError(String),

    /// The assembler was asked for a mnemonic that does not exist.
    #[error("Invalid mnemonic - {0}")]
    InvalidMnemonic(String),

    /// A branch references a label that was never defined.
    #[error("Undefined label - {0}")]
    UndefinedLabel(String),

    /// A label was defined twice.
    #[error("Duplicate label - {0}")]
    DuplicateLabel(String),

    /// A branch could not be encoded.
    #[error("Invalid branch - {0}")]
    InvalidBranch(String),
}
