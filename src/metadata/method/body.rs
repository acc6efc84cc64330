//! Method bodies.
//!
//! A [`MethodBody`] bundles everything the circuit builder needs to know about
//! one method: its code, how many local registers and user arguments it has,
//! and its try blocks.
//!
//! # Register numbering
//!
//! Registers `v0 .. v{num_vregs}` are locals. The registers that follow name
//! the argument gates one-to-one: first the four implicit arguments in
//! [`ImplicitArgument`] order, then the user arguments.
//!
//! ```text
//! num_vregs = 2, num_args = 1
//!   v0 v1 | v2      v3          v4    v5             | v6
//!   locals| callee  new-target  this  actual-argc    | arg 0
//! ```

use strum::{Display, EnumCount, EnumIter};

use crate::{assembly::Register, metadata::method::TryBlock, Error, Result};

/// Arguments every method receives ahead of its declared ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
#[strum(serialize_all = "snake_case")]
pub enum ImplicitArgument {
    /// The function object being called
    Callee,
    /// `new.target`
    NewTarget,
    /// The receiver
    This,
    /// Number of arguments actually passed by the caller
    ActualArgc,
}

impl ImplicitArgument {
    /// Argument gate slot of this implicit argument.
    #[must_use]
    pub const fn slot(self) -> u16 {
        self as u16
    }
}

/// Number of implicit leading argument slots.
#[allow(clippy::cast_possible_truncation)]
pub const IMPLICIT_ARGUMENTS: u16 = ImplicitArgument::COUNT as u16;

/// One method as handed to the circuit builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    /// Encoded instructions
    pub code: Vec<u8>,
    /// Number of local registers
    pub num_vregs: u16,
    /// Number of declared arguments, excluding the implicit ones
    pub num_args: u16,
    /// Exception table
    pub try_blocks: Vec<TryBlock>,
}

impl MethodBody {
    /// Create a method without try blocks.
    #[must_use]
    pub fn new(code: Vec<u8>, num_vregs: u16, num_args: u16) -> Self {
        MethodBody {
            code,
            num_vregs,
            num_args,
            try_blocks: Vec::new(),
        }
    }

    /// Add a try block.
    #[must_use]
    pub fn with_try_block(mut self, try_block: TryBlock) -> Self {
        self.try_blocks.push(try_block);
        self
    }

    /// Total number of argument gates, implicit ones included.
    #[must_use]
    pub fn argument_count(&self) -> usize {
        usize::from(IMPLICIT_ARGUMENTS) + usize::from(self.num_args)
    }

    /// Argument gate slot named by `register`, if it names one.
    #[must_use]
    pub fn argument_slot(&self, register: Register) -> Option<u16> {
        let Register::Virtual(index) = register else {
            return None;
        };
        let slot = index.checked_sub(self.num_vregs)?;
        (usize::from(slot) < self.argument_count()).then_some(slot)
    }

    /// Register that holds user argument `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `index` is not a declared argument
    /// or the register number overflows.
    pub fn user_argument_register(&self, index: u16) -> Result<u16> {
        if index >= self.num_args {
            return Err(malformed_error!(
                "argument {} out of range, method declares {}",
                index,
                self.num_args
            ));
        }
        self.num_vregs
            .checked_add(IMPLICIT_ARGUMENTS)
            .and_then(|base| base.checked_add(index))
            .ok_or_else(|| Error::Error(format!("argument register {index} overflows")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_numbering() {
        let method = MethodBody::new(vec![], 2, 1);
        assert_eq!(method.argument_count(), 5);
        assert_eq!(method.argument_slot(Register::Virtual(1)), None);
        assert_eq!(
            method.argument_slot(Register::Virtual(2)),
            Some(ImplicitArgument::Callee.slot())
        );
        assert_eq!(
            method.argument_slot(Register::Virtual(5)),
            Some(ImplicitArgument::ActualArgc.slot())
        );
        assert_eq!(method.argument_slot(Register::Virtual(6)), Some(4));
        assert_eq!(method.argument_slot(Register::Virtual(7)), None);
        assert_eq!(method.argument_slot(Register::Accumulator), None);
        assert_eq!(method.user_argument_register(0).expect("declared"), 6);
        assert!(method.user_argument_register(1).is_err());
    }
}
