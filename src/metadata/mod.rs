//! Method metadata and type information handed to the builder.
//!
//! - [`MethodBody`] / [`TryBlock`] - code, register counts and exception table
//! - [`TypeOracle`] - optional source of advisory static types

pub mod method;
pub mod types;

pub use method::{ImplicitArgument, MethodBody, TryBlock, IMPLICIT_ARGUMENTS};
pub use types::{GateType, NoTypes, TypeOracle, TypeSite, TypeTable};
