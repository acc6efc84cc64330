//! Method-level metadata consumed by the circuit builder.

mod body;
mod exceptions;

pub use body::{ImplicitArgument, MethodBody, IMPLICIT_ARGUMENTS};
pub use exceptions::TryBlock;
