//! Sea-of-nodes circuit representation.
//!
//! A [`Circuit`] is an arena of [`Gate`]s addressed by [`GateId`]. Every gate
//! has three ordered input lists:
//!
//! - **state** - control flow (block entries, projections, returns)
//! - **depend** - effect ordering between operations with side effects
//! - **value** - data operands
//!
//! The circuit starts with six fixed roots ([`RootKind`]). Constants, argument
//! and return gates hang off their respective root list.

#[allow(clippy::module_inception)]
mod circuit;
mod gate;

pub use circuit::{Circuit, RootKind};
pub use gate::{ConstantValue, Gate, GateId, GateOp, MachineType};
