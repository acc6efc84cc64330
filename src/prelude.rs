//! # bytecircuit Prelude
//!
//! The types most programs need to assemble a method, translate it and inspect
//! the result.
//!
//! ```rust
//! use bytecircuit::prelude::*;
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all bytecircuit operations
pub use crate::Error;

/// The result type used throughout bytecircuit
pub use crate::Result;

// ================================================================================================
// Entry Points
// ================================================================================================

/// Translation of one or many methods
pub use crate::{translate, translate_all, BuilderOptions, BytecodeCircuitBuilder, Translation};

// ================================================================================================
// Input
// ================================================================================================

/// Method bodies and their exception table
pub use crate::metadata::{ImplicitArgument, MethodBody, TryBlock};

/// Advisory type annotations
pub use crate::metadata::{GateType, NoTypes, TypeOracle, TypeSite, TypeTable};

/// Encoding and decoding of instructions
pub use crate::assembly::{BytecodeAssembler, BytecodeInfo, FlowType, InstructionStream, Register};

// ================================================================================================
// Output
// ================================================================================================

/// Block graph produced by the analysis phases
pub use crate::analysis::{BytecodeGraph, BytecodeRegion, EdgeKind, PredEdge};

/// The circuit and its gates
pub use crate::circuit::{Circuit, ConstantValue, Gate, GateId, GateOp, MachineType, RootKind};

/// Block identifiers
pub use crate::utils::graph::NodeId;
