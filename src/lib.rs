// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # bytecircuit
//!
//! Front-end IR construction for a register/accumulator bytecode: a single method's
//! variable-length bytecode plus its try/catch table is translated into a
//! sea-of-nodes SSA graph (a "circuit") ready for an optimizer or code generator.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ──decode──▶ InstructionStream ──split──▶ BlockLayout ──link──▶ BytecodeGraph
//!                                                                         │
//!            Circuit ◀──emit + resolve── phi placement ◀── dominance ◀────┘
//! ```
//!
//! - [`assembly`] - instruction table, decoder and a label-aware assembler
//! - [`analysis`] - block splitting, the block graph, dominance and phi placement
//! - [`circuit`] - the gate arena and its roots
//! - [`compiler`] - circuit emission, operand resolution and the public entry points
//! - [`metadata`] - method bodies, try blocks and the type oracle interface
//!
//! ## Quick Start
//!
//! ```rust
//! use bytecircuit::prelude::*;
//!
//! let mut asm = BytecodeAssembler::new();
//! // v0 and v1 are locals, v2..v5 hold the implicit arguments, v6 the user argument
//! asm.lda(6)?.add2(6)?.ret()?;
//! let code = asm.finish()?;
//!
//! let method = MethodBody::new(code, 2, 1);
//! let translation = translate(&method)?;
//! assert_eq!(translation.graph().live_block_count(), 1);
//! # Ok::<(), bytecircuit::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result`]. A failure aborts the translation of that
//! method as a whole, no partially built circuit is ever handed out.

#[macro_use]
pub(crate) mod error;

pub mod analysis;
pub mod assembly;
pub mod circuit;
pub mod compiler;
pub mod file;
pub mod metadata;
pub mod prelude;
pub mod utils;

pub use compiler::{translate, translate_all, BuilderOptions, BytecodeCircuitBuilder, Translation};
pub use error::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
