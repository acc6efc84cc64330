//! Circuit construction.
//!
//! [`BytecodeCircuitBuilder`] drives the analysis in [`crate::analysis`] and
//! then emits gates into a [`crate::circuit::Circuit`]:
//!
//! ```text
//! MethodBody ─ decode ─ split ─ graph ─ dominance ─ edge counts ─ phis
//!                                                                  │
//!                  Translation ◄─ verify ◄─ resolve ◄─ emit ◄──────┘
//! ```
//!
//! Emission wires control and effect edges block by block. Value inputs that
//! read registers are recorded as pending uses and resolved once every block
//! head exists, walking the dominator tree and creating value selectors on
//! demand.
//!
//! [`translate_all`] runs independent translations on the rayon thread pool.

mod builder;
mod config;
mod pipeline;
mod resolver;

pub use config::BuilderOptions;
pub use pipeline::{translate, translate_all, BytecodeCircuitBuilder, Translation};
