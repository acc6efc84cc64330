//! Control-flow discovery for bytecode methods.
//!
//! - [`BlockSplitter`] finds block boundaries from instructions and try ranges
//! - [`BytecodeGraph`] materializes the blocks, links them, prunes dead code
//!   and stores dominance information on each [`BytecodeRegion`]
//!
//! # Examples
//!
//! ```rust
//! use bytecircuit::analysis::cfg::{BlockSplitter, BytecodeGraph};
//! use bytecircuit::assembly::{BytecodeAssembler, InstructionStream};
//!
//! let mut asm = BytecodeAssembler::new();
//! asm.lda(0)?.jeqz("skip")?.inc()?.label("skip")?.ret()?;
//! let code = asm.finish()?;
//!
//! let stream = InstructionStream::decode(&code)?;
//! let layout = BlockSplitter::split(&stream, &[])?;
//! let mut graph = BytecodeGraph::build(&layout, &stream)?;
//! graph.analyze_dominance();
//!
//! assert_eq!(graph.live_block_count(), 3);
//! # Ok::<(), bytecircuit::Error>(())
//! ```

mod graph;
mod region;
mod splitter;

pub use graph::BytecodeGraph;
pub use region::{BytecodeRegion, EdgeKind, PredEdge};
pub use splitter::{BlockLayout, BlockSplitter, BoundaryMarker, SplitKind, TryRange};
