//! Block boundary discovery.
//!
//! The splitter walks the decoded instructions and the exception table and
//! records where blocks must start and end. Markers are collected in any
//! order, then sorted, merged and closed:
//!
//! 1. Every jump, conditional jump, return and throw ends a block. Jump
//!    targets and the instruction after a terminator start one.
//! 2. Every try range is isolated as its own run of blocks. The block in front
//!    of it gets an explicit edge into the range, the last protected
//!    instruction gets an edge to the first instruction after it, and every
//!    handler pc starts a block.
//! 3. Markers are sorted by `(pc, kind)` and identical `(pc, kind)` pairs are
//!    merged, uniting their successor lists.
//! 4. A closure pass fills implied boundaries until nothing changes: two
//!    adjacent starts put an end on the instruction before the second, two
//!    adjacent ends put a start on the instruction after the first.
//!
//! The result alternates `Start`/`End` and the pairs tile the code exactly.

use std::fmt::{self, Write};

use strum::Display;

use crate::{
    assembly::{FlowType, InstructionStream},
    metadata::TryBlock,
    utils::graph::NodeId,
    Result,
};

/// Kind of a block boundary. Starts sort before ends at the same pc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SplitKind {
    /// First instruction of a block
    Start,
    /// Last instruction of a block
    End,
}

/// A block boundary at an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMarker {
    /// Pc of the instruction the boundary is attached to
    pub pc: u32,
    /// Start or end of a block
    pub kind: SplitKind,
    /// Successor pcs, only meaningful for [`SplitKind::End`]
    pub succs: Vec<u32>,
}

impl BoundaryMarker {
    /// A block start at `pc`.
    #[must_use]
    pub fn start(pc: u32) -> Self {
        BoundaryMarker {
            pc,
            kind: SplitKind::Start,
            succs: Vec::new(),
        }
    }

    /// A block end at `pc` with the given successors.
    #[must_use]
    pub fn end(pc: u32, succs: Vec<u32>) -> Self {
        BoundaryMarker {
            pc,
            kind: SplitKind::End,
            succs,
        }
    }

    /// Sort key; at most one marker per key survives normalization.
    #[must_use]
    pub fn key(&self) -> (u32, SplitKind) {
        (self.pc, self.kind)
    }
}

impl fmt::Display for BoundaryMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x} {}", self.pc, self.kind)?;
        if self.kind == SplitKind::End {
            write!(f, " ->")?;
            for succ in &self.succs {
                write!(f, " {succ:04x}")?;
            }
        }
        Ok(())
    }
}

/// A protected range and the handler pcs that catch exceptions raised in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryRange {
    /// First protected pc
    pub start: u32,
    /// One past the last protected pc
    pub end: u32,
    /// Handler entry pcs, in declaration order
    pub handlers: Vec<u32>,
}

impl TryRange {
    /// Returns `true` if `pc` lies in the range.
    #[must_use]
    pub fn covers(&self, pc: u32) -> bool {
        self.start <= pc && pc < self.end
    }
}

/// Output of [`BlockSplitter::split`].
#[derive(Debug, Clone)]
pub struct BlockLayout {
    /// Sorted, merged markers, alternating start and end
    pub markers: Vec<BoundaryMarker>,
    /// Try ranges sorted by `(start, end)`, duplicates merged
    pub try_ranges: Vec<TryRange>,
}

impl BlockLayout {
    /// Number of blocks described by the markers.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.markers.len() / 2
    }

    /// Iterates `(start, end)` marker pairs, one per block.
    pub fn pairs(&self) -> impl Iterator<Item = (&BoundaryMarker, &BoundaryMarker)> {
        self.markers
            .chunks_exact(2)
            .map(|pair| (&pair[0], &pair[1]))
    }

    /// Text dump of the markers and try ranges.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "markers ({}):", self.markers.len());
        for marker in &self.markers {
            let _ = writeln!(out, "  {marker}");
        }
        for range in &self.try_ranges {
            let _ = write!(out, "try [{:04x}, {:04x}) catch", range.start, range.end);
            for handler in &range.handlers {
                let _ = write!(out, " {handler:04x}");
            }
            out.push('\n');
        }
        out
    }
}

/// Collects and normalizes block boundaries for one method.
pub struct BlockSplitter<'a> {
    stream: &'a InstructionStream,
    markers: Vec<BoundaryMarker>,
    try_ranges: Vec<TryRange>,
}

impl<'a> BlockSplitter<'a> {
    /// Create a splitter over decoded instructions.
    #[must_use]
    pub fn new(stream: &'a InstructionStream) -> Self {
        BlockSplitter {
            stream,
            markers: Vec::new(),
            try_ranges: Vec::new(),
        }
    }

    /// Compute the block layout of `stream` protected by `try_blocks`.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Malformed`] for try ranges or handlers that do not
    ///   line up with instructions, and for conditional jumps without a
    ///   fall-through instruction
    /// - [`crate::Error::InvariantViolation`] if the closed markers do not tile
    ///   the code
    pub fn split(stream: &'a InstructionStream, try_blocks: &[TryBlock]) -> Result<BlockLayout> {
        let mut splitter = BlockSplitter::new(stream);
        splitter.collect_instruction_markers()?;
        splitter.collect_try_markers(try_blocks)?;
        splitter.synthesize_exit();
        splitter.close()?;
        splitter.validate()?;

        Ok(BlockLayout {
            markers: splitter.markers,
            try_ranges: splitter.try_ranges,
        })
    }

    fn collect_instruction_markers(&mut self) -> Result<()> {
        self.markers.push(BoundaryMarker::start(0));

        for instr in self.stream.instructions() {
            let next = self.stream.next_pc(instr.pc);
            match instr.flow() {
                FlowType::Jump => {
                    let target = instr.jump_target.ok_or_else(|| {
                        malformed_error!("Jump at pc {:#x} has no target", instr.pc)
                    })?;
                    self.markers.push(BoundaryMarker::end(instr.pc, vec![target]));
                    self.markers.push(BoundaryMarker::start(target));
                }
                FlowType::CondJump => {
                    let target = instr.jump_target.ok_or_else(|| {
                        malformed_error!("Jump at pc {:#x} has no target", instr.pc)
                    })?;
                    let fallthrough = next.ok_or_else(|| {
                        malformed_error!(
                            "Conditional jump at pc {:#x} falls off the end of the code",
                            instr.pc
                        )
                    })?;
                    self.markers
                        .push(BoundaryMarker::end(instr.pc, vec![fallthrough, target]));
                    self.markers.push(BoundaryMarker::start(target));
                }
                FlowType::Return | FlowType::ReturnUndefined | FlowType::Throw => {
                    self.markers.push(BoundaryMarker::end(instr.pc, Vec::new()));
                }
                FlowType::Sequential | FlowType::Move | FlowType::Constant => continue,
            }

            if let Some(next) = next {
                self.markers.push(BoundaryMarker::start(next));
            }
        }

        Ok(())
    }

    fn collect_try_markers(&mut self, try_blocks: &[TryBlock]) -> Result<()> {
        let code_len = self.stream.code_len();

        for try_block in try_blocks {
            let (start, end) = (try_block.start_pc, try_block.end_pc);
            if start >= end || end > code_len {
                return Err(malformed_error!(
                    "Try range [{:#x}, {:#x}) does not fit a method of {} bytes",
                    start,
                    end,
                    code_len
                ));
            }
            if !self.stream.is_boundary(start) || (end < code_len && !self.stream.is_boundary(end))
            {
                return Err(malformed_error!(
                    "Try range [{:#x}, {:#x}) splits an instruction",
                    start,
                    end
                ));
            }
            if let Some(handler) = try_block
                .handlers
                .iter()
                .find(|handler| !self.stream.is_boundary(**handler))
            {
                return Err(malformed_error!(
                    "Handler pc {:#x} is not an instruction boundary",
                    handler
                ));
            }

            if let Some(before) = self.stream.prev_pc(start) {
                if !self.has_end(before) {
                    self.markers.push(BoundaryMarker::end(before, vec![start]));
                }
            }
            self.markers.push(BoundaryMarker::start(start));

            let last = self.stream.prev_pc(end).ok_or_else(|| {
                malformed_error!("Try range [{:#x}, {:#x}) is empty", start, end)
            })?;
            let falls_through = self
                .stream
                .at(last)
                .is_some_and(|instr| instr.flow().falls_through());
            let exit = if falls_through && end < code_len {
                vec![end]
            } else {
                Vec::new()
            };
            match self
                .markers
                .iter()
                .position(|marker| marker.pc == last && marker.kind == SplitKind::End)
            {
                Some(index) => self.markers[index].succs.extend(exit),
                None => self.markers.push(BoundaryMarker::end(last, exit)),
            }
            if end < code_len {
                self.markers.push(BoundaryMarker::start(end));
            }

            for &handler in &try_block.handlers {
                self.markers.push(BoundaryMarker::start(handler));
            }

            self.add_try_range(start, end, &try_block.handlers);
        }

        self.try_ranges.sort_by_key(|range| (range.start, range.end));
        Ok(())
    }

    fn add_try_range(&mut self, start: u32, end: u32, handlers: &[u32]) {
        if let Some(range) = self
            .try_ranges
            .iter_mut()
            .find(|range| range.start == start && range.end == end)
        {
            for handler in handlers {
                if !range.handlers.contains(handler) {
                    range.handlers.push(*handler);
                }
            }
            return;
        }

        self.try_ranges.push(TryRange {
            start,
            end,
            handlers: handlers.to_vec(),
        });
    }

    fn has_end(&self, pc: u32) -> bool {
        self.markers
            .iter()
            .any(|marker| marker.pc == pc && marker.kind == SplitKind::End)
    }

    /// The last instruction always ends a block, even when it falls through.
    fn synthesize_exit(&mut self) {
        let last = self.stream.last_pc();
        if !self.has_end(last) {
            self.markers.push(BoundaryMarker::end(last, Vec::new()));
        }
    }

    fn sort_and_merge(&mut self) {
        let mut markers = std::mem::take(&mut self.markers);
        markers.sort_by_key(BoundaryMarker::key);

        let mut merged: Vec<BoundaryMarker> = Vec::with_capacity(markers.len());
        for marker in markers {
            match merged.last_mut() {
                Some(last) if last.key() == marker.key() => last.succs.extend(marker.succs),
                _ => merged.push(marker),
            }
        }
        for marker in &mut merged {
            marker.succs.sort_unstable();
            marker.succs.dedup();
        }

        self.markers = merged;
    }

    fn close(&mut self) -> Result<()> {
        loop {
            self.sort_and_merge();

            let mut implied = Vec::new();
            for pair in self.markers.windows(2) {
                let (first, second) = (&pair[0], &pair[1]);
                match (first.kind, second.kind) {
                    (SplitKind::Start, SplitKind::Start) => {
                        let before = self.stream.prev_pc(second.pc).ok_or_else(|| {
                            invariant_error!(
                                NodeId::new(0),
                                second.pc,
                                "block start at {:#x} has no preceding instruction",
                                second.pc
                            )
                        })?;
                        implied.push(BoundaryMarker::end(before, vec![second.pc]));
                    }
                    (SplitKind::End, SplitKind::End) => {
                        let after = self.stream.next_pc(first.pc).ok_or_else(|| {
                            invariant_error!(
                                NodeId::new(0),
                                first.pc,
                                "block end at {:#x} has no following instruction",
                                first.pc
                            )
                        })?;
                        implied.push(BoundaryMarker::start(after));
                    }
                    _ => {}
                }
            }

            if implied.is_empty() {
                return Ok(());
            }
            self.markers.extend(implied);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.markers.len() % 2 != 0 {
            return Err(invariant_error!(
                NodeId::new(self.markers.len() / 2),
                self.stream.last_pc(),
                "odd number of block markers ({})",
                self.markers.len()
            ));
        }

        let mut expected_start = 0;
        for (index, pair) in self.markers.chunks_exact(2).enumerate() {
            let (start, end) = (&pair[0], &pair[1]);
            let block = NodeId::new(index);
            if start.kind != SplitKind::Start || end.kind != SplitKind::End {
                return Err(invariant_error!(
                    block,
                    start.pc,
                    "markers do not alternate: {} followed by {}",
                    start,
                    end
                ));
            }
            if start.pc != expected_start || end.pc < start.pc {
                return Err(invariant_error!(
                    block,
                    start.pc,
                    "block [{:#x}, {:#x}] leaves a gap or overlaps, expected start {:#x}",
                    start.pc,
                    end.pc,
                    expected_start
                ));
            }
            expected_start = self
                .stream
                .at(end.pc)
                .map_or(end.pc, |instr| instr.next_pc());
        }

        if expected_start != self.stream.code_len() {
            return Err(invariant_error!(
                NodeId::new(self.markers.len() / 2),
                expected_start,
                "blocks end at {:#x}, code is {} bytes",
                expected_start,
                self.stream.code_len()
            ));
        }
        Ok(())
    }
}
