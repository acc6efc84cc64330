//! Exception table entries.
//!
//! A [`TryBlock`] protects a half-open pc range. When an instruction inside the
//! range throws, control transfers to the first handler; further handlers are
//! kept in declaration order. Nested try blocks are expressed as separate
//! entries with nested ranges, the innermost one wins.

/// A protected pc range and its ordered handler entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryBlock {
    /// First protected pc
    pub start_pc: u32,
    /// One past the last protected pc
    pub end_pc: u32,
    /// Handler entry pcs, in declaration order
    pub handlers: Vec<u32>,
}

impl TryBlock {
    /// Create a try block covering `[start_pc, end_pc)`.
    #[must_use]
    pub fn new(start_pc: u32, end_pc: u32, handlers: Vec<u32>) -> Self {
        TryBlock {
            start_pc,
            end_pc,
            handlers,
        }
    }

    /// Returns `true` if `pc` lies in the protected range.
    #[must_use]
    pub fn covers(&self, pc: u32) -> bool {
        self.start_pc <= pc && pc < self.end_pc
    }
}
