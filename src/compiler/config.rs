//! Builder configuration.

/// Options controlling one translation.
///
/// # Examples
///
/// ```rust
/// use bytecircuit::BuilderOptions;
///
/// let options = BuilderOptions::default().with_trace(true);
/// assert!(options.trace);
/// assert!(options.verify);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Emit the marker list, block graph, dominance data and per-block
    /// bytecode-to-gate mapping through `tracing` at debug level.
    /// Purely observational.
    pub trace: bool,

    /// Check that every gate input was wired once construction is done
    /// (default: true)
    pub verify: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            trace: false,
            verify: true,
        }
    }
}

impl BuilderOptions {
    /// Default options with trace dumps enabled.
    #[must_use]
    pub fn tracing() -> Self {
        Self {
            trace: true,
            ..Self::default()
        }
    }

    /// Enable or disable trace dumps.
    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Enable or disable the final circuit check.
    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}
