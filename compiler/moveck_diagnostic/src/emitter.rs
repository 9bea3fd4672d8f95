//! Per-function diagnostic accumulator.
//!
//! Both checking engines, candidate search and the fallback sweep record
//! into one emitter per function. Its count is what the orchestrator
//! consults to decide whether the fallback sweep runs.

use crate::{Diagnostic, ErrorGuaranteed};

/// Append-only diagnostic record for one function.
///
/// Unlike a rendering queue this performs no deduplication, sorting or
/// limiting: identical diagnostics are all kept, in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticEmitter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one diagnostic.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Number of diagnostics recorded so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Number of error-severity diagnostics recorded so far.
    #[inline]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Whether anything has been recorded.
    #[inline]
    pub fn emitted_diagnostic(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Proof that an error was recorded, if one was.
    pub fn guarantee(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.error_count)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
