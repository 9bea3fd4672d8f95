//! Type-level proof that at least one error was emitted.

use std::fmt;

/// Proof that an error diagnostic was emitted.
///
/// Can only be obtained from a non-zero error count, so a function that
/// returns `Err(ErrorGuaranteed)` cannot fail silently.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorGuaranteed(());

impl ErrorGuaranteed {
    /// Returns a guarantee iff `count > 0`.
    pub fn from_error_count(count: usize) -> Option<Self> {
        (count > 0).then_some(ErrorGuaranteed(()))
    }
}

impl fmt::Display for ErrorGuaranteed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error(s) emitted")
    }
}

impl std::error::Error for ErrorGuaranteed {}
