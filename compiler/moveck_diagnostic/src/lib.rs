//! Diagnostic system for the move-only checker.
//!
//! - Error codes for searchability ([`ErrorCode`])
//! - Clear messages and labeled spans ([`Diagnostic`], [`Label`])
//! - A per-function, append-only [`DiagnosticEmitter`]
//!
//! # Error Guarantees
//!
//! [`ErrorGuaranteed`] is type-level proof that at least one error was
//! emitted, so a module whose functions produced errors cannot report
//! success.
//!
//! ```text
//! let guarantee = emitter.guarantee();   // Some(_) iff an error was recorded
//! fn check_module() -> Result<(), ErrorGuaranteed> { ... }
//! ```

mod diagnostic;
mod emitter;
mod error_code;
mod guarantee;

pub use diagnostic::{
    assigned_while_borrowed, consumed_in_loop, consumed_more_than_once, consumed_while_borrowed,
    missed_copy, missing_reinit, unanalyzable_marker, used_after_consume, used_before_init,
    Diagnostic, Label, Severity,
};
pub use emitter::DiagnosticEmitter;
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
