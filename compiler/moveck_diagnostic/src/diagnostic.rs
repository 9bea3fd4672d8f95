//! Core diagnostic types and the move-checking message catalog.
//!
//! Defines [`Diagnostic`], [`Label`] and [`Severity`], plus one factory
//! function per [`ErrorCode`] so every engine words the same error the
//! same way.

use std::fmt;

use moveck_ir::Span;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A labeled span with a message.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    /// The source location to highlight.
    pub span: Span,
    /// The label text explaining this location.
    pub message: String,
    /// Whether this is the primary error location.
    pub is_primary: bool,
}

impl Label {
    /// Create a primary label (the main error location).
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Label {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a secondary label (related context).
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Label {
            span,
            message: message.into(),
            is_primary: false,
        }
    }
}

/// A diagnostic with all context needed to render it.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    /// Error code for searchability.
    pub code: ErrorCode,
    /// Severity level.
    pub severity: Severity,
    /// Main error message.
    pub message: String,
    /// Labeled spans showing where the error occurred.
    pub labels: Vec<Label>,
    /// Additional notes providing context.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    #[cold]
    pub fn error(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Error)
    }

    /// Create a new warning diagnostic.
    #[cold]
    pub fn warning(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Warning)
    }

    /// Set the main message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a primary label at the error location.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label for context.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Add a note providing additional context.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Get the primary span (first primary label's span).
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.iter().find(|l| l.is_primary).map(|l| l.span)
    }

    /// Check if this is an error (vs warning/note).
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?;

        for label in &self.labels {
            let marker = if label.is_primary { "-->" } else { "   " };
            write!(f, "\n  {} {:?}: {}", marker, label.span, label.message)?;
        }

        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }

        Ok(())
    }
}

// Message catalog

/// Render a value's source name for a message, falling back to a generic
/// noun for compiler temporaries.
fn describe(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("`{name}`"),
        None => "value".to_owned(),
    }
}

/// E4001: a value consumed on a path where it may already be consumed.
#[cold]
pub fn consumed_more_than_once(name: Option<&str>, span: Span, previous: Span) -> Diagnostic {
    let what = describe(name);
    Diagnostic::error(ErrorCode::E4001)
        .with_message(format!("{what} consumed more than once"))
        .with_label(span, "consumed again here")
        .with_secondary_label(previous, "first consumed here")
}

/// E4002: a value read after it may have been consumed.
#[cold]
pub fn used_after_consume(name: Option<&str>, span: Span, consumed: Span) -> Diagnostic {
    let what = describe(name);
    Diagnostic::error(ErrorCode::E4002)
        .with_message(format!("{what} used after being consumed"))
        .with_label(span, "used here")
        .with_secondary_label(consumed, "consumed here")
}

/// E4003: a consuming use of a value whose rule forbids consumption.
#[cold]
pub fn consumed_while_borrowed(name: Option<&str>, span: Span) -> Diagnostic {
    let what = describe(name);
    Diagnostic::error(ErrorCode::E4003)
        .with_message(format!("{what} is borrowed and cannot be consumed"))
        .with_label(span, "consumed here")
        .with_note("borrowed values may be read but not moved out of")
}

/// E4004: an assignment to a location whose rule forbids reassignment.
#[cold]
pub fn assigned_while_borrowed(name: Option<&str>, span: Span) -> Diagnostic {
    let what = describe(name);
    Diagnostic::error(ErrorCode::E4004)
        .with_message(format!("{what} is borrowed and cannot be reassigned"))
        .with_label(span, "assigned here")
}

/// E4005: an inout location left consumed at function exit.
#[cold]
pub fn missing_reinit(name: Option<&str>, exit: Span, consumed: Span) -> Diagnostic {
    let what = describe(name);
    Diagnostic::error(ErrorCode::E4005)
        .with_message(format!("{what} must be reinitialized before the function returns"))
        .with_label(exit, "function returns here")
        .with_secondary_label(consumed, "consumed here")
        .with_note("the caller expects the location to hold a value again on return")
}

/// E4006: memory read before anything was stored into it.
#[cold]
pub fn used_before_init(name: Option<&str>, span: Span) -> Diagnostic {
    let what = describe(name);
    Diagnostic::error(ErrorCode::E4006)
        .with_message(format!("{what} used before being initialized"))
        .with_label(span, "used here")
}

/// E4007: a value consumed in a loop body, so a later iteration would
/// consume it again.
#[cold]
pub fn consumed_in_loop(name: Option<&str>, span: Span) -> Diagnostic {
    let what = describe(name);
    Diagnostic::error(ErrorCode::E4007)
        .with_message(format!("{what} consumed inside a loop"))
        .with_label(span, "consumed here, in a previous iteration of the loop")
        .with_note("reinitialize it before the next iteration, or consume it after the loop")
}

/// E9001: an introduction marker the checker cannot analyze.
#[cold]
pub fn unanalyzable_marker(span: Span, reason: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E9001)
        .with_message("move checker could not analyze a noncopyable value")
        .with_label(span, reason.to_owned())
        .with_note("this is a compiler bug; please report it")
}

/// E9002: an implicit copy of a noncopyable value no engine flagged.
#[cold]
pub fn missed_copy(name: Option<&str>, span: Span) -> Diagnostic {
    let what = describe(name);
    Diagnostic::error(ErrorCode::E9002)
        .with_message(format!("move checker failed to diagnose a copy of noncopyable {what}"))
        .with_label(span, "copied here")
        .with_note("this is a compiler bug; please report it")
}

#[cfg(test)]
mod tests;
