//! Error codes for move-checking diagnostics.
//!
//! Each code is a unique identifier (e.g., `E4001`) with the first digit
//! indicating the category. Used for `--explain` lookups and documentation.

use std::fmt;

/// Error codes for move-checking diagnostics.
///
/// Format: E#### where the first digit indicates the category:
/// - E4xxx: move-only legality errors (user errors)
/// - E9xxx: internal checker errors (compiler bugs surfaced to the user)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum ErrorCode {
    // Move-only Legality Errors (E4xxx)
    /// Value consumed more than once
    E4001,
    /// Value used after being consumed
    E4002,
    /// Borrowed or non-consumable value consumed
    E4003,
    /// Non-assignable value assigned
    E4004,
    /// Missing reinitialization before function exit
    E4005,
    /// Memory used before initialization
    E4006,
    /// Value consumed inside a loop
    E4007,

    // Internal Errors (E9xxx)
    /// Introduction marker the checker cannot analyze
    E9001,
    /// Copy of a noncopyable value missed by the checker
    E9002,
}

impl ErrorCode {
    /// Every code, in numeric order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E4001,
        ErrorCode::E4002,
        ErrorCode::E4003,
        ErrorCode::E4004,
        ErrorCode::E4005,
        ErrorCode::E4006,
        ErrorCode::E4007,
        ErrorCode::E9001,
        ErrorCode::E9002,
    ];

    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E4001 => "E4001",
            ErrorCode::E4002 => "E4002",
            ErrorCode::E4003 => "E4003",
            ErrorCode::E4004 => "E4004",
            ErrorCode::E4005 => "E4005",
            ErrorCode::E4006 => "E4006",
            ErrorCode::E4007 => "E4007",
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
        }
    }

    /// Check if this is a move-only legality error (E4xxx range).
    pub fn is_move_error(&self) -> bool {
        !self.is_internal_error()
    }

    /// Check if this is an internal checker error (E9xxx range).
    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9001 | ErrorCode::E9002)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E4001"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
