//! Checker configuration.

/// Options for [`check_module`](crate::check_module).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckerOptions {
    /// Whether the move-only language feature is enabled. When off, every
    /// function is left untouched.
    pub move_only_enabled: bool,
    /// Check independent functions on the rayon pool.
    pub parallel: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions {
            move_only_enabled: true,
            parallel: true,
        }
    }
}

impl CheckerOptions {
    /// Default options, checking one function at a time.
    pub fn sequential() -> Self {
        CheckerOptions {
            parallel: false,
            ..Self::default()
        }
    }
}
