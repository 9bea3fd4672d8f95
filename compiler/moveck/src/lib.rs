//! Move-only checker pass.
//!
//! Enforces non-copyable value semantics over raw function bodies and
//! repairs the IR so later stages see well-formed input even when the
//! program is rejected.
//!
//! - **Orchestration** ([`run_move_only_checker`]): the per-function state
//!   machine (gates, `delete-if-unused`, `no-move-only-diagnostics`,
//!   checking, fallback sweep, repair) talking to the pipeline through
//!   [`PassHost`].
//! - **Candidate search** ([`search_candidates`]): the validated,
//!   duplicate-free [`Worklist`] of introduction markers of one class.
//! - **Engines** ([`ObjectChecker`], [`AddressChecker`]): implementations of
//!   [`MarkerChecker`] built on a field-sensitive may/must dataflow
//!   ([`dataflow`]) over allocator-backed interval sets ([`interval`]).
//! - **Repair** ([`cleanup_copies`], [`emit_missed_copy_errors`]).
//! - **Module driver** ([`check_module`]): every function of a module,
//!   optionally in parallel, collected into a [`ModuleReport`].
//!
//! Set `RUST_LOG=moveck=debug` and call [`init_tracing`] to see per-marker
//! decisions.

pub mod address_checker;
pub mod checker;
pub mod dataflow;
pub mod driver;
pub mod interval;
pub mod object_checker;
mod options;
pub mod pass;
pub mod repair;
pub mod search;
pub mod uses;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use address_checker::AddressChecker;
pub use checker::{CheckCx, MarkerChecker, RewriteSet};
pub use driver::{check_module, FunctionReport, ModuleReport};
pub use interval::{FieldRange, IntervalAllocator, IntervalId, IntervalSet};
pub use object_checker::ObjectChecker;
pub use options::CheckerOptions;
pub use pass::{
    run_move_only_checker, run_move_only_checker_with, CheckStatus, InvalidationKind, PassError,
    PassHost, PassOutcome,
};
pub use repair::{cleanup_copies, emit_missed_copy_errors, implicit_copies};
pub use search::{search_candidates, Candidate, SearchResult, Worklist};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset, and only ever initializes once,
/// so tests and embedders may call it freely.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
