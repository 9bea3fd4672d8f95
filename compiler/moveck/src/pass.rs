//! The move-only checker pass for one function.
//!
//! # State machine
//!
//! ```text
//! entry gate ──disabled / already validated──────────────────▶ Gated
//!     │ (stage must be Raw, otherwise PassError)
//!     ▼
//! delete-if-unused ──unreferenced and not externally visible──▶ DeletedUnused
//!     │ (still referenced: fall through)
//!     ▼
//! no-move-only-diagnostics ──cleanup only─────────────────────▶ Suppressed
//!     │
//!     ▼
//! object search + check → address search + check
//!     → fallback sweep (only if nothing was diagnosed)
//!     → cleanup ──────────────────────────────────────────────▶ Checked
//! ```
//!
//! The change flag is a single accumulator threaded through the steps and
//! reported to the host as one invalidation at the end. Diagnostics go to
//! the host's sink, never into the return value; `Err` is reserved for
//! internal inconsistencies that must abort the compilation unit.

use std::sync::Arc;

use tracing::{debug, trace};

use moveck_diagnostic::{Diagnostic, DiagnosticEmitter};
use moveck_ir::{
    compute_predecessors, is_possibly_used_externally, Body, Directives, Function,
    FunctionAnalyses, Linkage, Stage, ValueClass,
};

use crate::address_checker::AddressChecker;
use crate::checker::{CheckCx, MarkerChecker};
use crate::interval::IntervalAllocator;
use crate::object_checker::ObjectChecker;
use crate::repair::{cleanup_copies, emit_missed_copy_errors};
use crate::search::search_candidates;

/// What the host must recompute after the pass changed a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvalidationKind {
    /// Instructions changed; the CFG did not.
    Instructions,
    /// The whole body was replaced.
    FunctionBody,
}

/// Terminal state of one pass invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckStatus {
    /// Checking was not applicable (feature off, or an already validated
    /// body).
    Gated,
    /// The body was discarded because nothing uses the function.
    DeletedUnused,
    /// Diagnostics were suppressed; only cleanup ran.
    Suppressed,
    /// Full checking ran.
    Checked,
}

/// Result of [`run_move_only_checker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassOutcome {
    /// Whether the function was modified.
    pub changed: bool,
    pub status: CheckStatus,
}

impl PassOutcome {
    fn new(changed: bool, status: CheckStatus) -> Self {
        PassOutcome { changed, status }
    }
}

/// Internal inconsistency that aborts processing of the unit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PassError {
    #[error("move checker ran on `{function}` at the {stage} stage; it only runs on raw IR")]
    NotRawStage { function: String, stage: Stage },
}

/// Services the pass pipeline provides to the checker.
pub trait PassHost {
    /// Whether the move-only language feature is enabled.
    fn move_only_enabled(&self) -> bool;

    /// Lowering stage of the enclosing module.
    fn stage(&self) -> Stage;

    /// Whether this compilation unit is the whole module.
    fn is_whole_module(&self) -> bool;

    /// Number of references to the function named `name` in the module.
    fn reference_count(&self, name: &str) -> usize;

    /// Cached dominance and post-order analyses for `func`.
    fn analyses(&mut self, func: &Function) -> Arc<FunctionAnalyses>;

    /// Report that `func` changed.
    fn invalidate(&mut self, func: &Function, kind: InvalidationKind);

    /// Hand over the diagnostics produced for `func`, in discovery order.
    fn emit_diagnostics(&mut self, func: &Function, diagnostics: Vec<Diagnostic>);
}

/// Check `func` with the reference object and address engines.
pub fn run_move_only_checker(
    func: &mut Function,
    host: &mut dyn PassHost,
) -> Result<PassOutcome, PassError> {
    run_move_only_checker_with(func, host, &mut ObjectChecker, &mut AddressChecker)
}

/// Check `func` with the given engines.
pub fn run_move_only_checker_with<'e>(
    func: &mut Function,
    host: &mut dyn PassHost,
    object_checker: &'e mut dyn MarkerChecker,
    address_checker: &'e mut dyn MarkerChecker,
) -> Result<PassOutcome, PassError> {
    if !host.move_only_enabled() {
        trace!(function = %func.name, "move-only checking disabled");
        return Ok(PassOutcome::new(false, CheckStatus::Gated));
    }
    if func.deserialized_canonical {
        trace!(function = %func.name, "body already validated");
        return Ok(PassOutcome::new(false, CheckStatus::Gated));
    }
    let stage = host.stage();
    if stage != Stage::Raw {
        return Err(PassError::NotRawStage {
            function: func.name.clone(),
            stage,
        });
    }

    if func.directives.contains(Directives::DELETE_IF_UNUSED) {
        let refs = host.reference_count(&func.name);
        let external = is_possibly_used_externally(func.linkage, host.is_whole_module());
        if refs == 0 && !external {
            delete_body(func);
            host.invalidate(func, InvalidationKind::FunctionBody);
            return Ok(PassOutcome::new(true, CheckStatus::DeletedUnused));
        }
        debug!(
            function = %func.name,
            refs,
            external,
            "delete-if-unused function is still used; checking"
        );
    }

    if func.directives.contains(Directives::NO_MOVE_ONLY_DIAGNOSTICS) {
        let changed = cleanup_copies(func);
        debug!(function = %func.name, changed, "diagnostics suppressed; cleanup only");
        if changed {
            host.invalidate(func, InvalidationKind::Instructions);
        }
        return Ok(PassOutcome::new(changed, CheckStatus::Suppressed));
    }

    let analyses = host.analyses(func);
    let preds = compute_predecessors(func);
    let mut emitter = DiagnosticEmitter::new();
    let mut allocator = IntervalAllocator::new();
    let mut changed = false;

    for (class, checker) in [
        (ValueClass::Object, object_checker),
        (ValueClass::Address, address_checker),
    ] {
        let search = search_candidates(func, class, &analyses.post_order, &mut emitter);
        if search.emitted_diagnostic {
            debug!(function = %func.name, ?class, "search rejected markers");
        }
        if search.worklist.is_empty() {
            continue;
        }
        let mut cx = CheckCx {
            emitter: &mut emitter,
            allocator: &mut allocator,
            analyses: &analyses,
            preds: &preds,
        };
        changed |= checker.check(func, &search.worklist, &mut cx);
    }

    if !emitter.emitted_diagnostic() {
        emit_missed_copy_errors(func, &mut emitter);
    }
    changed |= cleanup_copies(func);
    allocator.reset();

    debug!(
        function = %func.name,
        diagnostics = emitter.count(),
        changed,
        "move-only check complete"
    );
    if !emitter.diagnostics().is_empty() {
        host.emit_diagnostics(func, emitter.into_diagnostics());
    }
    if changed {
        host.invalidate(func, InvalidationKind::Instructions);
    }
    Ok(PassOutcome::new(changed, CheckStatus::Checked))
}

/// Swap in a body that is a single `Unreachable` block, located at the
/// first instruction of the entry block.
fn delete_body(func: &mut Function) {
    let span = func
        .spans
        .get(func.entry.index())
        .and_then(|s| s.first().copied().flatten());
    func.replace_body(Body::unreachable(span));
    if func.linkage == Linkage::Shared {
        func.linkage = Linkage::Private;
    }
    debug!(function = %func.name, linkage = ?func.linkage, "deleted unused function body");
}

#[cfg(test)]
mod tests;
