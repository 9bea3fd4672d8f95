//! Shared test utilities for the checker modules.
//!
//! Short ID constructors, a recording [`PassHost`], a helper that runs one
//! engine the way the orchestrator does, and a few fixture functions used
//! across the `search`, engine, `pass` and `driver` tests. Only compiled
//! in test builds.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use moveck_diagnostic::{Diagnostic, DiagnosticEmitter, ErrorCode};
use moveck_ir::{
    compute_predecessors, BlockId, CallArg, CheckKind, Function, FunctionAnalyses,
    FunctionBuilder, InstLoc, Span, Stage, Ty, ValueClass, ValueId,
};

use crate::checker::{CheckCx, MarkerChecker};
use crate::interval::IntervalAllocator;
use crate::pass::{InvalidationKind, PassHost};
use crate::search::search_candidates;

/// Shorthand for `ValueId::new(n)`.
pub(crate) fn v(n: u32) -> ValueId {
    ValueId::new(n)
}

/// Shorthand for `BlockId::new(n)`.
pub(crate) fn b(n: u32) -> BlockId {
    BlockId::new(n)
}

/// Shorthand for `InstLoc::new(b(block), index)`.
pub(crate) fn loc(block: u32, index: usize) -> InstLoc {
    InstLoc::new(b(block), index)
}

/// Error codes of `diagnostics`, in order.
pub(crate) fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
    diagnostics.iter().map(|d| d.code).collect()
}

/// Run candidate search and `checker` for `class`, as the orchestrator
/// would. Returns the change flag and the diagnostics, search included.
pub(crate) fn run_engine(
    func: &mut Function,
    class: ValueClass,
    checker: &mut dyn MarkerChecker,
) -> (bool, Vec<Diagnostic>) {
    let analyses = FunctionAnalyses::compute(func);
    let preds = compute_predecessors(func);
    let mut emitter = DiagnosticEmitter::new();
    let mut allocator = IntervalAllocator::new();
    let search = search_candidates(func, class, &analyses.post_order, &mut emitter);
    let mut cx = CheckCx {
        emitter: &mut emitter,
        allocator: &mut allocator,
        analyses: &analyses,
        preds: &preds,
    };
    let changed = checker.check(func, &search.worklist, &mut cx);
    assert_eq!(allocator.live_count(), 0, "engine leaked interval sets");
    (changed, emitter.into_diagnostics())
}

/// A [`PassHost`] that records everything the pass reports.
pub(crate) struct TestHost {
    pub enabled: bool,
    pub stage: Stage,
    pub whole_module: bool,
    pub ref_counts: FxHashMap<String, usize>,
    pub invalidations: Vec<InvalidationKind>,
    pub diagnostics: Vec<Diagnostic>,
    pub analyses_requests: usize,
}

impl Default for TestHost {
    fn default() -> Self {
        TestHost {
            enabled: true,
            stage: Stage::Raw,
            whole_module: true,
            ref_counts: FxHashMap::default(),
            invalidations: Vec::new(),
            diagnostics: Vec::new(),
            analyses_requests: 0,
        }
    }
}

impl TestHost {
    pub(crate) fn with_refs(name: &str, count: usize) -> Self {
        let mut host = Self::default();
        host.ref_counts.insert(name.to_owned(), count);
        host
    }
}

impl PassHost for TestHost {
    fn move_only_enabled(&self) -> bool {
        self.enabled
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn is_whole_module(&self) -> bool {
        self.whole_module
    }

    fn reference_count(&self, name: &str) -> usize {
        self.ref_counts.get(name).copied().unwrap_or(0)
    }

    fn analyses(&mut self, func: &Function) -> Arc<FunctionAnalyses> {
        self.analyses_requests += 1;
        Arc::new(FunctionAnalyses::compute(func))
    }

    fn invalidate(&mut self, _func: &Function, kind: InvalidationKind) {
        self.invalidations.push(kind);
    }

    fn emit_diagnostics(&mut self, _func: &Function, diagnostics: Vec<Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }
}

// Fixtures

/// `x` marked consumable, passed to a consuming call twice.
pub(crate) fn double_consume(name: &str) -> Function {
    let mut fb = FunctionBuilder::new(name);
    let p = fb.param(Ty::move_only(1));
    fb.set_span(Some(Span::new(10, 11)));
    let x = fb.mark(p, CheckKind::ConsumableAndAssignable);
    fb.name_value(x, "x");
    let sink = fb.function_ref("sink");
    fb.set_span(Some(Span::new(20, 27)));
    fb.apply(sink, vec![CallArg::consumed(x)], None);
    fb.set_span(Some(Span::new(30, 37)));
    fb.apply(sink, vec![CallArg::consumed(x)], None);
    fb.set_span(None);
    fb.ret(None);
    fb.finish()
}

/// `x` marked consumable, implicitly copied, the copy borrowed, and `x`
/// consumed once. Legal; the copy is redundant.
pub(crate) fn borrow_then_consume(name: &str) -> Function {
    let mut fb = FunctionBuilder::new(name);
    let p = fb.param(Ty::move_only(1));
    let x = fb.mark(p, CheckKind::ConsumableAndAssignable);
    let c = fb.copy(x);
    let f = fb.function_ref("inspect");
    fb.apply(f, vec![CallArg::borrowed(c)], None);
    fb.destroy(c);
    let sink = fb.function_ref("sink");
    fb.apply(sink, vec![CallArg::consumed(x)], None);
    fb.ret(None);
    fb.finish()
}

/// An implicit copy of a move-only parameter with no marker at all, so no
/// engine ever looks at it.
pub(crate) fn unmarked_copy(name: &str) -> Function {
    let mut fb = FunctionBuilder::new(name);
    let p = fb.param(Ty::move_only(1));
    fb.name_value(p, "p");
    fb.set_span(Some(Span::new(5, 9)));
    let c = fb.copy(p);
    fb.set_span(None);
    let sink = fb.function_ref("sink");
    fb.apply(sink, vec![CallArg::consumed(c)], None);
    fb.apply(sink, vec![CallArg::consumed(p)], None);
    fb.ret(None);
    fb.finish()
}
