//! Reference engine for register-like (object) markers.
//!
//! The marked value and every implicit copy made from it are treated as
//! one value. Each use is classified, the field-state solver runs over the
//! marker's dominance region, and every use is judged against the state
//! just before it:
//!
//! | use | illegal when | error |
//! |-----|--------------|-------|
//! | borrow | some path already consumed the fields | E4002 |
//! | consume | the check kind forbids consuming | E4003 |
//! | consume | some path consumed the fields in an earlier iteration of the same site | E4007 |
//! | consume | some path already consumed the fields | E4001 |
//!
//! A `Destroy` of the value or of a copy is not a use: it only releases
//! whatever the value still owns, so the other aliases stay usable after it.
//!
//! A marker whose uses are all legal is repaired in place: its implicit
//! copies are forwarded to the marked value and deleted. Once the aliases
//! are one value, a `Destroy` survives only where that value ends. It is
//! deleted when the value is consumed on every path reaching it, or when
//! any other access of the value can still run after it.

use rustc_hash::FxHashSet;
use tracing::debug;

use moveck_diagnostic::{
    consumed_in_loop, consumed_more_than_once, consumed_while_borrowed, used_after_consume,
    Diagnostic,
};
use moveck_ir::{BlockId, Function, InstLoc, Span};

use crate::checker::{CheckCx, MarkerChecker, RewriteSet};
use crate::dataflow::{solve, FlowStart, StateView};
use crate::interval::FieldRange;
use crate::search::{Candidate, Worklist};
use crate::uses::{collect_object_uses, Access, Effect};

/// Checker for `Object` markers.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectChecker;

impl ObjectChecker {
    pub fn new() -> Self {
        ObjectChecker
    }
}

impl MarkerChecker for ObjectChecker {
    fn check(&mut self, func: &mut Function, worklist: &Worklist, cx: &mut CheckCx<'_>) -> bool {
        let mut rewrites = RewriteSet::new();
        for candidate in worklist.iter() {
            check_marker(func, candidate, cx, &mut rewrites);
        }
        let changed = rewrites.apply(func);
        debug!(
            function = %func.name,
            markers = worklist.len(),
            changed,
            "object checker done"
        );
        changed
    }
}

/// Judge one access against the state before it.
fn judge(
    func: &Function,
    candidate: &Candidate,
    access: &Access,
    state: StateView<'_>,
) -> Option<Diagnostic> {
    let name = func
        .value_name(candidate.marker)
        .or_else(|| func.value_name(candidate.operand));
    let span = func.span_at(access.site.loc);
    let previous = state
        .witness
        .map_or(Span::DUMMY, |w| func.span_at(w.loc));

    match access.effect {
        Effect::Borrow(range) | Effect::Mutate(range) if state.maybe.overlaps(range) => {
            Some(used_after_consume(name, span, previous))
        }
        Effect::Consume(range) => {
            if !candidate.check.allows_consume() {
                Some(consumed_while_borrowed(name, span))
            } else if !state.maybe.overlaps(range) {
                None
            } else if state.witness == Some(access.site) {
                Some(consumed_in_loop(name, span))
            } else {
                Some(consumed_more_than_once(name, span, previous))
            }
        }
        _ => None,
    }
}

fn check_marker(
    func: &Function,
    candidate: &Candidate,
    cx: &mut CheckCx<'_>,
    rewrites: &mut RewriteSet,
) {
    let fields = func.value_type(candidate.marker).fields;
    let whole = FieldRange::whole(fields);
    let uses = collect_object_uses(func, candidate.marker, fields);
    let errors_before = cx.emitter.count();
    let mut dead_destroys: Vec<InstLoc> = Vec::new();
    let mut live_destroys: Vec<InstLoc> = Vec::new();

    let CheckCx {
        emitter,
        allocator,
        analyses,
        preds,
    } = &mut *cx;
    let start = FlowStart {
        marker: candidate.loc,
        fields,
        uninit: false,
        destroy_uninits: false,
    };
    solve(analyses, preds, start, &uses.accesses, allocator, |access, state| {
        if let Effect::LifetimeEnd = access.effect {
            if state.must.contains_range(whole) {
                dead_destroys.push(access.site.loc);
            } else {
                live_destroys.push(access.site.loc);
            }
            return;
        }
        if let Some(diagnostic) = judge(func, candidate, access, state) {
            emitter.record(diagnostic);
        }
    });

    let errors = cx.emitter.count() - errors_before;
    debug!(
        function = %func.name,
        marker = candidate.marker.raw(),
        uses = uses.accesses.len(),
        copies = uses.copies.len(),
        destroys = uses.destroys.len(),
        errors,
        "checked object marker"
    );
    if errors > 0 {
        return;
    }

    for &(loc, copy) in &uses.copies {
        rewrites.replace_uses(copy, candidate.marker);
        rewrites.delete(loc);
    }
    for loc in dead_destroys {
        rewrites.delete(loc);
    }
    for loc in live_destroys {
        if accessed_after(func, &uses.accesses, loc) {
            rewrites.delete(loc);
        }
    }
}

/// Blocks reachable through at least one edge out of `from`. Contains
/// `from` itself when it sits in a loop.
fn reachable_from(func: &Function, from: BlockId) -> FxHashSet<BlockId> {
    let mut seen = FxHashSet::default();
    let mut stack: Vec<BlockId> = func.block(from).terminator.successors().to_vec();
    while let Some(block) = stack.pop() {
        if seen.insert(block) {
            stack.extend(func.block(block).terminator.successors());
        }
    }
    seen
}

/// Whether some access other than the one at `loc` can execute after it.
fn accessed_after(func: &Function, accesses: &[Access], loc: InstLoc) -> bool {
    let later = reachable_from(func, loc.block);
    accesses.iter().any(|access| {
        let at = access.site.loc;
        at != loc
            && ((at.block == loc.block && at.index > loc.index) || later.contains(&at.block))
    })
}
