//! Reference engine for memory-location (address) markers.
//!
//! Reasons at field granularity: a `FieldAddr` projection narrows every
//! access through it to one top-level field, so moving out of `s.a` and
//! then reading `s.b` is legal while reading `s.a` again is not.
//!
//! Fresh stack slots (`Alloc` operands) start out uninitialized. Memory
//! reached through a function parameter marked `ConsumableAndAssignable`
//! belongs to the caller and must be initialized again before every
//! return.
//!
//! Rules, judged against the state just before each access:
//!
//! | access | illegal when | error |
//! |--------|--------------|-------|
//! | read or `inout` | fields uninitialized on some path, no consume reaches | E4006 |
//! | read or `inout` | fields consumed on some path | E4002 |
//! | `inout` | the check kind forbids assignment | E4004 |
//! | consume | the check kind forbids consuming | E4003 |
//! | consume | fields uninitialized on some path, no consume reaches | E4006 |
//! | consume | consumed by this same site in an earlier iteration | E4007 |
//! | consume | fields consumed on some path | E4001 |
//! | write | the check kind forbids assignment, unless initializing memory that is uninitialized on every path | E4004 |
//! | return | fields consumed on some path | E4005 |
//!
//! When a marker's uses are all legal, its implicit copies out of memory
//! are rewritten: a `Load [copy]` whose result is consumed becomes a take,
//! one whose result is only read becomes a borrow (its `Destroy`s go away),
//! and a `CopyAddr [copy]` becomes a take. `DestroyAddr`s of memory that is
//! uninitialized on every path reaching them are deleted. A `Store [assign]`
//! or `CopyAddr` assigning into memory that is uninitialized on every path
//! (typically after a take) becomes an initialization, so lowering never
//! destroys a value that is no longer there.

use tracing::debug;

use moveck_diagnostic::{
    assigned_while_borrowed, consumed_in_loop, consumed_more_than_once, consumed_while_borrowed,
    missing_reinit, used_after_consume, used_before_init, Diagnostic,
};
use moveck_ir::{
    CheckKind, CopyAddrKind, DefSite, DefinitionMap, Function, Inst, InstLoc, LoadKind, Span,
    StoreKind,
};

use crate::checker::{CheckCx, MarkerChecker, RewriteSet};
use crate::dataflow::{solve, FlowStart, StateView};
use crate::interval::FieldRange;
use crate::search::{Candidate, Worklist};
use crate::uses::{collect_address_uses, Access, CopyAccess, Effect};

/// Checker for `Address` markers.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddressChecker;

impl AddressChecker {
    pub fn new() -> Self {
        AddressChecker
    }
}

impl MarkerChecker for AddressChecker {
    fn check(&mut self, func: &mut Function, worklist: &Worklist, cx: &mut CheckCx<'_>) -> bool {
        let defs = func.definitions();
        let mut rewrites = RewriteSet::new();
        for candidate in worklist.iter() {
            check_marker(func, &defs, candidate, cx, &mut rewrites);
        }
        let changed = rewrites.apply(func);
        debug!(
            function = %func.name,
            markers = worklist.len(),
            changed,
            "address checker done"
        );
        changed
    }
}

/// Whether the marked memory starts out uninitialized.
fn starts_uninit(func: &Function, defs: &DefinitionMap, candidate: &Candidate) -> bool {
    match defs.unique(candidate.operand) {
        Some(DefSite::Inst(loc)) => matches!(func.inst(loc), Some(Inst::Alloc { .. })),
        _ => false,
    }
}

fn judge(
    func: &Function,
    candidate: &Candidate,
    whole: FieldRange,
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
    let check = candidate.check;

    match access.effect {
        Effect::Borrow(range) | Effect::Mutate(range) => {
            if matches!(access.effect, Effect::Mutate(_)) && !check.allows_assign() {
                Some(assigned_while_borrowed(name, span))
            } else if !state.maybe.overlaps(range) {
                None
            } else if state.witness.is_none() {
                Some(used_before_init(name, span))
            } else {
                Some(used_after_consume(name, span, previous))
            }
        }
        Effect::Consume(range) => {
            if !check.allows_consume() {
                Some(consumed_while_borrowed(name, span))
            } else if !state.maybe.overlaps(range) {
                None
            } else {
                match state.witness {
                    None => Some(used_before_init(name, span)),
                    Some(w) if w == access.site => Some(consumed_in_loop(name, span)),
                    Some(_) => Some(consumed_more_than_once(name, span, previous)),
                }
            }
        }
        Effect::Init { range, kind } => {
            let initializing = kind == StoreKind::Init && state.must.contains_range(range);
            if check.allows_assign() || initializing {
                None
            } else {
                Some(assigned_while_borrowed(name, span))
            }
        }
        Effect::Exit if state.maybe.overlaps(whole) => {
            Some(missing_reinit(name, span, previous))
        }
        Effect::Exit | Effect::LifetimeEnd => None,
    }
}

fn check_marker(
    func: &Function,
    defs: &DefinitionMap,
    candidate: &Candidate,
    cx: &mut CheckCx<'_>,
    rewrites: &mut RewriteSet,
) {
    let fields = func.value_type(candidate.marker).fields;
    let whole = FieldRange::whole(fields);
    let track_exit = candidate.check == CheckKind::ConsumableAndAssignable
        && func.params.contains(&candidate.operand);
    let uses = collect_address_uses(func, candidate.marker, fields, track_exit);
    let errors_before = cx.emitter.count();
    let mut dead_destroys: Vec<InstLoc> = Vec::new();
    let mut reinits: Vec<InstLoc> = Vec::new();

    let CheckCx {
        emitter,
        allocator,
        analyses,
        preds,
    } = &mut *cx;
    let start = FlowStart {
        marker: candidate.loc,
        fields,
        uninit: starts_uninit(func, defs, candidate),
        destroy_uninits: true,
    };
    solve(analyses, preds, start, &uses.accesses, allocator, |access, state| {
        if let Effect::LifetimeEnd = access.effect {
            if state.must.contains_range(whole) {
                dead_destroys.push(access.site.loc);
            }
            return;
        }
        if let Effect::Init {
            range,
            kind: StoreKind::Assign,
        } = access.effect
        {
            if state.must.contains_range(range) {
                reinits.push(access.site.loc);
            }
        }
        if let Some(diagnostic) = judge(func, candidate, whole, access, state) {
            emitter.record(diagnostic);
        }
    });

    let errors = cx.emitter.count() - errors_before;
    debug!(
        function = %func.name,
        marker = candidate.marker.raw(),
        uses = uses.accesses.len(),
        projections = uses.projections.len(),
        copies = uses.copies.len(),
        uninit = start.uninit,
        errors,
        "checked address marker"
    );
    if errors > 0 {
        return;
    }

    for copy in &uses.copies {
        match copy {
            CopyAccess::Load {
                loc,
                consumed: true,
                ..
            } => rewrites.set_load_kind(*loc, LoadKind::Take),
            CopyAccess::Load {
                loc,
                consumed: false,
                destroys,
            } => {
                rewrites.set_load_kind(*loc, LoadKind::Borrow);
                for &destroy in destroys {
                    rewrites.delete(destroy);
                }
            }
            CopyAccess::CopyAddr { loc } => rewrites.set_copy_addr_kind(*loc, CopyAddrKind::Take),
        }
    }
    for loc in dead_destroys {
        rewrites.delete(loc);
    }
    for loc in reinits {
        match func.inst(loc) {
            Some(Inst::Store { .. }) => rewrites.set_store_kind(loc, StoreKind::Init),
            Some(Inst::CopyAddr { .. }) => rewrites.set_copy_addr_dest_kind(loc, StoreKind::Init),
            _ => {}
        }
    }
}
