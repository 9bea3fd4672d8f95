//! Candidate search: collect the introduction markers of one value class.
//!
//! Every instruction is visited exactly once, in block order. Markers of
//! the requested class that fail structural validation get an E9001
//! diagnostic and stay out of the worklist; the rest are inserted in
//! first-seen order, deduplicated by marked value.

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use moveck_diagnostic::{unanalyzable_marker, DiagnosticEmitter};
use moveck_ir::{
    CheckKind, DefSite, DefinitionMap, Function, Inst, InstLoc, PostOrder, ValueClass, ValueId,
};

/// One validated introduction marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub loc: InstLoc,
    /// The marked value (the marker's result).
    pub marker: ValueId,
    /// The wrapped value or address.
    pub operand: ValueId,
    pub check: CheckKind,
}

/// Duplicate-free, insertion-ordered markers of one class.
#[derive(Clone, Debug, Default)]
pub struct Worklist {
    candidates: Vec<Candidate>,
    seen: FxHashSet<ValueId>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `candidate` unless its marker is already present.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        if !self.seen.insert(candidate.marker) {
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }
}

/// Output of [`search_candidates`].
#[derive(Clone, Debug, Default)]
pub struct SearchResult {
    pub worklist: Worklist,
    /// Whether the search itself rejected any marker.
    pub emitted_diagnostic: bool,
}

/// Why a marker cannot be analyzed.
fn validate(
    func: &Function,
    defs: &DefinitionMap,
    post_order: &PostOrder,
    marker: ValueId,
    operand: ValueId,
    class: ValueClass,
    check: CheckKind,
) -> Result<(), &'static str> {
    if func.try_value_type(marker).is_none() {
        return Err("marker result has no type");
    }
    let Some(site) = defs.unique(operand) else {
        return Err("operand has no unique definition");
    };
    let Some(ty) = func.try_value_type(operand) else {
        return Err("operand has no unique definition");
    };
    let reachable = match site {
        DefSite::Param => true,
        DefSite::BlockParam(block) => post_order.is_reachable(block),
        DefSite::Inst(loc) => post_order.is_reachable(loc.block),
    };
    if !reachable {
        return Err("operand is defined in unreachable code");
    }
    if ty.class != class {
        return Err("marker class does not match the operand");
    }
    if !check.is_valid_for(class) {
        return Err("check kind is not valid for this value class");
    }
    Ok(())
}

/// Collect the markers of `class` in `func`.
pub fn search_candidates(
    func: &Function,
    class: ValueClass,
    post_order: &PostOrder,
    emitter: &mut DiagnosticEmitter,
) -> SearchResult {
    let defs = func.definitions();
    let mut result = SearchResult::default();

    for (loc, inst) in func.instructions() {
        let Inst::Mark {
            dst,
            operand,
            class: marker_class,
            check,
        } = *inst
        else {
            continue;
        };
        if marker_class != class {
            continue;
        }
        if !post_order.is_reachable(loc.block) {
            trace!(block = loc.block.raw(), "skipping marker in unreachable block");
            continue;
        }
        if let Err(reason) = validate(func, &defs, post_order, dst, operand, class, check) {
            debug!(
                function = %func.name,
                block = loc.block.raw(),
                index = loc.index,
                reason,
                "rejecting unanalyzable marker"
            );
            emitter.record(unanalyzable_marker(func.span_at(loc), reason));
            result.emitted_diagnostic = true;
            continue;
        }
        result.worklist.insert(Candidate {
            loc,
            marker: dst,
            operand,
            check,
        });
    }

    debug!(
        function = %func.name,
        ?class,
        candidates = result.worklist.len(),
        "candidate search done"
    );
    result
}
