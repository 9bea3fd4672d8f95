//! Forward field-state dataflow over a marker's dominance region.
//!
//! For one marked value, tracks two field sets per program point:
//!
//! - **maybe**: fields consumed (or uninitialized) on *some* path here
//! - **must**: fields consumed (or uninitialized) on *every* path here
//!
//! plus a *witness*: the earliest consuming site that reaches the point.
//! Joins union `maybe`, intersect `must` and keep the smallest witness.
//!
//! The region is every reachable block dominated by the marker's block;
//! in the marker's own block only accesses after the marker count. The
//! solver iterates in reverse post-order to a fixpoint, then replays each
//! block once with the final entry states, handing every access and the
//! state just before it to a visitor. Visits therefore happen in
//! reverse post-order, each exactly once, so diagnostics come out in a
//! stable order.
//!
//! All sets live in the shared [`IntervalAllocator`] and are released
//! before returning.

use rustc_hash::{FxHashMap, FxHashSet};

use moveck_ir::{BlockId, FunctionAnalyses, InstLoc};

use crate::interval::{FieldRange, IntervalAllocator, IntervalId, IntervalSet};
use crate::uses::{Access, Effect, Site};

/// Field state at one program point, backed by allocator handles.
#[derive(Clone, Copy, Debug)]
struct FlowState {
    maybe: IntervalId,
    must: IntervalId,
    witness: Option<Site>,
}

impl FlowState {
    fn initial(alloc: &mut IntervalAllocator, fields: u32, uninit: bool) -> Self {
        let range = if uninit {
            FieldRange::whole(fields)
        } else {
            FieldRange::new(0, 0)
        };
        FlowState {
            maybe: alloc.allocate(range),
            must: alloc.allocate(range),
            witness: None,
        }
    }

    fn duplicate(self, alloc: &mut IntervalAllocator) -> Self {
        let maybe = alloc.allocate_empty();
        let must = alloc.allocate_empty();
        alloc.copy_into(maybe, self.maybe);
        alloc.copy_into(must, self.must);
        FlowState {
            maybe,
            must,
            witness: self.witness,
        }
    }

    fn join(&mut self, alloc: &mut IntervalAllocator, other: FlowState) {
        alloc.union_into(self.maybe, other.maybe);
        alloc.intersect_into(self.must, other.must);
        self.witness = match (self.witness, other.witness) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        };
    }

    /// Overwrite `self` with `other`. Returns whether anything changed.
    fn assign(&mut self, alloc: &mut IntervalAllocator, other: FlowState) -> bool {
        let mut changed = alloc.copy_into(self.maybe, other.maybe);
        changed |= alloc.copy_into(self.must, other.must);
        if self.witness != other.witness {
            self.witness = other.witness;
            changed = true;
        }
        changed
    }

    fn release(self, alloc: &mut IntervalAllocator) {
        alloc.release(self.maybe);
        alloc.release(self.must);
    }

    fn transfer(&mut self, alloc: &mut IntervalAllocator, access: &Access, start: &FlowStart) {
        match access.effect {
            Effect::Consume(range) => self.mark_gone(alloc, range, access.site),
            Effect::LifetimeEnd if start.destroy_uninits => {
                self.mark_gone(alloc, FieldRange::whole(start.fields), access.site);
            }
            Effect::Init { range, .. } => {
                let mut now_empty = false;
                if let Some(maybe) = alloc.get_mut(self.maybe) {
                    maybe.remove(range);
                    now_empty = maybe.is_empty();
                }
                if let Some(must) = alloc.get_mut(self.must) {
                    must.remove(range);
                }
                if now_empty {
                    self.witness = None;
                }
            }
            Effect::Borrow(_) | Effect::Mutate(_) | Effect::LifetimeEnd | Effect::Exit => {}
        }
    }

    fn mark_gone(&mut self, alloc: &mut IntervalAllocator, range: FieldRange, site: Site) {
        if let Some(maybe) = alloc.get_mut(self.maybe) {
            maybe.insert(range);
        }
        if let Some(must) = alloc.get_mut(self.must) {
            must.insert(range);
        }
        self.witness = Some(site);
    }
}

/// Read-only view of the state just before an access.
#[derive(Clone, Copy, Debug)]
pub struct StateView<'a> {
    pub maybe: &'a IntervalSet,
    pub must: &'a IntervalSet,
    pub witness: Option<Site>,
}

/// Where and how the tracked value starts out.
#[derive(Clone, Copy, Debug)]
pub struct FlowStart {
    /// Location of the introduction marker.
    pub marker: InstLoc,
    /// Number of top-level fields.
    pub fields: u32,
    /// Whether the fields start out uninitialized (fresh stack slots).
    pub uninit: bool,
    /// Whether a [`Effect::LifetimeEnd`] leaves the fields uninitialized.
    /// Off for objects: a destroy of one alias says nothing about the
    /// others.
    pub destroy_uninits: bool,
}

/// Run the solver and visit every access in the marker's region.
///
/// `accesses` must be sorted by site.
pub fn solve<F>(
    analyses: &FunctionAnalyses,
    preds: &[Vec<usize>],
    start: FlowStart,
    accesses: &[Access],
    alloc: &mut IntervalAllocator,
    mut visit: F,
) where
    F: FnMut(&Access, StateView<'_>),
{
    let marker_block = start.marker.block;
    let region: Vec<BlockId> = analyses
        .post_order
        .reverse()
        .filter(|&b| analyses.dom_tree.dominates(marker_block, b))
        .collect();
    if region.is_empty() {
        return;
    }

    let mut by_block: FxHashMap<BlockId, Vec<&Access>> = FxHashMap::default();
    for access in accesses {
        let loc = access.site.loc;
        if loc.block == marker_block && loc.index <= start.marker.index {
            continue;
        }
        by_block.entry(loc.block).or_default().push(access);
    }

    let in_region: FxHashSet<BlockId> = region.iter().copied().collect();
    let mut outs: FxHashMap<BlockId, FlowState> = FxHashMap::default();

    let entry_state = |block: BlockId,
                       outs: &FxHashMap<BlockId, FlowState>,
                       alloc: &mut IntervalAllocator|
     -> Option<FlowState> {
        if block == marker_block {
            return Some(FlowState::initial(alloc, start.fields, start.uninit));
        }
        let mut state: Option<FlowState> = None;
        for &pred in &preds[block.index()] {
            #[expect(clippy::cast_possible_truncation, reason = "block counts fit in u32")]
            let pred = BlockId::new(pred as u32);
            if !in_region.contains(&pred) {
                continue;
            }
            let Some(&out) = outs.get(&pred) else {
                continue;
            };
            match state.as_mut() {
                None => state = Some(out.duplicate(alloc)),
                Some(s) => s.join(alloc, out),
            }
        }
        state
    };

    // Fixpoint over block exit states.
    let mut changed = true;
    while changed {
        changed = false;
        for &block in &region {
            let Some(mut state) = entry_state(block, &outs, alloc) else {
                continue;
            };
            for access in by_block.get(&block).into_iter().flatten() {
                state.transfer(alloc, access, &start);
            }
            match outs.get_mut(&block) {
                Some(out) => {
                    changed |= out.assign(alloc, state);
                    state.release(alloc);
                }
                None => {
                    outs.insert(block, state);
                    changed = true;
                }
            }
        }
    }

    // Replay with final entry states.
    for &block in &region {
        let Some(mut state) = entry_state(block, &outs, alloc) else {
            continue;
        };
        for access in by_block.get(&block).into_iter().flatten() {
            if let (Some(maybe), Some(must)) = (alloc.get(state.maybe), alloc.get(state.must)) {
                visit(
                    access,
                    StateView {
                        maybe,
                        must,
                        witness: state.witness,
                    },
                );
            }
            state.transfer(alloc, access, &start);
        }
        state.release(alloc);
    }

    for (_, out) in outs {
        out.release(alloc);
    }
}
