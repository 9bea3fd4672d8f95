//! The seam between the orchestrator and the checking engines.
//!
//! An engine receives a worklist together with a [`CheckCx`]. The context
//! carries the per-invocation state (the diagnostic emitter, the interval
//! allocator and the host's analyses), so engines never reach for global
//! state.
//!
//! Engines analyze every marker against the unmodified body first, then
//! apply their edits in one batch through a [`RewriteSet`]. Instruction
//! locations collected during analysis therefore stay valid until the
//! batch is applied.

use rustc_hash::FxHashMap;

use moveck_diagnostic::DiagnosticEmitter;
use moveck_ir::{
    BlockId, CopyAddrKind, Function, FunctionAnalyses, Inst, InstLoc, LoadKind, StoreKind,
    ValueId,
};

use crate::interval::IntervalAllocator;
use crate::search::Worklist;

/// Per-invocation state shared by both engines for one function.
pub struct CheckCx<'a> {
    pub emitter: &'a mut DiagnosticEmitter,
    pub allocator: &'a mut IntervalAllocator,
    pub analyses: &'a FunctionAnalyses,
    /// Predecessor lists, indexed by block.
    pub preds: &'a [Vec<usize>],
}

/// A checking engine for one value class.
pub trait MarkerChecker {
    /// Check every marker in `worklist`. For each one, either prove all
    /// its uses legal or emit at least one diagnostic.
    ///
    /// Returns whether the body was modified.
    fn check(&mut self, func: &mut Function, worklist: &Worklist, cx: &mut CheckCx<'_>) -> bool;
}

/// One deferred edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rewrite {
    ReplaceUses { old: ValueId, new: ValueId },
    SetLoadKind { loc: InstLoc, kind: LoadKind },
    SetCopyAddrKind { loc: InstLoc, kind: CopyAddrKind },
    SetStoreKind { loc: InstLoc, kind: StoreKind },
    SetCopyAddrDestKind { loc: InstLoc, kind: StoreKind },
    Delete(InstLoc),
}

/// Edits collected while analyzing, applied together afterwards.
#[derive(Clone, Debug, Default)]
pub struct RewriteSet {
    rewrites: Vec<Rewrite>,
}

impl RewriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rewrites.len()
    }

    pub fn replace_uses(&mut self, old: ValueId, new: ValueId) {
        self.rewrites.push(Rewrite::ReplaceUses { old, new });
    }

    pub fn set_load_kind(&mut self, loc: InstLoc, kind: LoadKind) {
        self.rewrites.push(Rewrite::SetLoadKind { loc, kind });
    }

    pub fn set_copy_addr_kind(&mut self, loc: InstLoc, kind: CopyAddrKind) {
        self.rewrites.push(Rewrite::SetCopyAddrKind { loc, kind });
    }

    pub fn set_store_kind(&mut self, loc: InstLoc, kind: StoreKind) {
        self.rewrites.push(Rewrite::SetStoreKind { loc, kind });
    }

    /// Change how a `CopyAddr` treats its destination.
    pub fn set_copy_addr_dest_kind(&mut self, loc: InstLoc, kind: StoreKind) {
        self.rewrites.push(Rewrite::SetCopyAddrDestKind { loc, kind });
    }

    pub fn delete(&mut self, loc: InstLoc) {
        self.rewrites.push(Rewrite::Delete(loc));
    }

    /// Apply every edit to `func`. Deletions run last, grouped per block,
    /// so the other edits see the locations they were recorded with.
    ///
    /// Returns whether anything changed.
    pub fn apply(self, func: &mut Function) -> bool {
        let mut changed = false;
        let mut deletions: FxHashMap<BlockId, Vec<usize>> = FxHashMap::default();

        for rewrite in self.rewrites {
            match rewrite {
                Rewrite::ReplaceUses { old, new } => {
                    func.replace_all_uses(old, new);
                    changed = true;
                }
                Rewrite::SetLoadKind { loc, kind } => {
                    if let Some(Inst::Load { kind: k, .. }) = func.inst_mut(loc) {
                        changed |= *k != kind;
                        *k = kind;
                    }
                }
                Rewrite::SetCopyAddrKind { loc, kind } => {
                    if let Some(Inst::CopyAddr { kind: k, .. }) = func.inst_mut(loc) {
                        changed |= *k != kind;
                        *k = kind;
                    }
                }
                Rewrite::SetStoreKind { loc, kind } => {
                    if let Some(Inst::Store { kind: k, .. }) = func.inst_mut(loc) {
                        changed |= *k != kind;
                        *k = kind;
                    }
                }
                Rewrite::SetCopyAddrDestKind { loc, kind } => {
                    if let Some(Inst::CopyAddr { dest_kind: k, .. }) = func.inst_mut(loc) {
                        changed |= *k != kind;
                        *k = kind;
                    }
                }
                Rewrite::Delete(loc) => deletions.entry(loc.block).or_default().push(loc.index),
            }
        }

        let mut blocks: Vec<_> = deletions.into_iter().collect();
        blocks.sort_unstable_by_key(|(block, _)| *block);
        for (block, indices) in blocks {
            let before = func.block(block).body.len();
            func.remove_insts(block, &indices);
            changed |= func.block(block).body.len() != before;
        }
        changed
    }
}
