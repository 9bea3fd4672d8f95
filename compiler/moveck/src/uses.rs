//! Use classification for marked values.
//!
//! Given a marked value, find every instruction that touches it (directly,
//! through implicit copies for objects, or through field projections for
//! addresses) and classify the touch as an [`Effect`] on a field range.
//! The dataflow solver only ever sees these [`Access`] lists.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use moveck_ir::{
    BlockId, Convention, CopyAddrKind, Function, Inst, InstLoc, LoadKind, StoreKind, Terminator,
    ValueId,
};

use crate::interval::FieldRange;

/// One operand position of one instruction.
///
/// Orders by block, then instruction, then operand, so a sorted access
/// list follows program text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Site {
    pub loc: InstLoc,
    pub operand: u32,
}

impl Site {
    #[inline]
    #[expect(clippy::cast_possible_truncation, reason = "operand counts fit in u32")]
    pub fn new(loc: InstLoc, operand: usize) -> Self {
        Site {
            loc,
            operand: operand as u32,
        }
    }
}

/// What an access does to the tracked fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Reads the fields in place.
    Borrow(FieldRange),
    /// Reads and writes the fields in place (`inout`).
    Mutate(FieldRange),
    /// Moves the fields out.
    Consume(FieldRange),
    /// Writes fresh values into the fields.
    Init { range: FieldRange, kind: StoreKind },
    /// Ends the lifetime of whatever the value still owns.
    LifetimeEnd,
    /// Function exit, for locations that must be initialized on return.
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Access {
    pub site: Site,
    pub effect: Effect,
}

/// Implicit copy of memory that the address checker may turn into a
/// borrow or a take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyAccess {
    /// `Load [copy]`. `consumed` records whether the loaded value is ever
    /// consumed; `destroys` are its `Destroy` sites.
    Load {
        loc: InstLoc,
        consumed: bool,
        destroys: SmallVec<[InstLoc; 2]>,
    },
    /// `CopyAddr [copy]`, always a transfer of ownership.
    CopyAddr { loc: InstLoc },
}

fn terminator_loc(func: &Function, block: BlockId) -> InstLoc {
    InstLoc::new(block, func.block(block).body.len())
}

// Objects

/// Uses of a marked object and of the implicit copies made from it.
#[derive(Clone, Debug, Default)]
pub struct ObjectUses {
    /// Implicit copies of the value: location and copied result.
    pub copies: Vec<(InstLoc, ValueId)>,
    /// `Destroy` of the value or of any copy, in program order.
    pub destroys: Vec<InstLoc>,
    /// Accesses to the value (or any copy), in program order.
    pub accesses: Vec<Access>,
}

/// Compute the transitive set of implicit copies rooted at `root`.
fn object_aliases(func: &Function, root: ValueId) -> FxHashSet<ValueId> {
    let mut aliases = FxHashSet::default();
    aliases.insert(root);
    let mut changed = true;
    while changed {
        changed = false;
        for (_, inst) in func.instructions() {
            if let Inst::Copy { dst, src } = inst {
                if aliases.contains(src) {
                    changed |= aliases.insert(*dst);
                }
            }
        }
    }
    aliases
}

/// Classify every use of the marked object `root`, which has `fields`
/// top-level fields.
pub fn collect_object_uses(func: &Function, root: ValueId, fields: u32) -> ObjectUses {
    let aliases = object_aliases(func, root);
    let whole = FieldRange::whole(fields);
    let mut uses = ObjectUses::default();

    for block in &func.blocks {
        for (idx, inst) in block.body.iter().enumerate() {
            let loc = InstLoc::new(block.id, idx);
            let mut push = |operand: usize, effect: Effect| {
                uses.accesses.push(Access {
                    site: Site::new(loc, operand),
                    effect,
                });
            };
            match inst {
                Inst::Copy { dst, src } if aliases.contains(src) => {
                    uses.copies.push((loc, *dst));
                }
                Inst::Destroy { value } if aliases.contains(value) => {
                    uses.destroys.push(loc);
                    push(0, Effect::LifetimeEnd);
                }
                Inst::ExtractField { src, field, .. } if aliases.contains(src) => {
                    let range = if *field < fields {
                        FieldRange::single(*field)
                    } else {
                        whole
                    };
                    push(0, Effect::Borrow(range));
                }
                Inst::Apply { callee, args, .. } => {
                    if aliases.contains(callee) {
                        push(0, Effect::Borrow(whole));
                    }
                    for (i, arg) in args.iter().enumerate() {
                        if !aliases.contains(&arg.value) {
                            continue;
                        }
                        let effect = match arg.convention {
                            Convention::Borrowed => Effect::Borrow(whole),
                            Convention::Consumed | Convention::Inout => Effect::Consume(whole),
                        };
                        push(i + 1, effect);
                    }
                }
                _ => {
                    let consuming = matches!(
                        inst,
                        Inst::Construct { .. }
                            | Inst::Move { .. }
                            | Inst::Store { .. }
                            | Inst::Mark { .. }
                    );
                    for (i, value) in inst.used_values().iter().enumerate() {
                        if !aliases.contains(value) {
                            continue;
                        }
                        // `Store` consumes its source but only addresses its destination.
                        let effect = if consuming && !matches!(inst, Inst::Store { .. } if i == 1) {
                            Effect::Consume(whole)
                        } else {
                            Effect::Borrow(whole)
                        };
                        push(i, effect);
                    }
                }
            }
        }

        let loc = terminator_loc(func, block.id);
        let consuming = !matches!(block.terminator, Terminator::Branch { .. });
        for (i, value) in block.terminator.used_values().iter().enumerate() {
            if aliases.contains(value) {
                let effect = if consuming {
                    Effect::Consume(whole)
                } else {
                    Effect::Borrow(whole)
                };
                uses.accesses.push(Access {
                    site: Site::new(loc, i),
                    effect,
                });
            }
        }
    }

    uses
}

// Addresses

/// Uses of a marked address and of the field projections derived from it.
#[derive(Clone, Debug, Default)]
pub struct AddressUses {
    /// Field range addressed by each projection (the root included).
    pub projections: FxHashMap<ValueId, FieldRange>,
    /// Implicit copies out of the tracked memory.
    pub copies: Vec<CopyAccess>,
    /// `DestroyAddr` of the root, in program order.
    pub destroys: Vec<InstLoc>,
    /// Accesses to the memory, in program order.
    pub accesses: Vec<Access>,
}

fn address_projections(
    func: &Function,
    root: ValueId,
    fields: u32,
) -> FxHashMap<ValueId, FieldRange> {
    let whole = FieldRange::whole(fields);
    let mut projections = FxHashMap::default();
    projections.insert(root, whole);
    let mut changed = true;
    while changed {
        changed = false;
        for (_, inst) in func.instructions() {
            let Inst::FieldAddr { dst, base, field } = inst else {
                continue;
            };
            if projections.contains_key(dst) {
                continue;
            }
            let range = if *base == root {
                if *field < fields {
                    FieldRange::single(*field)
                } else {
                    whole
                }
            } else if let Some(&base_range) = projections.get(base) {
                // Nested projections stay within their top-level field.
                base_range
            } else {
                continue;
            };
            projections.insert(*dst, range);
            changed = true;
        }
    }
    projections
}

/// Whether `value` is ever consumed, and where it is destroyed.
fn object_fate(func: &Function, value: ValueId) -> (bool, SmallVec<[InstLoc; 2]>) {
    let mut consumed = false;
    let mut destroys = SmallVec::new();
    for block in &func.blocks {
        for (idx, inst) in block.body.iter().enumerate() {
            match inst {
                Inst::Destroy { value: v } if *v == value => {
                    destroys.push(InstLoc::new(block.id, idx));
                }
                Inst::Apply { args, .. } => {
                    consumed |= args
                        .iter()
                        .any(|a| a.value == value && a.convention != Convention::Borrowed);
                }
                Inst::Construct { args, .. } => consumed |= args.contains(&value),
                Inst::Copy { src, .. }
                | Inst::Move { src, .. }
                | Inst::Store { src, .. }
                | Inst::Mark { operand: src, .. } => consumed |= *src == value,
                _ => {}
            }
        }
        if !matches!(block.terminator, Terminator::Branch { .. }) {
            consumed |= block.terminator.used_values().contains(&value);
        }
    }
    (consumed, destroys)
}

/// Classify every use of the marked address `root`, which has `fields`
/// top-level fields. With `track_exit`, every `Return` also gets an
/// [`Effect::Exit`] access.
pub fn collect_address_uses(
    func: &Function,
    root: ValueId,
    fields: u32,
    track_exit: bool,
) -> AddressUses {
    let projections = address_projections(func, root, fields);
    let mut uses = AddressUses::default();

    for block in &func.blocks {
        for (idx, inst) in block.body.iter().enumerate() {
            let loc = InstLoc::new(block.id, idx);
            let mut push = |operand: usize, effect: Effect| {
                uses.accesses.push(Access {
                    site: Site::new(loc, operand),
                    effect,
                });
            };
            match inst {
                Inst::Load { dst, src, kind } => {
                    let Some(&range) = projections.get(src) else {
                        continue;
                    };
                    let effect = match kind {
                        LoadKind::Copy => {
                            let (consumed, destroys) = object_fate(func, *dst);
                            uses.copies.push(CopyAccess::Load {
                                loc,
                                consumed,
                                destroys,
                            });
                            if consumed {
                                Effect::Consume(range)
                            } else {
                                Effect::Borrow(range)
                            }
                        }
                        LoadKind::ExplicitCopy | LoadKind::Borrow => Effect::Borrow(range),
                        LoadKind::Take => Effect::Consume(range),
                    };
                    push(0, effect);
                }
                Inst::CopyAddr {
                    src,
                    dest,
                    kind,
                    dest_kind,
                } => {
                    if let Some(&range) = projections.get(src) {
                        let effect = match kind {
                            CopyAddrKind::Copy => {
                                uses.copies.push(CopyAccess::CopyAddr { loc });
                                Effect::Consume(range)
                            }
                            CopyAddrKind::ExplicitCopy => Effect::Borrow(range),
                            CopyAddrKind::Take => Effect::Consume(range),
                        };
                        push(0, effect);
                    }
                    if let Some(&range) = projections.get(dest) {
                        push(
                            1,
                            Effect::Init {
                                range,
                                kind: *dest_kind,
                            },
                        );
                    }
                }
                Inst::Store { src, dest, kind } => {
                    if let Some(&range) = projections.get(src) {
                        push(0, Effect::Borrow(range));
                    }
                    if let Some(&range) = projections.get(dest) {
                        push(1, Effect::Init { range, kind: *kind });
                    }
                }
                Inst::Apply { callee, args, .. } => {
                    if let Some(&range) = projections.get(callee) {
                        push(0, Effect::Borrow(range));
                    }
                    for (i, arg) in args.iter().enumerate() {
                        let Some(&range) = projections.get(&arg.value) else {
                            continue;
                        };
                        let effect = match arg.convention {
                            Convention::Borrowed => Effect::Borrow(range),
                            Convention::Consumed => Effect::Consume(range),
                            Convention::Inout => Effect::Mutate(range),
                        };
                        push(i + 1, effect);
                    }
                }
                Inst::DestroyAddr { addr } => {
                    if *addr == root {
                        uses.destroys.push(loc);
                        push(0, Effect::LifetimeEnd);
                    } else if let Some(&range) = projections.get(addr) {
                        push(0, Effect::Consume(range));
                    }
                }
                Inst::FieldAddr { .. } | Inst::Dealloc { .. } | Inst::Mark { .. } => {}
                _ => {
                    for (i, value) in inst.used_values().iter().enumerate() {
                        if let Some(&range) = projections.get(value) {
                            push(i, Effect::Borrow(range));
                        }
                    }
                }
            }
        }

        let loc = terminator_loc(func, block.id);
        let used = block.terminator.used_values();
        for (i, value) in used.iter().enumerate() {
            if let Some(&range) = projections.get(value) {
                uses.accesses.push(Access {
                    site: Site::new(loc, i),
                    effect: Effect::Borrow(range),
                });
            }
        }
        if track_exit && matches!(block.terminator, Terminator::Return { .. }) {
            uses.accesses.push(Access {
                site: Site::new(loc, used.len()),
                effect: Effect::Exit,
            });
        }
    }

    uses.projections = projections;
    uses
}
