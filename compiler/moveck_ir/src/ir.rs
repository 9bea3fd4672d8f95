//! Move-checking IR: basic-block representation of a raw function body.
//!
//! The front end lowers source into this IR and attaches directive tags;
//! the move-only checker then verifies and repairs it in place.
//!
//! # Architecture
//!
//! - **[`Function`]**: one function body with its parameters, blocks, value types,
//!   linkage and directive tags
//! - **[`Block`]**: a basic block with parameters, body and terminator
//! - **[`Inst`]**: a single instruction
//! - **[`Terminator`]**: block exit (return, jump, branch, unreachable)
//!
//! Values are named via [`ValueId`] (SSA: one definition each). Memory
//! locations are ordinary values whose [`Ty`] has [`ValueClass::Address`].

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{smallvec, SmallVec};

use crate::attrs::{Directives, Linkage};
use crate::span::Span;

// ── ID newtypes ─────────────────────────────────────────────────────

/// Value ID within a [`Function`].
///
/// IDs are allocated sequentially starting from 0 and index into
/// [`Function::value_types`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ValueId(u32);

impl ValueId {
    /// Create a new value ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Basic block ID within a [`Function`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// Create a new block ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position of an instruction: block plus index into the block body.
///
/// `index == body.len()` addresses the block's terminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct InstLoc {
    pub block: BlockId,
    pub index: usize,
}

impl InstLoc {
    #[inline]
    pub fn new(block: BlockId, index: usize) -> Self {
        Self { block, index }
    }
}

// ── Types ───────────────────────────────────────────────────────────

/// Whether a value is register-like or a memory location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueClass {
    /// Register-like value, copied or moved as a whole.
    Object,
    /// Memory location whose fields may be independently initialized.
    Address,
}

/// Shape of a value, as far as move checking cares.
///
/// The checker never needs full type information: only whether the value
/// lives in a register or in memory, whether duplication is forbidden,
/// and how many independently movable fields it has.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Ty {
    pub class: ValueClass,
    pub move_only: bool,
    /// Number of top-level fields. Always at least 1.
    pub fields: u32,
}

impl Ty {
    /// A copyable scalar object.
    pub const fn copyable() -> Self {
        Ty {
            class: ValueClass::Object,
            move_only: false,
            fields: 1,
        }
    }

    /// A non-copyable object with `fields` top-level fields.
    pub const fn move_only(fields: u32) -> Self {
        Ty {
            class: ValueClass::Object,
            move_only: true,
            fields: if fields == 0 { 1 } else { fields },
        }
    }

    /// The address of a value of type `pointee`.
    pub const fn address_of(pointee: Ty) -> Self {
        Ty {
            class: ValueClass::Address,
            ..pointee
        }
    }

    /// The object stored at an address of this type.
    #[must_use]
    pub const fn pointee(self) -> Self {
        Ty {
            class: ValueClass::Object,
            ..self
        }
    }

    /// Same shape, but duplication forbidden.
    #[must_use]
    pub const fn noncopyable(self) -> Self {
        Ty {
            move_only: true,
            ..self
        }
    }

    #[inline]
    pub const fn is_address(self) -> bool {
        matches!(self.class, ValueClass::Address)
    }
}

// ── Marker check kinds ──────────────────────────────────────────────

/// Legality rule selected by an introduction marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CheckKind {
    /// May be consumed (once per path) and reassigned.
    ConsumableAndAssignable,
    /// May be reassigned but never consumed. Address-only.
    AssignableButNotConsumable,
    /// Borrowed: neither consumed nor reassigned.
    NoConsumeOrAssign,
    /// A copyable value the source asked never to copy implicitly.
    NoImplicitCopy,
    /// The front end could not determine a rule. Never analyzable.
    Invalid,
}

impl CheckKind {
    /// Whether this rule can be attached to a value of `class`.
    pub fn is_valid_for(self, class: ValueClass) -> bool {
        match self {
            CheckKind::Invalid => false,
            CheckKind::AssignableButNotConsumable => class == ValueClass::Address,
            CheckKind::ConsumableAndAssignable
            | CheckKind::NoConsumeOrAssign
            | CheckKind::NoImplicitCopy => true,
        }
    }

    /// Whether a consuming use is permitted.
    pub fn allows_consume(self) -> bool {
        matches!(
            self,
            CheckKind::ConsumableAndAssignable | CheckKind::NoImplicitCopy
        )
    }

    /// Whether the marked location may be reassigned.
    pub fn allows_assign(self) -> bool {
        !matches!(self, CheckKind::NoConsumeOrAssign | CheckKind::Invalid)
    }
}

// ── Operation kinds ─────────────────────────────────────────────────

/// How a call argument is passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Convention {
    /// Callee reads the argument; caller keeps ownership.
    Borrowed,
    /// Callee takes ownership of the argument.
    Consumed,
    /// Callee reads and writes through an address; must be initialized
    /// on entry and is initialized on return.
    Inout,
}

/// A call argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct CallArg {
    pub value: ValueId,
    pub convention: Convention,
}

impl CallArg {
    pub fn borrowed(value: ValueId) -> Self {
        Self {
            value,
            convention: Convention::Borrowed,
        }
    }

    pub fn consumed(value: ValueId) -> Self {
        Self {
            value,
            convention: Convention::Consumed,
        }
    }

    pub fn inout(value: ValueId) -> Self {
        Self {
            value,
            convention: Convention::Inout,
        }
    }
}

/// How a `Load` reads memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadKind {
    /// Implicit copy of the stored value. Illegal for move-only memory.
    Copy,
    /// Copy spelled out explicitly; legality-agnostic.
    ExplicitCopy,
    /// Move the value out, leaving the memory uninitialized.
    Take,
    /// Borrow the value in place.
    Borrow,
}

/// How a `Store` (or the destination of a `CopyAddr`) writes memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreKind {
    /// Destination is uninitialized.
    Init,
    /// Destination holds a value that is destroyed first.
    Assign,
}

/// How a `CopyAddr` reads its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CopyAddrKind {
    /// Implicit copy. Illegal for move-only memory.
    Copy,
    /// Copy spelled out explicitly; legality-agnostic.
    ExplicitCopy,
    /// Move out of the source.
    Take,
}

// ── Instructions ────────────────────────────────────────────────────

/// A single instruction in a basic block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Inst {
    /// Build a fresh owned value, consuming `args`.
    Construct { dst: ValueId, args: Vec<ValueId> },

    /// Reference another function by name. These are the references
    /// counted when deciding whether a function is unused.
    FunctionRef { dst: ValueId, name: String },

    /// Call through a function value.
    Apply {
        dst: Option<ValueId>,
        callee: ValueId,
        args: Vec<CallArg>,
    },

    /// Introduction marker: from here on `dst` (wrapping `operand`) is
    /// subject to move-only legality rules.
    Mark {
        dst: ValueId,
        operand: ValueId,
        class: ValueClass,
        check: CheckKind,
    },

    /// Implicit duplication. Illegal for move-only values.
    Copy { dst: ValueId, src: ValueId },

    /// Duplication spelled out explicitly; legality-agnostic.
    ExplicitCopy { dst: ValueId, src: ValueId },

    /// Consume `src` into `dst`.
    Move { dst: ValueId, src: ValueId },

    /// Borrow one field of an object.
    ExtractField {
        dst: ValueId,
        src: ValueId,
        field: u32,
    },

    /// End the lifetime of an owned object, if it still owns one. Values
    /// moved out on some paths only are destroyed behind a drop flag.
    Destroy { value: ValueId },

    /// Allocate an uninitialized stack slot.
    Alloc { dst: ValueId },

    /// Release a stack slot.
    Dealloc { addr: ValueId },

    /// Address of one field of a memory location.
    FieldAddr {
        dst: ValueId,
        base: ValueId,
        field: u32,
    },

    /// Read memory into an object.
    Load {
        dst: ValueId,
        src: ValueId,
        kind: LoadKind,
    },

    /// Write an object into memory, consuming it.
    Store {
        src: ValueId,
        dest: ValueId,
        kind: StoreKind,
    },

    /// Memory-to-memory transfer.
    CopyAddr {
        src: ValueId,
        dest: ValueId,
        kind: CopyAddrKind,
        dest_kind: StoreKind,
    },

    /// Destroy whatever is still initialized at an address.
    DestroyAddr { addr: ValueId },
}

impl Inst {
    /// Returns the value defined by this instruction, if any.
    pub fn defined_value(&self) -> Option<ValueId> {
        match self {
            Inst::Construct { dst, .. }
            | Inst::FunctionRef { dst, .. }
            | Inst::Mark { dst, .. }
            | Inst::Copy { dst, .. }
            | Inst::ExplicitCopy { dst, .. }
            | Inst::Move { dst, .. }
            | Inst::ExtractField { dst, .. }
            | Inst::Alloc { dst }
            | Inst::FieldAddr { dst, .. }
            | Inst::Load { dst, .. } => Some(*dst),

            Inst::Apply { dst, .. } => *dst,

            Inst::Destroy { .. }
            | Inst::Dealloc { .. }
            | Inst::Store { .. }
            | Inst::CopyAddr { .. }
            | Inst::DestroyAddr { .. } => None,
        }
    }

    /// Returns all values read by this instruction, in operand order.
    ///
    /// The `dst` of value-producing instructions is NOT included.
    pub fn used_values(&self) -> SmallVec<[ValueId; 4]> {
        match self {
            Inst::Construct { args, .. } => args.iter().copied().collect(),
            Inst::FunctionRef { .. } | Inst::Alloc { .. } => SmallVec::new(),
            Inst::Apply { callee, args, .. } => {
                let mut vals = SmallVec::with_capacity(1 + args.len());
                vals.push(*callee);
                vals.extend(args.iter().map(|a| a.value));
                vals
            }
            Inst::Mark { operand, .. } => smallvec![*operand],
            Inst::Copy { src, .. }
            | Inst::ExplicitCopy { src, .. }
            | Inst::Move { src, .. }
            | Inst::ExtractField { src, .. }
            | Inst::Load { src, .. } => smallvec![*src],
            Inst::Destroy { value } => smallvec![*value],
            Inst::Dealloc { addr } | Inst::DestroyAddr { addr } => smallvec![*addr],
            Inst::FieldAddr { base, .. } => smallvec![*base],
            Inst::Store { src, dest, .. } | Inst::CopyAddr { src, dest, .. } => {
                smallvec![*src, *dest]
            }
        }
    }

    /// Replace all occurrences of `old` with `new` in read positions.
    ///
    /// Defined values (`dst`) are NOT substituted.
    pub fn substitute_value(&mut self, old: ValueId, new: ValueId) {
        fn sub(v: &mut ValueId, old: ValueId, new: ValueId) {
            if *v == old {
                *v = new;
            }
        }
        match self {
            Inst::Construct { args, .. } => {
                for a in args {
                    sub(a, old, new);
                }
            }
            Inst::FunctionRef { .. } | Inst::Alloc { .. } => {}
            Inst::Apply { callee, args, .. } => {
                sub(callee, old, new);
                for a in args {
                    sub(&mut a.value, old, new);
                }
            }
            Inst::Mark { operand, .. } => sub(operand, old, new),
            Inst::Copy { src, .. }
            | Inst::ExplicitCopy { src, .. }
            | Inst::Move { src, .. }
            | Inst::ExtractField { src, .. }
            | Inst::Load { src, .. } => sub(src, old, new),
            Inst::Destroy { value } => sub(value, old, new),
            Inst::Dealloc { addr } | Inst::DestroyAddr { addr } => sub(addr, old, new),
            Inst::FieldAddr { base, .. } => sub(base, old, new),
            Inst::Store { src, dest, .. } | Inst::CopyAddr { src, dest, .. } => {
                sub(src, old, new);
                sub(dest, old, new);
            }
        }
    }
}

// ── Terminators ─────────────────────────────────────────────────────

/// Block terminator: how control leaves a basic block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Terminator {
    /// Return from the function, consuming the returned value.
    Return { value: Option<ValueId> },

    /// Unconditional jump, passing (consuming) arguments to block params.
    Jump { target: BlockId, args: Vec<ValueId> },

    /// Conditional branch on a copyable condition.
    Branch {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },

    /// Control never reaches the end of this block.
    Unreachable,
}

impl Terminator {
    /// Returns all values read by this terminator.
    pub fn used_values(&self) -> SmallVec<[ValueId; 4]> {
        match self {
            Terminator::Return { value } => value.iter().copied().collect(),
            Terminator::Jump { args, .. } => args.iter().copied().collect(),
            Terminator::Branch { cond, .. } => smallvec![*cond],
            Terminator::Unreachable => SmallVec::new(),
        }
    }

    /// Successor blocks, in edge order.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Terminator::Return { .. } | Terminator::Unreachable => SmallVec::new(),
            Terminator::Jump { target, .. } => smallvec![*target],
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => smallvec![*then_block, *else_block],
        }
    }

    /// Replace all occurrences of `old` with `new`.
    pub fn substitute_value(&mut self, old: ValueId, new: ValueId) {
        fn sub(v: &mut ValueId, old: ValueId, new: ValueId) {
            if *v == old {
                *v = new;
            }
        }
        match self {
            Terminator::Return { value } => {
                if let Some(v) = value {
                    sub(v, old, new);
                }
            }
            Terminator::Jump { args, .. } => {
                for a in args {
                    sub(a, old, new);
                }
            }
            Terminator::Branch { cond, .. } => sub(cond, old, new),
            Terminator::Unreachable => {}
        }
    }
}

// ── Blocks ──────────────────────────────────────────────────────────

/// A basic block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    /// This block's identifier.
    pub id: BlockId,
    /// Block parameters: values passed from predecessors via `Jump`.
    pub params: Vec<ValueId>,
    /// Sequential instructions executed in order.
    pub body: Vec<Inst>,
    /// How control leaves this block.
    pub terminator: Terminator,
}

/// Where a value is defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefSite {
    /// A function parameter.
    Param,
    /// A parameter of the given block.
    BlockParam(BlockId),
    /// The result of an instruction.
    Inst(InstLoc),
}

impl DefSite {
    /// The block the definition lives in (`None` for function params,
    /// which are live on entry).
    pub fn block(self) -> Option<BlockId> {
        match self {
            DefSite::Param => None,
            DefSite::BlockParam(b) => Some(b),
            DefSite::Inst(loc) => Some(loc.block),
        }
    }
}

/// Definition sites of every value in a function.
///
/// Well-formed IR defines each value exactly once; values defined more
/// than once are tracked separately so callers can reject them.
#[derive(Clone, Debug, Default)]
pub struct DefinitionMap {
    sites: FxHashMap<ValueId, DefSite>,
    redefined: FxHashSet<ValueId>,
}

impl DefinitionMap {
    /// The unique definition of `value`, or `None` if it has zero or
    /// several.
    pub fn unique(&self, value: ValueId) -> Option<DefSite> {
        if self.redefined.contains(&value) {
            return None;
        }
        self.sites.get(&value).copied()
    }

    fn record(&mut self, value: ValueId, site: DefSite) {
        if self.sites.insert(value, site).is_some() {
            self.redefined.insert(value);
        }
    }
}

/// Replacement contents for a function body.
///
/// Built off to the side and swapped in whole by
/// [`Function::replace_body`], so no block is ever erased from a live
/// graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Body {
    pub blocks: Vec<Block>,
    pub entry: BlockId,
    pub spans: Vec<Vec<Option<Span>>>,
}

impl Body {
    /// A single entry block containing only an `Unreachable` terminator.
    pub fn unreachable(span: Option<Span>) -> Self {
        Body {
            blocks: vec![Block {
                id: BlockId::new(0),
                params: Vec::new(),
                body: Vec::new(),
                terminator: Terminator::Unreachable,
            }],
            entry: BlockId::new(0),
            spans: vec![vec![span]],
        }
    }
}

// ── Functions ───────────────────────────────────────────────────────

/// A complete function body plus the attributes the checker consults.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    /// The function's (mangled) name.
    pub name: String,
    /// Parameters, live on entry.
    pub params: Vec<ValueId>,
    /// Basic blocks in definition order. `blocks[entry.index()]` is the entry.
    pub blocks: Vec<Block>,
    /// The entry block ID.
    pub entry: BlockId,
    /// Type of each value, indexed by `ValueId::index()`.
    pub value_types: Vec<Ty>,
    /// Source-level names, for diagnostics.
    pub value_names: FxHashMap<ValueId, String>,
    /// Source spans indexed by `[block_index][instr_index]`; each block has
    /// one extra trailing slot for its terminator.
    pub spans: Vec<Vec<Option<Span>>>,
    pub linkage: Linkage,
    /// Directive tags attached by earlier passes.
    pub directives: Directives,
    /// Set when the body was deserialized from an artifact that already
    /// passed checking.
    pub deserialized_canonical: bool,
}

impl Function {
    /// Look up the type of a value.
    ///
    /// # Panics
    ///
    /// Debug-panics if `value` is out of bounds.
    #[inline]
    pub fn value_type(&self, value: ValueId) -> Ty {
        debug_assert!(
            value.index() < self.value_types.len(),
            "ValueId {} out of bounds (have {} values)",
            value.raw(),
            self.value_types.len(),
        );
        self.value_types[value.index()]
    }

    /// Type of a value, or `None` for IDs this function never allocated.
    #[inline]
    pub fn try_value_type(&self, value: ValueId) -> Option<Ty> {
        self.value_types.get(value.index()).copied()
    }

    /// Whether duplicating `value` is forbidden.
    pub fn is_move_only(&self, value: ValueId) -> bool {
        self.try_value_type(value).is_some_and(|ty| ty.move_only)
    }

    /// Source-level name of a value, if the front end recorded one.
    pub fn value_name(&self, value: ValueId) -> Option<&str> {
        self.value_names.get(&value).map(String::as_str)
    }

    /// Allocate a fresh value with the given type.
    pub fn fresh_value(&mut self, ty: Ty) -> ValueId {
        let id = u32::try_from(self.value_types.len())
            .unwrap_or_else(|_| panic!("value count exceeds u32::MAX"));
        self.value_types.push(ty);
        ValueId::new(id)
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index()]
    }

    /// The instruction at `loc`, or `None` if `loc` is a terminator slot
    /// or out of range.
    pub fn inst(&self, loc: InstLoc) -> Option<&Inst> {
        self.blocks
            .get(loc.block.index())
            .and_then(|b| b.body.get(loc.index))
    }

    /// Mutable access to the instruction at `loc`.
    pub fn inst_mut(&mut self, loc: InstLoc) -> Option<&mut Inst> {
        self.blocks
            .get_mut(loc.block.index())
            .and_then(|b| b.body.get_mut(loc.index))
    }

    /// Source span of the instruction (or terminator) at `loc`.
    pub fn span_at(&self, loc: InstLoc) -> Span {
        self.spans
            .get(loc.block.index())
            .and_then(|s| s.get(loc.index))
            .copied()
            .flatten()
            .unwrap_or(Span::DUMMY)
    }

    /// Iterate all body instructions in block order.
    pub fn instructions(&self) -> impl Iterator<Item = (InstLoc, &Inst)> {
        self.blocks.iter().flat_map(|block| {
            block
                .body
                .iter()
                .enumerate()
                .map(move |(idx, inst)| (InstLoc::new(block.id, idx), inst))
        })
    }

    /// Total number of body instructions.
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.body.len()).sum()
    }

    /// Compute the definition site of every value.
    pub fn definitions(&self) -> DefinitionMap {
        let mut defs = DefinitionMap::default();
        for &param in &self.params {
            defs.record(param, DefSite::Param);
        }
        for block in &self.blocks {
            for &param in &block.params {
                defs.record(param, DefSite::BlockParam(block.id));
            }
            for (idx, inst) in block.body.iter().enumerate() {
                if let Some(dst) = inst.defined_value() {
                    defs.record(dst, DefSite::Inst(InstLoc::new(block.id, idx)));
                }
            }
        }
        defs
    }

    /// Replace every use of `old` with `new`, in all blocks.
    pub fn replace_all_uses(&mut self, old: ValueId, new: ValueId) {
        for block in &mut self.blocks {
            for inst in &mut block.body {
                inst.substitute_value(old, new);
            }
            block.terminator.substitute_value(old, new);
        }
    }

    /// Remove the body instructions at `indices` from `block`, keeping the
    /// span table in sync. `indices` may be unsorted and contain duplicates.
    pub fn remove_insts(&mut self, block: BlockId, indices: &[usize]) {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let body = &mut self.blocks[block.index()].body;
        let spans = &mut self.spans[block.index()];
        for &idx in sorted.iter().rev() {
            if idx < body.len() {
                body.remove(idx);
                if idx < spans.len() {
                    spans.remove(idx);
                }
            }
        }
    }

    /// Swap in a freshly built body, returning the old one.
    pub fn replace_body(&mut self, body: Body) -> Body {
        let old = Body {
            blocks: std::mem::replace(&mut self.blocks, body.blocks),
            entry: std::mem::replace(&mut self.entry, body.entry),
            spans: std::mem::replace(&mut self.spans, body.spans),
        };
        tracing::trace!(
            function = %self.name,
            old_blocks = old.blocks.len(),
            new_blocks = self.blocks.len(),
            "replaced function body"
        );
        old
    }
}

#[cfg(test)]
mod tests;
