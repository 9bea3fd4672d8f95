//! Builder for constructing [`Function`] bodies.
//!
//! Follows the "position at a block, emit instructions, terminate" pattern
//! of LLVM's `IRBuilder`. Front ends lower through it, and tests use it to
//! write small functions without spelling out every ID by hand.

use rustc_hash::FxHashMap;

use crate::attrs::{Directives, Linkage};
use crate::ir::{
    Block, BlockId, CallArg, CheckKind, CopyAddrKind, Function, Inst, LoadKind, StoreKind,
    Terminator, Ty, ValueClass, ValueId,
};
use crate::span::Span;

/// In-progress basic block.
struct BlockBuilder {
    id: BlockId,
    params: Vec<ValueId>,
    body: Vec<Inst>,
    spans: Vec<Option<Span>>,
    terminator: Option<(Terminator, Option<Span>)>,
}

impl BlockBuilder {
    fn new(id: BlockId) -> Self {
        Self {
            id,
            params: Vec::new(),
            body: Vec::new(),
            spans: Vec::new(),
            terminator: None,
        }
    }
}

/// Builder for an in-progress function.
///
/// Consumed by [`finish`](FunctionBuilder::finish). Blocks left without a
/// terminator are closed with `Unreachable`.
pub struct FunctionBuilder {
    name: String,
    params: Vec<ValueId>,
    blocks: Vec<BlockBuilder>,
    current_block: BlockId,
    value_types: Vec<Ty>,
    value_names: FxHashMap<ValueId, String>,
    linkage: Linkage,
    directives: Directives,
    span: Option<Span>,
}

impl FunctionBuilder {
    /// Create a builder with an entry block already allocated.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            blocks: vec![BlockBuilder::new(BlockId::new(0))],
            current_block: BlockId::new(0),
            value_types: Vec::new(),
            value_names: FxHashMap::default(),
            linkage: Linkage::default(),
            directives: Directives::empty(),
            span: None,
        }
    }

    // Attributes

    pub fn set_linkage(&mut self, linkage: Linkage) -> &mut Self {
        self.linkage = linkage;
        self
    }

    pub fn add_directives(&mut self, directives: Directives) -> &mut Self {
        self.directives |= directives;
        self
    }

    /// Attach `span` to every instruction emitted until the next call.
    pub fn set_span(&mut self, span: Option<Span>) -> &mut Self {
        self.span = span;
        self
    }

    /// Record a source-level name for `value`.
    pub fn name_value(&mut self, value: ValueId, name: impl Into<String>) -> &mut Self {
        self.value_names.insert(value, name.into());
        self
    }

    // Block management

    /// Allocate a new empty block and return its ID.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "block indices never exceed u32"
    )]
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(BlockBuilder::new(id));
        id
    }

    /// Set the current insertion point to the given block.
    pub fn position_at(&mut self, block: BlockId) {
        debug_assert!(
            block.index() < self.blocks.len(),
            "BlockId {} out of bounds (have {} blocks)",
            block.raw(),
            self.blocks.len(),
        );
        self.current_block = block;
    }

    #[inline]
    pub fn current_block(&self) -> BlockId {
        self.current_block
    }

    /// Get the entry block (always block 0).
    #[inline]
    pub fn entry_block(&self) -> BlockId {
        BlockId::new(0)
    }

    // Value allocation

    /// Allocate a fresh value with the given type.
    pub fn fresh_value(&mut self, ty: Ty) -> ValueId {
        let id = u32::try_from(self.value_types.len())
            .unwrap_or_else(|_| panic!("value count exceeds u32::MAX"));
        self.value_types.push(ty);
        ValueId::new(id)
    }

    /// Add a function parameter.
    pub fn param(&mut self, ty: Ty) -> ValueId {
        let value = self.fresh_value(ty);
        self.params.push(value);
        value
    }

    /// Add a block parameter and return the value bound to it.
    pub fn block_param(&mut self, block: BlockId, ty: Ty) -> ValueId {
        let value = self.fresh_value(ty);
        self.blocks[block.index()].params.push(value);
        value
    }

    // Instruction emission

    /// Append a raw instruction to the current block.
    pub fn emit(&mut self, inst: Inst) {
        let span = self.span;
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "emitting into terminated block {}",
            block.id.raw()
        );
        block.body.push(inst);
        block.spans.push(span);
    }

    pub fn construct(&mut self, ty: Ty, args: Vec<ValueId>) -> ValueId {
        let dst = self.fresh_value(ty);
        self.emit(Inst::Construct { dst, args });
        dst
    }

    pub fn function_ref(&mut self, name: impl Into<String>) -> ValueId {
        let dst = self.fresh_value(Ty::copyable());
        self.emit(Inst::FunctionRef {
            dst,
            name: name.into(),
        });
        dst
    }

    /// Call `callee`. Returns the result value when `result` is given.
    pub fn apply(
        &mut self,
        callee: ValueId,
        args: Vec<CallArg>,
        result: Option<Ty>,
    ) -> Option<ValueId> {
        let dst = result.map(|ty| self.fresh_value(ty));
        self.emit(Inst::Apply { dst, callee, args });
        dst
    }

    /// Emit an introduction marker whose class follows the operand's type.
    ///
    /// The marked value is always move-only, even when the operand's type
    /// is copyable (`NoImplicitCopy`).
    pub fn mark(&mut self, operand: ValueId, check: CheckKind) -> ValueId {
        let class = self.value_types[operand.index()].class;
        self.mark_as(operand, class, check)
    }

    /// Emit an introduction marker with an explicit class tag.
    pub fn mark_as(&mut self, operand: ValueId, class: ValueClass, check: CheckKind) -> ValueId {
        let ty = self
            .value_types
            .get(operand.index())
            .copied()
            .unwrap_or_else(|| match class {
                ValueClass::Object => Ty::move_only(1),
                ValueClass::Address => Ty::address_of(Ty::move_only(1)),
            })
            .noncopyable();
        let dst = self.fresh_value(ty);
        self.emit(Inst::Mark {
            dst,
            operand,
            class,
            check,
        });
        dst
    }

    pub fn copy(&mut self, src: ValueId) -> ValueId {
        let dst = self.fresh_value(self.value_types[src.index()]);
        self.emit(Inst::Copy { dst, src });
        dst
    }

    pub fn explicit_copy(&mut self, src: ValueId) -> ValueId {
        let dst = self.fresh_value(self.value_types[src.index()]);
        self.emit(Inst::ExplicitCopy { dst, src });
        dst
    }

    pub fn move_value(&mut self, src: ValueId) -> ValueId {
        let dst = self.fresh_value(self.value_types[src.index()]);
        self.emit(Inst::Move { dst, src });
        dst
    }

    pub fn extract_field(&mut self, src: ValueId, field: u32, ty: Ty) -> ValueId {
        let dst = self.fresh_value(ty);
        self.emit(Inst::ExtractField { dst, src, field });
        dst
    }

    pub fn destroy(&mut self, value: ValueId) {
        self.emit(Inst::Destroy { value });
    }

    /// Allocate a stack slot holding a `pointee`. Returns its address.
    pub fn alloc(&mut self, pointee: Ty) -> ValueId {
        let dst = self.fresh_value(Ty::address_of(pointee));
        self.emit(Inst::Alloc { dst });
        dst
    }

    pub fn dealloc(&mut self, addr: ValueId) {
        self.emit(Inst::Dealloc { addr });
    }

    /// Address of field `field` of `base`, holding a `pointee`.
    pub fn field_addr(&mut self, base: ValueId, field: u32, pointee: Ty) -> ValueId {
        let dst = self.fresh_value(Ty::address_of(pointee));
        self.emit(Inst::FieldAddr { dst, base, field });
        dst
    }

    pub fn load(&mut self, src: ValueId, kind: LoadKind) -> ValueId {
        let dst = self.fresh_value(self.value_types[src.index()].pointee());
        self.emit(Inst::Load { dst, src, kind });
        dst
    }

    pub fn store(&mut self, src: ValueId, dest: ValueId, kind: StoreKind) {
        self.emit(Inst::Store { src, dest, kind });
    }

    pub fn copy_addr(
        &mut self,
        src: ValueId,
        dest: ValueId,
        kind: CopyAddrKind,
        dest_kind: StoreKind,
    ) {
        self.emit(Inst::CopyAddr {
            src,
            dest,
            kind,
            dest_kind,
        });
    }

    pub fn destroy_addr(&mut self, addr: ValueId) {
        self.emit(Inst::DestroyAddr { addr });
    }

    // Terminators

    fn terminate(&mut self, terminator: Terminator) {
        let span = self.span;
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "block {} already terminated",
            block.id.raw()
        );
        block.terminator = Some((terminator, span));
    }

    /// Terminate with `Return`.
    pub fn ret(&mut self, value: Option<ValueId>) {
        self.terminate(Terminator::Return { value });
    }

    /// Terminate with unconditional `Jump`.
    pub fn jump(&mut self, target: BlockId, args: Vec<ValueId>) {
        self.terminate(Terminator::Jump { target, args });
    }

    /// Terminate with conditional `Branch`.
    pub fn branch(&mut self, cond: ValueId, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::Branch {
            cond,
            then_block,
            else_block,
        });
    }

    /// Terminate with `Unreachable`.
    pub fn unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }

    /// Finish building and produce the function.
    pub fn finish(self) -> Function {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        let mut spans = Vec::with_capacity(self.blocks.len());
        for bb in self.blocks {
            let (terminator, term_span) = bb.terminator.unwrap_or((Terminator::Unreachable, None));
            let mut block_spans = bb.spans;
            block_spans.push(term_span);
            spans.push(block_spans);
            blocks.push(Block {
                id: bb.id,
                params: bb.params,
                body: bb.body,
                terminator,
            });
        }

        Function {
            name: self.name,
            params: self.params,
            blocks,
            entry: BlockId::new(0),
            value_types: self.value_types,
            value_names: self.value_names,
            spans,
            linkage: self.linkage,
            directives: self.directives,
            deserialized_canonical: false,
        }
    }
}
