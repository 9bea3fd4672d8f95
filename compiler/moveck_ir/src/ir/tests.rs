use pretty_assertions::assert_eq;

use crate::builder::FunctionBuilder;
use crate::span::Span;

use super::*;

fn v(n: u32) -> ValueId {
    ValueId::new(n)
}

fn b(n: u32) -> BlockId {
    BlockId::new(n)
}

#[test]
fn move_only_type_has_at_least_one_field() {
    assert_eq!(Ty::move_only(0).fields, 1);
    assert_eq!(Ty::move_only(3).fields, 3);
    assert!(Ty::move_only(2).move_only);
    assert!(!Ty::copyable().move_only);
}

#[test]
fn address_round_trips_through_pointee() {
    let obj = Ty::move_only(2);
    let addr = Ty::address_of(obj);
    assert!(addr.is_address());
    assert_eq!(addr.fields, 2);
    assert_eq!(addr.pointee(), obj);
}

#[test]
fn check_kind_validity_per_class() {
    assert!(!CheckKind::Invalid.is_valid_for(ValueClass::Object));
    assert!(!CheckKind::Invalid.is_valid_for(ValueClass::Address));
    assert!(!CheckKind::AssignableButNotConsumable.is_valid_for(ValueClass::Object));
    assert!(CheckKind::AssignableButNotConsumable.is_valid_for(ValueClass::Address));
    assert!(CheckKind::NoImplicitCopy.is_valid_for(ValueClass::Object));
}

#[test]
fn check_kind_permissions() {
    assert!(CheckKind::ConsumableAndAssignable.allows_consume());
    assert!(CheckKind::ConsumableAndAssignable.allows_assign());
    assert!(!CheckKind::AssignableButNotConsumable.allows_consume());
    assert!(CheckKind::AssignableButNotConsumable.allows_assign());
    assert!(!CheckKind::NoConsumeOrAssign.allows_consume());
    assert!(!CheckKind::NoConsumeOrAssign.allows_assign());
}

#[test]
fn used_values_in_operand_order() {
    let inst = Inst::Apply {
        dst: Some(v(9)),
        callee: v(1),
        args: vec![CallArg::borrowed(v(2)), CallArg::consumed(v(3))],
    };
    assert_eq!(inst.used_values().as_slice(), &[v(1), v(2), v(3)]);
    assert_eq!(inst.defined_value(), Some(v(9)));

    let store = Inst::Store {
        src: v(4),
        dest: v(5),
        kind: StoreKind::Init,
    };
    assert_eq!(store.used_values().as_slice(), &[v(4), v(5)]);
    assert_eq!(store.defined_value(), None);
}

#[test]
fn substitute_leaves_dst_alone() {
    let mut inst = Inst::Copy { dst: v(1), src: v(1) };
    inst.substitute_value(v(1), v(7));
    assert_eq!(inst, Inst::Copy { dst: v(1), src: v(7) });
}

#[test]
fn terminator_successors() {
    let branch = Terminator::Branch {
        cond: v(0),
        then_block: b(1),
        else_block: b(2),
    };
    assert_eq!(branch.successors().as_slice(), &[b(1), b(2)]);
    assert!(Terminator::Return { value: None }.successors().is_empty());
}

#[test]
fn definitions_find_params_and_results() {
    let mut fb = FunctionBuilder::new("defs");
    let p = fb.param(Ty::move_only(1));
    let next = fb.new_block();
    let bp = fb.block_param(next, Ty::move_only(1));
    let m = fb.mark(p, CheckKind::ConsumableAndAssignable);
    fb.jump(next, vec![m]);
    fb.position_at(next);
    fb.ret(Some(bp));
    let func = fb.finish();

    let defs = func.definitions();
    assert_eq!(defs.unique(p), Some(DefSite::Param));
    assert_eq!(defs.unique(bp), Some(DefSite::BlockParam(next)));
    assert_eq!(defs.unique(m), Some(DefSite::Inst(InstLoc::new(b(0), 0))));
    assert_eq!(DefSite::Param.block(), None);
}

#[test]
fn redefined_value_has_no_unique_definition() {
    let mut fb = FunctionBuilder::new("twice");
    let p = fb.param(Ty::move_only(1));
    let c = fb.copy(p);
    fb.emit(Inst::Copy { dst: c, src: p });
    fb.ret(None);
    let func = fb.finish();

    assert_eq!(func.definitions().unique(c), None);
}

#[test]
fn replace_all_uses_reaches_terminators() {
    let mut fb = FunctionBuilder::new("rauw");
    let p = fb.param(Ty::move_only(1));
    let c = fb.copy(p);
    fb.ret(Some(c));
    let mut func = fb.finish();

    func.replace_all_uses(c, p);
    assert_eq!(
        func.blocks[0].terminator,
        Terminator::Return { value: Some(p) }
    );
}

#[test]
fn remove_insts_keeps_spans_aligned() {
    let mut fb = FunctionBuilder::new("remove");
    let p = fb.param(Ty::move_only(1));
    fb.set_span(Some(Span::new(0, 1)));
    let c0 = fb.copy(p);
    fb.set_span(Some(Span::new(2, 3)));
    let c1 = fb.copy(p);
    fb.set_span(Some(Span::new(4, 5)));
    fb.destroy(c0);
    fb.ret(Some(c1));
    let mut func = fb.finish();

    func.remove_insts(b(0), &[2, 0, 2]);
    assert_eq!(func.blocks[0].body, vec![Inst::Copy { dst: c1, src: p }]);
    assert_eq!(func.span_at(InstLoc::new(b(0), 0)), Span::new(2, 3));
    assert_eq!(func.spans[0].len(), func.blocks[0].body.len() + 1);
}

#[test]
fn replace_body_swaps_whole_body() {
    let mut fb = FunctionBuilder::new("swap");
    let p = fb.param(Ty::copyable());
    let next = fb.new_block();
    fb.jump(next, vec![]);
    fb.position_at(next);
    fb.ret(Some(p));
    let mut func = fb.finish();

    let old = func.replace_body(Body::unreachable(None));
    assert_eq!(old.blocks.len(), 2);
    assert_eq!(func.blocks.len(), 1);
    assert_eq!(func.blocks[0].terminator, Terminator::Unreachable);
    assert_eq!(func.instruction_count(), 0);
}

#[test]
fn span_at_out_of_range_is_dummy() {
    let func = FunctionBuilder::new("empty").finish();
    assert_eq!(func.span_at(InstLoc::new(b(3), 7)), Span::DUMMY);
    assert!(func.inst(InstLoc::new(b(0), 0)).is_none());
}
