#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;

use moveck_diagnostic::ErrorCode;
use moveck_ir::{CallArg, CheckKind, FunctionBuilder, Inst, Span, Terminator, Ty};

use crate::repair::implicit_copies;
use crate::search::Worklist;
use crate::test_helpers::{
    borrow_then_consume, codes, double_consume, loc, unmarked_copy, v, TestHost,
};

use super::*;

fn with_directives(mut func: Function, directives: Directives) -> Function {
    func.directives |= directives;
    func
}

/// Engine that records the worklist sizes it was handed and does nothing.
#[derive(Default)]
struct Recording {
    calls: Vec<usize>,
}

impl MarkerChecker for Recording {
    fn check(&mut self, _func: &mut Function, worklist: &Worklist, _cx: &mut CheckCx<'_>) -> bool {
        self.calls.push(worklist.len());
        false
    }
}

// Gates

#[test]
fn disabled_feature_is_a_no_op() {
    let mut func = double_consume("f");
    let before = func.clone();
    let mut host = TestHost {
        enabled: false,
        ..TestHost::default()
    };

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome, PassOutcome::new(false, CheckStatus::Gated));
    assert_eq!(func, before);
    assert!(host.diagnostics.is_empty());
    assert!(host.invalidations.is_empty());
    assert_eq!(host.analyses_requests, 0);
}

#[test]
fn validated_bodies_are_left_alone() {
    let mut func = double_consume("f");
    func.deserialized_canonical = true;
    let before = func.clone();
    let mut host = TestHost::default();

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome.status, CheckStatus::Gated);
    assert!(!outcome.changed);
    assert_eq!(func, before);
    assert!(host.diagnostics.is_empty());
}

#[test]
fn non_raw_stage_is_an_internal_error() {
    let mut func = double_consume("f");
    let mut host = TestHost {
        stage: Stage::Canonical,
        ..TestHost::default()
    };

    let err = run_move_only_checker(&mut func, &mut host).unwrap_err();
    assert_eq!(
        err,
        PassError::NotRawStage {
            function: "f".to_owned(),
            stage: Stage::Canonical,
        }
    );
    assert!(err.to_string().contains("canonical"));
    assert!(host.diagnostics.is_empty());
}

// delete-if-unused

#[test]
fn unused_shared_function_is_deleted() {
    let mut func = with_directives(double_consume("helper"), Directives::DELETE_IF_UNUSED);
    func.linkage = Linkage::Shared;
    let mut host = TestHost::default();

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome, PassOutcome::new(true, CheckStatus::DeletedUnused));
    assert_eq!(func.blocks.len(), 1);
    assert!(func.blocks[0].body.is_empty());
    assert_eq!(func.blocks[0].terminator, Terminator::Unreachable);
    assert_eq!(func.linkage, Linkage::Private);
    assert_eq!(host.invalidations, vec![InvalidationKind::FunctionBody]);
    assert!(host.diagnostics.is_empty());
}

#[test]
fn deleted_body_is_located_at_the_first_entry_instruction() {
    let mut fb = FunctionBuilder::new("helper");
    fb.set_span(Some(Span::new(10, 12)));
    let f = fb.function_ref("g");
    fb.apply(f, vec![], None);
    fb.ret(None);
    let mut func = with_directives(fb.finish(), Directives::DELETE_IF_UNUSED);
    func.linkage = Linkage::Shared;

    run_move_only_checker(&mut func, &mut TestHost::default()).unwrap();
    assert_eq!(func.span_at(loc(0, 0)), Span::new(10, 12));
}

#[test]
fn deleted_body_follows_a_non_zero_entry_block() {
    let mut fb = FunctionBuilder::new("helper");
    let start = fb.new_block();
    fb.set_span(Some(Span::new(1, 2)));
    fb.jump(start, vec![]);
    fb.position_at(start);
    fb.set_span(Some(Span::new(40, 45)));
    fb.function_ref("g");
    fb.ret(None);
    let mut func = with_directives(fb.finish(), Directives::DELETE_IF_UNUSED);
    func.linkage = Linkage::Shared;
    func.entry = start;

    let outcome = run_move_only_checker(&mut func, &mut TestHost::default()).unwrap();
    assert_eq!(outcome.status, CheckStatus::DeletedUnused);
    assert_eq!(func.span_at(loc(0, 0)), Span::new(40, 45));
}

#[test]
fn unused_private_function_keeps_its_linkage() {
    let mut func = with_directives(double_consume("helper"), Directives::DELETE_IF_UNUSED);
    func.linkage = Linkage::Private;
    let mut host = TestHost::default();

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome.status, CheckStatus::DeletedUnused);
    assert_eq!(func.linkage, Linkage::Private);
}

#[test]
fn referenced_function_is_checked_instead() {
    let mut func = with_directives(double_consume("helper"), Directives::DELETE_IF_UNUSED);
    func.linkage = Linkage::Shared;
    let blocks_before = func.blocks.len();
    let mut host = TestHost::with_refs("helper", 1);

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome.status, CheckStatus::Checked);
    assert_eq!(func.linkage, Linkage::Shared);
    assert_eq!(func.blocks.len(), blocks_before);
    assert!(!func.blocks[0].body.is_empty());
    assert_eq!(codes(&host.diagnostics), vec![ErrorCode::E4001]);
}

#[test]
fn externally_visible_function_is_never_deleted() {
    let mut func = with_directives(borrow_then_consume("api"), Directives::DELETE_IF_UNUSED);
    func.linkage = Linkage::Hidden;
    let mut host = TestHost {
        whole_module: false,
        ..TestHost::default()
    };

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome.status, CheckStatus::Checked);
    assert!(host.diagnostics.is_empty());

    // In whole-module mode nothing outside can see a hidden function.
    let mut func = with_directives(borrow_then_consume("api"), Directives::DELETE_IF_UNUSED);
    func.linkage = Linkage::Hidden;
    let mut host = TestHost::default();
    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome.status, CheckStatus::DeletedUnused);
}

// no-move-only-diagnostics

#[test]
fn suppressed_function_is_only_repaired() {
    let mut func = with_directives(unmarked_copy("f"), Directives::NO_MOVE_ONLY_DIAGNOSTICS);
    let mut host = TestHost::default();

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome, PassOutcome::new(true, CheckStatus::Suppressed));
    assert!(host.diagnostics.is_empty());
    assert!(implicit_copies(&func).is_empty());
    assert!(func
        .instructions()
        .any(|(_, i)| matches!(i, Inst::ExplicitCopy { .. })));
    assert_eq!(host.invalidations, vec![InvalidationKind::Instructions]);
    assert_eq!(host.analyses_requests, 0);
}

#[test]
fn suppressed_function_without_copies_is_unchanged() {
    let mut func = with_directives(double_consume("f"), Directives::NO_MOVE_ONLY_DIAGNOSTICS);
    let before = func.clone();
    let mut host = TestHost::default();

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome, PassOutcome::new(false, CheckStatus::Suppressed));
    assert_eq!(func, before);
    assert!(host.diagnostics.is_empty());
    assert!(host.invalidations.is_empty());
}

// Normal checking

#[test]
fn legal_function_is_checked_and_simplified() {
    let mut func = borrow_then_consume("f");
    let mut host = TestHost::default();

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome, PassOutcome::new(true, CheckStatus::Checked));
    assert!(host.diagnostics.is_empty());
    assert_eq!(host.invalidations, vec![InvalidationKind::Instructions]);
    assert!(implicit_copies(&func).is_empty());
}

#[test]
fn second_run_on_checked_output_changes_nothing() {
    let mut func = borrow_then_consume("f");
    run_move_only_checker(&mut func, &mut TestHost::default()).unwrap();
    let once = func.clone();

    let mut host = TestHost::default();
    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert!(!outcome.changed);
    assert_eq!(func, once);
    assert!(host.diagnostics.is_empty());
    assert!(host.invalidations.is_empty());
}

#[test]
fn rejected_function_is_still_repaired() {
    let mut fb = FunctionBuilder::new("f");
    let p = fb.param(Ty::copyable());
    let x = fb.mark(p, CheckKind::NoImplicitCopy);
    let c1 = fb.copy(x);
    let c2 = fb.copy(x);
    let sink = fb.function_ref("sink");
    fb.apply(sink, vec![CallArg::consumed(c1)], None);
    fb.apply(sink, vec![CallArg::consumed(c2)], None);
    fb.ret(None);
    let mut func = fb.finish();
    let mut host = TestHost::default();

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert!(outcome.changed);
    assert_eq!(codes(&host.diagnostics), vec![ErrorCode::E4001]);
    assert!(implicit_copies(&func).is_empty());
}

#[test]
fn fallback_sweep_catches_unmarked_copies() {
    let mut func = unmarked_copy("f");
    let mut host = TestHost::default();

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome.status, CheckStatus::Checked);
    assert_eq!(codes(&host.diagnostics), vec![ErrorCode::E9002]);
    assert!(implicit_copies(&func).is_empty());
}

#[test]
fn fallback_sweep_is_skipped_once_something_was_diagnosed() {
    let mut fb = FunctionBuilder::new("f");
    let p = fb.param(Ty::move_only(1));
    let q = fb.param(Ty::move_only(1));
    let x = fb.mark(p, CheckKind::ConsumableAndAssignable);
    let sink = fb.function_ref("sink");
    fb.apply(sink, vec![CallArg::consumed(x)], None);
    fb.apply(sink, vec![CallArg::consumed(x)], None);
    let c = fb.copy(q);
    fb.apply(sink, vec![CallArg::consumed(c)], None);
    fb.ret(Some(q));
    let mut func = fb.finish();
    let mut host = TestHost::default();

    run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(codes(&host.diagnostics), vec![ErrorCode::E4001]);
    assert!(implicit_copies(&func).is_empty());
}

#[test]
fn untyped_marker_is_diagnosed_without_panicking() {
    let mut fb = FunctionBuilder::new("f");
    let p = fb.param(Ty::move_only(1));
    fb.emit(Inst::Mark {
        dst: v(99),
        operand: p,
        class: ValueClass::Object,
        check: CheckKind::ConsumableAndAssignable,
    });
    fb.ret(None);
    let mut func = fb.finish();
    let mut host = TestHost::default();

    let outcome = run_move_only_checker(&mut func, &mut host).unwrap();
    assert_eq!(outcome.status, CheckStatus::Checked);
    assert_eq!(codes(&host.diagnostics), vec![ErrorCode::E9001]);
}

#[test]
fn engines_see_only_non_empty_worklists() {
    let mut func = double_consume("f");
    let mut host = TestHost::default();
    let mut objects = Recording::default();
    let mut addresses = Recording::default();

    run_move_only_checker_with(&mut func, &mut host, &mut objects, &mut addresses).unwrap();
    assert_eq!(objects.calls, vec![1]);
    assert!(addresses.calls.is_empty());
}

#[test]
fn silent_engines_are_backed_by_the_fallback_sweep() {
    let mut fb = FunctionBuilder::new("f");
    let p = fb.param(Ty::move_only(1));
    let x = fb.mark(p, CheckKind::ConsumableAndAssignable);
    let c = fb.copy(x);
    let sink = fb.function_ref("sink");
    fb.apply(sink, vec![CallArg::consumed(c)], None);
    fb.apply(sink, vec![CallArg::consumed(x)], None);
    fb.ret(None);
    let mut func = fb.finish();
    let mut host = TestHost::default();

    let outcome = run_move_only_checker_with(
        &mut func,
        &mut host,
        &mut Recording::default(),
        &mut Recording::default(),
    )
    .unwrap();
    assert!(outcome.changed);
    assert!(!host.diagnostics.is_empty());
    assert_eq!(codes(&host.diagnostics), vec![ErrorCode::E9002]);
    assert!(implicit_copies(&func).is_empty());
}
