use crate::builder::FunctionBuilder;
use crate::ir::{BlockId, Ty};

use super::*;

fn b(n: u32) -> BlockId {
    BlockId::new(n)
}

/// Diamond: B0 → B1, B0 → B2, B1 → B3, B2 → B3.
fn diamond() -> Function {
    let mut fb = FunctionBuilder::new("diamond");
    let cond = fb.param(Ty::copyable());
    let then_b = fb.new_block();
    let else_b = fb.new_block();
    let merge = fb.new_block();
    fb.branch(cond, then_b, else_b);
    fb.position_at(then_b);
    fb.jump(merge, vec![]);
    fb.position_at(else_b);
    fb.jump(merge, vec![]);
    fb.position_at(merge);
    fb.ret(None);
    fb.finish()
}

/// Single block: entry dominates itself.
#[test]
fn single_block_self_dominance() {
    let mut fb = FunctionBuilder::new("single");
    fb.ret(None);
    let func = fb.finish();

    let analyses = FunctionAnalyses::compute(&func);
    assert!(analyses.dom_tree.dominates(b(0), b(0)));
    assert_eq!(analyses.dom_tree.idom(b(0)), None);
    assert_eq!(analyses.post_order.len(), 1);
}

/// Linear chain: B0 → B1 → B2. B0 dominates all.
#[test]
fn linear_chain() {
    let mut fb = FunctionBuilder::new("chain");
    let b1 = fb.new_block();
    let b2 = fb.new_block();
    fb.jump(b1, vec![]);
    fb.position_at(b1);
    fb.jump(b2, vec![]);
    fb.position_at(b2);
    fb.ret(None);
    let func = fb.finish();

    let analyses = FunctionAnalyses::compute(&func);
    let dom = &analyses.dom_tree;
    assert!(dom.dominates(b(0), b(2)));
    assert!(dom.dominates(b(1), b(2)));
    assert!(!dom.dominates(b(2), b(1)));
    assert_eq!(dom.idom(b(2)), Some(b(1)));

    let order: Vec<BlockId> = analyses.post_order.iter().collect();
    assert_eq!(order, vec![b(2), b(1), b(0)]);
    let rpo: Vec<BlockId> = analyses.post_order.reverse().collect();
    assert_eq!(rpo, vec![b(0), b(1), b(2)]);
}

/// B3 is not dominated by either arm of the diamond.
#[test]
fn diamond_merge_dominated_by_entry_only() {
    let func = diamond();
    let analyses = FunctionAnalyses::compute(&func);
    let dom = &analyses.dom_tree;

    assert!(dom.dominates(b(0), b(3)));
    assert!(!dom.dominates(b(1), b(3)));
    assert!(!dom.dominates(b(2), b(3)));
    assert_eq!(dom.idom(b(3)), Some(b(0)));
}

#[test]
fn diamond_predecessors() {
    let func = diamond();
    let preds = compute_predecessors(&func);
    assert_eq!(preds[0], Vec::<usize>::new());
    assert_eq!(preds[1], vec![0]);
    assert_eq!(preds[3], vec![1, 2]);
}

/// Branch with both arms to the same block lists the predecessor once.
#[test]
fn duplicate_edges_deduplicated() {
    let mut fb = FunctionBuilder::new("dup");
    let cond = fb.param(Ty::copyable());
    let next = fb.new_block();
    fb.branch(cond, next, next);
    fb.position_at(next);
    fb.ret(None);
    let func = fb.finish();

    assert_eq!(compute_predecessors(&func)[1], vec![0]);
}

/// Loop: B0 → B1, B1 → B1 | B2. The header dominates the exit.
#[test]
fn loop_header_dominates_exit() {
    let mut fb = FunctionBuilder::new("loop");
    let cond = fb.param(Ty::copyable());
    let header = fb.new_block();
    let exit = fb.new_block();
    fb.jump(header, vec![]);
    fb.position_at(header);
    fb.branch(cond, header, exit);
    fb.position_at(exit);
    fb.ret(None);
    let func = fb.finish();

    let analyses = FunctionAnalyses::compute(&func);
    assert!(analyses.dom_tree.dominates(header, exit));
    assert_eq!(analyses.dom_tree.idom(header), Some(b(0)));
    assert_eq!(analyses.post_order.len(), 3);
}

#[test]
fn unreachable_block_not_in_post_order() {
    let mut fb = FunctionBuilder::new("dead");
    let dead = fb.new_block();
    fb.ret(None);
    fb.position_at(dead);
    fb.ret(None);
    let func = fb.finish();

    let analyses = FunctionAnalyses::compute(&func);
    assert!(analyses.post_order.is_reachable(b(0)));
    assert!(!analyses.post_order.is_reachable(dead));
    assert_eq!(analyses.post_order.len(), 1);
    assert!(!analyses.dom_tree.dominates(b(0), dead));
    assert!(analyses.dom_tree.dominates(dead, dead));
    assert_eq!(analyses.dom_tree.idom(dead), None);
}
