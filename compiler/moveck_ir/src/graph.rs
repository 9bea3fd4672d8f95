//! Shared CFG analyses: predecessors, post-order, dominance.
//!
//! These are the "already computed" analyses a pass pipeline caches per
//! function and hands to passes read-only. A pass that mutates the CFG
//! reports it, and the pipeline recomputes them.

use rustc_hash::FxHashSet;

use crate::ir::{BlockId, Function};

/// Compute the predecessor list for each block (deduplicated).
///
/// Returns a vector indexed by block index, where each entry is the
/// list of distinct predecessor block indices.
pub fn compute_predecessors(func: &Function) -> Vec<Vec<usize>> {
    let num_blocks = func.blocks.len();
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); num_blocks];

    for (block_idx, block) in func.blocks.iter().enumerate() {
        let mut seen = FxHashSet::default();
        for succ_id in block.terminator.successors() {
            let succ_idx = succ_id.index();
            if succ_idx < num_blocks && seen.insert(succ_idx) {
                predecessors[succ_idx].push(block_idx);
            }
        }
    }

    predecessors
}

/// Post-order traversal of the blocks reachable from the entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostOrder {
    order: Vec<BlockId>,
    reachable: Vec<bool>,
}

impl PostOrder {
    /// Compute the post-order of `func`.
    ///
    /// Uses an iterative DFS with an explicit stack to avoid recursion depth
    /// issues on deeply nested CFGs. Only visits reachable blocks.
    pub fn compute(func: &Function) -> Self {
        let num_blocks = func.blocks.len();
        let mut visited = vec![false; num_blocks];
        let mut order = Vec::with_capacity(num_blocks);

        if num_blocks == 0 {
            return Self {
                order,
                reachable: visited,
            };
        }

        // Stack entries: (block_index, children_processed).
        let mut stack: Vec<(usize, bool)> = vec![(func.entry.index(), false)];

        while let Some(&mut (block_idx, ref mut children_done)) = stack.last_mut() {
            if *children_done {
                stack.pop();
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "block counts fit in u32"
                )]
                order.push(BlockId::new(block_idx as u32));
                continue;
            }

            *children_done = true;

            if block_idx >= num_blocks || visited[block_idx] {
                stack.pop();
                continue;
            }
            visited[block_idx] = true;

            // Push in reverse so the first successor is explored first.
            let succs = func.blocks[block_idx].terminator.successors();
            for succ_id in succs.iter().rev() {
                let succ_idx = succ_id.index();
                if succ_idx < num_blocks && !visited[succ_idx] {
                    stack.push((succ_idx, false));
                }
            }
        }

        Self {
            order,
            reachable: visited,
        }
    }

    /// Blocks in post-order (successors before predecessors).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = BlockId> + '_ {
        self.order.iter().copied()
    }

    /// Blocks in reverse post-order (predecessors before successors,
    /// ignoring back edges).
    pub fn reverse(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.order.iter().rev().copied()
    }

    /// Whether `block` is reachable from the entry.
    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.reachable.get(block.index()).copied().unwrap_or(false)
    }

    /// Number of reachable blocks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Dominator tree.
///
/// Uses the Cooper-Harvey-Kennedy iterative algorithm, which is simpler than
/// Lengauer-Tarjan and fast enough for typical function sizes. Works on
/// reverse postorder and converges in a handful of iterations.
///
/// Reference: Cooper, Harvey and Kennedy, "A Simple, Fast Dominance Algorithm" (2001)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DominatorTree {
    /// Immediate dominator for each block, indexed by block index.
    /// `idom[entry] == Some(entry)`; unreachable blocks are `None`.
    idom: Vec<Option<usize>>,
}

impl DominatorTree {
    /// Build the dominator tree for a function.
    pub fn build(func: &Function, post_order: &PostOrder) -> Self {
        let n = func.blocks.len();
        if n == 0 {
            return Self { idom: vec![] };
        }

        let preds = compute_predecessors(func);
        let rpo: Vec<usize> = post_order.reverse().map(BlockId::index).collect();

        // Map block index → RPO position for O(1) lookup
        let mut rpo_pos = vec![usize::MAX; n];
        for (pos, &block_idx) in rpo.iter().enumerate() {
            rpo_pos[block_idx] = pos;
        }

        let entry = func.entry.index();
        let mut idom: Vec<Option<usize>> = vec![None; n];
        idom[entry] = Some(entry);

        let mut changed = true;
        while changed {
            changed = false;
            for &block_idx in rpo.iter().skip(1) {
                let mut new_idom = None;
                for &pred in &preds[block_idx] {
                    if idom[pred].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred,
                        Some(cur) => Self::intersect(pred, cur, &idom, &rpo_pos),
                    });
                }

                let Some(new_idom) = new_idom else {
                    continue;
                };

                if idom[block_idx] != Some(new_idom) {
                    idom[block_idx] = Some(new_idom);
                    changed = true;
                }
            }
        }

        Self { idom }
    }

    /// Does block `a` dominate block `b`?
    ///
    /// A block dominates itself. Unreachable blocks are dominated by
    /// nothing (and dominate only themselves).
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        let a_idx = a.index();
        let mut current = b.index();
        loop {
            if current == a_idx {
                return true;
            }
            match self.idom.get(current).copied().flatten() {
                Some(dom) if dom != current => current = dom,
                _ => return false,
            }
        }
    }

    /// The immediate dominator of `block` (`None` for the entry and for
    /// unreachable blocks).
    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        match self.idom.get(block.index()).copied().flatten() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "block counts fit in u32"
            )]
            Some(dom) if dom != block.index() => Some(BlockId::new(dom as u32)),
            _ => None,
        }
    }

    /// CHK intersect: walk two fingers upward until they meet.
    fn intersect(mut a: usize, mut b: usize, idom: &[Option<usize>], rpo_pos: &[usize]) -> usize {
        while a != b {
            while rpo_pos[a] > rpo_pos[b] {
                let Some(next) = idom[a] else {
                    debug_assert!(false, "intersect: broken idom chain at {a}");
                    return a;
                };
                a = next;
            }
            while rpo_pos[b] > rpo_pos[a] {
                let Some(next) = idom[b] else {
                    debug_assert!(false, "intersect: broken idom chain at {b}");
                    return b;
                };
                b = next;
            }
        }
        a
    }
}

/// The cached analyses a pass pipeline supplies for one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionAnalyses {
    pub post_order: PostOrder,
    pub dom_tree: DominatorTree,
}

impl FunctionAnalyses {
    /// Compute every analysis from the function's current CFG.
    pub fn compute(func: &Function) -> Self {
        let post_order = PostOrder::compute(func);
        let dom_tree = DominatorTree::build(func, &post_order);
        tracing::trace!(
            function = %func.name,
            reachable = post_order.len(),
            "computed CFG analyses"
        );
        Self {
            post_order,
            dom_tree,
        }
    }
}

#[cfg(test)]
mod tests;
