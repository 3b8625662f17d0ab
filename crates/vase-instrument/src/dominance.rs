//! Dominator-tree computation over a function's control-flow graph.
//!
//! The instrumentation pass needs "does this instruction's defining
//! block dominate that insertion point" (spec.md §4.2 "Safety
//! conditions"). Uses the standard iterative algorithm (Cooper, Harvey,
//! Kennedy, "A Simple, Fast Dominance Algorithm") — functions here are
//! small enough that a fixpoint over reverse-postorder blocks is plenty.

use std::collections::HashMap;

use crate::ir::Function;

pub struct DominatorTree {
    /// Block label -> reverse-postorder index.
    rpo_index: HashMap<String, usize>,
    /// Reverse-postorder index -> immediate dominator's index (self for entry).
    idom: Vec<usize>,
    order: Vec<String>,
}

impl DominatorTree {
    pub fn compute(func: &Function) -> Self {
        let order = reverse_postorder(func);
        let rpo_index: HashMap<String, usize> =
            order.iter().enumerate().map(|(i, label)| (label.clone(), i)).collect();

        let preds = predecessors(func);
        let n = order.len();
        let mut idom: Vec<Option<usize>> = vec![None; n];
        if n == 0 {
            return DominatorTree { rpo_index, idom: Vec::new(), order };
        }
        idom[0] = Some(0);

        let mut changed = true;
        while changed {
            changed = false;
            for idx in 1..n {
                let label = &order[idx];
                let mut new_idom: Option<usize> = None;
                for pred in preds.get(label).into_iter().flatten() {
                    let Some(&pred_idx) = rpo_index.get(pred) else { continue };
                    if idom[pred_idx].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred_idx,
                        Some(cur) => intersect(&idom, cur, pred_idx),
                    });
                }
                if new_idom != idom[idx] {
                    idom[idx] = new_idom;
                    changed = true;
                }
            }
        }

        let idom: Vec<usize> = idom.into_iter().map(|v| v.unwrap_or(0)).collect();
        DominatorTree { rpo_index, idom, order }
    }

    /// True iff block `a` dominates block `b` (reflexive: a block
    /// dominates itself).
    pub fn dominates(&self, a: &str, b: &str) -> bool {
        let (Some(&ai), Some(&bi)) = (self.rpo_index.get(a), self.rpo_index.get(b)) else {
            return false;
        };
        let mut cur = bi;
        loop {
            if cur == ai {
                return true;
            }
            if self.idom[cur] == cur {
                return cur == ai;
            }
            cur = self.idom[cur];
        }
    }
}

fn intersect(idom: &[Option<usize>], mut a: usize, mut b: usize) -> usize {
    while a != b {
        while a > b {
            a = idom[a].expect("finger walked off a block with a known idom");
        }
        while b > a {
            b = idom[b].expect("finger walked off a block with a known idom");
        }
    }
    a
}

fn predecessors(func: &Function) -> HashMap<String, Vec<String>> {
    let mut preds: HashMap<String, Vec<String>> = HashMap::new();
    for block in &func.blocks {
        for succ in block.terminator.successors() {
            preds.entry(succ.to_string()).or_default().push(block.label.clone());
        }
    }
    preds
}

fn reverse_postorder(func: &Function) -> Vec<String> {
    let Some(entry) = func.blocks.first() else { return Vec::new() };
    let mut visited = std::collections::HashSet::new();
    let mut postorder = Vec::new();
    let mut stack = vec![(entry.label.clone(), false)];

    while let Some((label, processed)) = stack.pop() {
        if processed {
            postorder.push(label);
            continue;
        }
        if !visited.insert(label.clone()) {
            continue;
        }
        stack.push((label.clone(), true));
        if let Some(block) = func.block(&label) {
            for succ in block.terminator.successors() {
                if !visited.contains(succ) {
                    stack.push((succ.to_string(), false));
                }
            }
        }
    }

    postorder.reverse();
    postorder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BasicBlock, Function, Operand, Terminator, Width};

    fn diamond() -> Function {
        Function {
            name: "f".into(),
            entry_line: 1,
            params: vec![],
            blocks: vec![
                BasicBlock::new(
                    "entry",
                    Terminator::CondBr {
                        cond: Operand::Value("c".into()),
                        then_bb: "then".into(),
                        else_bb: "else".into(),
                        debug_line: Some(1),
                    },
                ),
                BasicBlock::new("then", Terminator::Br { target: "join".into() }),
                BasicBlock::new("else", Terminator::Br { target: "join".into() }),
                BasicBlock::new("join", Terminator::Ret(Some(Operand::Const(0, Width::W32)))),
            ],
        }
    }

    #[test]
    fn entry_dominates_everything() {
        let f = diamond();
        let dt = DominatorTree::compute(&f);
        assert!(dt.dominates("entry", "then"));
        assert!(dt.dominates("entry", "else"));
        assert!(dt.dominates("entry", "join"));
        assert!(dt.dominates("entry", "entry"));
    }

    #[test]
    fn branch_arms_do_not_dominate_the_join() {
        let f = diamond();
        let dt = DominatorTree::compute(&f);
        assert!(!dt.dominates("then", "join"));
        assert!(!dt.dominates("else", "join"));
        assert!(!dt.dominates("then", "else"));
    }

    #[test]
    fn a_block_dominates_its_own_successor_in_a_chain() {
        let f = Function {
            name: "g".into(),
            entry_line: 1,
            params: vec![],
            blocks: vec![
                BasicBlock::new("entry", Terminator::Br { target: "next".into() }),
                BasicBlock::new("next", Terminator::Ret(None)),
            ],
        };
        let dt = DominatorTree::compute(&f);
        assert!(dt.dominates("entry", "next"));
    }
}
