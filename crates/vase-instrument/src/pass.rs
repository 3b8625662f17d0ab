//! The instrumentation transform (C2, spec.md §4.2).

use std::collections::HashMap;
use std::fmt;

use vase_core::ENTRY_BRANCH;

use crate::dominance::DominatorTree;
use crate::ir::{Inst, InstKind, Module, Operand, Terminator, Width, SINK_CALLEE};

/// Placeholder variable name for the floating-point side marker (spec.md
/// §4.2: "a single branch-direction marker may optionally be emitted
/// with a placeholder name to preserve site presence").
pub const FP_MARKER_NAME: &str = "__fp__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstrumentError {
    /// Re-running the pass over already-instrumented IR (spec.md §4.2
    /// "Idempotence": "A second pass over already-instrumented IR is
    /// prohibited").
    AlreadyInstrumented,
}

impl fmt::Display for InstrumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentError::AlreadyInstrumented => {
                write!(f, "module has already been instrumented; the pass must run once over pristine IR")
            }
        }
    }
}

impl std::error::Error for InstrumentError {}

/// One `(site, var)` logging attempt the pass could not place safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLog {
    pub function: String,
    pub site: u64,
    pub side: i32,
    pub variable: String,
}

/// Summary of what the pass did, for diagnostics and for testing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentReport {
    pub sites_seen: usize,
    pub calls_inserted: usize,
    pub skipped_dominance: Vec<SkippedLog>,
    pub floating_point_markers: usize,
}

/// Runs the instrumentation pass over every function in `module`.
///
/// Errors only if the module was already instrumented; per-site
/// dominance failures are recorded in the returned report, never
/// surfaced as an error (spec.md §7).
pub fn run(module: &mut Module) -> Result<InstrumentReport, InstrumentError> {
    if module.is_instrumented() {
        return Err(InstrumentError::AlreadyInstrumented);
    }

    let mut report = InstrumentReport::default();
    let mut tmp_counter: u32 = 0;

    for func_idx in 0..module.functions.len() {
        instrument_function(module, func_idx, &mut report, &mut tmp_counter);
    }

    module.mark_instrumented();
    tracing::info!(
        sites_seen = report.sites_seen,
        calls_inserted = report.calls_inserted,
        skipped = report.skipped_dominance.len(),
        "vase-instrument: pass complete"
    );
    Ok(report)
}

/// Where a value is defined, for dominance and naming purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DefSite {
    Param,
    Phi { block: String },
    Inst { block: String, index: usize },
}

enum Anchor {
    /// Front of the successor block's instruction list (after its phis,
    /// which live in a separate list — spec.md §4.2 step 3's "first
    /// non-phi insertion point").
    Front,
    /// Immediately after the original instruction at this index in the
    /// *same* block (spec.md §4.2 "Safety conditions": hoist after the
    /// definition when both are in the same block).
    AfterOriginalIndex(usize),
}

fn instrument_function(
    module: &mut Module,
    func_idx: usize,
    report: &mut InstrumentReport,
    tmp_counter: &mut u32,
) {
    let func = &module.functions[func_idx];
    let entry_line = func.entry_line;
    let entry_block_label = match func.blocks.first() {
        Some(b) => b.label.clone(),
        None => return,
    };
    let defs = build_def_sites(func);
    let dom = DominatorTree::compute(func);

    // Step: planned insertions per block, applied after the walk so
    // index-based anchors stay valid against the pre-pass layout.
    let mut planned: HashMap<String, Vec<(Anchor, Inst)>> = HashMap::new();

    // spec.md §4.2 step 5: log function arguments at entry.
    for param in &func.params {
        let call = sink_call(entry_line.into(), ENTRY_BRANCH, &param.name, Operand::Value(param.name.clone()));
        planned.entry(entry_block_label.clone()).or_default().push((Anchor::Front, call));
        report.calls_inserted += 1;
    }

    for block in &func.blocks {
        let Terminator::CondBr { cond, then_bb, else_bb, debug_line } = &block.terminator else {
            continue;
        };
        report.sites_seen += 1;
        let site = resolve_site(*debug_line, entry_line);

        if matches!(cond, Operand::Float) {
            for (side, succ) in [(0, then_bb), (1, else_bb)] {
                let call = sink_call(site, side, FP_MARKER_NAME, Operand::Const(0, Width::W1));
                planned.entry(succ.clone()).or_default().push((Anchor::Front, call));
                report.floating_point_markers += 1;
            }
            continue;
        }

        for operand in condition_operands(func, cond) {
            if operand.is_constant() {
                continue;
            }
            let Some(name) = operand.ssa_name() else { continue };
            let Some(def) = defs.get(name) else { continue };
            let var_name = resolve_variable_name(func, name, def, tmp_counter);
            let def_block = def_block_label(def, &entry_block_label);

            for (side, succ) in [(0, then_bb), (1, else_bb)] {
                let anchor = if def_block == succ.as_str() {
                    match def {
                        DefSite::Inst { index, .. } => Some(Anchor::AfterOriginalIndex(*index)),
                        DefSite::Param | DefSite::Phi { .. } => Some(Anchor::Front),
                    }
                } else if dom.dominates(&def_block, succ) {
                    Some(Anchor::Front)
                } else {
                    None
                };

                match anchor {
                    Some(anchor) => {
                        let call = sink_call(site, side, &var_name, operand.clone());
                        planned.entry(succ.clone()).or_default().push((anchor, call));
                        report.calls_inserted += 1;
                    }
                    None => {
                        tracing::warn!(
                            function = %func.name,
                            site,
                            side,
                            variable = %var_name,
                            "vase-instrument: skipping log call, no dominating insertion point"
                        );
                        report.skipped_dominance.push(SkippedLog {
                            function: func.name.clone(),
                            site,
                            side,
                            variable: var_name.clone(),
                        });
                    }
                }
            }
        }
    }

    apply_planned(&mut module.functions[func_idx], planned);
}

fn apply_planned(func: &mut crate::ir::Function, planned: HashMap<String, Vec<(Anchor, Inst)>>) {
    for (label, mut inserts) in planned {
        let Some(block_idx) = func.block_index(&label) else { continue };
        let block = &mut func.blocks[block_idx];

        // Hoisted insertions reference original indices; apply them
        // highest-index-first so earlier indices stay valid.
        inserts.sort_by_key(|(anchor, _)| match anchor {
            Anchor::AfterOriginalIndex(idx) => std::cmp::Reverse(*idx as isize),
            Anchor::Front => std::cmp::Reverse(-1),
        });

        let mut fronts = Vec::new();
        for (anchor, inst) in inserts {
            match anchor {
                Anchor::AfterOriginalIndex(idx) => block.insts.insert(idx + 1, inst),
                Anchor::Front => fronts.push(inst),
            }
        }
        for inst in fronts.into_iter().rev() {
            block.insts.insert(0, inst);
        }
    }
}

fn sink_call(site: u64, side: i32, var: &str, value: Operand) -> Inst {
    Inst {
        result: None,
        kind: InstKind::Call {
            callee: SINK_CALLEE.to_string(),
            args: vec![
                Operand::Const(site as i64, Width::W64),
                Operand::Const(side as i64, Width::W32),
                Operand::Name(var.to_string()),
                value,
            ],
        },
        debug_name: None,
    }
}

/// spec.md §4.2 step 1.
fn resolve_site(debug_line: Option<u32>, entry_line: u32) -> u64 {
    debug_line.unwrap_or(entry_line) as u64
}

/// spec.md §4.2 step 2: the operands of the branching condition.
fn condition_operands(func: &crate::ir::Function, cond: &Operand) -> Vec<Operand> {
    let Operand::Value(name) = cond else {
        return vec![];
    };
    for block in &func.blocks {
        for inst in &block.insts {
            if inst.result.as_deref() == Some(name.as_str()) {
                return match &inst.kind {
                    InstKind::BinOp { lhs, rhs, .. } => vec![lhs.clone(), rhs.clone()],
                    InstKind::Load { .. } | InstKind::Call { .. } => vec![cond.clone()],
                };
            }
        }
    }
    // A bare named boolean with no locally visible definition (e.g. a
    // block/phi parameter) is still "a named boolean produced elsewhere".
    vec![cond.clone()]
}

fn build_def_sites(func: &crate::ir::Function) -> HashMap<String, DefSite> {
    let mut defs = HashMap::new();
    for param in &func.params {
        defs.insert(param.name.clone(), DefSite::Param);
    }
    for block in &func.blocks {
        for phi in &block.phis {
            defs.insert(phi.result.clone(), DefSite::Phi { block: block.label.clone() });
        }
        for (idx, inst) in block.insts.iter().enumerate() {
            if let Some(name) = &inst.result {
                defs.insert(name.clone(), DefSite::Inst { block: block.label.clone(), index: idx });
            }
        }
    }
    defs
}

fn def_block_label(def: &DefSite, entry_block_label: &str) -> String {
    match def {
        DefSite::Param => entry_block_label.to_string(),
        DefSite::Phi { block } | DefSite::Inst { block, .. } => block.clone(),
    }
}

fn is_anonymous_ssa(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

/// spec.md §4.2 step 4: SSA name -> debug declaration name -> (for
/// loads) pointer name -> synthetic `tmp_<k>`.
fn resolve_variable_name(
    func: &crate::ir::Function,
    name: &str,
    def: &DefSite,
    tmp_counter: &mut u32,
) -> String {
    if !is_anonymous_ssa(name) {
        return name.to_string();
    }
    match def {
        DefSite::Param => name.to_string(),
        DefSite::Phi { .. } => {
            *tmp_counter += 1;
            format!("tmp_{tmp_counter}")
        }
        DefSite::Inst { block, index } => {
            let inst = func.block(block).and_then(|b| b.insts.get(*index));
            if let Some(debug_name) = inst.and_then(|i| i.debug_name.as_deref()) {
                return debug_name.to_string();
            }
            if let Some(Inst { kind: InstKind::Load { pointer, .. }, .. }) = inst {
                return pointer.clone();
            }
            *tmp_counter += 1;
            format!("tmp_{tmp_counter}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BasicBlock, Function, Param};

    fn unreachable_branch_module() -> Module {
        // Condition value is an anonymous SSA register loaded through a
        // named pointer; the variable-name fallback chain should surface
        // the pointer name.
        let a = BasicBlock::new(
            "a",
            Terminator::CondBr {
                cond: Operand::Value("3".into()),
                then_bb: "x".into(),
                else_bb: "y".into(),
                debug_line: Some(2),
            },
        );
        let mut entry = BasicBlock::new("entry", Terminator::Br { target: "a".into() });
        entry.insts.push(Inst {
            result: Some("3".into()),
            kind: InstKind::Load { pointer: "flagptr".into(), width: Width::W1 },
            debug_name: None,
        });
        let x = BasicBlock::new("x", Terminator::Ret(None));
        let y = BasicBlock::new("y", Terminator::Ret(None));

        Module::new(vec![Function {
            name: "h".into(),
            entry_line: 1,
            params: vec![],
            blocks: vec![entry, a, x, y],
        }])
    }

    #[test]
    fn load_condition_falls_back_to_pointer_name() {
        let mut module = unreachable_branch_module();
        let report = run(&mut module).unwrap();
        assert!(report.calls_inserted >= 2);

        for label in ["x", "y"] {
            let block = module.functions[0].block(label).unwrap();
            let found = block.insts.iter().any(|i| match &i.kind {
                InstKind::Call { args, .. } => matches!(&args[2], Operand::Name(n) if n == "flagptr"),
                _ => false,
            });
            assert!(found, "expected a sink call naming flagptr in {label}");
        }
    }

    #[test]
    fn anonymous_phi_result_gets_a_synthetic_name() {
        let func = Function {
            name: "p".into(),
            entry_line: 1,
            params: vec![Param { name: "n".into(), width: Width::W32 }],
            blocks: vec![],
        };
        let mut tmp = 0;
        let name = resolve_variable_name(&func, "7", &DefSite::Phi { block: "join".into() }, &mut tmp);
        assert_eq!(name, "tmp_1");
    }

    #[test]
    fn named_ssa_value_is_used_as_is() {
        let func = Function { name: "q".into(), entry_line: 1, params: vec![], blocks: vec![] };
        let mut tmp = 0;
        let name = resolve_variable_name(&func, "n", &DefSite::Param, &mut tmp);
        assert_eq!(name, "n");
        assert_eq!(tmp, 0);
    }
}
