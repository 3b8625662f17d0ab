//! The underlying solver's interface surface, named after KLEE's own
//! `computeValidity` / `computeTruth` / `computeValue` /
//! `computeInitialValues` split, since this system wraps exactly that
//! kind of solver (spec.md §1, §4.5 "Public contract").
//!
//! No real SMT solver is implemented here in non-test code; embedders
//! provide their own `Solver` impl backed by the engine's actual
//! constraint solver.

use std::fmt;

use crate::expr::{Expr, Query};

/// The outcome of a satisfiability-flavored solver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Sat,
    Unsat,
    Unknown,
}

impl Decision {
    /// spec.md §4.5 "Acceptance predicate": anything other than
    /// certified-unsatisfiable is accepted.
    pub fn is_accepted(self) -> bool {
        !matches!(self, Decision::Unsat)
    }
}

/// An underlying-solver failure (spec.md §7): always counts as
/// "not accepted" mid-pipeline, and is propagated verbatim if it occurs
/// on the final forwarded query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverError(pub String);

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "underlying solver failure: {}", self.0)
    }
}

impl std::error::Error for SolverError {}

/// The four operations the wrapper exposes and that it, in turn,
/// requires from whatever solver it wraps (spec.md §4.5).
pub trait Solver {
    /// Is `query` satisfiable? Used both as a directly-requested
    /// operation and as the wrapper's internal acceptance check for a
    /// candidate augmentation.
    fn validity(&self, query: &Query) -> Result<Decision, SolverError>;

    /// Does `expr` hold in every model of `query`'s constraints?
    fn truth(&self, query: &Query, expr: &Expr) -> Result<Decision, SolverError>;

    /// The concrete value of `expr` in some model of `query`'s constraints.
    fn value(&self, query: &Query, expr: &Expr) -> Result<i64, SolverError>;

    /// A satisfying assignment for each named symbolic object, or
    /// `None` if `query` is unsatisfiable.
    fn initial_values(&self, query: &Query, objects: &[String]) -> Result<Option<Vec<i64>>, SolverError>;
}

#[cfg(any(test, feature = "brute-force-solver"))]
pub use brute_force::BruteForceSolver;

#[cfg(any(test, feature = "brute-force-solver"))]
mod brute_force {
    //! A real, generic `Solver` backed by bounded enumeration over
    //! single-byte array values — gives the test suite something to
    //! validate candidate acceptance against instead of hand-stubbed
    //! verdicts (grounded in `norlen-symex`'s evaluated-model split
    //! referenced by the retrieval pack). Exponential in the number of
    //! distinct arrays; only ever linked into tests or opt-in builds.

    use std::collections::HashMap;

    use super::{Decision, Solver, SolverError};
    use crate::expr::{Expr, Query};

    /// Enumerates every assignment of `0..=255` to each array byte up
    /// to `max_bytes_per_array`, evaluating the query's constraints and
    /// goal as booleans over that assignment.
    pub struct BruteForceSolver {
        pub max_bytes_per_array: usize,
    }

    impl Default for BruteForceSolver {
        fn default() -> Self {
            BruteForceSolver { max_bytes_per_array: 4 }
        }
    }

    type Env = HashMap<(String, i64), i64>;

    impl BruteForceSolver {
        fn arrays_in(&self, query: &Query) -> Vec<(String, usize)> {
            let mut widths: HashMap<String, usize> = HashMap::new();
            for expr in query.expressions() {
                collect_widths(expr, &mut widths, self.max_bytes_per_array);
            }
            let mut out: Vec<(String, usize)> = widths.into_iter().collect();
            out.sort();
            out
        }

        fn has_satisfying_assignment(&self, query: &Query, goal_must_hold: bool) -> Result<bool, SolverError> {
            let arrays = self.arrays_in(query);
            if arrays.iter().any(|(_, n)| *n > self.max_bytes_per_array) {
                return Err(SolverError("query exceeds brute-force solver's byte budget".into()));
            }
            let mut env = Env::new();
            Ok(self.search(query, &arrays, 0, &mut env, goal_must_hold))
        }

        fn search(&self, query: &Query, arrays: &[(String, usize)], idx: usize, env: &mut Env, goal_must_hold: bool) -> bool {
            if idx == arrays.len() {
                let constraints_hold = query.constraints.iter().all(|c| eval_bool(c, env));
                if !constraints_hold {
                    return false;
                }
                return if goal_must_hold { eval_bool(&query.goal, env) } else { true };
            }
            let (name, width) = &arrays[idx];
            let total_bytes: u32 = *width as u32;
            let upper = 1u64 << (8 * total_bytes.min(2));
            // Bound the search space for a whole-array value when the
            // array is wider than 2 bytes by only trying a handful of
            // representative byte patterns, since this solver exists to
            // validate small, hand-written test queries, not to scale.
            let candidates: Vec<u64> = if total_bytes <= 2 {
                (0..upper).collect()
            } else {
                vec![0, 1, 0x41, 0xff, 0x0102, 0xffffffff]
            };
            for value in candidates {
                for i in 0..*width {
                    let byte = ((value >> (8 * i)) & 0xff) as i64;
                    env.insert((name.clone(), i as i64), byte);
                }
                if self.search(query, arrays, idx + 1, env, goal_must_hold) {
                    return true;
                }
            }
            false
        }
    }

    fn collect_widths(expr: &Expr, widths: &mut HashMap<String, usize>, cap: usize) {
        match expr {
            Expr::Read { array, index } => {
                let idx = match index.as_ref() {
                    Expr::Const(i) => (*i as usize) + 1,
                    _ => 1,
                };
                let entry = widths.entry(array.clone()).or_insert(idx.min(cap));
                *entry = (*entry).max(idx.min(cap));
            }
            Expr::Eq(a, b) | Expr::And(a, b) | Expr::Add(a, b) => {
                collect_widths(a, widths, cap);
                collect_widths(b, widths, cap);
            }
            Expr::ZExt(a) | Expr::Shl(a, _) => collect_widths(a, widths, cap),
            Expr::BoolConst(_) | Expr::Const(_) | Expr::Tag(_) => {}
        }
    }

    fn eval_int(expr: &Expr, env: &Env) -> i64 {
        match expr {
            Expr::Const(v) => *v,
            Expr::Read { array, index } => {
                let idx = eval_int(index, env);
                *env.get(&(array.clone(), idx)).unwrap_or(&0)
            }
            Expr::Add(a, b) => eval_int(a, env).wrapping_add(eval_int(b, env)),
            Expr::ZExt(a) => eval_int(a, env) & 0xff,
            Expr::Shl(a, bits) => eval_int(a, env) << bits,
            Expr::Eq(a, b) => (eval_int(a, env) == eval_int(b, env)) as i64,
            Expr::And(a, b) => ((eval_int(a, env) != 0) && (eval_int(b, env) != 0)) as i64,
            Expr::BoolConst(b) => *b as i64,
            Expr::Tag(_) => 1,
        }
    }

    fn eval_bool(expr: &Expr, env: &Env) -> bool {
        eval_int(expr, env) != 0
    }

    impl Solver for BruteForceSolver {
        fn validity(&self, query: &Query) -> Result<Decision, SolverError> {
            Ok(if self.has_satisfying_assignment(query, false)? { Decision::Sat } else { Decision::Unsat })
        }

        fn truth(&self, query: &Query, expr: &Expr) -> Result<Decision, SolverError> {
            let augmented = query.with_extra_constraint(Expr::eq(expr.clone(), Expr::Const(0)));
            Ok(if self.has_satisfying_assignment(&augmented, false)? { Decision::Unsat } else { Decision::Sat })
        }

        fn value(&self, query: &Query, expr: &Expr) -> Result<i64, SolverError> {
            let arrays = self.arrays_in(query);
            let mut env = Env::new();
            if self.search(query, &arrays, 0, &mut env, false) {
                Ok(eval_int(expr, &env))
            } else {
                Err(SolverError("no satisfying assignment".into()))
            }
        }

        fn initial_values(&self, query: &Query, objects: &[String]) -> Result<Option<Vec<i64>>, SolverError> {
            let arrays = self.arrays_in(query);
            let mut env = Env::new();
            if !self.search(query, &arrays, 0, &mut env, false) {
                return Ok(None);
            }
            let widths: HashMap<String, usize> = arrays.into_iter().collect();
            let values = objects
                .iter()
                .map(|name| {
                    let width = widths.get(name).copied().unwrap_or(1);
                    let mut v: i64 = 0;
                    for i in 0..width {
                        let b = *env.get(&(name.clone(), i as i64)).unwrap_or(&0);
                        v |= b << (8 * i);
                    }
                    v
                })
                .collect();
            Ok(Some(values))
        }
    }
}
