//! Root-array discovery and bytes-used inference (spec.md §4.5,
//! "Candidate synthesis over symbolic arrays").

use vase_core::WrapperLimits;

use crate::expr::{Expr, Query};

/// A symbolic root array retained for candidate synthesis, with its
/// inferred access width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootArray {
    pub name: String,
    pub bytes_used: usize,
}

/// Walks every constraint and the goal once, collecting up to
/// `limits.max_arrays` distinct array names in first-seen order, each
/// with its inferred bytes-used (one plus the maximum constant byte
/// index observed in a read of that array; `4` if only non-constant
/// indices appear; clamped to `[1, limits.max_bytes]`).
pub fn discover(query: &Query, limits: &WrapperLimits) -> Vec<RootArray> {
    let mut order: Vec<String> = Vec::new();
    let mut max_const_index: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
    let mut saw_nonconstant: std::collections::HashMap<String, bool> = std::collections::HashMap::new();

    for expr in query.expressions() {
        walk(expr, &mut order, &mut max_const_index, &mut saw_nonconstant, limits.max_arrays);
    }

    order
        .into_iter()
        .take(limits.max_arrays)
        .map(|name| {
            let bytes_used = if saw_nonconstant.get(&name).copied().unwrap_or(false) && !max_const_index.contains_key(&name)
            {
                4
            } else {
                max_const_index.get(&name).map(|m| (m + 1) as usize).unwrap_or(4)
            };
            RootArray { name, bytes_used: bytes_used.clamp(1, limits.max_bytes) }
        })
        .collect()
}

fn walk(
    expr: &Expr,
    order: &mut Vec<String>,
    max_const_index: &mut std::collections::HashMap<String, i64>,
    saw_nonconstant: &mut std::collections::HashMap<String, bool>,
    max_arrays: usize,
) {
    match expr {
        Expr::Read { array, index } => {
            if !order.contains(array) && order.len() < max_arrays {
                order.push(array.clone());
            }
            match index.as_ref() {
                Expr::Const(i) => {
                    let entry = max_const_index.entry(array.clone()).or_insert(*i);
                    if *i > *entry {
                        *entry = *i;
                    }
                }
                other => {
                    saw_nonconstant.insert(array.clone(), true);
                    walk(other, order, max_const_index, saw_nonconstant, max_arrays);
                }
            }
        }
        Expr::Eq(a, b) | Expr::And(a, b) | Expr::Add(a, b) => {
            walk(a, order, max_const_index, saw_nonconstant, max_arrays);
            walk(b, order, max_const_index, saw_nonconstant, max_arrays);
        }
        Expr::ZExt(a) => walk(a, order, max_const_index, saw_nonconstant, max_arrays),
        Expr::Shl(a, _) => walk(a, order, max_const_index, saw_nonconstant, max_arrays),
        Expr::BoolConst(_) | Expr::Const(_) | Expr::Tag(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> WrapperLimits {
        WrapperLimits::default()
    }

    #[test]
    fn bytes_used_is_max_const_index_plus_one() {
        let query = Query::new(
            vec![Expr::eq(Expr::read("A", 2), Expr::Const(0))],
            Expr::BoolConst(true),
        );
        let arrays = discover(&query, &limits());
        assert_eq!(arrays, vec![RootArray { name: "A".into(), bytes_used: 3 }]);
    }

    #[test]
    fn only_nonconstant_indices_default_to_four() {
        let query = Query::new(
            vec![Expr::eq(Expr::Read { array: "A".into(), index: Box::new(Expr::read("idx", 0)) }, Expr::Const(0))],
            Expr::BoolConst(true),
        );
        let arrays = discover(&query, &limits());
        let a = arrays.iter().find(|r| r.name == "A").unwrap();
        assert_eq!(a.bytes_used, 4);
    }

    #[test]
    fn bytes_used_is_clamped_to_max_bytes() {
        let query = Query::new(vec![Expr::eq(Expr::read("A", 99), Expr::Const(0))], Expr::BoolConst(true));
        let limits = WrapperLimits { max_bytes: 4, ..WrapperLimits::default() };
        let arrays = discover(&query, &limits);
        assert_eq!(arrays[0].bytes_used, 4);
    }

    #[test]
    fn at_most_max_arrays_are_retained_in_first_seen_order() {
        let query = Query::new(
            vec![
                Expr::eq(Expr::read("A", 0), Expr::Const(0)),
                Expr::eq(Expr::read("B", 0), Expr::Const(0)),
                Expr::eq(Expr::read("C", 0), Expr::Const(0)),
            ],
            Expr::BoolConst(true),
        );
        let limits = WrapperLimits { max_arrays: 2, ..WrapperLimits::default() };
        let arrays = discover(&query, &limits);
        assert_eq!(arrays.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
