//! Candidate constraint synthesis over symbolic byte arrays (spec.md
//! §4.5 "Candidate synthesis over symbolic arrays").

use vase_core::WrapperLimits;

use crate::arrays::RootArray;
use crate::expr::Expr;

/// Builds every candidate augmentation for one limited value, across
/// all retained arrays, in the documented order: bytewise-per-array,
/// then packed-per-array, then (optionally) the two-array sum (spec.md
/// §4.5 a/b/c). Callers iterate values outermost to get the full
/// value × candidate-class × array ordering.
pub fn candidates_for_value(val: i64, arrays: &[RootArray], limits: &WrapperLimits) -> Vec<Expr> {
    let mut out = Vec::new();

    for array in arrays {
        out.push(bytewise_equality(array, val));
    }
    for array in arrays {
        out.push(packed_equality(array, val));
    }
    if limits.try_pairs && arrays.len() == 2 {
        out.push(pair_sum_equality(&arrays[0], &arrays[1], val));
    }

    out
}

fn byte_of(val: i64, i: usize) -> i64 {
    (val >> (8 * i)) & 0xff
}

/// a. Bytewise equality on a single array: `read(A,i) == byte_i(v)` for
/// `i = 0..n-1`, conjoined.
fn bytewise_equality(array: &RootArray, val: i64) -> Expr {
    let conjuncts: Vec<Expr> =
        (0..array.bytes_used).map(|i| Expr::eq(Expr::read(&array.name, i as i64), Expr::Const(byte_of(val, i)))).collect();
    Expr::conjunction(conjuncts)
}

/// `pack_LE_u32(A, n) = sum_{i=0..n-1} zext(read(A,i)) << 8i`.
fn packed_le_u32(array: &RootArray) -> Expr {
    let terms: Vec<Expr> = (0..array.bytes_used)
        .map(|i| {
            let byte = Expr::zext(Expr::read(&array.name, i as i64));
            if i == 0 { byte } else { Expr::shl(byte, (8 * i) as u32) }
        })
        .collect();
    let mut iter = terms.into_iter();
    let mut acc = iter.next().expect("bytes_used is always >= 1");
    for term in iter {
        acc = Expr::add(acc, term);
    }
    acc
}

/// b. Packed 32-bit equality: `pack_LE_u32(A,n) == (uint32)v`.
fn packed_equality(array: &RootArray, val: i64) -> Expr {
    Expr::eq(packed_le_u32(array), Expr::Const(val as u32 as i64))
}

/// c. Sum of two arrays: `pack_LE_u32(A0,n0) + pack_LE_u32(A1,n1) == (uint32)v`.
fn pair_sum_equality(a0: &RootArray, a1: &RootArray, val: i64) -> Expr {
    Expr::eq(Expr::add(packed_le_u32(a0), packed_le_u32(a1)), Expr::Const(val as u32 as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(name: &str, bytes_used: usize) -> RootArray {
        RootArray { name: name.into(), bytes_used }
    }

    #[test]
    fn bytewise_equality_matches_little_endian_bytes() {
        let e = bytewise_equality(&array("A", 2), 0x0102);
        assert_eq!(e.to_string(), "((read(A,0) == 2) && (read(A,1) == 1))");
    }

    #[test]
    fn packed_equality_renders_sum_of_shifted_bytes() {
        let e = packed_equality(&array("A", 2), 0x0102);
        assert_eq!(e.to_string(), "((zext(read(A,0)) + (zext(read(A,1)) << 8)) == 258)");
    }

    #[test]
    fn candidates_are_value_then_class_then_array_ordered() {
        let arrays = vec![array("A", 1), array("B", 1)];
        let limits = WrapperLimits::default();
        let cands = candidates_for_value(5, &arrays, &limits);
        // a(A), a(B), b(A), b(B), c(A,B)
        assert_eq!(cands.len(), 5);
        assert_eq!(cands[0].to_string(), bytewise_equality(&arrays[0], 5).to_string());
        assert_eq!(cands[1].to_string(), bytewise_equality(&arrays[1], 5).to_string());
        assert_eq!(cands[2].to_string(), packed_equality(&arrays[0], 5).to_string());
        assert_eq!(cands[3].to_string(), packed_equality(&arrays[1], 5).to_string());
        assert_eq!(cands[4].to_string(), pair_sum_equality(&arrays[0], &arrays[1], 5).to_string());
    }

    #[test]
    fn pair_sum_is_skipped_when_try_pairs_is_off() {
        let arrays = vec![array("A", 1), array("B", 1)];
        let limits = WrapperLimits { try_pairs: false, ..WrapperLimits::default() };
        let cands = candidates_for_value(5, &arrays, &limits);
        assert_eq!(cands.len(), 4);
    }

    #[test]
    fn pair_sum_is_skipped_unless_exactly_two_arrays() {
        let arrays = vec![array("A", 1)];
        let limits = WrapperLimits::default();
        let cands = candidates_for_value(5, &arrays, &limits);
        assert_eq!(cands.len(), 2);
    }
}
