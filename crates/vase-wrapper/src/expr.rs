//! A minimal symbolic expression type and the query shape the wrapper
//! operates on (spec.md §1: "we specify only the interface surface it
//! requires" from the underlying engine and solver).
//!
//! This is not a general SMT AST — just enough structure for the
//! location extractor to scan textual renderings (spec.md §4.4) and for
//! candidate synthesis to build byte-array equalities (spec.md §4.5).

use std::fmt;

/// A symbolic expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    BoolConst(bool),
    Const(i64),
    /// A byte read from a symbolic array at a (possibly symbolic) index.
    Read { array: String, index: Box<Expr> },
    Eq(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    /// Zero-extend a narrower value to a wider one.
    ZExt(Box<Expr>),
    /// Left-shift by a constant number of bits.
    Shl(Box<Expr>, u32),
    /// An opaque marker planted in a query purely so the location
    /// extractor's textual scan has something to find (spec.md §4.4).
    /// Carries no semantic weight of its own.
    Tag(String),
}

impl Expr {
    pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Eq(Box::new(lhs), Box::new(rhs))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn read(array: impl Into<String>, index: i64) -> Expr {
        Expr::Read { array: array.into(), index: Box::new(Expr::Const(index)) }
    }

    pub fn zext(inner: Expr) -> Expr {
        Expr::ZExt(Box::new(inner))
    }

    pub fn shl(inner: Expr, bits: u32) -> Expr {
        Expr::Shl(Box::new(inner), bits)
    }

    /// Folds a left-to-right conjunction over `exprs`, panicking on an
    /// empty slice only when called with one (internal synthesis paths
    /// always pass at least one conjunct).
    pub fn conjunction(mut exprs: Vec<Expr>) -> Expr {
        let mut acc = exprs.remove(0);
        for e in exprs {
            acc = Expr::and(acc, e);
        }
        acc
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::BoolConst(b) => write!(f, "{b}"),
            Expr::Const(v) => write!(f, "{v}"),
            Expr::Read { array, index } => write!(f, "read({array},{index})"),
            Expr::Eq(a, b) => write!(f, "({a} == {b})"),
            Expr::And(a, b) => write!(f, "({a} && {b})"),
            Expr::Add(a, b) => write!(f, "({a} + {b})"),
            Expr::ZExt(a) => write!(f, "zext({a})"),
            Expr::Shl(a, bits) => write!(f, "({a} << {bits})"),
            Expr::Tag(s) => write!(f, "{s}"),
        }
    }
}

/// A solver query: side-constraints plus a goal expression (spec.md
/// §4.5 "Public contract").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub constraints: Vec<Expr>,
    pub goal: Expr,
}

impl Query {
    pub fn new(constraints: Vec<Expr>, goal: Expr) -> Self {
        Query { constraints, goal }
    }

    /// All constraints plus the goal, in the order the location
    /// extractor and array discovery scan them.
    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.constraints.iter().chain(std::iter::once(&self.goal))
    }

    /// Returns a query identical to `self` with `extra` conjoined onto
    /// the constraint set (spec.md §4.5 "candidate augmentation").
    pub fn with_extra_constraint(&self, extra: Expr) -> Query {
        let mut constraints = self.constraints.clone();
        constraints.push(extra);
        Query { constraints, goal: self.goal.clone() }
    }
}
