//! A small, self-contained intermediate representation: functions, basic
//! blocks, and three-address instructions with SSA values and attached
//! debug line numbers (spec.md §4.2 "Scope"). Independent of any real
//! compiler — the pass in `pass.rs` is specified against this shape so
//! its dominance and insertion-point logic can be unit-tested directly.

use std::fmt;

/// Bit width of an integer operand, before the pass's widen/narrow-to-32
/// normalization (spec.md §4.2 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W1,
    W8,
    W16,
    W32,
    W64,
}

impl Width {
    pub fn bits(self) -> u32 {
        match self {
            Width::W1 => 1,
            Width::W8 => 8,
            Width::W16 => 16,
            Width::W32 => 32,
            Width::W64 => 64,
        }
    }
}

/// A value used as an instruction or terminator operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A constant integer — never logged by value (spec.md §4.2 step 3:
    /// "non-constant integer value").
    Const(i64, Width),
    /// A reference to an SSA name: an instruction result, a block
    /// parameter (phi), or a function parameter.
    Value(String),
    /// A non-integer (floating point) condition operand (spec.md §4.2
    /// "Floating-point and otherwise-non-integer conditions").
    Float,
    /// A compile-time string literal burned into a call's argument list
    /// (used for the observation sink's `var` argument). Not a value a
    /// branch condition can depend on.
    Name(String),
}

impl Operand {
    pub fn is_constant(&self) -> bool {
        matches!(self, Operand::Const(..))
    }

    pub fn ssa_name(&self) -> Option<&str> {
        match self {
            Operand::Value(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
            BinOp::Lt => "lt",
            BinOp::Le => "le",
            BinOp::Gt => "gt",
            BinOp::Ge => "ge",
        };
        f.write_str(s)
    }
}

/// The operation an instruction performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    BinOp { op: BinOp, lhs: Operand, rhs: Operand, width: Width },
    /// Loads through a named pointer (spec.md §4.2 step 4: "for loads,
    /// the pointer name" is the variable-name fallback).
    Load { pointer: String, width: Width },
    /// A call instruction — this is also the shape the pass itself
    /// inserts for observation-sink calls.
    Call { callee: String, args: Vec<Operand> },
}

/// The observation-sink callee name the pass inserts calls to.
pub const SINK_CALLEE: &str = "__vase_record";

/// One instruction. `debug_name` is the declared source name, if debug
/// metadata carries one (spec.md §4.2 step 4, second priority after the
/// SSA name itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inst {
    pub result: Option<String>,
    pub kind: InstKind,
    pub debug_name: Option<String>,
}

impl Inst {
    pub fn is_sink_call(&self) -> bool {
        matches!(&self.kind, InstKind::Call { callee, .. } if callee == SINK_CALLEE)
    }
}

/// A phi node: still counted as "leading" for insertion-point purposes
/// (spec.md §4.2 step 3: "Insertion points in a block always skip over
/// leading phi nodes").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phi {
    pub result: String,
    pub incoming: Vec<(String, Operand)>,
}

/// A basic block's terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    /// A two-way conditional branch — the only terminator the pass acts on.
    CondBr {
        cond: Operand,
        then_bb: String,
        else_bb: String,
        /// Source line, if debug metadata carries one (spec.md §4.2 step 1).
        debug_line: Option<u32>,
    },
    Br { target: String },
    Ret(Option<Operand>),
}

impl Terminator {
    pub fn successors(&self) -> Vec<&str> {
        match self {
            Terminator::CondBr { then_bb, else_bb, .. } => vec![then_bb.as_str(), else_bb.as_str()],
            Terminator::Br { target } => vec![target.as_str()],
            Terminator::Ret(_) => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub label: String,
    pub phis: Vec<Phi>,
    pub insts: Vec<Inst>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>, terminator: Terminator) -> Self {
        BasicBlock { label: label.into(), phis: Vec::new(), insts: Vec::new(), terminator }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub width: Width,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    /// Declaration line, used as the synthetic site id when a branch
    /// terminator carries no debug line (spec.md §4.2 step 1).
    pub entry_line: u32,
    pub params: Vec<Param>,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }

    pub fn block_index(&self, label: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.label == label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub functions: Vec<Function>,
    instrumented: bool,
}

impl Module {
    pub fn new(functions: Vec<Function>) -> Self {
        Module { functions, instrumented: false }
    }

    pub fn is_instrumented(&self) -> bool {
        self.instrumented
    }

    pub(crate) fn mark_instrumented(&mut self) {
        self.instrumented = true;
    }
}
