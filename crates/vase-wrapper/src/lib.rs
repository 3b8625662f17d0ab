//! Location Extractor (C4) and Injection Solver Wrapper (C5): locates
//! the site a solver query belongs to, proposes candidate equality
//! constraints drawn from the Limited-Value Map, and forwards the
//! first proposal the underlying solver certifies as non-unsatisfiable.

mod arrays;
pub mod expr;
pub mod locate;
pub mod solver;
mod synth;
mod wrapper;

pub use expr::{Expr, Query};
pub use solver::{Decision, Solver, SolverError};
pub use wrapper::InjectionWrapper;
