//! Instrumentation pass: walks a function's conditional branches and
//! inserts observation-sink calls for the operands that feed each
//! branch decision, following the dominance and naming rules that keep
//! the inserted IR valid.

mod dominance;
pub mod ir;
mod pass;

pub use pass::{run, InstrumentError, InstrumentReport, SkippedLog, FP_MARKER_NAME};
