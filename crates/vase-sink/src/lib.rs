//! Observation Log (C1, spec.md §4.1).
//!
//! An append-only sink addressable by a configured path, falling back to
//! a default file name. A single call atomically writes exactly one
//! observation record in the canonical textual format. Writers must
//! tolerate concurrent invocations from child processes; failure to open
//! the sink is non-fatal.

pub mod ffi;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use vase_core::{ObservationRecord, ENTRY_BRANCH};

/// Environment variable the path is read from at program startup (spec.md §6).
pub const ENV_VAR: &str = "VASE_VALUE_LOG";

/// Relative default used when the env var is absent or empty (spec.md §6).
pub const DEFAULT_LOG_FILE: &str = "vase_value_log.txt";

/// Resolves the configured log path: `VASE_VALUE_LOG`, or the relative
/// default if absent or empty.
pub fn default_log_path() -> PathBuf {
    match std::env::var(ENV_VAR) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_LOG_FILE),
    }
}

/// Appends one observation record at a branch side. `path` overrides the
/// env-var-resolved default; pass `None` to use it. Never panics: a
/// failure to open or write is reported via `tracing::warn!` and the call
/// returns (spec.md §4.1, §7).
pub fn record(path: Option<&Path>, loc: u64, branch: i32, var: &str, val: i32) {
    let resolved;
    let target: &Path = match path {
        Some(p) => p,
        None => {
            resolved = default_log_path();
            &resolved
        }
    };

    let line = ObservationRecord::new(loc, branch, var, val);
    if let Err(e) = append_line(target, &line.to_string()) {
        tracing::warn!(path = %target.display(), error = %e, "vase-sink: failed to append observation record");
    }
}

/// Appends a function-argument observation at function entry, using the
/// reserved entry sentinel branch (spec.md §4.2 step 5).
pub fn record_entry(path: Option<&Path>, loc: u64, var: &str, val: i32) {
    record(path, loc, ENTRY_BRANCH, var, val);
}

/// One atomic `write` of a single complete line (spec.md §5: "use the
/// O/S atomic-append semantics for its record writes"). Opens and closes
/// the file handle per call — no shared in-process state, so no lock can
/// alter the host program's threading behavior.
fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    file.write_all(buf.as_bytes())
}
