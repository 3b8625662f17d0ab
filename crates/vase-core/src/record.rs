//! Observation records: one line in the native-phase log (spec.md §4.1, §6).

use std::fmt;

use crate::site::SiteKey;

/// Sentinel branch value used when logging a function argument at entry
/// rather than at a branch side (spec.md §4.2 step 5).
pub const ENTRY_BRANCH: i32 = -1;

/// One observed integer value at a branch side (or function entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationRecord {
    pub loc: u64,
    pub branch: i32,
    pub var: String,
    pub val: i32,
}

/// A log line did not match the wire grammar of spec.md §6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordParseError {
    pub line: String,
}

impl fmt::Display for RecordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed observation line: {:?}", self.line)
    }
}

impl std::error::Error for RecordParseError {}

impl ObservationRecord {
    pub fn new(loc: u64, branch: i32, var: impl Into<String>, val: i32) -> Self {
        ObservationRecord { loc, branch, var: var.into(), val }
    }

    /// The site key this record contributes to (spec.md §8 property 6 —
    /// always well-formed, even for the entry sentinel branch).
    pub fn site_key(&self) -> SiteKey {
        SiteKey::from_loc_branch(self.loc, self.branch)
    }

    /// Parses one line of the exact grammar:
    /// `loc:<N>:branch:<B>\t<identifier>:<val>` (trailing `\n` optional,
    /// already stripped by the caller's line iterator in the common case).
    pub fn parse_line(line: &str) -> Result<Self, RecordParseError> {
        let err = || RecordParseError { line: line.to_string() };
        let line = line.trim_end_matches(['\n', '\r']);
        let (head, tail) = line.split_once('\t').ok_or_else(err)?;

        let head = head.strip_prefix("loc:").ok_or_else(err)?;
        let (loc_str, rest) = head.split_once(":branch:").ok_or_else(err)?;
        let loc: u64 = loc_str.parse().map_err(|_| err())?;
        let branch: i32 = rest.parse().map_err(|_| err())?;

        let (var, val_str) = tail.rsplit_once(':').ok_or_else(err)?;
        if var.is_empty() {
            return Err(err());
        }
        let val: i32 = val_str.parse().map_err(|_| err())?;

        Ok(ObservationRecord { loc, branch, var: var.to_string(), val })
    }
}

impl fmt::Display for ObservationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loc:{}:branch:{}\t{}:{}", self.loc, self.branch, self.var, self.val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let r = ObservationRecord::new(42, 1, "argc", 4);
        let line = r.to_string();
        assert_eq!(line, "loc:42:branch:1\targc:4");
        assert_eq!(ObservationRecord::parse_line(&line).unwrap(), r);
    }

    #[test]
    fn parses_negative_values() {
        let r = ObservationRecord::parse_line("loc:7:branch:0\tx:-128").unwrap();
        assert_eq!(r.val, -128);
    }

    #[test]
    fn entry_sentinel_site_key_is_bare() {
        let r = ObservationRecord::new(5, ENTRY_BRANCH, "argv0", 0);
        assert_eq!(r.site_key().to_string(), "loc:5");
    }

    #[test]
    fn rejects_malformed_lines() {
        for bad in [
            "not a record",
            "loc:abc:branch:1\tx:1",
            "loc:1:branch:1\tx",
            "loc:1:branch:1\t:5",
            "loc:1:branch:1\tx:y",
        ] {
            assert!(ObservationRecord::parse_line(bad).is_err(), "expected {bad:?} to be rejected");
        }
    }
}
