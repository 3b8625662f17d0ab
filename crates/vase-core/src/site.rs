//! Site keys identifying a conditional-branch observation point.
//!
//! A site key is either `loc:<N>` (the branch-less fallback) or
//! `loc:<N>:branch:<B>` with `B` in `{0, 1}`. Both the distiller (which
//! emits keys into the Limited-Value Map) and the location extractor
//! (which parses keys back out of solver-query text) share this type so
//! the grammar can never drift between producer and consumer.

use std::fmt;
use std::str::FromStr;

/// Identifies a conditional-branch observation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteKey {
    loc: u64,
    branch: Option<u8>,
}

/// A site key string failed to match `loc:\d+(:branch:[01])?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteKeyError(pub String);

impl fmt::Display for SiteKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed site key: {:?}", self.0)
    }
}

impl std::error::Error for SiteKeyError {}

impl SiteKey {
    /// The branch-less fallback site used when no constraint in a query
    /// carries a recognizable `loc:` tag.
    pub fn sentinel() -> Self {
        SiteKey { loc: 0, branch: None }
    }

    pub fn bare(loc: u64) -> Self {
        SiteKey { loc, branch: None }
    }

    /// Returns `None` (and normalizes to the bare form) unless `branch`
    /// is `0` or `1` — the only values the wire grammar allows in a
    /// `:branch:<B>` suffix. Observation records carrying other sentinel
    /// "sides" (e.g. the `-1` entry-argument marker, spec.md §4.2 step 5)
    /// fold into the bare site for their line rather than producing a
    /// key the rest of the system could never parse back (spec.md §8
    /// property 6, site-key well-formedness).
    pub fn from_loc_branch(loc: u64, branch: i32) -> Self {
        match branch {
            0 => SiteKey { loc, branch: Some(0) },
            1 => SiteKey { loc, branch: Some(1) },
            _ => SiteKey::bare(loc),
        }
    }

    pub fn loc(&self) -> u64 {
        self.loc
    }

    pub fn branch(&self) -> Option<u8> {
        self.branch
    }

    /// True if this key carries a `:branch:` suffix.
    pub fn has_branch(&self) -> bool {
        self.branch.is_some()
    }

    /// The branch-less fallback of this key (itself, if already bare).
    pub fn without_branch(&self) -> Self {
        SiteKey { loc: self.loc, branch: None }
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.branch {
            Some(b) => write!(f, "loc:{}:branch:{}", self.loc, b),
            None => write!(f, "loc:{}", self.loc),
        }
    }
}

impl FromStr for SiteKey {
    type Err = SiteKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("loc:").ok_or_else(|| SiteKeyError(s.to_string()))?;
        match rest.split_once(":branch:") {
            Some((loc_str, branch_str)) => {
                let loc: u64 = loc_str.parse().map_err(|_| SiteKeyError(s.to_string()))?;
                let branch: u8 = branch_str.parse().map_err(|_| SiteKeyError(s.to_string()))?;
                if branch > 1 {
                    return Err(SiteKeyError(s.to_string()));
                }
                Ok(SiteKey { loc, branch: Some(branch) })
            }
            None => {
                let loc: u64 = rest.parse().map_err(|_| SiteKeyError(s.to_string()))?;
                Ok(SiteKey { loc, branch: None })
            }
        }
    }
}

impl serde::Serialize for SiteKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for SiteKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SiteKey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_branch_form() {
        let key = SiteKey::from_str("loc:42:branch:1").unwrap();
        assert_eq!(key.to_string(), "loc:42:branch:1");
        assert_eq!(key.loc(), 42);
        assert_eq!(key.branch(), Some(1));
    }

    #[test]
    fn round_trips_bare_form() {
        let key = SiteKey::from_str("loc:9").unwrap();
        assert_eq!(key.to_string(), "loc:9");
        assert_eq!(key.branch(), None);
    }

    #[test]
    fn rejects_malformed_keys() {
        for bad in ["loc:", "loc:9:branch:2", "loc:x", "branch:1", "loc:9:branch:"] {
            assert!(SiteKey::from_str(bad).is_err(), "expected {bad:?} to be rejected");
        }
    }

    #[test]
    fn entry_sentinel_folds_to_bare() {
        let key = SiteKey::from_loc_branch(12, -1);
        assert_eq!(key, SiteKey::bare(12));
        assert_eq!(key.to_string(), "loc:12");
    }

    #[test]
    fn without_branch_strips_suffix() {
        let key = SiteKey::from_str("loc:3:branch:0").unwrap();
        assert_eq!(key.without_branch(), SiteKey::bare(3));
    }
}
