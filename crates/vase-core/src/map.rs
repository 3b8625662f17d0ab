//! The Limited-Value Map (spec.md §3, §6): the compact per-site catalogue
//! the distiller produces and the injection wrapper loads.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::site::SiteKey;

/// Tag `0` is the only one the wrapper acts on (spec.md §3): a signed
/// integer literal in `value`. Other tags are reserved for future
/// producers and are preserved on round-trip but otherwise ignored.
pub const TYPE_TAG_INTEGER: i32 = 0;

/// One catalogued value at a site, for one variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueProperty {
    #[serde(rename = "type")]
    pub type_tag: i32,
    pub value: String,
    #[serde(default)]
    pub ops: Vec<String>,
}

impl ValueProperty {
    pub fn integer(val: i64) -> Self {
        ValueProperty { type_tag: TYPE_TAG_INTEGER, value: val.to_string(), ops: Vec::new() }
    }

    /// Parses `value` as a signed 64-bit integer, iff this is a tag-0
    /// entry (spec.md §4.5 "Propose" — non-tag-0 and non-integer values
    /// are skipped by the wrapper, not treated as errors).
    pub fn as_integer(&self) -> Option<i64> {
        if self.type_tag != TYPE_TAG_INTEGER {
            return None;
        }
        self.value.parse().ok()
    }
}

/// Per-site, per-variable catalogue of limited values.
///
/// `BTreeMap` (rather than `HashMap`) throughout so that serialized
/// output and iteration order are deterministic — distilling the same
/// log twice with the same parameters must produce byte-identical JSON
/// (spec.md §8 property 4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitedValueMap(BTreeMap<SiteKey, BTreeMap<String, Vec<ValueProperty>>>);

impl LimitedValueMap {
    pub fn new() -> Self {
        LimitedValueMap(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sites(&self) -> impl Iterator<Item = &SiteKey> {
        self.0.keys()
    }

    pub fn get(&self, site: &SiteKey) -> Option<&BTreeMap<String, Vec<ValueProperty>>> {
        self.0.get(site)
    }

    pub fn insert_variable(&mut self, site: SiteKey, var: impl Into<String>, values: Vec<ValueProperty>) {
        if values.is_empty() {
            return;
        }
        self.0.entry(site).or_default().insert(var.into(), values);
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        LimitedValueMap::from_json(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let text = self.to_json_pretty().map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_through_json() {
        let mut map = LimitedValueMap::new();
        map.insert_variable(
            SiteKey::from_str("loc:42:branch:1").unwrap(),
            "argc",
            vec![ValueProperty::integer(4), ValueProperty::integer(9)],
        );
        let json = map.to_json_pretty().unwrap();
        let back = LimitedValueMap::from_json(&json).unwrap();
        assert_eq!(
            back.get(&SiteKey::from_str("loc:42:branch:1").unwrap())
                .unwrap()
                .get("argc")
                .unwrap(),
            &vec![ValueProperty::integer(4), ValueProperty::integer(9)]
        );
    }

    #[test]
    fn empty_sites_are_never_inserted() {
        let mut map = LimitedValueMap::new();
        map.insert_variable(SiteKey::bare(1), "x", vec![]);
        assert!(map.is_empty());
    }

    #[test]
    fn non_integer_tag_is_preserved_but_not_parsed() {
        let prop = ValueProperty { type_tag: 1, value: "whatever".into(), ops: vec![] };
        assert_eq!(prop.as_integer(), None);
    }

    #[test]
    fn matches_documented_shape() {
        let json = r#"{
            "loc:7": {
                "x": [{"type": 0, "value": "65", "ops": []}]
            }
        }"#;
        let map = LimitedValueMap::from_json(json).unwrap();
        let props = map.get(&SiteKey::bare(7)).unwrap().get("x").unwrap();
        assert_eq!(props[0].as_integer(), Some(65));
    }
}
