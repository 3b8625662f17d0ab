//! Profile distiller (C3, spec.md §4.3): turns a raw observation log
//! into the Limited-Value Map, under occurrence and cardinality bounds.

use std::collections::BTreeMap;
use std::fmt;

use vase_core::{DistillerParams, LimitedValueMap, ObservationRecord, ValueProperty};

/// A line that could not be parsed as an observation record, or some
/// other non-fatal condition encountered while distilling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistillWarning {
    MalformedLine { line_number: usize, text: String },
}

impl fmt::Display for DistillWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistillWarning::MalformedLine { line_number, text } => {
                write!(f, "line {line_number}: malformed observation record: {text:?}")
            }
        }
    }
}

/// Parses every line, tallies occurrences, and emits the Limited-Value
/// Map per spec.md §4.3's algorithm. Never fails: an empty or entirely
/// malformed input yields an empty map plus one warning per bad line
/// (spec.md §4.3 "Failure semantics").
pub fn distill<'a>(
    lines: impl Iterator<Item = &'a str>,
    params: &DistillerParams,
) -> (LimitedValueMap, Vec<DistillWarning>) {
    let mut warnings = Vec::new();
    // (site, var) -> val -> occurrence count
    let mut counts: BTreeMap<(vase_core::SiteKey, String), BTreeMap<i32, u32>> = BTreeMap::new();

    for (idx, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        match ObservationRecord::parse_line(line) {
            Ok(record) => {
                let key = (record.site_key(), record.var.clone());
                *counts.entry(key).or_default().entry(record.val).or_insert(0) += 1;
            }
            Err(_) => warnings.push(DistillWarning::MalformedLine { line_number: idx + 1, text: line.to_string() }),
        }
    }

    let mut map = LimitedValueMap::new();
    for ((site, var), value_counts) in counts {
        let mut survivors: Vec<(i32, u32)> = value_counts
            .into_iter()
            .filter(|(_, count)| *count >= params.min_occurrence)
            .collect();
        // Descending by count, ties broken by ascending value (spec.md
        // §4.3 step 4) — sort by value first so the stable sort on count
        // preserves ascending order within equal counts.
        survivors.sort_by_key(|(val, _)| *val);
        survivors.sort_by(|a, b| b.1.cmp(&a.1));
        survivors.truncate(params.max_values);

        let values: Vec<ValueProperty> = survivors.into_iter().map(|(val, _)| ValueProperty::integer(val as i64)).collect();
        map.insert_variable(site, var, values);
    }

    (map, warnings)
}
