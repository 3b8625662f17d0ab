//! Configuration inputs shared across the pipeline (spec.md §5, §6).

/// Parameters controlling what the distiller keeps (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistillerParams {
    /// Minimum occurrence count for a value to survive (spec.md §3 invariant).
    pub min_occurrence: u32,
    /// Maximum distinct values retained per `(site, var)` (spec.md §3 invariant).
    pub max_values: usize,
}

impl Default for DistillerParams {
    /// Recommended defaults for exploratory runs (spec.md §4.3).
    fn default() -> Self {
        DistillerParams { min_occurrence: 3, max_values: 5 }
    }
}

/// Resource caps the injection wrapper applies per query (spec.md §5, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapperLimits {
    pub max_arrays: usize,
    pub max_bytes: usize,
    pub max_values_per_site: usize,
    pub try_pairs: bool,
    pub verbose: bool,
}

impl Default for WrapperLimits {
    fn default() -> Self {
        WrapperLimits {
            max_arrays: 4,
            max_bytes: 4,
            max_values_per_site: 4,
            try_pairs: true,
            verbose: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let d = DistillerParams::default();
        assert_eq!(d.min_occurrence, 3);
        assert_eq!(d.max_values, 5);

        let w = WrapperLimits::default();
        assert_eq!(w.max_arrays, 4);
        assert_eq!(w.max_bytes, 4);
        assert_eq!(w.max_values_per_site, 4);
        assert!(w.try_pairs);
        assert!(w.verbose);
    }
}
