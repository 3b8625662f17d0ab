//! Injection Solver Wrapper (C5, spec.md §4.5): the locate/propose/try
//! pipeline, plus the one-shot map-loading state machine (spec.md §4.5
//! "State machine"), loaded once via `OnceLock` and never transitioning
//! again once `Ready` or `Degraded`.

use std::path::PathBuf;
use std::sync::OnceLock;

use vase_core::{LimitedValueMap, SiteKey, WrapperLimits};

use crate::arrays;
use crate::expr::{Expr, Query};
use crate::locate;
use crate::solver::{Decision, Solver, SolverError};
use crate::synth;

enum MapState {
    Ready(LimitedValueMap),
    Degraded,
}

/// Wraps an underlying `Solver`, consulting a Limited-Value Map to
/// propose candidate constraint augmentations before forwarding each
/// operation (spec.md §4.5 "Public contract").
pub struct InjectionWrapper<S: Solver> {
    solver: S,
    limits: WrapperLimits,
    map_path: Option<PathBuf>,
    state: OnceLock<MapState>,
}

impl<S: Solver> InjectionWrapper<S> {
    /// `map_path = None` means the wrapper degrades to pass-through
    /// after its first warning (spec.md §4.5 "Failure semantics").
    pub fn new(solver: S, limits: WrapperLimits, map_path: Option<PathBuf>) -> Self {
        InjectionWrapper { solver, limits, map_path, state: OnceLock::new() }
    }

    /// Loads the map on first call; every call thereafter reuses the
    /// same `Ready`/`Degraded` outcome (spec.md §4.5 "from degraded or
    /// ready, no further transitions").
    fn ensure_loaded(&self) -> &MapState {
        self.state.get_or_init(|| match &self.map_path {
            None => {
                tracing::warn!("vase-wrapper: no limited-value map configured, degrading to pass-through");
                MapState::Degraded
            }
            Some(path) => match LimitedValueMap::load(path) {
                Ok(map) => MapState::Ready(map),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "vase-wrapper: failed to load limited-value map, degrading to pass-through");
                    MapState::Degraded
                }
            },
        })
    }

    /// Looks the site up directly, then (spec.md §4.5 "Locate") retries
    /// without the `:branch:` suffix if the key carries one.
    fn lookup<'a>(map: &'a LimitedValueMap, site: &SiteKey) -> Option<&'a std::collections::BTreeMap<String, Vec<vase_core::ValueProperty>>> {
        map.get(site).or_else(|| if site.has_branch() { map.get(&site.without_branch()) } else { None })
    }

    /// Union of every variable's distinct integer values at the site,
    /// de-duplicated and capped at `max_values_per_site` (spec.md §4.5
    /// "Propose"; pooling across variables rather than keeping separate
    /// per-variable candidate sets is deliberate, per spec.md §9).
    fn candidate_values(&self, vars: &std::collections::BTreeMap<String, Vec<vase_core::ValueProperty>>) -> Vec<i64> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for values in vars.values() {
            for prop in values {
                if let Some(v) = prop.as_integer() {
                    if seen.insert(v) {
                        out.push(v);
                        if out.len() >= self.limits.max_values_per_site {
                            return out;
                        }
                    }
                }
            }
        }
        out
    }

    /// Runs the full locate/propose/try pipeline, returning the
    /// accepted augmentation if any (spec.md §4.5 steps 1-3).
    fn propose_augmented(&self, query: &Query) -> Result<Option<Query>, SolverError> {
        let map = match self.ensure_loaded() {
            MapState::Degraded => return Ok(None),
            MapState::Ready(map) => map,
        };

        let site = locate::extract_site_key(query.expressions().map(|e| e.to_string()));
        let Some(vars) = Self::lookup(map, &site) else { return Ok(None) };

        let values = self.candidate_values(vars);
        if values.is_empty() {
            return Ok(None);
        }

        let retained = arrays::discover(query, &self.limits);
        for val in values {
            for candidate in synth::candidates_for_value(val, &retained, &self.limits) {
                let augmented = query.with_extra_constraint(candidate.clone());
                match self.solver.validity(&augmented) {
                    Ok(decision) if decision.is_accepted() => {
                        if self.limits.verbose {
                            tracing::info!(site = %site, candidate = %candidate, "vase-wrapper: accepted constraint augmentation");
                        }
                        return Ok(Some(augmented));
                    }
                    Ok(_) => continue,
                    Err(_) => continue,
                }
            }
        }
        Ok(None)
    }

    fn effective_query(&self, query: &Query) -> Result<Query, SolverError> {
        Ok(self.propose_augmented(query)?.unwrap_or_else(|| query.clone()))
    }

    pub fn validity(&self, query: &Query) -> Result<Decision, SolverError> {
        let q = self.effective_query(query)?;
        self.solver.validity(&q)
    }

    pub fn truth(&self, query: &Query, expr: &Expr) -> Result<Decision, SolverError> {
        let q = self.effective_query(query)?;
        self.solver.truth(&q, expr)
    }

    pub fn value(&self, query: &Query, expr: &Expr) -> Result<i64, SolverError> {
        let q = self.effective_query(query)?;
        self.solver.value(&q, expr)
    }

    pub fn initial_values(&self, query: &Query, objects: &[String]) -> Result<Option<Vec<i64>>, SolverError> {
        let q = self.effective_query(query)?;
        self.solver.initial_values(&q, objects)
    }
}
