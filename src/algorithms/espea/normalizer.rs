//! Global objective bounds and normalization.

use std::collections::HashMap;

use log::debug;

use super::cache::CacheValidity;
use crate::{Genotype, Individual, NormalizedObjectives, Objective, Objectives};

/// Smallest and largest value seen for one objective, in minimization terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

/// Maps objectives onto `[0, 1]`, where 0 is the best and 1 the worst value
/// ever observed for that objective.
///
/// Bounds only ever widen. Whenever they do, the attached energy cache is
/// invalidated before [`Normalizer::observe`] returns, since every cached
/// energy was computed under the old scale.
#[derive(Debug, Default)]
pub struct Normalizer {
    bounds: HashMap<Objective, Bounds>,
    cache: Option<CacheValidity>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires the invalidation hook of an energy cache.
    pub fn attach(&mut self, cache: CacheValidity) {
        self.cache = Some(cache);
    }

    pub fn bounds(&self, objective: &Objective) -> Option<Bounds> {
        self.bounds.get(objective).copied()
    }

    /// Normalizes each value to `[0, 1]`.
    ///
    /// Infeasible values and objectives that were never observed map to 1.0.
    /// An objective whose bounds have collapsed to a single value maps to 0.0.
    pub fn normalize(&self, objectives: &Objectives) -> NormalizedObjectives {
        let values = objectives
            .iter()
            .map(|(objective, value)| {
                let v = objective.to_min_problem(value);
                match self.bounds.get(objective) {
                    _ if !v.is_finite() => 1.0,
                    None => 1.0,
                    Some(b) if b.max > b.min => ((v - b.min) / (b.max - b.min)).clamp(0.0, 1.0),
                    Some(_) => 0.0,
                }
            })
            .collect();
        NormalizedObjectives::new(values)
    }

    /// Widens the bounds to include `objectives`. Returns `true` if any bound
    /// moved, in which case the attached cache has been invalidated.
    pub fn observe(&mut self, objectives: &Objectives) -> bool {
        let mut changed = false;
        for (objective, value) in objectives.iter() {
            let v = objective.to_min_problem(value);
            if !v.is_finite() {
                continue;
            }
            match self.bounds.get_mut(objective) {
                Some(b) => {
                    if v < b.min {
                        b.min = v;
                        changed = true;
                    }
                    if v > b.max {
                        b.max = v;
                        changed = true;
                    }
                }
                None => {
                    self.bounds.insert(objective.clone(), Bounds { min: v, max: v });
                    changed = true;
                }
            }
        }
        if changed && let Some(cache) = &self.cache {
            debug!("objective bounds widened, invalidating energy cache");
            cache.invalidate();
        }
        changed
    }

    /// Observes a freshly evaluated individual. Unevaluated individuals are
    /// ignored.
    pub fn on_evaluated<G: Genotype>(&mut self, individual: &Individual<G>) -> bool {
        match individual.objectives() {
            Some(objectives) => self.observe(objectives),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(cost: Option<f64>, quality: f64) -> Objectives {
        Objectives::new()
            .with(Objective::minimize("cost"), cost)
            .with(Objective::maximize("quality"), quality)
    }

    #[test]
    fn test_normalizes_against_observed_range() {
        let mut n = Normalizer::new();
        n.observe(&obj(Some(0.0), 10.0));
        n.observe(&obj(Some(4.0), 0.0));

        let out = n.normalize(&obj(Some(1.0), 10.0));
        assert!((out.array()[0] - 0.25).abs() < 1e-12);
        // Best quality seen is the minimum of the negated scale.
        assert!(out.array()[1].abs() < 1e-12);
        let worst = n.normalize(&obj(Some(4.0), 0.0));
        assert_eq!(worst.array(), &[1.0, 1.0]);
    }

    #[test]
    fn test_maximized_bounds_are_negated() {
        let mut n = Normalizer::new();
        n.observe(&obj(Some(1.0), 3.0));
        n.observe(&obj(Some(1.0), 5.0));
        let b = n.bounds(&Objective::maximize("quality")).unwrap();
        assert_eq!(b, Bounds { min: -5.0, max: -3.0 });
    }

    #[test]
    fn test_infeasible_never_moves_bounds_and_maps_to_one() {
        let mut n = Normalizer::new();
        n.observe(&obj(Some(2.0), 1.0));
        assert!(!n.observe(&obj(None, 1.0)));
        assert_eq!(
            n.bounds(&Objective::minimize("cost")),
            Some(Bounds { min: 2.0, max: 2.0 })
        );
        assert_eq!(n.normalize(&obj(None, 1.0)).array()[0], 1.0);
    }

    #[test]
    fn test_unobserved_and_degenerate_objectives() {
        let mut n = Normalizer::new();
        assert_eq!(n.normalize(&obj(Some(3.0), 1.0)).array(), &[1.0, 1.0]);
        n.observe(&obj(Some(3.0), 1.0));
        assert_eq!(n.normalize(&obj(Some(3.0), 1.0)).array(), &[0.0, 0.0]);
    }

    #[test]
    fn test_values_outside_bounds_are_clamped() {
        let mut n = Normalizer::new();
        n.observe(&obj(Some(0.0), 0.0));
        n.observe(&obj(Some(1.0), 1.0));
        let out = n.normalize(&obj(Some(-5.0), 7.0));
        assert_eq!(out.array(), &[0.0, 0.0]);
    }

    #[test]
    fn test_bound_change_invalidates_attached_cache() {
        let validity = CacheValidity::default();
        let mut n = Normalizer::new();
        n.attach(validity.clone());

        validity.mark_valid();
        assert!(n.observe(&obj(Some(1.0), 1.0)));
        assert!(!validity.is_valid());

        validity.mark_valid();
        // Inside the current bounds: nothing moves.
        assert!(!n.observe(&obj(Some(1.0), 1.0)));
        assert!(validity.is_valid());
    }
}
