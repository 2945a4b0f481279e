//! Offspring production from the archive.

use rand::Rng;
use rand::seq::index;

use super::coupler::DistinctTournamentCoupler;
use crate::{EspeaError, Genotype};

/// Produces offspring genotypes from a parent pool.
pub trait Mating<G: Genotype> {
    /// Creates `size` offspring from `parents`.
    ///
    /// `ranking` is aligned with `parents`; lower values are preferred.
    /// Missing entries rank as ties.
    fn offspring<R: Rng>(
        &self,
        size: usize,
        parents: &[&G],
        ranking: &[f64],
        rng: &mut R,
    ) -> Result<Vec<G>, EspeaError>;
}

/// Tournament-coupled crossover followed by mutation of both children.
#[derive(Debug, Clone)]
pub struct CrossoverMutateMating {
    coupler: DistinctTournamentCoupler,
    crossover_rate: f64,
    mutation_rate: f32,
}

impl CrossoverMutateMating {
    pub fn new(coupler: DistinctTournamentCoupler, crossover_rate: f64, mutation_rate: f32) -> Self {
        Self {
            coupler,
            crossover_rate: crossover_rate.clamp(0.0, 1.0),
            mutation_rate,
        }
    }
}

impl<G: Genotype> Mating<G> for CrossoverMutateMating {
    fn offspring<R: Rng>(
        &self,
        size: usize,
        parents: &[&G],
        ranking: &[f64],
        rng: &mut R,
    ) -> Result<Vec<G>, EspeaError> {
        let rank = |i: usize| ranking.get(i).copied().unwrap_or(0.0);
        let couples = self.coupler.couples(
            size.div_ceil(2),
            parents.len(),
            |a, b| rank(a).total_cmp(&rank(b)),
            rng,
        )?;

        let mut offspring = Vec::with_capacity(couples.len() * 2);
        for (a, b) in couples {
            let (mut first, mut second) = if rng.random_bool(self.crossover_rate) {
                parents[a].crossover_pair(parents[b], rng)
            } else {
                (parents[a].clone(), parents[b].clone())
            };
            first.mutate(rng, self.mutation_rate);
            second.mutate(rng, self.mutation_rate);
            offspring.push(first);
            offspring.push(second);
        }
        offspring.truncate(size);
        Ok(offspring)
    }
}

/// DE/rand/1: one trial vector `a + F * (b - c)` per parent, recombined with
/// that parent.
///
/// Requires exactly one offspring per parent and at least 4 parents, so that
/// three others remain to build the trial vector.
#[derive(Debug, Clone)]
pub struct DifferentialEvolutionMating {
    scaling_factor: f64,
}

impl DifferentialEvolutionMating {
    pub const MIN_PARENTS: usize = 4;

    pub fn new(scaling_factor: f64) -> Self {
        Self { scaling_factor }
    }

    pub fn scaling_factor(&self) -> f64 {
        self.scaling_factor
    }
}

impl<G: Genotype> Mating<G> for DifferentialEvolutionMating {
    fn offspring<R: Rng>(
        &self,
        size: usize,
        parents: &[&G],
        _ranking: &[f64],
        rng: &mut R,
    ) -> Result<Vec<G>, EspeaError> {
        let n = parents.len();
        if size != n {
            return Err(EspeaError::OffspringSizeMismatch {
                requested: size,
                parents: n,
            });
        }
        if n < Self::MIN_PARENTS {
            return Err(EspeaError::TooFewParents {
                required: Self::MIN_PARENTS,
                actual: n,
            });
        }

        let mut offspring = Vec::with_capacity(n);
        for (i, parent) in parents.iter().enumerate() {
            // Three distinct others: sample from the n - 1 slots left after
            // taking the parent out.
            let picks = index::sample(rng, n - 1, 3);
            let [a, b, c] = [0, 1, 2].map(|k| {
                let j = picks.index(k);
                if j >= i { j + 1 } else { j }
            });

            let trial = parents[a]
                .differential(parents[b], parents[c], self.scaling_factor)
                .ok_or(EspeaError::IncompatibleRepresentation)?;
            let (first, second) = trial.crossover_pair(parent, rng);
            offspring.push(if rng.random_bool(0.5) { first } else { second });
        }
        Ok(offspring)
    }
}
