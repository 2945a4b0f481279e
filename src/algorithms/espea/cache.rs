//! Incremental pairwise energies of archive members.
//!
//! For an archive capacity of n the cache keeps an n²/2 table of pairwise
//! energies plus one row sum per member. Scoring a candidate takes n energy
//! computations while the cache is valid and n²/2 + n when it has to be
//! rebuilt first. The cache only goes invalid when the [`Normalizer`] widens
//! its bounds, which becomes rare once the objective ranges settle.
//!
//! Row sums are maintained incrementally as members come and go, so they may
//! differ from a from-scratch summation by rounding error. With
//! [`MutationStrategy::Inverse`] that error comes from subtracting a summand
//! that dominates its row sum; such summands mostly show up while the archive
//! is still filling and are wiped out by the next rebuild.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use serde::{Deserialize, Serialize};

use super::index::IndexAllocator;
use super::normalizer::Normalizer;
use super::scalarization::ScalarizationFunction;
use crate::{IndividualId, NormalizedObjectives, Objectives};

/// Energy between two normalized objective vectors.
pub fn energy_between(
    scalarization: &dyn ScalarizationFunction,
    a: &NormalizedObjectives,
    b: &NormalizedObjectives,
) -> f64 {
    scalarization.calculate(a, b) / a.distance(b)
}

/// How row sums are corrected when a member leaves the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationStrategy {
    /// Subtract the departing member's summand from each row. O(1) per row,
    /// subject to cancellation error.
    #[default]
    Inverse,
    /// Re-add every remaining summand of each row. O(n) per row, exact up to
    /// ordinary summation error.
    Recalculate,
}

/// Validity flag shared between a cache and the normalizer feeding it.
///
/// A fresh flag is invalid.
#[derive(Clone, Debug, Default)]
pub struct CacheValidity(Arc<AtomicBool>);

impl CacheValidity {
    pub fn invalidate(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn mark_valid(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_valid(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happens if `member` is evicted in favour of a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemovalOption {
    /// Energy `member` currently introduces into the archive.
    pub member_energy: f64,
    /// Energy the candidate would introduce if it replaced `member`.
    pub candidate_energy: f64,
    pub member: IndividualId,
}

#[inline]
fn cell(summands: &[Vec<f64>], i: usize, j: usize) -> f64 {
    if i > j { summands[i][j] } else { summands[j][i] }
}

pub struct EnergyCache {
    slots: IndexAllocator<Objectives>,
    /// Normalized objectives per slot, current while the cache is valid.
    normalized: Vec<NormalizedObjectives>,
    validity: CacheValidity,
    /// `summands[i][j]` with `i > j`: energy between the members at i and j.
    summands: Vec<Vec<f64>>,
    /// Total energy each member introduces into the archive.
    sums: Vec<f64>,
    /// Last scored candidate, kept so admitting it needs no recomputation.
    candidate: Option<(IndividualId, NormalizedObjectives)>,
    candidate_summands: Vec<f64>,
    mutation: MutationStrategy,
    scalarization: Box<dyn ScalarizationFunction>,
    rebuilds: u64,
}

impl EnergyCache {
    pub fn new(
        capacity: usize,
        scalarization: Box<dyn ScalarizationFunction>,
        mutation: MutationStrategy,
    ) -> Self {
        let slots = IndexAllocator::new(capacity);
        let n = slots.slot_count();
        Self {
            slots,
            normalized: vec![NormalizedObjectives::default(); n],
            validity: CacheValidity::default(),
            summands: (0..n).map(|i| vec![0.0; i]).collect(),
            sums: vec![0.0; n],
            candidate: None,
            candidate_summands: vec![0.0; n],
            mutation,
            scalarization,
            rebuilds: 0,
        }
    }

    /// Handle the normalizer uses to invalidate this cache.
    pub fn validity(&self) -> CacheValidity {
        self.validity.clone()
    }

    pub fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }

    /// Forces a full rebuild on the next read.
    pub fn invalidate(&self) {
        self.validity.invalidate();
    }

    /// Number of full rebuilds performed so far.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn mutation_strategy(&self) -> MutationStrategy {
        self.mutation
    }

    pub fn scalarization(&self) -> &dyn ScalarizationFunction {
        self.scalarization.as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn index_of(&self, id: IndividualId) -> Option<usize> {
        self.slots.lookup(id)
    }

    /// Scores a candidate against every member.
    ///
    /// Returns one [`RemovalOption`] per member, in ascending index order. If
    /// the candidate is admitted right afterwards, [`EnergyCache::member_added`]
    /// reuses this scoring.
    pub fn replacement_energies_for(
        &mut self,
        candidate: IndividualId,
        objectives: &Objectives,
        normalizer: &Normalizer,
    ) -> Vec<RemovalOption> {
        self.ensure_valid(normalizer);
        let normalized = normalizer.normalize(objectives);
        let total = self.fill_candidate_summands(candidate, &normalized);
        self.candidate = Some((candidate, normalized));

        self.slots
            .iter()
            .map(|(index, slot)| RemovalOption {
                member_energy: self.sums[index],
                candidate_energy: total - self.candidate_summands[index],
                member: slot.id,
            })
            .collect()
    }

    /// Energy `member` introduces into the archive, or `None` if it is not
    /// cached.
    pub fn energy_introduced_by(
        &mut self,
        member: IndividualId,
        normalizer: &Normalizer,
    ) -> Option<f64> {
        let index = self.slots.lookup(member)?;
        self.ensure_valid(normalizer);
        Some(self.sums[index])
    }

    /// Sum of all pairwise energies.
    pub fn total_energy(&mut self, normalizer: &Normalizer) -> f64 {
        self.ensure_valid(normalizer);
        self.slots.iter().map(|(i, _)| self.sums[i]).sum::<f64>() / 2.0
    }

    /// Registers a new member and folds its energies into the table.
    pub fn member_added(
        &mut self,
        member: IndividualId,
        objectives: Objectives,
        normalizer: &Normalizer,
    ) -> usize {
        let scored = match self.candidate.take() {
            Some((id, normalized)) if id == member => Some(normalized),
            _ => None,
        };
        if !self.validity.is_valid() {
            return self.slots.assign(member, objectives);
        }

        let normalized = match scored {
            Some(normalized) => normalized,
            None => {
                let normalized = normalizer.normalize(&objectives);
                self.fill_candidate_summands(member, &normalized);
                normalized
            }
        };

        let added = self.slots.assign(member, objectives);
        self.normalized[added] = normalized;
        self.sums[added] = 0.0;
        for (index, _) in self.slots.iter() {
            if index == added {
                continue;
            }
            let summand = self.candidate_summands[index];
            if added > index {
                self.summands[added][index] = summand;
            } else {
                self.summands[index][added] = summand;
            }
            self.sums[added] += summand;
            self.sums[index] += summand;
        }
        added
    }

    /// Drops a member and removes its energy from every other row.
    ///
    /// # Panics
    ///
    /// Panics if `member` is not cached.
    pub fn member_removed(&mut self, member: IndividualId) -> usize {
        let Some((removed, _)) = self.slots.release(member) else {
            panic!("individual {member} is not an energy cache member");
        };
        if !self.validity.is_valid() {
            return removed;
        }

        match self.mutation {
            MutationStrategy::Inverse => {
                for (index, _) in self.slots.iter() {
                    self.sums[index] -= cell(&self.summands, removed, index);
                }
            }
            MutationStrategy::Recalculate => {
                for (index, _) in self.slots.iter() {
                    self.sums[index] = self
                        .slots
                        .iter()
                        .filter(|(other, _)| *other != index)
                        .map(|(other, _)| cell(&self.summands, index, other))
                        .sum();
                }
            }
        }
        removed
    }

    fn ensure_valid(&mut self, normalizer: &Normalizer) {
        if !self.validity.is_valid() {
            self.rebuild(normalizer);
        }
    }

    fn rebuild(&mut self, normalizer: &Normalizer) {
        // Mark first: a concurrent invalidation must not be lost.
        self.validity.mark_valid();
        self.candidate = None;

        let indices: Vec<usize> = self.slots.iter().map(|(i, _)| i).collect();
        for (index, slot) in self.slots.iter() {
            self.normalized[index] = normalizer.normalize(&slot.value);
        }
        for (pos, &row) in indices.iter().enumerate() {
            self.sums[row] = 0.0;
            for &column in &indices[..pos] {
                let summand = energy_between(
                    self.scalarization.as_ref(),
                    &self.normalized[row],
                    &self.normalized[column],
                );
                self.sums[row] += summand;
                self.sums[column] += summand;
                self.summands[row][column] = summand;
            }
        }
        self.rebuilds += 1;
        debug!(
            "rebuilt energy cache for {} members (rebuild #{})",
            indices.len(),
            self.rebuilds
        );
    }

    /// Computes the candidate's energy against every member, returning the
    /// total.
    fn fill_candidate_summands(
        &mut self,
        candidate: IndividualId,
        normalized: &NormalizedObjectives,
    ) -> f64 {
        let mut total = 0.0;
        for (index, slot) in self.slots.iter() {
            let summand = if slot.id == candidate {
                0.0
            } else {
                energy_between(self.scalarization.as_ref(), normalized, &self.normalized[index])
            };
            self.candidate_summands[index] = summand;
            total += summand;
        }
        total
    }
}
