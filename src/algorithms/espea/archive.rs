//! The bounded energy archive.

use log::trace;
use serde::{Deserialize, Serialize};

use super::cache::{EnergyCache, MutationStrategy, RemovalOption};
use super::normalizer::Normalizer;
use super::scalarization::ScalarizationFunction;
use crate::{EspeaError, Genotype, Individual, IndividualId};

/// Which replaceable member a candidate evicts once the archive is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplacementStrategy {
    /// The member whose slot gives the candidate the lowest energy.
    BestFeasiblePosition,
    /// The member with the highest energy, regardless of the candidate.
    #[default]
    WorstInArchive,
    /// The member maximizing `member_energy - candidate_energy`.
    LargestEnergyDecrease,
}

impl ReplacementStrategy {
    /// Picks the member to evict from the replaceable options. On ties the
    /// option listed first (lowest cache index) wins.
    pub fn select(self, replaceable: &[RemovalOption]) -> Option<IndividualId> {
        let key = |o: &RemovalOption| match self {
            Self::BestFeasiblePosition => -o.candidate_energy,
            Self::WorstInArchive => o.member_energy,
            Self::LargestEnergyDecrease => o.member_energy - o.candidate_energy,
        };
        let mut best: Option<(f64, IndividualId)> = None;
        for option in replaceable {
            let k = key(option);
            if best.is_none_or(|(b, _)| k > b) {
                best = Some((k, option.member));
            }
        }
        best.map(|(_, member)| member)
    }
}

/// Observer of archive membership changes.
///
/// Called synchronously, exactly once per admission or eviction, after the
/// energy cache has been updated.
pub trait ArchiveListener<G: Genotype>: Send {
    fn member_added(&mut self, member: &Individual<G>);
    fn member_removed(&mut self, member: &Individual<G>);
}

/// A bounded set of non-dominated individuals.
///
/// While below capacity every candidate is admitted. At capacity a candidate
/// only enters by replacing a member that introduces more energy into the
/// archive than the candidate would in its place; if several members qualify
/// the [`ReplacementStrategy`] decides.
///
/// Construction is two-phase: [`EnergyArchive::new`] followed by
/// [`EnergyArchive::initialize`], which creates the energy cache and wires it
/// to the [`Normalizer`].
pub struct EnergyArchive<G: Genotype> {
    capacity: usize,
    replacement: ReplacementStrategy,
    mutation: MutationStrategy,
    scalarization: Option<Box<dyn ScalarizationFunction>>,
    cache: Option<EnergyCache>,
    members: Vec<Individual<G>>,
    listeners: Vec<Box<dyn ArchiveListener<G>>>,
}

impl<G: Genotype> EnergyArchive<G> {
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(
        capacity: usize,
        replacement: ReplacementStrategy,
        mutation: MutationStrategy,
        scalarization: Box<dyn ScalarizationFunction>,
    ) -> Self {
        assert!(capacity > 0, "archive capacity must be greater than 0");
        Self {
            capacity,
            replacement,
            mutation,
            scalarization: Some(scalarization),
            cache: None,
            members: Vec::with_capacity(capacity),
            listeners: Vec::new(),
        }
    }

    /// Creates the energy cache and attaches it to `normalizer`.
    ///
    /// Must be called once before the first update. Calling it again only
    /// re-attaches the existing cache.
    pub fn initialize(&mut self, normalizer: &mut Normalizer) {
        if let Some(scalarization) = self.scalarization.take() {
            self.cache = Some(EnergyCache::new(self.capacity, scalarization, self.mutation));
        }
        if let Some(cache) = &self.cache {
            normalizer.attach(cache.validity());
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cache.is_some()
    }

    pub fn add_listener(&mut self, listener: Box<dyn ArchiveListener<G>>) {
        self.listeners.push(listener);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn replacement_strategy(&self) -> ReplacementStrategy {
        self.replacement
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    /// Members in admission order.
    pub fn members(&self) -> &[Individual<G>] {
        &self.members
    }

    pub fn contains(&self, id: IndividualId) -> bool {
        self.members.iter().any(|m| m.id() == id)
    }

    pub fn get(&self, id: IndividualId) -> Option<&Individual<G>> {
        self.members.iter().find(|m| m.id() == id)
    }

    pub fn cache(&self) -> Option<&EnergyCache> {
        self.cache.as_ref()
    }

    /// Energy `member` introduces into the archive. `None` if the archive is
    /// not initialized or `member` is not archived.
    pub fn energy_introduced_by(
        &mut self,
        member: IndividualId,
        normalizer: &Normalizer,
    ) -> Option<f64> {
        self.cache.as_mut()?.energy_introduced_by(member, normalizer)
    }

    /// Energies of all members, aligned with [`EnergyArchive::members`].
    pub fn energies(&mut self, normalizer: &Normalizer) -> Result<Vec<f64>, EspeaError> {
        let cache = self.cache.as_mut().ok_or(EspeaError::ArchiveNotInitialized)?;
        Ok(self
            .members
            .iter()
            .map(|m| {
                cache
                    .energy_introduced_by(m.id(), normalizer)
                    .unwrap_or_else(|| panic!("archive member {} missing from energy cache", m.id()))
            })
            .collect())
    }

    /// Sum of all pairwise energies in the archive.
    pub fn total_energy(&mut self, normalizer: &Normalizer) -> Option<f64> {
        Some(self.cache.as_mut()?.total_energy(normalizer))
    }

    /// Offers a batch of evaluated candidates to the archive.
    ///
    /// Candidates weakly dominated by another candidate or by a member are
    /// dropped, and members dominated by a surviving candidate are evicted.
    /// The rest goes through [`EnergyArchive::update_with_nondominated`].
    /// Returns `true` if membership changed.
    pub fn update(
        &mut self,
        candidates: Vec<Individual<G>>,
        normalizer: &Normalizer,
    ) -> Result<bool, EspeaError> {
        self.check_ready(&candidates)?;

        let candidates: Vec<Individual<G>> = candidates
            .into_iter()
            .filter(|c| !self.contains(c.id()))
            .collect();

        // Among equal candidates the first one survives.
        let keep: Vec<bool> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                !candidates.iter().enumerate().any(|(j, other)| {
                    j != i && (dominates(other, c) || (j < i && weakly_dominates(other, c)))
                })
            })
            .collect();
        let candidates: Vec<Individual<G>> = candidates
            .into_iter()
            .zip(keep)
            .filter(|(c, keep)| *keep && !self.members.iter().any(|m| weakly_dominates(m, c)))
            .map(|(c, _)| c)
            .collect();

        let dominated: Vec<IndividualId> = self
            .members
            .iter()
            .filter(|m| candidates.iter().any(|c| dominates(c, m)))
            .map(|m| m.id())
            .collect();
        let changed = !dominated.is_empty();
        for id in dominated {
            self.evict(id);
        }

        Ok(self.update_with_nondominated(candidates, normalizer)? || changed)
    }

    /// Admits or rejects candidates one by one, assuming none of them is
    /// dominated by a member.
    ///
    /// Candidates are not checked against each other: below capacity each one
    /// is admitted unconditionally.
    pub fn update_with_nondominated(
        &mut self,
        candidates: Vec<Individual<G>>,
        normalizer: &Normalizer,
    ) -> Result<bool, EspeaError> {
        self.check_ready(&candidates)?;
        let mut changed = false;
        for candidate in candidates {
            if self.members.len() < self.capacity {
                self.admit(candidate, normalizer);
                changed = true;
            } else {
                changed |= self.replace_with_nondominated(candidate, normalizer);
            }
        }
        Ok(changed)
    }

    fn check_ready(&self, candidates: &[Individual<G>]) -> Result<(), EspeaError> {
        if self.cache.is_none() {
            return Err(EspeaError::ArchiveNotInitialized);
        }
        match candidates.iter().find(|c| !c.is_evaluated()) {
            Some(c) => Err(EspeaError::NotEvaluated(c.id())),
            None => Ok(()),
        }
    }

    /// Replaces a member with `candidate` if that lowers the archive energy.
    fn replace_with_nondominated(
        &mut self,
        candidate: Individual<G>,
        normalizer: &Normalizer,
    ) -> bool {
        let (Some(cache), Some(objectives)) = (self.cache.as_mut(), candidate.objectives()) else {
            return false;
        };
        let replaceable: Vec<RemovalOption> = cache
            .replacement_energies_for(candidate.id(), objectives, normalizer)
            .into_iter()
            .filter(|o| o.member_energy > o.candidate_energy)
            .collect();

        let Some(victim) = self.replacement.select(&replaceable) else {
            return false;
        };
        trace!(
            "{:?}: {} replaces {} ({} replaceable members)",
            self.replacement,
            candidate.id(),
            victim,
            replaceable.len()
        );
        self.evict(victim);
        self.admit(candidate, normalizer);
        true
    }

    fn admit(&mut self, candidate: Individual<G>, normalizer: &Normalizer) {
        if let (Some(cache), Some(objectives)) = (self.cache.as_mut(), candidate.objectives()) {
            cache.member_added(candidate.id(), objectives.clone(), normalizer);
        }
        for listener in &mut self.listeners {
            listener.member_added(&candidate);
        }
        self.members.push(candidate);
    }

    fn evict(&mut self, id: IndividualId) -> Option<Individual<G>> {
        let position = self.members.iter().position(|m| m.id() == id)?;
        let member = self.members.remove(position);
        if let Some(cache) = self.cache.as_mut() {
            cache.member_removed(id);
        }
        for listener in &mut self.listeners {
            listener.member_removed(&member);
        }
        Some(member)
    }
}

fn dominates<G: Genotype>(a: &Individual<G>, b: &Individual<G>) -> bool {
    match (a.objectives(), b.objectives()) {
        (Some(a), Some(b)) => a.dominates(b),
        _ => false,
    }
}

fn weakly_dominates<G: Genotype>(a: &Individual<G>, b: &Individual<G>) -> bool {
    match (a.objectives(), b.objectives()) {
        (Some(a), Some(b)) => a.weakly_dominates(b),
        _ => false,
    }
}
