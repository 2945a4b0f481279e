//! Candidate solutions and the factory that hands out their identities.

use std::fmt;
use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Genotype, Objectives};

/// Identity of an individual. Two individuals are the same only if their ids are.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualId(u64);

impl IndividualId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A genotype together with its (eventual) evaluation result.
///
/// Equality is identity-based: two individuals with identical genotypes and
/// objectives are still different unless they share an [`IndividualId`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "G: Genotype")]
pub struct Individual<G: Genotype> {
    id: IndividualId,
    genotype: G,
    objectives: Option<Objectives>,
}

impl<G: Genotype> Individual<G> {
    pub fn new(id: IndividualId, genotype: G) -> Self {
        Self {
            id,
            genotype,
            objectives: None,
        }
    }

    /// Creates an individual that already carries its objectives.
    pub fn evaluated(id: IndividualId, genotype: G, objectives: Objectives) -> Self {
        Self {
            id,
            genotype,
            objectives: Some(objectives),
        }
    }

    pub fn id(&self) -> IndividualId {
        self.id
    }

    pub fn genotype(&self) -> &G {
        &self.genotype
    }

    pub fn objectives(&self) -> Option<&Objectives> {
        self.objectives.as_ref()
    }

    pub fn is_evaluated(&self) -> bool {
        self.objectives.is_some()
    }

    /// Attaches the evaluation result. Objectives are write-once.
    ///
    /// # Panics
    ///
    /// Panics if the individual was already evaluated.
    pub fn set_objectives(&mut self, objectives: Objectives) {
        assert!(
            self.objectives.is_none(),
            "individual {} is already evaluated",
            self.id
        );
        self.objectives = Some(objectives);
    }
}

impl<G: Genotype> PartialEq for Individual<G> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<G: Genotype> Eq for Individual<G> {}

impl<G: Genotype> Hash for Individual<G> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Produces fresh random genotypes for the initial population.
pub trait Creator<G: Genotype>: Send + Sync {
    fn create<R: Rng>(&self, rng: &mut R) -> G;
}

/// Wraps genotypes into individuals with unique ids.
#[derive(Debug)]
pub struct IndividualFactory<C> {
    creator: C,
    next_id: u64,
}

impl<C> IndividualFactory<C> {
    pub fn new(creator: C) -> Self {
        Self { creator, next_id: 0 }
    }

    pub fn creator(&self) -> &C {
        &self.creator
    }

    /// Number of individuals created so far.
    pub fn created(&self) -> u64 {
        self.next_id
    }

    /// Creates an individual from a random genotype.
    pub fn create<G, R>(&mut self, rng: &mut R) -> Individual<G>
    where
        G: Genotype,
        C: Creator<G>,
        R: Rng,
    {
        let genotype = self.creator.create(rng);
        self.create_from(genotype)
    }

    /// Creates an individual from a given genotype.
    pub fn create_from<G: Genotype>(&mut self, genotype: G) -> Individual<G> {
        let id = IndividualId(self.next_id);
        self.next_id += 1;
        Individual::new(id, genotype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Objective;

    #[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
    struct Dna(f64);

    impl Genotype for Dna {
        fn mutate<R: Rng>(&mut self, _rng: &mut R, _rate: f32) {}
        fn crossover<R: Rng>(&self, other: &Self, _rng: &mut R) -> Self {
            Dna((self.0 + other.0) / 2.0)
        }
    }

    #[test]
    fn test_equality_is_identity_based() {
        let mut factory = IndividualFactory::new(());
        let a = factory.create_from(Dna(1.0));
        let b = factory.create_from(Dna(1.0));
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    #[should_panic(expected = "already evaluated")]
    fn test_objectives_are_write_once() {
        let mut ind = Individual::new(IndividualId::new(0), Dna(0.0));
        let obj = Objectives::new().with(Objective::minimize("f"), 1.0);
        ind.set_objectives(obj.clone());
        ind.set_objectives(obj);
    }
}
