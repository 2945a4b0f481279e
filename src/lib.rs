use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod completer;
pub mod config;
pub mod error;
pub mod individual;
pub mod objectives;

pub use completer::{Completer, TerminationSignal};
pub use config::{ConfigError, EspeaConfig};
pub use error::EspeaError;
pub use individual::{Creator, Individual, IndividualFactory, IndividualId};
pub use objectives::{NormalizedObjectives, Objective, Objectives, Sign};

/// The 'DNA' of an individual.
/// Defined by how it changes, not what it does.
pub trait Genotype: Clone + Serialize + for<'de> Deserialize<'de> + Send + Sync {
    fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32);
    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self;

    /// Crossover producing two children. The default recombines twice with
    /// the parents in swapped roles.
    fn crossover_pair<R: Rng>(&self, other: &Self, rng: &mut R) -> (Self, Self) {
        (self.crossover(other, rng), other.crossover(self, rng))
    }

    /// Vector algebra used by differential evolution: `self + scale * (b - c)`.
    ///
    /// Returns `None` when the representation has no arithmetic, which makes
    /// differential evolution report an incompatible representation.
    fn differential(&self, _b: &Self, _c: &Self, _scale: f64) -> Option<Self> {
        None
    }
}

/// A trait for systems that can turn DNA into a Body and evaluate it.
pub trait Evaluator<G: Genotype>: Send + Sync {
    /// Express DNA and return its objective values.
    /// This is where the 'Physics' or 'Logic' happens.
    fn evaluate(&self, genotype: &G) -> Objectives;
}

/// The master engine trait.
pub trait Evolver<G: Genotype> {
    /// Runs one generation.
    fn step<E: Evaluator<G>>(&mut self, evaluator: &E) -> Result<(), EspeaError>;
    fn population(&self) -> &[Individual<G>];
}

pub mod algorithms {
    pub mod espea;
}
