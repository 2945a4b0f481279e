//! ESPEA: energy-based scalarized preference evolutionary algorithm.
//!
//! ESPEA keeps a bounded archive of non-dominated individuals. Once the
//! archive is full, a new candidate only enters by replacing a member, and
//! only if the replacement lowers the archive's total *energy*. The energy of
//! a pair of members is
//!
//! ```text
//! energy(a, b) = W(a) * W(b) / |a - b|
//! ```
//!
//! where `W` is a [`ScalarizationFunction`] applied to normalized objectives
//! and `|a - b|` their Euclidean distance. Low-charge, well spread members are
//! cheap; crowded or unpreferred members are expensive and get replaced.
//!
//! # Components
//!
//! - [`IndexAllocator`]: stable slot indices for archive members
//! - [`Normalizer`]: global objective bounds, invalidates the cache when they move
//! - [`ScalarizationFunction`]: the charge `W`
//! - [`EnergyCache`]: incremental pairwise energies, O(n) per scored candidate
//! - [`EnergyArchive`]: admission and replacement policy
//! - [`DistinctTournamentCoupler`]: distinct parent pairs
//! - [`CrossoverMutateMating`] and [`DifferentialEvolutionMating`]: offspring
//! - [`Espea`]: the generation loop
//!
//! # References
//!
//! Braun, M., Shukla, P., & Schmeck, H. (2015). Obtaining optimal Pareto front
//! approximations using scalarized preference information. GECCO '15.

mod archive;
mod cache;
mod coupler;
mod index;
mod mating;
mod normalizer;
mod optimizer;
mod scalarization;

pub use archive::{ArchiveListener, EnergyArchive, ReplacementStrategy};
pub use cache::{CacheValidity, EnergyCache, MutationStrategy, RemovalOption, energy_between};
pub use coupler::DistinctTournamentCoupler;
pub use index::{IndexAllocator, Slot};
pub use mating::{CrossoverMutateMating, DifferentialEvolutionMating, Mating};
pub use normalizer::{Bounds, Normalizer};
pub use optimizer::{Espea, Phase};
pub use scalarization::{
    Chebyshev, NoPreference, ScalarizationFunction, ScalarizationKind, SumOfObjectives,
};
