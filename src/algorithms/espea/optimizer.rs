use log::{debug, info, warn};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use super::archive::{ArchiveListener, EnergyArchive};
use super::coupler::DistinctTournamentCoupler;
use super::mating::{CrossoverMutateMating, DifferentialEvolutionMating, Mating};
use super::normalizer::Normalizer;
use super::scalarization::ScalarizationFunction;
use crate::{
    Completer, Creator, EspeaConfig, EspeaError, Evaluator, Evolver, Genotype, Individual,
    IndividualFactory, TerminationSignal,
};

/// What the next generation does, decided from the archive state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fewer than 2 members: draw a fresh random population.
    Bootstrap,
    /// Crossover and mutation of archive members.
    Early,
    /// Differential evolution over the full archive.
    Late,
}

/// The ESPEA generation loop.
///
/// Each call to [`Espea::next`] produces candidates for the current
/// [`Phase`], evaluates them through the [`Completer`], feeds the results to
/// the [`Normalizer`] and offers them to the [`EnergyArchive`]. The archive is
/// the result of the optimization.
pub struct Espea<G: Genotype, C: Creator<G>> {
    config: EspeaConfig,
    factory: IndividualFactory<C>,
    normalizer: Normalizer,
    archive: EnergyArchive<G>,
    completer: Completer,
    early: CrossoverMutateMating,
    late: DifferentialEvolutionMating,
    // Set once differential evolution rejected the representation.
    late_fallback: bool,
    capacity_reached: bool,
    iteration: usize,
    rng: Pcg64,
    termination: TerminationSignal,
}

impl<G: Genotype, C: Creator<G>> Espea<G, C> {
    /// Creates an optimizer using the configured built-in scalarization.
    pub fn new(config: EspeaConfig, creator: C, seed: u64) -> Result<Self, EspeaError> {
        let scalarization = config.scalarization.build();
        Self::with_scalarization(config, creator, scalarization, seed)
    }

    /// Creates an optimizer with a custom scalarization function. The
    /// `scalarization` field of `config` is ignored.
    pub fn with_scalarization(
        config: EspeaConfig,
        creator: C,
        scalarization: Box<dyn ScalarizationFunction>,
        seed: u64,
    ) -> Result<Self, EspeaError> {
        config.validate()?;

        let mut normalizer = Normalizer::new();
        let mut archive = EnergyArchive::new(
            config.capacity,
            config.replacement_strategy,
            config.cache_mutation_strategy,
            scalarization,
        );
        archive.initialize(&mut normalizer);

        let early = CrossoverMutateMating::new(
            DistinctTournamentCoupler::new(config.tournament_size),
            config.crossover_rate,
            config.mutation_rate,
        );
        let late = DifferentialEvolutionMating::new(config.scaling_factor);

        Ok(Self {
            completer: Completer::new(config.max_threads)?,
            factory: IndividualFactory::new(creator),
            normalizer,
            archive,
            early,
            late,
            late_fallback: false,
            capacity_reached: false,
            iteration: 0,
            rng: Pcg64::seed_from_u64(seed),
            termination: TerminationSignal::new(),
            config,
        })
    }

    pub fn config(&self) -> &EspeaConfig {
        &self.config
    }

    pub fn archive(&self) -> &EnergyArchive<G> {
        &self.archive
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Generations completed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Number of individuals created, which is also the number evaluated
    /// unless a generation was terminated.
    pub fn evaluations(&self) -> u64 {
        self.factory.created()
    }

    /// Whether the archive has been full at the end of an early generation.
    pub fn capacity_reached(&self) -> bool {
        self.capacity_reached
    }

    /// Whether late generations fell back to crossover and mutation.
    pub fn uses_late_fallback(&self) -> bool {
        self.late_fallback
    }

    /// Handle a host can use to stop the run between generations.
    pub fn termination(&self) -> TerminationSignal {
        self.termination.clone()
    }

    pub fn add_archive_listener(&mut self, listener: Box<dyn ArchiveListener<G>>) {
        self.archive.add_listener(listener);
    }

    /// Energy each archive member introduces, aligned with
    /// [`EnergyArchive::members`].
    pub fn energies(&mut self) -> Result<Vec<f64>, EspeaError> {
        self.archive.energies(&self.normalizer)
    }

    pub fn phase(&self) -> Phase {
        let size = self.archive.len();
        if size < 2 {
            Phase::Bootstrap
        } else if !self.capacity_reached || size < DifferentialEvolutionMating::MIN_PARENTS {
            Phase::Early
        } else {
            Phase::Late
        }
    }

    /// Runs one generation.
    ///
    /// Returns [`EspeaError::Terminated`] if the termination signal is raised
    /// before or during evaluation. The archive is untouched in that case.
    pub fn next<E: Evaluator<G>>(&mut self, evaluator: &E) -> Result<(), EspeaError> {
        if self.termination.is_raised() {
            return Err(EspeaError::Terminated);
        }

        let phase = self.phase();
        let candidates = match phase {
            Phase::Bootstrap => {
                let size = self.config.initial_population_size;
                (0..size)
                    .map(|_| self.factory.create(&mut self.rng))
                    .collect::<Vec<Individual<G>>>()
            }
            Phase::Early => self.crossover_offspring(self.config.early_generation_size)?,
            Phase::Late => self.late_offspring()?,
        };
        let offered = candidates.len();
        let changed = self.evaluate(candidates, evaluator)?;

        if phase == Phase::Early {
            self.capacity_reached |= self.archive.is_full();
        }
        self.iteration += 1;
        debug!(
            "generation {}: {:?}, {} candidates, archive {}/{}{}",
            self.iteration,
            phase,
            offered,
            self.archive.len(),
            self.archive.capacity(),
            if changed { "" } else { " (unchanged)" }
        );
        Ok(())
    }

    /// Runs up to `config.iterations` generations, stopping early when the
    /// termination signal is raised. Returns the number of generations run.
    pub fn run<E: Evaluator<G>>(&mut self, evaluator: &E) -> Result<usize, EspeaError> {
        info!(
            "starting ESPEA: capacity {}, {:?}, {:?}, {:?}",
            self.config.capacity,
            self.config.replacement_strategy,
            self.config.cache_mutation_strategy,
            self.config.scalarization
        );
        let start = self.iteration;
        for _ in 0..self.config.iterations {
            match self.next(evaluator) {
                Ok(()) => {}
                Err(EspeaError::Terminated) => {
                    info!("terminated after {} generations", self.iteration - start);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        let rebuilds = self.archive.cache().map_or(0, |c| c.rebuilds());
        info!(
            "finished: {} generations, {} evaluations, {} archive members, {} cache rebuilds",
            self.iteration - start,
            self.evaluations(),
            self.archive.len(),
            rebuilds
        );
        Ok(self.iteration - start)
    }

    fn evaluate<E: Evaluator<G>>(
        &mut self,
        mut candidates: Vec<Individual<G>>,
        evaluator: &E,
    ) -> Result<bool, EspeaError> {
        self.completer
            .complete(&mut candidates, evaluator, &self.termination)?;
        for candidate in &candidates {
            self.normalizer.on_evaluated(candidate);
        }
        self.archive.update(candidates, &self.normalizer)
    }

    /// Crossover and mutation over the archive, ranked by energy.
    fn crossover_offspring(&mut self, size: usize) -> Result<Vec<Individual<G>>, EspeaError> {
        let ranking = self.archive.energies(&self.normalizer)?;
        let parents: Vec<&G> = self.archive.members().iter().map(|m| m.genotype()).collect();
        let genotypes = self.early.offspring(size, &parents, &ranking, &mut self.rng)?;
        Ok(self.adopt(genotypes))
    }

    fn late_offspring(&mut self) -> Result<Vec<Individual<G>>, EspeaError> {
        let size = self.archive.len();
        if !self.late_fallback {
            let parents: Vec<&G> = self.archive.members().iter().map(|m| m.genotype()).collect();
            match self.late.offspring(size, &parents, &[], &mut self.rng) {
                Ok(genotypes) => return Ok(self.adopt(genotypes)),
                Err(EspeaError::IncompatibleRepresentation) => {
                    warn!(
                        "representation does not support differential evolution, \
                         falling back to crossover and mutation"
                    );
                    self.late_fallback = true;
                }
                Err(e) => return Err(e),
            }
        }
        self.crossover_offspring(size)
    }

    fn adopt(&mut self, genotypes: Vec<G>) -> Vec<Individual<G>> {
        genotypes
            .into_iter()
            .map(|g| self.factory.create_from(g))
            .collect()
    }
}

impl<G: Genotype, C: Creator<G>> Evolver<G> for Espea<G, C> {
    fn step<E: Evaluator<G>>(&mut self, evaluator: &E) -> Result<(), EspeaError> {
        self.next(evaluator)
    }

    fn population(&self) -> &[Individual<G>] {
        self.archive.members()
    }
}
