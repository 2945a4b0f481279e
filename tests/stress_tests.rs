use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use symbios_espea::algorithms::espea::{
    EnergyArchive, Espea, MutationStrategy, Normalizer, ReplacementStrategy, ScalarizationKind,
};
use symbios_espea::{
    Creator, EspeaConfig, Evaluator, Genotype, Individual, IndividualId, Objective, Objectives,
};

#[derive(Clone, Serialize, Deserialize)]
struct HeavyDNA(Vec<f64>);
impl Genotype for HeavyDNA {
    fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        for v in &mut self.0 {
            if rng.random_bool(rate as f64) {
                *v = rng.random();
            }
        }
    }
    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        HeavyDNA(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(&a, &b)| if rng.random_bool(0.5) { a } else { b })
                .collect(),
        )
    }
}

struct HeavyCreator;
impl Creator<HeavyDNA> for HeavyCreator {
    fn create<R: Rng>(&self, rng: &mut R) -> HeavyDNA {
        HeavyDNA((0..10).map(|_| rng.random()).collect())
    }
}

struct HeavyEvaluator;
impl Evaluator<HeavyDNA> for HeavyEvaluator {
    fn evaluate(&self, genotype: &HeavyDNA) -> Objectives {
        // Simulate heavy physics work (1ms)
        std::thread::sleep(Duration::from_millis(1));
        let head = genotype.0[0];
        let tail: f64 = genotype.0[1..].iter().sum();
        Objectives::new()
            .with(Objective::minimize("head"), head)
            .with(Objective::minimize("tail"), tail - head)
    }
}

#[test]
fn stress_test_parallel_throughput() {
    let pop_size = 1000;
    let config = EspeaConfig {
        capacity: 50,
        initial_population_size: pop_size,
        max_threads: 8,
        ..EspeaConfig::default()
    };
    let mut espea = Espea::new(config, HeavyCreator, 42).unwrap();

    println!("Starting Heavy Stress Test (1000 individuals @ 1ms sleep)...");
    let start = Instant::now();
    espea.next(&HeavyEvaluator).unwrap();
    let duration = start.elapsed();

    println!("Throughput: {} evals in {:?}", pop_size, duration);
    assert!(espea.archive().len() <= 50);

    #[cfg(feature = "parallel")]
    {
        // Sequential would be at least 1000 * 1ms = 1000ms
        let sequential_estimate_ms = pop_size as u64;
        let actual_ms = duration.as_millis() as u64;
        let speedup = sequential_estimate_ms as f64 / actual_ms.max(1) as f64;

        println!(
            "Sequential estimate: {}ms, Actual: {}ms, Speedup: {:.2}x",
            sequential_estimate_ms, actual_ms, speedup
        );

        // Conservative for CI environments
        assert!(
            speedup > 1.5,
            "Parallel evaluation should provide speedup. Got {:.2}x (expected > 1.5x)",
            speedup
        );
    }
}

#[test]
fn stress_test_long_inverse_run_stays_close_to_rebuild() {
    let mut rng = Pcg64::seed_from_u64(2015);
    let mut normalizer = Normalizer::new();
    normalizer.observe(
        &Objectives::new()
            .with(Objective::minimize("f1"), 0.0)
            .with(Objective::minimize("f2"), 0.0),
    );
    normalizer.observe(
        &Objectives::new()
            .with(Objective::minimize("f1"), 1.0)
            .with(Objective::minimize("f2"), 1.0),
    );
    let mut archive: EnergyArchive<HeavyDNA> = EnergyArchive::new(
        100,
        ReplacementStrategy::LargestEnergyDecrease,
        MutationStrategy::Inverse,
        ScalarizationKind::SumOfObjectives.build(),
    );
    archive.initialize(&mut normalizer);

    let start = Instant::now();
    for n in 0..5000u64 {
        let x: f64 = rng.random();
        let candidate = Individual::evaluated(
            IndividualId::new(n),
            HeavyDNA(vec![x]),
            Objectives::new()
                .with(Objective::minimize("f1"), x)
                .with(Objective::minimize("f2"), 1.0 - x * x),
        );
        archive
            .update_with_nondominated(vec![candidate], &normalizer)
            .unwrap();
    }
    println!("5000 updates at capacity 100 in {:?}", start.elapsed());
    assert_eq!(archive.len(), 100);
    assert_eq!(archive.cache().unwrap().rebuilds(), 1);

    let incremental = archive.energies(&normalizer).unwrap();
    archive.cache().unwrap().invalidate();
    let rebuilt = archive.energies(&normalizer).unwrap();
    for (a, e) in incremental.iter().zip(&rebuilt) {
        assert!(
            (a - e).abs() <= 1e-6 * e.abs().max(1.0),
            "drifted: incremental {a} vs rebuilt {e}"
        );
    }
}
