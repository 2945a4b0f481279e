//! A bi-objective knapsack over bit strings.
//!
//! Bit strings have no vector arithmetic, so once the archive fills up the
//! optimizer logs a warning and keeps using crossover and mutation. Run with
//! `RUST_LOG=warn` (or lower) to see it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use symbios_espea::algorithms::espea::{Espea, Phase, ReplacementStrategy, ScalarizationKind};
use symbios_espea::{Creator, EspeaConfig, Evaluator, Genotype, Objective, Objectives};

const ITEMS: usize = 40;
const BUDGET: u32 = 200;

#[derive(Clone, Serialize, Deserialize, Debug)]
struct Selection(Vec<bool>);

impl Genotype for Selection {
    fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        for bit in &mut self.0 {
            if rng.random::<f32>() < rate {
                *bit = !*bit;
            }
        }
    }

    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let point = rng.random_range(0..self.0.len());
        let mut child = self.0[..point].to_vec();
        child.extend_from_slice(&other.0[point..]);
        Selection(child)
    }
}

struct Sparse;
impl Creator<Selection> for Sparse {
    fn create<R: Rng>(&self, rng: &mut R) -> Selection {
        Selection((0..ITEMS).map(|_| rng.random_bool(0.2)).collect())
    }
}

/// Item `i` weighs `3 + i % 7`, is worth `1 + (i * 13) % 11` and carries a
/// risk of `(i * 7) % 5`.
struct Knapsack;
impl Evaluator<Selection> for Knapsack {
    fn evaluate(&self, genotype: &Selection) -> Objectives {
        let chosen = || genotype.0.iter().enumerate().filter(|(_, b)| **b).map(|(i, _)| i as u32);
        let weight: u32 = chosen().map(|i| 3 + i % 7).sum();
        let value: u32 = chosen().map(|i| 1 + (i * 13) % 11).sum();
        let risk: u32 = chosen().map(|i| (i * 7) % 5).sum();

        // Over budget: no meaningful value.
        let value = (weight <= BUDGET).then_some(value as f64);
        Objectives::new()
            .with(Objective::maximize("value"), value)
            .with(Objective::minimize("risk"), risk as f64)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = EspeaConfig {
        capacity: 20,
        replacement_strategy: ReplacementStrategy::LargestEnergyDecrease,
        scalarization: ScalarizationKind::Chebyshev,
        initial_population_size: 60,
        early_generation_size: 6,
        mutation_rate: 0.05,
        ..EspeaConfig::default()
    };
    let mut espea = Espea::new(config, Sparse, 7)?;

    for generation in 0..300 {
        espea.next(&Knapsack)?;
        if generation % 50 == 0 {
            println!(
                "generation {:>3}: {:?}, archive {}",
                generation,
                espea.phase(),
                espea.archive().len()
            );
        }
    }

    if espea.phase() == Phase::Late {
        println!("late generations use fallback: {}", espea.uses_late_fallback());
    }
    for member in espea.archive().members() {
        if let Some(objectives) = member.objectives() {
            let v = objectives.to_min_problem();
            println!("value {:>5.0}  risk {:>4.0}", -v[0], v[1]);
        }
    }
    Ok(())
}
