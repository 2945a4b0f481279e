//! Approximates the ZDT1 Pareto front.
//!
//! Usage: `cargo run --example zdt1_front [config.json]`. Set `RUST_LOG=debug`
//! to follow the generations.

use rand::Rng;
use serde::{Deserialize, Serialize};
use symbios_espea::algorithms::espea::Espea;
use symbios_espea::{Creator, EspeaConfig, Evaluator, Genotype, Objective, Objectives};

const DIMENSIONS: usize = 30;

#[derive(Clone, Serialize, Deserialize, Debug)]
struct RealDNA(Vec<f64>);

impl Genotype for RealDNA {
    fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        for x in &mut self.0 {
            if rng.random::<f32>() < rate {
                *x = (*x + rng.random_range(-0.1..0.1)).clamp(0.0, 1.0);
            }
        }
    }

    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let split = rng.random_range(0..self.0.len());
        let mut child = self.0[..split].to_vec();
        child.extend_from_slice(&other.0[split..]);
        RealDNA(child)
    }

    fn differential(&self, b: &Self, c: &Self, scale: f64) -> Option<Self> {
        Some(RealDNA(
            self.0
                .iter()
                .zip(&b.0)
                .zip(&c.0)
                .map(|((a, b), c)| (a + scale * (b - c)).clamp(0.0, 1.0))
                .collect(),
        ))
    }
}

struct Uniform;
impl Creator<RealDNA> for Uniform {
    fn create<R: Rng>(&self, rng: &mut R) -> RealDNA {
        RealDNA((0..DIMENSIONS).map(|_| rng.random()).collect())
    }
}

struct Zdt1;
impl Evaluator<RealDNA> for Zdt1 {
    fn evaluate(&self, genotype: &RealDNA) -> Objectives {
        let x = &genotype.0;
        let g = 1.0 + 9.0 * x[1..].iter().sum::<f64>() / (x.len() - 1) as f64;
        let f1 = x[0];
        Objectives::new()
            .with(Objective::minimize("f1"), f1)
            .with(Objective::minimize("f2"), g * (1.0 - (f1 / g).sqrt()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => EspeaConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EspeaConfig {
            capacity: 50,
            initial_population_size: 100,
            early_generation_size: 10,
            iterations: 500,
            ..EspeaConfig::default()
        },
    };

    let mut espea = Espea::new(config, Uniform, 42)?;
    let generations = espea.run(&Zdt1)?;

    let mut front: Vec<(f64, f64)> = espea
        .archive()
        .members()
        .iter()
        .filter_map(|m| m.objectives())
        .map(|o| {
            let v = o.to_min_problem();
            (v[0], v[1])
        })
        .collect();
    front.sort_by(|a, b| a.0.total_cmp(&b.0));

    println!(
        "{} generations, {} evaluations, {} archive members",
        generations,
        espea.evaluations(),
        front.len()
    );
    println!("{:>10} {:>10} {:>10}", "f1", "f2", "gap");
    for (f1, f2) in &front {
        println!("{:>10.4} {:>10.4} {:>10.4}", f1, f2, f2 - (1.0 - f1.sqrt()));
    }
    Ok(())
}
