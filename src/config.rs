//! Optimizer configuration.

use serde::{Deserialize, Serialize};

use crate::algorithms::espea::{MutationStrategy, ReplacementStrategy, ScalarizationKind};

/// All recognized ESPEA options.
///
/// Missing fields take their defaults when deserializing, so a config file
/// only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EspeaConfig {
    /// Maximum number of archive members.
    pub capacity: usize,
    pub replacement_strategy: ReplacementStrategy,
    pub cache_mutation_strategy: MutationStrategy,
    pub scalarization: ScalarizationKind,
    /// Individuals drawn per tournament by the coupler.
    pub tournament_size: usize,
    pub initial_population_size: usize,
    /// Offspring per generation until the archive first fills up.
    pub early_generation_size: usize,
    /// Differential weight `F` of differential evolution.
    pub scaling_factor: f64,
    /// Probability that a couple is recombined instead of cloned.
    pub crossover_rate: f64,
    pub mutation_rate: f32,
    /// Worker threads used to evaluate a generation.
    pub max_threads: usize,
    /// Generation limit used by `Espea::run`.
    pub iterations: usize,
}

impl Default for EspeaConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            replacement_strategy: ReplacementStrategy::WorstInArchive,
            cache_mutation_strategy: MutationStrategy::Inverse,
            scalarization: ScalarizationKind::NoPreference,
            tournament_size: 2,
            initial_population_size: 100,
            early_generation_size: 1,
            scaling_factor: 0.5,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            max_threads: 1,
            iterations: 1000,
        }
    }
}

impl EspeaConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::InvalidTournamentSize);
        }
        if self.initial_population_size == 0 {
            return Err(ConfigError::InvalidInitialPopulationSize);
        }
        if self.early_generation_size == 0 {
            return Err(ConfigError::InvalidEarlyGenerationSize);
        }
        if !self.scaling_factor.is_finite() {
            return Err(ConfigError::InvalidScalingFactor(self.scaling_factor));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(ConfigError::InvalidRate {
                name: "crossover_rate",
                value: self.crossover_rate,
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::InvalidRate {
                name: "mutation_rate",
                value: f64::from(self.mutation_rate),
            });
        }
        if self.max_threads == 0 {
            return Err(ConfigError::InvalidMaxThreads);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("archive capacity must be at least 1")]
    InvalidCapacity,
    #[error("tournament size must be at least 1")]
    InvalidTournamentSize,
    #[error("initial population size must be at least 1")]
    InvalidInitialPopulationSize,
    #[error("early generation size must be at least 1")]
    InvalidEarlyGenerationSize,
    #[error("scaling factor must be finite, got {0}")]
    InvalidScalingFactor(f64),
    #[error("{name} must lie in [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("max threads must be at least 1")]
    InvalidMaxThreads,
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EspeaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EspeaConfig::from_json(
            r#"{ "capacity": 30, "replacement_strategy": "LARGEST_ENERGY_DECREASE",
                 "scalarization": "CHEBYSHEV", "cache_mutation_strategy": "RECALCULATE" }"#,
        )
        .unwrap();
        assert_eq!(config.capacity, 30);
        assert_eq!(
            config.replacement_strategy,
            ReplacementStrategy::LargestEnergyDecrease
        );
        assert_eq!(config.scalarization, ScalarizationKind::Chebyshev);
        assert_eq!(config.cache_mutation_strategy, MutationStrategy::Recalculate);
        assert_eq!(config.tournament_size, 2);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let config = EspeaConfig {
            capacity: 0,
            ..EspeaConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidCapacity)));

        let config = EspeaConfig {
            crossover_rate: 1.5,
            ..EspeaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRate { name: "crossover_rate", .. })
        ));

        assert!(matches!(
            EspeaConfig::from_json(r#"{ "max_threads": 0 }"#),
            Err(ConfigError::InvalidMaxThreads)
        ));
        assert!(matches!(
            EspeaConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_strategy_names() {
        let json = EspeaConfig::default().to_json().unwrap();
        assert!(json.contains("\"WORST_IN_ARCHIVE\""));
        assert!(json.contains("\"NO_PREFERENCE\""));
        assert!(json.contains("\"INVERSE\""));
    }
}
