//! Scalarization functions: the "charge" of a normalized objective vector.
//!
//! Lower charge means stronger preference: a member with a small charge
//! contributes little energy and is more likely to stay in the archive.

use serde::{Deserialize, Serialize};

use crate::NormalizedObjectives;

/// Smallest charge a built-in function returns, so the charge stays strictly
/// positive even at the utopia point.
const MIN_CHARGE: f64 = f64::EPSILON;

/// Maps normalized objectives to a strictly positive charge.
pub trait ScalarizationFunction: Send + Sync {
    fn charge(&self, objectives: &NormalizedObjectives) -> f64;

    /// Combined charge of a pair. Override only as an optimization.
    fn calculate(&self, a: &NormalizedObjectives, b: &NormalizedObjectives) -> f64 {
        self.charge(a) * self.charge(b)
    }
}

/// Every point has the same charge; energy depends on distance only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreference;

impl ScalarizationFunction for NoPreference {
    fn charge(&self, _objectives: &NormalizedObjectives) -> f64 {
        1.0
    }

    fn calculate(&self, _a: &NormalizedObjectives, _b: &NormalizedObjectives) -> f64 {
        1.0
    }
}

/// Sum of the normalized objective values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumOfObjectives;

impl ScalarizationFunction for SumOfObjectives {
    fn charge(&self, objectives: &NormalizedObjectives) -> f64 {
        objectives.array().iter().sum::<f64>().max(MIN_CHARGE)
    }
}

/// Chebyshev distance to the utopia point, which is the origin after
/// normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chebyshev;

impl ScalarizationFunction for Chebyshev {
    fn charge(&self, objectives: &NormalizedObjectives) -> f64 {
        objectives
            .array()
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
            .max(MIN_CHARGE)
    }
}

/// Configuration-level choice of a built-in scalarization function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalarizationKind {
    #[default]
    NoPreference,
    SumOfObjectives,
    Chebyshev,
}

impl ScalarizationKind {
    pub fn build(self) -> Box<dyn ScalarizationFunction> {
        match self {
            Self::NoPreference => Box::new(NoPreference),
            Self::SumOfObjectives => Box::new(SumOfObjectives),
            Self::Chebyshev => Box::new(Chebyshev),
        }
    }
}
