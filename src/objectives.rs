//! Objective vectors and their normalized form.
//!
//! An [`Objectives`] value is an ordered list of `(Objective, value)` pairs as
//! produced by an [`Evaluator`](crate::Evaluator). A missing value marks the
//! objective as infeasible. All comparisons are done in minimization terms:
//! maximized objectives are negated and infeasible values count as `+inf`.

use serde::{Deserialize, Serialize};

/// Whether an objective is minimized or maximized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Min,
    Max,
}

/// Identity of a single objective.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Objective {
    name: String,
    sign: Sign,
}

impl Objective {
    pub fn new(name: impl Into<String>, sign: Sign) -> Self {
        Self {
            name: name.into(),
            sign,
        }
    }

    pub fn minimize(name: impl Into<String>) -> Self {
        Self::new(name, Sign::Min)
    }

    pub fn maximize(name: impl Into<String>) -> Self {
        Self::new(name, Sign::Max)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// Maps a raw value onto the minimization scale.
    pub fn to_min_problem(&self, value: Option<f64>) -> f64 {
        match (value, self.sign) {
            (None, _) => f64::INFINITY,
            (Some(v), Sign::Min) => v,
            (Some(v), Sign::Max) => -v,
        }
    }
}

/// The evaluated objective values of one individual.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    entries: Vec<(Objective, Option<f64>)>,
}

impl Objectives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an objective value. `None` marks the objective as infeasible.
    pub fn add(&mut self, objective: Objective, value: impl Into<Option<f64>>) {
        self.entries.push((objective, value.into()));
    }

    /// Builder form of [`Objectives::add`].
    pub fn with(mut self, objective: Objective, value: impl Into<Option<f64>>) -> Self {
        self.add(objective, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Objective, Option<f64>)> {
        self.entries.iter().map(|(o, v)| (o, *v))
    }

    pub fn get(&self, objective: &Objective) -> Option<Option<f64>> {
        self.entries
            .iter()
            .find(|(o, _)| o == objective)
            .map(|(_, v)| *v)
    }

    /// Returns `true` if every objective has a value.
    pub fn is_feasible(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.is_some())
    }

    /// All values on the minimization scale, in entry order.
    pub fn to_min_problem(&self) -> Vec<f64> {
        self.entries
            .iter()
            .map(|(o, v)| o.to_min_problem(*v))
            .collect()
    }

    /// `self` is at least as good as `other` in every objective.
    ///
    /// Vectors of different arity are incomparable.
    pub fn weakly_dominates(&self, other: &Objectives) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.entries
            .iter()
            .zip(&other.entries)
            .all(|((oa, va), (ob, vb))| oa.to_min_problem(*va) <= ob.to_min_problem(*vb))
    }

    /// `self` is at least as good as `other` everywhere and strictly better
    /// somewhere.
    pub fn dominates(&self, other: &Objectives) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut better_in_any = false;
        for ((oa, va), (ob, vb)) in self.entries.iter().zip(&other.entries) {
            let a = oa.to_min_problem(*va);
            let b = ob.to_min_problem(*vb);
            if a > b {
                return false;
            }
            if a < b {
                better_in_any = true;
            }
        }
        better_in_any
    }
}

/// Objective values rescaled to `[0, 1]`, all to be minimized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedObjectives {
    values: Vec<f64>,
}

impl NormalizedObjectives {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn array(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Euclidean distance.
    pub fn distance(&self, other: &NormalizedObjectives) -> f64 {
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}
