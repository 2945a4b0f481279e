//! Batch evaluation of individuals.
//!
//! The [`Completer`] evaluates every unevaluated individual of a generation and
//! blocks until the batch is done. With the `parallel` feature and more than
//! one thread it runs on a dedicated rayon pool; otherwise it evaluates in
//! order on the calling thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{EspeaError, Evaluator, Genotype, Individual};

/// Cooperative stop request shared between the host and the optimizer.
#[derive(Clone, Debug, Default)]
pub struct TerminationSignal(Arc<AtomicBool>);

impl TerminationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Completer {
    max_threads: usize,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Completer {
    /// Creates a completer using up to `max_threads` evaluation workers.
    pub fn new(max_threads: usize) -> Result<Self, EspeaError> {
        let max_threads = max_threads.max(1);
        #[cfg(feature = "parallel")]
        let pool = if max_threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(max_threads)
                    .thread_name(|i| format!("espea-eval-{i}"))
                    .build()?,
            )
        } else {
            None
        };
        Ok(Self {
            max_threads,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Evaluates all individuals that carry no objectives yet.
    ///
    /// Returns [`EspeaError::Terminated`] if `termination` was raised before
    /// or during the batch; individuals not yet started stay unevaluated.
    pub fn complete<G, E>(
        &self,
        individuals: &mut [Individual<G>],
        evaluator: &E,
        termination: &TerminationSignal,
    ) -> Result<(), EspeaError>
    where
        G: Genotype,
        E: Evaluator<G>,
    {
        if termination.is_raised() {
            return Err(EspeaError::Terminated);
        }

        let evaluate_one = |ind: &mut Individual<G>| {
            if ind.is_evaluated() || termination.is_raised() {
                return;
            }
            let objectives = evaluator.evaluate(ind.genotype());
            ind.set_objectives(objectives);
        };

        #[cfg(feature = "parallel")]
        match &self.pool {
            Some(pool) => pool.install(|| individuals.par_iter_mut().for_each(evaluate_one)),
            None => individuals.iter_mut().for_each(evaluate_one),
        }
        #[cfg(not(feature = "parallel"))]
        individuals.iter_mut().for_each(evaluate_one);

        if termination.is_raised() {
            return Err(EspeaError::Terminated);
        }
        Ok(())
    }
}
