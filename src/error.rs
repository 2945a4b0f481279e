use crate::IndividualId;
use crate::config::ConfigError;

/// Errors reported by the optimizer and its components.
#[derive(Debug, thiserror::Error)]
pub enum EspeaError {
    #[error("at least 2 parents are required to create distinct couples, got {0}")]
    InsufficientParents(usize),

    #[error("differential evolution requires at least {required} parents, got {actual}")]
    TooFewParents { required: usize, actual: usize },

    #[error("differential evolution produces one offspring per parent: requested {requested}, got {parents} parents")]
    OffspringSizeMismatch { requested: usize, parents: usize },

    #[error("genotype representation does not support differential evolution")]
    IncompatibleRepresentation,

    #[error("energy archive used before initialize() wired its cache")]
    ArchiveNotInitialized,

    #[error("individual {0} has not been evaluated")]
    NotEvaluated(IndividualId),

    /// The host asked the run to stop. Not a failure: the archive is left in
    /// a consistent state.
    #[error("optimization terminated")]
    Terminated,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[cfg(feature = "parallel")]
    #[error("failed to build evaluation thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
