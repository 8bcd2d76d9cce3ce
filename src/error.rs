//! Domain errors: setup failures, evaluation failures, and the loading umbrella.

use crate::parser::ParsingError;
use thiserror::Error;

/// Fatal error while assembling models, ensembles, or likelihood pipelines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{input} has dimension {actual}, but {expected} was expected")]
    DimensionMismatch {
        input: String,
        actual: usize,
        expected: usize,
    },
    #[error("burn-in percentage must lie in [0, 100], got {0}")]
    BurnInOutOfRange(f64),
    #[error("tree ensemble is empty{0}")]
    EmptyEnsemble(&'static str),
    #[error(
        "Cannot find taxon {0} in tree set. Perhaps there is a spelling error, \
         or different case (matching is case sensitive)"
    )]
    MissingTaxon(String),
    #[error("reference taxa must contain at least two taxa, got {0}")]
    TooFewTaxa(usize),
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
    #[error("thread count must be at least 1")]
    ZeroThreads,
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl ConfigurationError {
    pub(crate) fn dimension(input: impl Into<String>, actual: usize, expected: usize) -> Self {
        ConfigurationError::DimensionMismatch {
            input: input.into(),
            actual,
            expected,
        }
    }

    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Fatal error while evaluating a likelihood.
#[derive(Debug, Error)]
pub enum LikelihoodError {
    /// A worker of a threaded evaluation failed on its partition.
    #[error("worker {worker} failed on trees [{start}, {end})")]
    Worker {
        worker: usize,
        start: usize,
        end: usize,
        #[source]
        source: Box<LikelihoodError>,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Error while loading a tree set from NEXUS or Newick input.
#[derive(Debug, Error)]
pub enum TreeSetError {
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
