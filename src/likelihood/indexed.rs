//! Likelihood of a single tree of an ensemble, chosen by an index parameter.

use crate::ensemble::TreeEnsemble;
use crate::error::{ConfigurationError, LikelihoodError};
use crate::likelihood::{Evaluation, TreeEvaluator, check_taxa};
use crate::parameter::IntegerParameter;

/// Evaluates the tree at `index` only, so the tree becomes a sampled parameter.
///
/// The index is bounded to `[0, N)`. An index outside these bounds is
/// [Evaluation::Rejected] instead of evaluated.
pub struct IndexedTreeSetLikelihood<E> {
    pipeline: E,
    ensemble: TreeEnsemble,
    index: IntegerParameter,
}

impl<E: TreeEvaluator> IndexedTreeSetLikelihood<E> {
    /// Creates the likelihood with the index starting at `initial`.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if the ensemble is empty, its taxa
    /// differ from the pipeline's, or `initial` is not a tree index.
    pub fn new(
        pipeline: E,
        ensemble: TreeEnsemble,
        index_id: impl Into<String>,
        initial: i64,
    ) -> Result<Self, ConfigurationError> {
        if ensemble.is_empty() {
            return Err(ConfigurationError::EmptyEnsemble(""));
        }
        check_taxa(&pipeline, &ensemble)?;
        let upper = ensemble.len() as i64 - 1;
        let index = IntegerParameter::new(index_id, initial, 0, upper)?;
        if !index.is_within_bounds() {
            return Err(ConfigurationError::invalid(
                index.id(),
                format!("initial value {initial} is not a tree index in [0, {upper}]"),
            ));
        }
        Ok(Self {
            pipeline,
            ensemble,
            index,
        })
    }

    pub fn index(&self) -> &IntegerParameter {
        &self.index
    }

    /// Returns the index for modification, e.g. by a proposal.
    pub fn index_mut(&mut self) -> &mut IntegerParameter {
        &mut self.index
    }

    /// Evaluates the tree at the current index.
    ///
    /// # Errors
    /// Returns the pipeline's error if evaluation fails.
    pub fn calculate_log_p(&mut self) -> Result<Evaluation, LikelihoodError> {
        if !self.index.is_within_bounds() {
            return Ok(Evaluation::Rejected);
        }
        let Some(tree) = usize::try_from(self.index.value())
            .ok()
            .and_then(|i| self.ensemble.tree(i))
        else {
            return Ok(Evaluation::Rejected);
        };

        self.pipeline.set_tree(tree)?;
        Ok(Evaluation::Evaluated(self.pipeline.calculate_log_p()?))
    }

    pub fn ensemble(&self) -> &TreeEnsemble {
        &self.ensemble
    }

    pub fn pipeline_mut(&mut self) -> &mut E {
        &mut self.pipeline
    }
}
