//! Sequential average likelihood over a tree ensemble.

use crate::ensemble::TreeEnsemble;
use crate::error::{ConfigurationError, LikelihoodError};
use crate::likelihood::{TreeEvaluator, check_taxa, log_mean_exp};

/// Average likelihood of data over the trees of an ensemble:
/// `logP = ln((1/N) Σ_i exp(logL_i))`.
///
/// One pipeline is reused for all trees; before each evaluation the tree is
/// assigned into the pipeline, which marks it dirty. Every call re-evaluates
/// all `N` trees.
pub struct TreeSetLikelihood<E> {
    pipeline: E,
    ensemble: TreeEnsemble,
    tree_log_ps: Vec<f64>,
    log_p: f64,
}

impl<E: TreeEvaluator> TreeSetLikelihood<E> {
    /// Creates the likelihood over `ensemble` using `pipeline` for each tree.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if the ensemble is empty or its taxa
    /// differ from the pipeline's.
    pub fn new(pipeline: E, ensemble: TreeEnsemble) -> Result<Self, ConfigurationError> {
        if ensemble.is_empty() {
            return Err(ConfigurationError::EmptyEnsemble(""));
        }
        check_taxa(&pipeline, &ensemble)?;
        Ok(Self {
            pipeline,
            tree_log_ps: Vec::with_capacity(ensemble.len()),
            ensemble,
            log_p: f64::NEG_INFINITY,
        })
    }

    /// Evaluates every tree and returns the log of the mean likelihood.
    ///
    /// # Errors
    /// Returns the first error of the pipeline.
    pub fn calculate_log_p(&mut self) -> Result<f64, LikelihoodError> {
        self.tree_log_ps.clear();
        for tree in self.ensemble.trees() {
            self.pipeline.set_tree(tree)?;
            self.tree_log_ps.push(self.pipeline.calculate_log_p()?);
        }
        self.log_p = log_mean_exp(&self.tree_log_ps);
        Ok(self.log_p)
    }

    /// Returns the result of the last evaluation, `-inf` before the first.
    pub fn log_p(&self) -> f64 {
        self.log_p
    }

    /// Returns the per-tree log-likelihoods of the last evaluation.
    pub fn tree_log_ps(&self) -> &[f64] {
        &self.tree_log_ps
    }

    pub fn ensemble(&self) -> &TreeEnsemble {
        &self.ensemble
    }

    pub fn pipeline(&self) -> &E {
        &self.pipeline
    }

    /// Returns the pipeline for modification, e.g. of its substitution model.
    pub fn pipeline_mut(&mut self) -> &mut E {
        &mut self.pipeline
    }
}
