//! Likelihoods of a character alignment on a single tree and on tree sets.
//!
//! - [TreeLikelihood]: Felsenstein pruning on one tree
//! - [TreeSetLikelihood]: average likelihood over an ensemble, sequentially
//! - [ThreadedTreeSetLikelihood]: the same on a fixed pool of workers
//! - [IndexedTreeSetLikelihood]: likelihood of one tree picked by an index
//!
//! The tree-set variants are generic over a [TreeEvaluator], the single-tree
//! pipeline into which each tree of the ensemble is swapped in turn.

pub mod indexed;
pub mod threaded;
pub mod tree_likelihood;
pub mod tree_set;

pub use indexed::IndexedTreeSetLikelihood;
pub use threaded::{ThreadCount, ThreadedTreeSetLikelihood};
pub use tree_likelihood::TreeLikelihood;
pub use tree_set::TreeSetLikelihood;

use crate::clone::StructuralClone;
use crate::ensemble::TreeEnsemble;
use crate::error::{ConfigurationError, LikelihoodError};
use crate::model::{LeafLabelMap, Tree};
use std::ops::Range;

/// A single-tree likelihood pipeline.
pub trait TreeEvaluator: StructuralClone + Send {
    /// Assigns `tree` into the pipeline and marks everything dirty.
    fn set_tree(&mut self, tree: &Tree) -> Result<(), LikelihoodError>;

    /// Returns the log-likelihood of the current tree.
    fn calculate_log_p(&mut self) -> Result<f64, LikelihoodError>;

    /// Returns the taxa that leaf `i` of every assigned tree must refer to.
    fn taxa(&self) -> &LeafLabelMap;
}

/// Checks that the ensemble was reconciled against the pipeline's taxa,
/// in the same order.
pub(crate) fn check_taxa<E: TreeEvaluator>(pipeline: &E, ensemble: &TreeEnsemble) -> Result<(), ConfigurationError> {
    let expected = pipeline.taxa().labels();
    let actual = ensemble.taxa().labels();
    if actual.len() != expected.len() {
        return Err(ConfigurationError::dimension("taxa of tree ensemble", actual.len(), expected.len()));
    }
    match actual.iter().zip(expected).position(|(a, e)| a != e) {
        Some(i) => Err(ConfigurationError::invalid(
            "taxa of tree ensemble",
            format!(
                "taxon {i} is {} but {} in the data; reconcile the ensemble against the data's taxa",
                actual[i], expected[i]
            ),
        )),
        None => Ok(()),
    }
}

/// Result of an evaluation that may be rejected outright.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    Evaluated(f64),
    Rejected,
}

impl Evaluation {
    /// Returns the log-likelihood, `-inf` if rejected.
    pub fn log_p(&self) -> f64 {
        match self {
            Evaluation::Evaluated(log_p) => *log_p,
            Evaluation::Rejected => f64::NEG_INFINITY,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Evaluation::Rejected)
    }
}

/// Returns `ln(mean(exp(values)))` without overflow or underflow.
///
/// Computed as `max + ln(mean(exp(v - max)))`. If all values are `-inf`
/// (or there are none), the result is `-inf`.
///
/// # Example
/// ```
/// use treeset::likelihood::log_mean_exp;
///
/// let log_p = log_mean_exp(&[-1e6, 0.0]);
/// assert!((log_p - 0.5f64.ln()).abs() < 1e-12);
/// ```
pub fn log_mean_exp(values: &[f64]) -> f64 {
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        return max;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + (sum / values.len() as f64).ln()
}

/// Splits `0..total` into `workers` contiguous, disjoint ranges.
///
/// Worker `k` gets `[total·k/W, total·(k+1)/W)`, so sizes differ by at most one.
/// `W` is clamped to `[1, total]`; no range is empty unless `total == 0`.
pub fn partition_boundaries(total: usize, workers: usize) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, total);
    (0..workers)
        .map(|k| {
            let start = total * k / workers;
            let end = if k + 1 == workers { total } else { total * (k + 1) / workers };
            start..end
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn single_value_is_returned_exactly() {
        assert_eq!(log_mean_exp(&[-123.456]), -123.456);
    }

    #[test]
    fn all_negative_infinity_stays_negative_infinity() {
        assert_eq!(log_mean_exp(&[f64::NEG_INFINITY; 3]), f64::NEG_INFINITY);
        assert_eq!(log_mean_exp(&[]), f64::NEG_INFINITY);
    }

    #[test]
    fn matches_direct_computation_in_safe_range() {
        let values = [-1.0, -2.0, -3.5, 0.25];
        let direct = (values.iter().map(|v: &f64| v.exp()).sum::<f64>() / 4.0).ln();
        assert_relative_eq!(log_mean_exp(&values), direct, epsilon = 1e-12);
    }

    #[test]
    fn survives_extreme_spread() {
        assert_relative_eq!(log_mean_exp(&[-1e6, 0.0]), -(2f64.ln()), epsilon = 1e-12);
        assert_relative_eq!(log_mean_exp(&[-2000.0, -2000.0]), -2000.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case(10, 1)]
    #[case(10, 3)]
    #[case(10, 4)]
    #[case(10, 10)]
    #[case(7, 5)]
    #[case(3, 8)]
    fn partitions_cover_every_index_once(#[case] total: usize, #[case] workers: usize) {
        let ranges = partition_boundaries(total, workers);
        assert_eq!(ranges.len(), workers.min(total));
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[ranges.len() - 1].end, total);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert!(ranges.iter().all(|r| !r.is_empty()));
    }

    #[test]
    fn evaluation_rejected_is_negative_infinity() {
        assert_eq!(Evaluation::Rejected.log_p(), f64::NEG_INFINITY);
        assert_eq!(Evaluation::Evaluated(-3.0).log_p(), -3.0);
    }
}
