//! Prior on dependent versus independent trait evolution.

use crate::error::ConfigurationError;
use crate::likelihood::Evaluation;
use crate::parameter::RealParameter;
use crate::substitution::CorrelatedSubstitutionModel;
use crate::substitution::correlated::COMPONENT_COUNT;

/// Penalizes or favours dependence between the traits of a
/// [CorrelatedSubstitutionModel].
///
/// With `p` the prior probability that a trait evolves independently of
/// another, every ordered pair `(c1, c2)` where `c1` depends on `c2`
/// contributes `ln(1-p) - ln(p)`.
///
/// Each ordered pair counts once. Implementations that visit every pair
/// twice report twice this log prior for the same model.
///
/// # Example
/// ```
/// use treeset::parameter::RealParameter;
/// use treeset::prior::IndependentEvolutionPrior;
/// use treeset::substitution::{CorrelatedSubstitutionModel, Frequencies};
///
/// let p = RealParameter::new("pIndependent", vec![0.8]).unwrap();
/// let prior = IndependentEvolutionPrior::new(p).unwrap();
///
/// let rates = RealParameter::new("rates", vec![1.0; 8]).unwrap();
/// let mut model = CorrelatedSubstitutionModel::new("m", rates, Frequencies::uniform(4)).unwrap();
/// assert_eq!(prior.calculate_log_p(&model).log_p(), 0.0);
///
/// model.rates_mut().set_value(3, 2.0);
/// assert!((prior.calculate_log_p(&model).log_p() - 0.25f64.ln()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct IndependentEvolutionPrior {
    p_independent: RealParameter,
}

impl IndependentEvolutionPrior {
    /// Creates the prior from a one-dimensional parameter in `(0, 1)`.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if `p_independent` has more than one
    /// value or its value is not strictly between 0 and 1.
    pub fn new(p_independent: RealParameter) -> Result<Self, ConfigurationError> {
        if p_independent.dimension() != 1 {
            return Err(ConfigurationError::dimension(
                p_independent.id(),
                p_independent.dimension(),
                1,
            ));
        }
        let prior = Self { p_independent };
        if prior.log_p_dependent().is_none() {
            return Err(ConfigurationError::invalid(
                prior.p_independent.id(),
                format!("must lie in (0, 1), got {}", prior.p_independent.value(0)),
            ));
        }
        Ok(prior)
    }

    pub fn p_independent(&self) -> &RealParameter {
        &self.p_independent
    }

    /// Returns the probability parameter for modification, e.g. by a proposal.
    pub fn p_independent_mut(&mut self) -> &mut RealParameter {
        &mut self.p_independent
    }

    /// Returns `ln(1-p) - ln(p)`, or `None` if `p` is not in `(0, 1)`.
    pub fn log_p_dependent(&self) -> Option<f64> {
        let p = self.p_independent.value(0);
        (p > 0.0 && p < 1.0).then(|| (1.0 - p).ln() - p.ln())
    }

    /// Returns the log prior of the dependencies in `model`.
    ///
    /// Rejected if `p` has been moved outside `(0, 1)`.
    pub fn calculate_log_p(&self, model: &CorrelatedSubstitutionModel) -> Evaluation {
        let Some(log_p_dependent) = self.log_p_dependent() else {
            return Evaluation::Rejected;
        };
        let dependent_pairs = (0..COMPONENT_COUNT)
            .flat_map(|c1| (0..COMPONENT_COUNT).map(move |c2| (c1, c2)))
            .filter(|&(c1, c2)| c1 != c2 && model.depends(c1, c2))
            .count();
        Evaluation::Evaluated(dependent_pairs as f64 * log_p_dependent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substitution::Frequencies;
    use approx::assert_relative_eq;

    fn prior(p: f64) -> Result<IndependentEvolutionPrior, ConfigurationError> {
        IndependentEvolutionPrior::new(RealParameter::new("p", vec![p]).unwrap())
    }

    #[test]
    fn rejects_degenerate_probabilities() {
        assert!(prior(0.0).is_err());
        assert!(prior(1.0).is_err());
        assert!(prior(0.5).is_ok());
        let two = RealParameter::new("p", vec![0.5, 0.5]).unwrap();
        assert!(IndependentEvolutionPrior::new(two).is_err());
    }

    #[test]
    fn non_uniform_frequencies_count_both_directions() {
        let prior = prior(0.9).unwrap();
        let rates = RealParameter::new("rates", vec![1.0; 8]).unwrap();
        let frequencies = Frequencies::new(vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let model = CorrelatedSubstitutionModel::new("m", rates, frequencies).unwrap();
        assert_relative_eq!(
            prior.calculate_log_p(&model).log_p(),
            2.0 * (0.1f64.ln() - 0.9f64.ln()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn moved_out_of_range_is_rejected() {
        let mut prior = prior(0.5).unwrap();
        prior.p_independent_mut().set_value(0, 1.5);
        let rates = RealParameter::new("rates", vec![1.0; 8]).unwrap();
        let model = CorrelatedSubstitutionModel::new("m", rates, Frequencies::uniform(4)).unwrap();
        assert!(prior.calculate_log_p(&model).is_rejected());
    }
}
