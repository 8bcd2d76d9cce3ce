//! Rate proposals that leave the stationary frequencies unchanged.

use crate::error::ConfigurationError;
use crate::operators::{AcceptanceCounter, Proposal, TARGET_ACCEPTANCE_PROBABILITY};
use crate::parameter::RealParameter;
use crate::substitution::correlated::REVERSE_EDGES;
use rand::Rng;

/// Changes a rate and the rate of the reverse transition by the same amount.
///
/// With `Q[i][j] = r_ij f_j`, the flow `f_i Q[i][j] - f_j Q[j][i]` between two
/// states is unaffected by adding the same value to `r_ij` and `r_ji`, so
/// the frequencies stay stationary. Afterwards the rates are rescaled to
/// mean 1, which does not affect stationarity either.
///
/// The proposal is symmetric; its log Hastings ratio is 0.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use treeset::operators::RatesFreqsOperator;
/// use treeset::parameter::RealParameter;
///
/// let mut rates = RealParameter::new("rates", vec![1.0; 8]).unwrap();
/// let mut operator = RatesFreqsOperator::correlated(&rates).unwrap();
/// let mut rng = StdRng::seed_from_u64(7);
///
/// let proposal = operator.propose(&mut rates, &mut rng).unwrap();
/// assert_eq!(proposal.log_hastings_ratio(), 0.0);
/// assert!((rates.mean() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct RatesFreqsOperator {
    pairs: Vec<usize>,
    scale_factor: f64,
    optimise: bool,
    lower: f64,
    upper: f64,
    counter: AcceptanceCounter,
}

impl RatesFreqsOperator {
    /// Creates the operator for a full rate matrix, rates laid out row-major
    /// over the off-diagonal cells of an `n`×`n` matrix.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] unless the dimension of `rates` is
    /// `n(n-1)` for some `n`, or if its bounds leave no room above 0.
    pub fn full(rates: &RealParameter) -> Result<Self, ConfigurationError> {
        let dim = rates.dimension();
        let n = (dim as f64).sqrt().floor() as usize + 1;
        if n * (n - 1) != dim {
            return Err(ConfigurationError::invalid(
                rates.id(),
                format!("dimension {dim} is not n(n-1) for any number of states n"),
            ));
        }

        let mut cell = vec![vec![0; n]; n];
        let mut k = 0;
        for i in 0..n {
            for j in (0..n).filter(|&j| j != i) {
                cell[i][j] = k;
                k += 1;
            }
        }
        let mut pairs = Vec::with_capacity(dim);
        for i in 0..n {
            for j in (0..n).filter(|&j| j != i) {
                pairs.push(cell[j][i]);
            }
        }

        Self::with_pairs(rates, pairs)
    }

    /// Creates the operator for the eight rates of the correlated model.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] unless `rates` has dimension 8, or if
    /// its bounds leave no room above 0.
    pub fn correlated(rates: &RealParameter) -> Result<Self, ConfigurationError> {
        if rates.dimension() != REVERSE_EDGES.len() {
            return Err(ConfigurationError::dimension(
                rates.id(),
                rates.dimension(),
                REVERSE_EDGES.len(),
            ));
        }
        Self::with_pairs(rates, REVERSE_EDGES.to_vec())
    }

    fn with_pairs(rates: &RealParameter, pairs: Vec<usize>) -> Result<Self, ConfigurationError> {
        let lower = rates.lower().max(0.0);
        let upper = rates.upper();
        if upper < lower {
            return Err(ConfigurationError::invalid(
                rates.id(),
                format!("upper bound {upper} leaves no non-negative rates"),
            ));
        }
        Ok(Self {
            pairs,
            scale_factor: 1.0,
            optimise: true,
            lower,
            upper,
            counter: AcceptanceCounter::default(),
        })
    }

    /// Sets the maximum step size, 1 by default.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] unless `scale_factor` is positive and finite.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Result<Self, ConfigurationError> {
        if !(scale_factor > 0.0 && scale_factor.is_finite()) {
            return Err(ConfigurationError::invalid(
                "scaleFactor",
                format!("must be positive, got {scale_factor}"),
            ));
        }
        self.scale_factor = scale_factor;
        Ok(self)
    }

    /// Enables or disables adaptive tuning of the scale factor, on by default.
    pub fn with_optimise(mut self, optimise: bool) -> Self {
        self.optimise = optimise;
        self
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Returns, for each rate, the index of the rate it is changed together with.
    pub fn pairs(&self) -> &[usize] {
        &self.pairs
    }

    /// Proposes a new state of `rates` in place.
    ///
    /// Moving a pair up adds `ε ~ U[0, scaleFactor)` to both rates, moving down
    /// subtracts `ε/(1+ε)`. If either rate would leave the bounds, `rates` is
    /// left unchanged and the proposal is [Proposal::Rejected].
    ///
    /// # Errors
    /// Returns a [ConfigurationError::DimensionMismatch] if `rates` does not
    /// have the dimension the operator was created for.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        rates: &mut RealParameter,
        rng: &mut R,
    ) -> Result<Proposal, ConfigurationError> {
        if rates.dimension() != self.pairs.len() {
            return Err(ConfigurationError::dimension(
                rates.id(),
                rates.dimension(),
                self.pairs.len(),
            ));
        }

        let i = rng.gen_range(0..self.pairs.len());
        let j = self.pairs[i];
        let epsilon = rng.gen_range(0.0..1.0) * self.scale_factor;

        let values = rates.values_mut();
        if rng.gen_bool(0.5) {
            if values[i] + epsilon > self.upper || values[j] + epsilon > self.upper {
                return Ok(Proposal::Rejected);
            }
            values[i] += epsilon;
            values[j] += epsilon;
        } else {
            let delta = epsilon / (1.0 + epsilon);
            if values[i] - delta < self.lower || values[j] - delta < self.lower {
                return Ok(Proposal::Rejected);
            }
            values[i] -= delta;
            values[j] -= delta;
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        if mean > 0.0 {
            values.iter_mut().for_each(|v| *v /= mean);
        }

        Ok(Proposal::Accepted { log_hastings_ratio: 0.0 })
    }

    /// Records an accepted proposal.
    pub fn accept(&mut self) {
        self.counter.accept();
    }

    /// Records a rejected proposal.
    pub fn reject(&mut self) {
        self.counter.reject();
    }

    pub fn counter(&self) -> &AcceptanceCounter {
        &self.counter
    }

    /// Returns the fraction of accepted proposals, `None` before the first.
    pub fn acceptance_probability(&self) -> Option<f64> {
        self.counter.acceptance_probability()
    }

    /// Moves the scale factor towards the target acceptance probability,
    /// given the log acceptance ratio `log_alpha` of the last proposal.
    ///
    /// Does nothing if tuning is disabled. The result is clamped to the
    /// bounds of the rates.
    pub fn optimize(&mut self, log_alpha: f64) {
        if !self.optimise {
            return;
        }
        let delta = self.counter.coercion_delta(log_alpha) + (1.0 / self.scale_factor - 1.0).ln();
        let scale_factor = 1.0 / (delta.exp() + 1.0);
        if scale_factor.is_nan() {
            return;
        }
        self.scale_factor = scale_factor.max(self.lower).min(self.upper);
    }

    /// Suggests a better scale factor if acceptance is far from the target.
    pub fn performance_suggestion(&self) -> Option<String> {
        let prob = self.acceptance_probability()?;
        if (0.1..=0.4).contains(&prob) {
            return None;
        }
        let ratio = (prob / TARGET_ACCEPTANCE_PROBABILITY).clamp(0.5, 2.0);
        let suggested = self.scale_factor.powf(ratio);
        Some(format!("Try setting scaleFactor to about {suggested:.3}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rates(dim: usize) -> RealParameter {
        RealParameter::new("rates", vec![1.0; dim]).unwrap()
    }

    #[test]
    fn full_pairs_are_transposed_cells() {
        let operator = RatesFreqsOperator::full(&rates(6)).unwrap();
        // (0,1) (0,2) (1,0) (1,2) (2,0) (2,1)
        assert_eq!(operator.pairs(), &[2, 4, 0, 5, 1, 3]);
        for (i, &j) in operator.pairs().iter().enumerate() {
            assert_eq!(operator.pairs()[j], i);
        }
    }

    #[test]
    fn full_rejects_impossible_dimension() {
        assert!(RatesFreqsOperator::full(&rates(7)).is_err());
        assert!(RatesFreqsOperator::full(&rates(12)).is_ok());
        assert!(RatesFreqsOperator::correlated(&rates(12)).is_err());
    }

    #[test]
    fn propose_keeps_pairs_equal_and_mean_one() {
        let mut rates = rates(8);
        let operator = RatesFreqsOperator::correlated(&rates).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            operator.propose(&mut rates, &mut rng).unwrap();
            assert_relative_eq!(rates.mean(), 1.0, epsilon = 1e-12);
        }
        for (i, &j) in REVERSE_EDGES.iter().enumerate() {
            assert_relative_eq!(rates.value(i), rates.value(j), epsilon = 1e-12);
        }
    }

    #[test]
    fn out_of_bounds_leaves_rates_unchanged() {
        let mut rates = RealParameter::new("rates", vec![1.0; 8])
            .unwrap()
            .with_bounds(1.0, 1.0)
            .unwrap();
        let operator = RatesFreqsOperator::correlated(&rates).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut rejected = 0;
        for _ in 0..50 {
            if operator.propose(&mut rates, &mut rng).unwrap().is_rejected() {
                rejected += 1;
            }
        }
        assert!(rejected > 40);
        assert!(rates.values().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn wrong_dimension_at_proposal_is_an_error() {
        let operator = RatesFreqsOperator::correlated(&rates(8)).unwrap();
        let mut other = rates(6);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(operator.propose(&mut other, &mut rng).is_err());
    }

    #[test]
    fn optimize_respects_switch() {
        let mut operator = RatesFreqsOperator::correlated(&rates(8))
            .unwrap()
            .with_scale_factor(0.5)
            .unwrap()
            .with_optimise(false);
        operator.optimize(-5.0);
        assert_eq!(operator.scale_factor(), 0.5);

        let mut operator = operator.with_optimise(true);
        operator.optimize(-5.0);
        let after_reject = operator.scale_factor();
        assert!(after_reject > 0.5 && after_reject < 1.0);
        operator.optimize(0.0);
        assert!(operator.scale_factor() < after_reject);
        assert!(operator.scale_factor() > 0.0);
    }

    #[test]
    fn suggestion_only_far_from_target() {
        let mut operator = RatesFreqsOperator::correlated(&rates(8))
            .unwrap()
            .with_scale_factor(0.5)
            .unwrap();
        assert_eq!(operator.performance_suggestion(), None);

        for _ in 0..3 {
            operator.accept();
        }
        for _ in 0..7 {
            operator.reject();
        }
        assert_eq!(operator.performance_suggestion(), None);

        for _ in 0..90 {
            operator.reject();
        }
        // acceptance 0.03, ratio clamped to 0.5
        assert_eq!(
            operator.performance_suggestion().as_deref(),
            Some("Try setting scaleFactor to about 0.707")
        );
    }
}
