//! Substitution model under which states never change.

use crate::clone::StructuralClone;
use crate::error::ConfigurationError;
use crate::substitution::{Frequencies, SubstitutionModel};
use nalgebra::DMatrix;

/// The state at the bottom of a branch equals the state at its top.
///
/// `P(t)` is the identity restricted to states of positive frequency, so
/// states with zero frequency have zero probability everywhere.
#[derive(Debug, Clone)]
pub struct NoChangeSubstitutionModel {
    id: String,
    frequencies: Frequencies,
    zero: DMatrix<f64>,
}

impl NoChangeSubstitutionModel {
    pub fn new(id: impl Into<String>, frequencies: Frequencies) -> Self {
        let n = frequencies.len();
        Self {
            id: id.into(),
            frequencies,
            zero: DMatrix::zeros(n, n),
        }
    }
}

impl SubstitutionModel for NoChangeSubstitutionModel {
    fn id(&self) -> &str {
        &self.id
    }

    fn state_count(&self) -> usize {
        self.frequencies.len()
    }

    fn frequencies(&self) -> &Frequencies {
        &self.frequencies
    }

    /// There are no substitutions, so the generator is zero.
    fn rate_matrix(&mut self) -> &DMatrix<f64> {
        &self.zero
    }

    fn transition_probabilities(&mut self, _distance: f64) -> DMatrix<f64> {
        let n = self.state_count();
        DMatrix::from_fn(n, n, |i, j| {
            if i == j && self.frequencies[i] > 0.0 { 1.0 } else { 0.0 }
        })
    }
}

impl StructuralClone for NoChangeSubstitutionModel {
    fn structural_clone(&self, worker: usize) -> Result<Self, ConfigurationError> {
        Ok(Self::new(format!("{}_{worker}", self.id), self.frequencies.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frequency_states_vanish() {
        let frequencies = Frequencies::new(vec![0.5, 0.0, 0.5]).unwrap();
        let mut model = NoChangeSubstitutionModel::new("frozen", frequencies);
        let p = model.transition_probabilities(100.0);

        assert_eq!(p[(0, 0)], 1.0);
        assert_eq!(p[(1, 1)], 0.0);
        assert_eq!(p[(2, 2)], 1.0);
        assert_eq!(p[(0, 2)], 0.0);
    }
}
