//! Substitution model with one free rate per ordered pair of states.

use crate::clone::StructuralClone;
use crate::error::ConfigurationError;
use crate::parameter::RealParameter;
use crate::substitution::rate_matrix::normalized_generator;
use crate::substitution::{Frequencies, RateMatrixState, SubstitutionModel};
use nalgebra::DMatrix;

/// An `n`-state model with `n(n-1)` rates, `Q[i][j] = r_ij f_j`.
///
/// Rates are laid out row-major over the off-diagonal cells: for `n = 3`,
/// the order is `(0,1) (0,2) (1,0) (1,2) (2,0) (2,1)`.
#[derive(Debug, Clone)]
pub struct GeneralSubstitutionModel {
    id: String,
    rates: RealParameter,
    frequencies: Frequencies,
    rate_matrix: RateMatrixState,
}

impl GeneralSubstitutionModel {
    /// Creates a model on `frequencies.len()` states.
    ///
    /// # Errors
    /// Returns a [ConfigurationError::DimensionMismatch] unless `rates` has dimension `n(n-1)`.
    pub fn new(
        id: impl Into<String>,
        rates: RealParameter,
        frequencies: Frequencies,
    ) -> Result<Self, ConfigurationError> {
        let model = Self {
            id: id.into(),
            rates,
            frequencies,
            rate_matrix: RateMatrixState::Dirty,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let n = self.frequencies.len();
        if self.rates.dimension() != n * (n - 1) {
            return Err(ConfigurationError::dimension(
                format!("rates of {}", self.id),
                self.rates.dimension(),
                n * (n - 1),
            ));
        }
        Ok(())
    }

    pub fn rates(&self) -> &RealParameter {
        &self.rates
    }

    /// Returns the rates for modification and marks the rate matrix dirty.
    pub fn rates_mut(&mut self) -> &mut RealParameter {
        self.rate_matrix.invalidate();
        &mut self.rates
    }

    /// Replaces the frequencies and marks the rate matrix dirty.
    pub fn set_frequencies(&mut self, frequencies: Frequencies) -> Result<(), ConfigurationError> {
        if frequencies.len() != self.frequencies.len() {
            return Err(ConfigurationError::dimension(
                format!("frequencies of {}", self.id),
                frequencies.len(),
                self.frequencies.len(),
            ));
        }
        self.frequencies = frequencies;
        self.rate_matrix.invalidate();
        Ok(())
    }
}

impl SubstitutionModel for GeneralSubstitutionModel {
    fn id(&self) -> &str {
        &self.id
    }

    fn state_count(&self) -> usize {
        self.frequencies.len()
    }

    fn frequencies(&self) -> &Frequencies {
        &self.frequencies
    }

    fn rate_matrix(&mut self) -> &DMatrix<f64> {
        let (rates, frequencies) = (&self.rates, &self.frequencies);
        self.rate_matrix.get_or_build(|| {
            let n = frequencies.len();
            let mut off_diagonal = rates.values().iter();
            let mut q = DMatrix::zeros(n, n);
            for i in 0..n {
                for j in (0..n).filter(|&j| j != i) {
                    q[(i, j)] = off_diagonal.next().copied().unwrap_or_default();
                }
            }
            normalized_generator(q, frequencies)
        })
    }
}

impl StructuralClone for GeneralSubstitutionModel {
    fn structural_clone(&self, worker: usize) -> Result<Self, ConfigurationError> {
        let clone = Self {
            id: format!("{}_{worker}", self.id),
            rates: self.rates.structural_clone(worker)?,
            frequencies: self.frequencies.clone(),
            rate_matrix: RateMatrixState::Dirty,
        };
        clone.validate()?;
        Ok(clone)
    }
}
