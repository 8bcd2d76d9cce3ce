//! Substitution model for two binary traits that may evolve dependently.
//!
//! The compound state `s = 2·t0 + t1` combines trait 0 (the more significant
//! bit) and trait 1, so the states are `00, 01, 10, 11`. In an infinitesimal
//! time step only one trait changes, which leaves eight directed transitions,
//! each with its own rate:
//!
//! | rate | transition |
//! |------|------------|
//! | r0   | 00 → 01    |
//! | r1   | 00 → 10    |
//! | r2   | 01 → 00    |
//! | r3   | 01 → 11    |
//! | r4   | 10 → 00    |
//! | r5   | 10 → 11    |
//! | r6   | 11 → 01    |
//! | r7   | 11 → 10    |
//!
//! Trait evolution is independent exactly when the rates of flipping one trait
//! do not depend on the state of the other, e.g. `r1 == r3` and `r4 == r6`
//! for trait 0. Frequencies should be uniform to make rates directly
//! comparable in this sense.

use crate::clone::StructuralClone;
use crate::error::ConfigurationError;
use crate::parameter::RealParameter;
use crate::substitution::rate_matrix::normalized_generator;
use crate::substitution::{Frequencies, RateMatrixState, SubstitutionModel};
use nalgebra::DMatrix;

/// Number of compound states
pub const STATE_COUNT: usize = 4;

/// Number of binary traits
pub const COMPONENT_COUNT: usize = 2;

/// Directed transitions `(from, to)` in rate order.
pub const EDGES: [(usize, usize); 8] = [(0, 1), (0, 2), (1, 0), (1, 3), (2, 0), (2, 3), (3, 1), (3, 2)];

/// For each rate, the index of the rate of the reverse transition.
pub const REVERSE_EDGES: [usize; 8] = [2, 4, 0, 6, 1, 7, 3, 5];

/// Returns the bit of compound states that holds `component`.
fn component_bit(component: usize) -> usize {
    1 << (COMPONENT_COUNT - 1 - component)
}

/// Returns the two-character name of a compound state, e.g. `01`.
pub fn state_name(state: usize) -> String {
    format!("{state:02b}")
}

/// Returns the rate index of transition `from → to`, if it is a single-trait flip.
pub fn edge_index(from: usize, to: usize) -> Option<usize> {
    EDGES.iter().position(|&edge| edge == (from, to))
}

// =#========================================================================#=
// CORRELATED SUBSTITUTION MODEL
// =#========================================================================#=
/// Four-state model for two correlated binary traits (Pagel & Meade 2006).
///
/// # Example
/// ```
/// use treeset::parameter::RealParameter;
/// use treeset::substitution::{CorrelatedSubstitutionModel, Frequencies, SubstitutionModel};
///
/// let rates = RealParameter::new("rates", vec![1.0; 8]).unwrap();
/// let mut model = CorrelatedSubstitutionModel::new("pagel", rates, Frequencies::uniform(4)).unwrap();
/// assert!(!model.depends(0, 1));
///
/// model.rates_mut().set_value(3, 2.0);
/// assert!(model.depends(0, 1));
/// assert!(!model.depends(1, 0));
///
/// let q = model.rate_matrix();
/// assert_eq!(q[(0, 3)], 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct CorrelatedSubstitutionModel {
    id: String,
    rates: RealParameter,
    frequencies: Frequencies,
    rate_matrix: RateMatrixState,
}

impl CorrelatedSubstitutionModel {
    /// Creates a model from eight rates (see module docs) and four frequencies.
    ///
    /// # Errors
    /// Returns a [ConfigurationError::DimensionMismatch] if `rates` does not have
    /// dimension 8 or `frequencies` not dimension 4, and a
    /// [ConfigurationError::InvalidValue] if a rate is not positive and finite.
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

    /// Creates a model with independently evolving traits.
    ///
    /// # Arguments
    /// * `gains` - Rates of `0 → 1` for trait 0 and trait 1
    /// * `losses` - Rates of `1 → 0` for trait 0 and trait 1
    pub fn independent(
        id: impl Into<String>,
        gains: [f64; 2],
        losses: [f64; 2],
        frequencies: Frequencies,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();
        let values = EDGES
            .iter()
            .map(|&(from, to)| {
                let component = if (from ^ to) == component_bit(0) { 0 } else { 1 };
                if to > from { gains[component] } else { losses[component] }
            })
            .collect();
        let rates = RealParameter::new(format!("{id}.rates"), values)?;
        Self::new(id, rates, frequencies)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let expected_rates = STATE_COUNT * COMPONENT_COUNT;
        if self.rates.dimension() != expected_rates {
            return Err(ConfigurationError::dimension(
                format!("rates of {}", self.id),
                self.rates.dimension(),
                expected_rates,
            ));
        }
        if self.frequencies.len() != STATE_COUNT {
            return Err(ConfigurationError::dimension(
                format!("frequencies of {}", self.id),
                self.frequencies.len(),
                STATE_COUNT,
            ));
        }
        if let Some(rate) = self.rates.values().iter().find(|&&r| !(r.is_finite() && r > 0.0)) {
            return Err(ConfigurationError::invalid(
                format!("rates of {}", self.id),
                format!("{rate} is not positive"),
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
    ///
    /// # Errors
    /// Returns a [ConfigurationError::DimensionMismatch] unless there are four frequencies.
    pub fn set_frequencies(&mut self, frequencies: Frequencies) -> Result<(), ConfigurationError> {
        if frequencies.len() != STATE_COUNT {
            return Err(ConfigurationError::dimension(
                format!("frequencies of {}", self.id),
                frequencies.len(),
                STATE_COUNT,
            ));
        }
        self.frequencies = frequencies;
        self.rate_matrix.invalidate();
        Ok(())
    }

    /// Returns the relative rate of `from → to`, zero if not a single-trait flip.
    pub fn rate(&self, from: usize, to: usize) -> f64 {
        edge_index(from, to).map_or(0.0, |k| self.rates.value(k))
    }

    /// Returns whether the rates of `component` depend on the state of `depends_on`.
    ///
    /// Compares, for each state of the other trait, the rates of flipping
    /// `component`. Non-uniform frequencies always count as dependent, as do
    /// any rate differences. A component never depends on itself, and
    /// components out of range are reported as independent.
    pub fn depends(&self, component: usize, depends_on: usize) -> bool {
        if component == depends_on || component >= COMPONENT_COUNT || depends_on >= COMPONENT_COUNT {
            return false;
        }
        if !self.frequencies.is_uniform() {
            return true;
        }

        let flip = component_bit(component);
        let condition = component_bit(depends_on);
        (0..STATE_COUNT).filter(|s| s & condition == 0).any(|s| {
            let unset = self.rate(s, s ^ flip);
            let set = self.rate(s | condition, (s | condition) ^ flip);
            unset != set
        })
    }

    fn build_rate_matrix(rates: &RealParameter, frequencies: &Frequencies) -> DMatrix<f64> {
        let mut q = DMatrix::zeros(STATE_COUNT, STATE_COUNT);
        for (k, &(from, to)) in EDGES.iter().enumerate() {
            q[(from, to)] = rates.value(k);
        }
        normalized_generator(q, frequencies)
    }
}

impl SubstitutionModel for CorrelatedSubstitutionModel {
    fn id(&self) -> &str {
        &self.id
    }

    fn state_count(&self) -> usize {
        STATE_COUNT
    }

    fn frequencies(&self) -> &Frequencies {
        &self.frequencies
    }

    fn rate_matrix(&mut self) -> &DMatrix<f64> {
        let (rates, frequencies) = (&self.rates, &self.frequencies);
        self.rate_matrix
            .get_or_build(|| Self::build_rate_matrix(rates, frequencies))
    }
}

impl StructuralClone for CorrelatedSubstitutionModel {
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
