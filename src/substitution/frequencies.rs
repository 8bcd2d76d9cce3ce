//! Stationary state frequencies.

use crate::error::ConfigurationError;
use std::ops::Index;

/// Tolerance for treating frequencies as uniform
const UNIFORM_TOLERANCE: f64 = 1e-10;

/// A probability vector over the states of a substitution model.
///
/// Values are normalized to sum 1 at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Frequencies {
    values: Vec<f64>,
}

impl Frequencies {
    /// Creates frequencies from non-negative weights, normalizing them.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if `weights` is empty, contains a negative
    /// or non-finite value, or sums to zero.
    pub fn new(weights: Vec<f64>) -> Result<Self, ConfigurationError> {
        if weights.is_empty() {
            return Err(ConfigurationError::invalid("frequencies", "needs at least one state"));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigurationError::invalid(
                "frequencies",
                "weights must be non-negative and finite",
            ));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(ConfigurationError::invalid("frequencies", "weights sum to zero"));
        }
        Ok(Self {
            values: weights.into_iter().map(|w| w / total).collect(),
        })
    }

    /// Creates equal frequencies for `state_count` states.
    pub fn uniform(state_count: usize) -> Self {
        Self {
            values: vec![1.0 / state_count as f64; state_count],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Returns whether all frequencies are equal, trivially so without states.
    pub fn is_uniform(&self) -> bool {
        match self.values.first() {
            Some(&first) => self.values.iter().all(|f| (f - first).abs() < UNIFORM_TOLERANCE),
            None => true,
        }
    }
}

impl Index<usize> for Frequencies {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_detection() {
        assert!(Frequencies::uniform(4).is_uniform());
        assert!(!Frequencies::new(vec![1.0, 2.0]).unwrap().is_uniform());
    }

    #[test]
    fn no_states_is_trivially_uniform() {
        let frequencies = Frequencies::uniform(0);
        assert!(frequencies.is_empty());
        assert!(frequencies.is_uniform());
    }
}
