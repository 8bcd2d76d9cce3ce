//! Named, bounded model parameters.

use crate::clone::StructuralClone;
use crate::error::ConfigurationError;

// =#========================================================================#=
// REAL PARAMETER
// =#========================================================================#=
/// A vector of reals with an id and inclusive bounds shared by all entries.
///
/// Setters do not enforce the bounds; proposals check them explicitly and
/// [RealParameter::is_within_bounds] reports the state.
#[derive(Debug, Clone, PartialEq)]
pub struct RealParameter {
    id: String,
    values: Vec<f64>,
    lower: f64,
    upper: f64,
}

impl RealParameter {
    /// Creates an unbounded parameter.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if `values` is empty or contains NaN.
    pub fn new(id: impl Into<String>, values: Vec<f64>) -> Result<Self, ConfigurationError> {
        let id = id.into();
        if values.is_empty() {
            return Err(ConfigurationError::invalid(id, "needs at least one value"));
        }
        if values.iter().any(|v| v.is_nan()) {
            return Err(ConfigurationError::invalid(id, "contains NaN"));
        }
        Ok(Self {
            id,
            values,
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        })
    }

    /// Sets inclusive bounds.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if `lower > upper` or a value lies outside.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Result<Self, ConfigurationError> {
        if !(lower <= upper) {
            return Err(ConfigurationError::invalid(
                &self.id,
                format!("lower bound {lower} exceeds upper bound {upper}"),
            ));
        }
        self.lower = lower;
        self.upper = upper;
        if !self.is_within_bounds() {
            return Err(ConfigurationError::invalid(
                &self.id,
                format!("values must lie in [{lower}, {upper}]"),
            ));
        }
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn set_value(&mut self, index: usize, value: f64) {
        self.values[index] = value;
    }

    /// Returns all values for modification.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Returns whether every value lies within the bounds.
    pub fn is_within_bounds(&self) -> bool {
        self.values.iter().all(|v| (self.lower..=self.upper).contains(v))
    }

    /// Returns the arithmetic mean of the values.
    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

impl StructuralClone for RealParameter {
    fn structural_clone(&self, worker: usize) -> Result<Self, ConfigurationError> {
        let mut clone = self.clone();
        clone.id = format!("{}_{worker}", self.id);
        Ok(clone)
    }
}

// =#========================================================================#=
// INTEGER PARAMETER
// =#========================================================================#=
/// A single integer with an id and inclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerParameter {
    id: String,
    value: i64,
    lower: i64,
    upper: i64,
}

impl IntegerParameter {
    /// Creates a parameter with inclusive bounds `[lower, upper]`.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if `lower > upper`.
    pub fn new(id: impl Into<String>, value: i64, lower: i64, upper: i64) -> Result<Self, ConfigurationError> {
        let id = id.into();
        if lower > upper {
            return Err(ConfigurationError::invalid(
                id,
                format!("lower bound {lower} exceeds upper bound {upper}"),
            ));
        }
        Ok(Self { id, value, lower, upper })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn lower(&self) -> i64 {
        self.lower
    }

    pub fn upper(&self) -> i64 {
        self.upper
    }

    /// Sets the value; bounds are not enforced.
    pub fn set_value(&mut self, value: i64) {
        self.value = value;
    }

    pub fn is_within_bounds(&self) -> bool {
        (self.lower..=self.upper).contains(&self.value)
    }
}
