//! Rate heterogeneity across sites and the molecular clock.

use crate::clone::StructuralClone;
use crate::error::ConfigurationError;
use crate::substitution::SubstitutionModel;

// =#========================================================================#=
// SITE MODEL
// =#========================================================================#=
/// Owns the substitution model and scales it per site category.
///
/// Every category has the same weight. The default is one category of rate 1.
#[derive(Debug, Clone)]
pub struct SiteModel<M> {
    id: String,
    mutation_rate: f64,
    category_rates: Vec<f64>,
    substitution_model: M,
}

impl<M: SubstitutionModel> SiteModel<M> {
    pub fn new(id: impl Into<String>, substitution_model: M) -> Self {
        Self {
            id: id.into(),
            mutation_rate: 1.0,
            category_rates: vec![1.0],
            substitution_model,
        }
    }

    /// Sets the overall mutation rate.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] unless the rate is positive and finite.
    pub fn with_mutation_rate(mut self, mutation_rate: f64) -> Result<Self, ConfigurationError> {
        self.mutation_rate = mutation_rate;
        self.validate()?;
        Ok(self)
    }

    /// Sets the rates of equally weighted site categories.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if there is no rate or a rate is negative or not finite.
    pub fn with_category_rates(mut self, category_rates: Vec<f64>) -> Result<Self, ConfigurationError> {
        self.category_rates = category_rates;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.mutation_rate.is_finite() && self.mutation_rate > 0.0) {
            return Err(ConfigurationError::invalid(
                format!("mutation rate of {}", self.id),
                format!("{} is not positive", self.mutation_rate),
            ));
        }
        if self.category_rates.is_empty() || self.category_rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(ConfigurationError::invalid(
                format!("category rates of {}", self.id),
                "need at least one non-negative rate",
            ));
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    pub fn category_count(&self) -> usize {
        self.category_rates.len()
    }

    /// Returns the rate of `category` including the mutation rate.
    pub fn category_rate(&self, category: usize) -> f64 {
        self.category_rates[category] * self.mutation_rate
    }

    /// Returns the weight of every category.
    pub fn category_weight(&self) -> f64 {
        1.0 / self.category_rates.len() as f64
    }

    pub fn substitution_model(&self) -> &M {
        &self.substitution_model
    }

    pub fn substitution_model_mut(&mut self) -> &mut M {
        &mut self.substitution_model
    }
}

impl<M: SubstitutionModel> StructuralClone for SiteModel<M> {
    fn structural_clone(&self, worker: usize) -> Result<Self, ConfigurationError> {
        let clone = Self {
            id: format!("{}_{worker}", self.id),
            mutation_rate: self.mutation_rate,
            category_rates: self.category_rates.clone(),
            substitution_model: self.substitution_model.structural_clone(worker)?,
        };
        clone.validate()?;
        Ok(clone)
    }
}

// =#========================================================================#=
// STRICT CLOCK
// =#========================================================================#=
/// One substitution rate for all branches.
#[derive(Debug, Clone, PartialEq)]
pub struct StrictClock {
    id: String,
    rate: f64,
}

impl StrictClock {
    /// Creates a clock with the given rate.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] unless the rate is positive and finite.
    pub fn new(id: impl Into<String>, rate: f64) -> Result<Self, ConfigurationError> {
        let clock = Self { id: id.into(), rate };
        clock.validate()?;
        Ok(clock)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.rate.is_finite() && self.rate > 0.0 {
            Ok(())
        } else {
            Err(ConfigurationError::invalid(
                format!("clock rate of {}", self.id),
                format!("{} is not positive", self.rate),
            ))
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Default for StrictClock {
    fn default() -> Self {
        Self {
            id: "clock".to_string(),
            rate: 1.0,
        }
    }
}

impl StructuralClone for StrictClock {
    fn structural_clone(&self, worker: usize) -> Result<Self, ConfigurationError> {
        let clone = Self {
            id: format!("{}_{worker}", self.id),
            rate: self.rate,
        };
        clone.validate()?;
        Ok(clone)
    }
}
