//! Trace loggers for model state.
//!
//! Each logger writes one header row at the start of a run and one row per
//! logged sample. Columns are tab-separated, with a tab after every column
//! (including the last) as in trace files.

use crate::error::ConfigurationError;
use crate::substitution::correlated::{COMPONENT_COUNT, EDGES, state_name};
use crate::substitution::{CorrelatedSubstitutionModel, SubstitutionModel};
use std::io::{self, Write};
use std::marker::PhantomData;

/// Branch length at which transition probabilities are taken as stationary
const STATIONARY_DISTANCE: f64 = 1000.0;

/// Writes columns describing some state to a trace.
pub trait Loggable {
    /// The logged state
    type Subject: ?Sized;

    /// Returns the column names.
    fn headers(&self) -> Vec<String>;

    /// Returns the current column values of `subject`.
    fn values(&self, subject: &mut Self::Subject) -> Vec<f64>;

    /// Writes the header row.
    fn init<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        for header in self.headers() {
            write!(out, "{header}\t")?;
        }
        Ok(())
    }

    /// Writes the values of `subject`.
    fn log<W: Write + ?Sized>(&self, subject: &mut Self::Subject, out: &mut W) -> io::Result<()> {
        for value in self.values(subject) {
            write!(out, "{value}\t")?;
        }
        Ok(())
    }
}

// =#========================================================================#=
// RATE LOGGER
// =#========================================================================#=
/// Logs the eight rates of a [CorrelatedSubstitutionModel], e.g. `rate_00->01`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLogger;

impl Loggable for RateLogger {
    type Subject = CorrelatedSubstitutionModel;

    fn headers(&self) -> Vec<String> {
        EDGES
            .iter()
            .map(|&(from, to)| format!("rate_{}->{}", state_name(from), state_name(to)))
            .collect()
    }

    fn values(&self, model: &mut CorrelatedSubstitutionModel) -> Vec<f64> {
        model.rates().values().to_vec()
    }
}

// =#========================================================================#=
// INDEPENDENCY LOGGER
// =#========================================================================#=
/// Logs for each pair of traits whether either depends on the other, as 1 or 0.
#[derive(Debug, Clone)]
pub struct IndependencyLogger {
    id: String,
}

impl IndependencyLogger {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Pairs `(c1, c2)` with `c1 > c2`, in column order.
    fn pairs() -> impl Iterator<Item = (usize, usize)> {
        (0..COMPONENT_COUNT).flat_map(|c1| (0..c1).map(move |c2| (c1, c2)))
    }
}

impl Loggable for IndependencyLogger {
    type Subject = CorrelatedSubstitutionModel;

    fn headers(&self) -> Vec<String> {
        Self::pairs()
            .flat_map(|(c1, c2)| {
                [
                    format!("{}_{c1}_depends_on_{c2}", self.id),
                    format!("{}_{c2}_depends_on_{c1}", self.id),
                ]
            })
            .collect()
    }

    fn values(&self, model: &mut CorrelatedSubstitutionModel) -> Vec<f64> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self::pairs()
            .flat_map(|(c1, c2)| [flag(model.depends(c1, c2)), flag(model.depends(c2, c1))])
            .collect()
    }
}

// =#========================================================================#=
// STATIONARY FREQUENCIES LOGGER
// =#========================================================================#=
/// Logs the stationary frequencies of a substitution model, computed as
/// the first row of `P(1000)`.
///
/// # Example
/// ```
/// use treeset::loggers::{Loggable, StationaryFrequenciesLogger};
/// use treeset::parameter::RealParameter;
/// use treeset::substitution::{CorrelatedSubstitutionModel, Frequencies};
///
/// let rates = RealParameter::new("rates", vec![1.0; 8]).unwrap();
/// let mut model = CorrelatedSubstitutionModel::new("m", rates, Frequencies::uniform(4)).unwrap();
/// let logger = StationaryFrequenciesLogger::for_model("pi", &model).with_dim(2).unwrap();
///
/// let mut out = Vec::new();
/// logger.init(&mut out).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "statFreqspi.1\tstatFreqspi.2\t");
/// assert!((logger.value(&mut model, 1).unwrap() - 0.25).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct StationaryFrequenciesLogger<M> {
    id: String,
    state_count: usize,
    dim: usize,
    model: PhantomData<fn(&mut M)>,
}

impl<M: SubstitutionModel> StationaryFrequenciesLogger<M> {
    /// Creates a logger for all `state_count` states.
    pub fn new(id: impl Into<String>, state_count: usize) -> Self {
        Self {
            id: id.into(),
            state_count,
            dim: state_count,
            model: PhantomData,
        }
    }

    /// Creates a logger for all states of `model`.
    pub fn for_model(id: impl Into<String>, model: &M) -> Self {
        Self::new(id, model.state_count())
    }

    /// Logs only the first `dim` states.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if `dim` exceeds the state count.
    pub fn with_dim(mut self, dim: usize) -> Result<Self, ConfigurationError> {
        if dim > self.state_count {
            return Err(ConfigurationError::invalid(
                "dim",
                format!("cannot be larger than state count (={})", self.state_count),
            ));
        }
        self.dim = dim;
        Ok(self)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the stationary frequency of `state`.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if `state` is not among the logged states.
    pub fn value(&self, model: &mut M, state: usize) -> Result<f64, ConfigurationError> {
        if state >= self.dim {
            return Err(ConfigurationError::invalid(
                "state",
                format!("{state} is not below the logged dimension {}", self.dim),
            ));
        }
        Ok(self.stationary_frequencies(model)[state])
    }

    fn stationary_frequencies(&self, model: &mut M) -> Vec<f64> {
        let p = model.transition_probabilities(STATIONARY_DISTANCE);
        p.row(0).iter().take(self.dim).copied().collect()
    }
}

impl<M: SubstitutionModel> Loggable for StationaryFrequenciesLogger<M> {
    type Subject = M;

    fn headers(&self) -> Vec<String> {
        (1..=self.dim).map(|k| format!("statFreqs{}.{k}", self.id)).collect()
    }

    fn values(&self, model: &mut M) -> Vec<f64> {
        self.stationary_frequencies(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::RealParameter;
    use crate::substitution::Frequencies;

    fn model(frequencies: Frequencies) -> CorrelatedSubstitutionModel {
        let rates = RealParameter::new("rates", vec![1.0; 8]).unwrap();
        CorrelatedSubstitutionModel::new("m", rates, frequencies).unwrap()
    }

    #[test]
    fn rate_headers() {
        let mut out = Vec::new();
        RateLogger.init(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "rate_00->01\trate_00->10\trate_01->00\trate_01->11\t\
             rate_10->00\trate_10->11\trate_11->01\trate_11->10\t"
        );
    }

    #[test]
    fn independency_values_follow_depends() {
        let logger = IndependencyLogger::new("ind");
        let mut model = model(Frequencies::uniform(4));
        assert_eq!(
            logger.headers(),
            vec!["ind_1_depends_on_0", "ind_0_depends_on_1"]
        );

        model.rates_mut().set_value(3, 2.0);
        let mut out = Vec::new();
        logger.log(&mut model, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0\t1\t");
    }

    #[test]
    fn stationary_dim_is_bounded() {
        let mut model = model(Frequencies::uniform(4));
        assert!(StationaryFrequenciesLogger::for_model("pi", &model).with_dim(5).is_err());
        let logger = StationaryFrequenciesLogger::for_model("pi", &model).with_dim(3).unwrap();
        assert!(logger.value(&mut model, 3).is_err());
        assert_eq!(logger.values(&mut model).len(), 3);
    }
}
