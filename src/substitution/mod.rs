//! Continuous-time Markov substitution models for discrete traits.
//!
//! - [CorrelatedSubstitutionModel]: two binary traits that may evolve dependently
//! - [GeneralSubstitutionModel]: any number of states, one rate per directed pair
//! - [NoChangeSubstitutionModel]: states never change
//!
//! All models build their generator `Q` lazily (see [RateMatrixState]) and
//! derive transition probabilities as `P(t) = exp(Q t)`.

pub mod correlated;
pub mod frequencies;
pub mod general;
pub mod no_change;
pub mod rate_matrix;

pub use correlated::CorrelatedSubstitutionModel;
pub use frequencies::Frequencies;
pub use general::GeneralSubstitutionModel;
pub use no_change::NoChangeSubstitutionModel;
pub use rate_matrix::RateMatrixState;

use crate::clone::StructuralClone;
use nalgebra::DMatrix;

/// A substitution model as consumed by a tree likelihood.
pub trait SubstitutionModel: StructuralClone + Send {
    /// Returns the id of this model.
    fn id(&self) -> &str;

    /// Returns the number of states.
    fn state_count(&self) -> usize;

    /// Returns the stationary (root) frequencies.
    fn frequencies(&self) -> &Frequencies;

    /// Returns the normalized generator, rebuilding it if rates or frequencies changed.
    fn rate_matrix(&mut self) -> &DMatrix<f64>;

    /// Returns `P(distance) = exp(Q · distance)`.
    ///
    /// `distance` is the product of branch length, clock rate and site rate.
    fn transition_probabilities(&mut self, distance: f64) -> DMatrix<f64> {
        (self.rate_matrix() * distance).exp()
    }
}
