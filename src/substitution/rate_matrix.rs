//! Lazily built generator matrices.

use crate::substitution::Frequencies;
use nalgebra::DMatrix;

/// Cache state of a model's generator matrix.
///
/// Any change to rates or frequencies moves the state to `Dirty`; the next
/// read rebuilds the matrix and moves it to `Clean`.
#[derive(Debug, Clone, Default)]
pub enum RateMatrixState {
    #[default]
    Dirty,
    Clean(DMatrix<f64>),
}

impl RateMatrixState {
    /// Returns the cached matrix, building it with `build` first if dirty.
    pub fn get_or_build(&mut self, build: impl FnOnce() -> DMatrix<f64>) -> &DMatrix<f64> {
        if let RateMatrixState::Dirty = self {
            *self = RateMatrixState::Clean(build());
        }
        match self {
            RateMatrixState::Clean(matrix) => matrix,
            RateMatrixState::Dirty => unreachable!("rate matrix was rebuilt above"),
        }
    }

    pub fn invalidate(&mut self) {
        *self = RateMatrixState::Dirty;
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self, RateMatrixState::Dirty)
    }
}

/// Completes a generator from its off-diagonal relative rates.
///
/// Scales every `Q[i][j]` by `f[j]`, sets the diagonal to the negative row
/// sums, and normalizes to one expected substitution per unit time, that is
/// `Σ -Q[i][i] f[i] = 1`. A matrix without any substitution stays zero.
pub(crate) fn normalized_generator(mut q: DMatrix<f64>, frequencies: &Frequencies) -> DMatrix<f64> {
    let n = q.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            q[(i, j)] *= frequencies[j];
            q[(j, i)] *= frequencies[i];
        }
    }

    for i in 0..n {
        q[(i, i)] = 0.0;
        let row_sum: f64 = q.row(i).sum();
        q[(i, i)] = -row_sum;
    }

    let substitutions: f64 = (0..n).map(|i| -q[(i, i)] * frequencies[i]).sum();
    if substitutions > 0.0 {
        q /= substitutions;
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn state_machine_rebuilds_only_when_dirty() {
        let mut state = RateMatrixState::default();
        let mut builds = 0;
        state.get_or_build(|| {
            builds += 1;
            DMatrix::zeros(2, 2)
        });
        state.get_or_build(|| {
            builds += 1;
            DMatrix::zeros(2, 2)
        });
        assert_eq!(builds, 1);

        state.invalidate();
        assert!(state.is_dirty());
    }

    #[test]
    fn generator_is_normalized() {
        let frequencies = Frequencies::new(vec![0.2, 0.3, 0.5]).unwrap();
        let mut q = DMatrix::from_element(3, 3, 1.0);
        q[(0, 2)] = 4.0;
        let q = normalized_generator(q, &frequencies);

        for i in 0..3 {
            assert_relative_eq!(q.row(i).sum(), 0.0, epsilon = 1e-12);
        }
        let substitutions: f64 = (0..3).map(|i| -q[(i, i)] * frequencies[i]).sum();
        assert_relative_eq!(substitutions, 1.0, epsilon = 1e-12);
    }
}
