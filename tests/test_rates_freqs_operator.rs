use approx::assert_abs_diff_eq;
use nalgebra::DVector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use treeset::parameter::RealParameter;
use treeset::substitution::{Frequencies, SubstitutionModel};
use treeset::{CorrelatedSubstitutionModel, GeneralSubstitutionModel, Proposal, RatesFreqsOperator};

const PROPOSALS: usize = 100_000;

/// Returns the largest entry of `|f Q|`, zero for stationary `f`.
fn stationarity_error<M: SubstitutionModel>(model: &mut M) -> f64 {
    let frequencies = DVector::from_row_slice(model.frequencies().as_slice());
    let flow = model.rate_matrix().transpose() * frequencies;
    flow.amax()
}

#[test]
fn test_general_model_keeps_frequencies_stationary() {
    let frequencies = Frequencies::new(vec![0.3, 0.15, 0.15, 0.2, 0.2]).unwrap();
    let rates = RealParameter::new("rates", vec![1.0; 20])
        .unwrap()
        .with_bounds(0.0, f64::INFINITY)
        .unwrap();
    let operator = RatesFreqsOperator::full(&rates).unwrap();
    let mut model = GeneralSubstitutionModel::new("gtr", rates, frequencies).unwrap();
    let mut rng = StdRng::seed_from_u64(127);

    let mut accepted = 0;
    for _ in 0..PROPOSALS {
        if let Proposal::Accepted { log_hastings_ratio } = operator.propose(model.rates_mut(), &mut rng).unwrap() {
            assert_eq!(log_hastings_ratio, 0.0);
            accepted += 1;
        }
    }

    assert!(accepted > PROPOSALS / 2);
    assert_abs_diff_eq!(model.rates().mean(), 1.0, epsilon = 1e-10);
    assert!(model.rates().values().iter().all(|&r| r >= 0.0));
    assert_abs_diff_eq!(stationarity_error(&mut model), 0.0, epsilon = 1e-10);
}

#[test]
fn test_correlated_model_keeps_frequencies_stationary() {
    let frequencies = Frequencies::new(vec![0.1, 0.2, 0.3, 0.4]).unwrap();
    let rates = RealParameter::new("rates", vec![1.0; 8])
        .unwrap()
        .with_bounds(0.0, 100.0)
        .unwrap();
    let mut operator = RatesFreqsOperator::correlated(&rates)
        .unwrap()
        .with_scale_factor(0.5)
        .unwrap();
    let mut model = CorrelatedSubstitutionModel::new("pagel", rates, frequencies).unwrap();
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..PROPOSALS {
        match operator.propose(model.rates_mut(), &mut rng).unwrap() {
            Proposal::Accepted { .. } => {
                operator.accept();
                operator.optimize(0.0);
            }
            Proposal::Rejected => {
                operator.reject();
                operator.optimize(f64::NEG_INFINITY);
            }
        }
    }

    assert_eq!(operator.counter().proposals(), PROPOSALS as u64);
    assert!(operator.scale_factor() > 0.0 && operator.scale_factor() <= 100.0);
    assert_abs_diff_eq!(model.rates().mean(), 1.0, epsilon = 1e-10);
    assert_abs_diff_eq!(stationarity_error(&mut model), 0.0, epsilon = 1e-10);
}

#[test]
fn test_same_seed_same_chain() {
    let run = || {
        let mut rates = RealParameter::new("rates", vec![1.0; 12]).unwrap();
        let operator = RatesFreqsOperator::full(&rates).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1000 {
            operator.propose(&mut rates, &mut rng).unwrap();
        }
        rates
    };
    assert_eq!(run(), run());
}
