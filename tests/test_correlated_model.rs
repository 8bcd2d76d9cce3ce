use approx::assert_relative_eq;
use treeset::loggers::{IndependencyLogger, Loggable, RateLogger, StationaryFrequenciesLogger};
use treeset::parameter::RealParameter;
use treeset::substitution::correlated::{EDGES, edge_index};
use treeset::substitution::{Frequencies, SubstitutionModel};
use treeset::{CorrelatedSubstitutionModel, IndependentEvolutionPrior, StructuralClone};

fn model(rates: Vec<f64>, frequencies: Vec<f64>) -> CorrelatedSubstitutionModel {
    let rates = RealParameter::new("rates", rates).unwrap();
    CorrelatedSubstitutionModel::new("pagel", rates, Frequencies::new(frequencies).unwrap()).unwrap()
}

// --- RATE MATRIX ---
#[test]
fn test_rows_sum_to_zero_and_one_substitution_expected() {
    let frequencies = vec![0.1, 0.2, 0.3, 0.4];
    let mut model = model(vec![0.3, 1.7, 2.0, 0.4, 1.1, 0.9, 3.0, 0.6], frequencies.clone());
    let q = model.rate_matrix().clone();

    for i in 0..4 {
        assert_relative_eq!(q.row(i).sum(), 0.0, epsilon = 1e-12);
    }
    let expected_substitutions: f64 = (0..4).map(|i| -q[(i, i)] * frequencies[i]).sum();
    assert_relative_eq!(expected_substitutions, 1.0, epsilon = 1e-12);
}

#[test]
fn test_only_single_trait_flips() {
    let mut model = model((1..=8).map(f64::from).collect(), vec![1.0; 4]);
    let q = model.rate_matrix().clone();
    for from in 0..4usize {
        for to in (0..4).filter(|&to| to != from) {
            let flips_one = (from ^ to).count_ones() == 1;
            assert_eq!(q[(from, to)] > 0.0, flips_one, "{from} -> {to}");
            assert_eq!(edge_index(from, to).is_some(), flips_one);
        }
    }
    // Q_ij is proportional to the rate of edge (i, j)
    let (from, to) = EDGES[5];
    let (other_from, other_to) = EDGES[0];
    assert_relative_eq!(q[(from, to)] / q[(other_from, other_to)], 6.0, epsilon = 1e-12);
}

#[test]
fn test_transition_probabilities_converge_to_frequencies() {
    // reversible rates, so uniform frequencies are stationary
    let mut model = model(vec![1.0, 2.0, 1.0, 3.0, 2.0, 1.0, 3.0, 1.0], vec![1.0; 4]);
    let p = model.transition_probabilities(0.7);
    for i in 0..4 {
        assert_relative_eq!(p.row(i).sum(), 1.0, epsilon = 1e-10);
    }

    let logger = StationaryFrequenciesLogger::for_model("pi", &model);
    let stationary = logger.values(&mut model);
    assert_relative_eq!(stationary.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    for frequency in stationary {
        assert_relative_eq!(frequency, 0.25, epsilon = 1e-9);
    }
}

// --- DEPENDENCE ---
#[test]
fn test_independent_construction_becomes_dependent_after_perturbation() {
    let mut model =
        CorrelatedSubstitutionModel::independent("pagel", [0.5, 2.0], [1.5, 0.7], Frequencies::uniform(4)).unwrap();
    assert!(!model.depends(0, 1));
    assert!(!model.depends(1, 0));

    // 00 -> 01 flips trait 1 while trait 0 is 0
    let edge = edge_index(0b00, 0b01).unwrap();
    let rate = model.rates().value(edge);
    model.rates_mut().set_value(edge, rate * 1.01);
    assert!(model.depends(1, 0));
    assert!(!model.depends(0, 1));
}

#[test]
fn test_non_uniform_frequencies_are_dependent() {
    let model = model(vec![1.0; 8], vec![0.2, 0.3, 0.3, 0.2]);
    assert!(model.depends(0, 1));
    assert!(model.depends(1, 0));
}

#[test]
fn test_structural_clone_is_independent() {
    let original = model(vec![1.0; 8], vec![1.0; 4]);
    let mut clone = original.structural_clone(3).unwrap();
    assert_eq!(clone.id(), "pagel_3");
    assert_eq!(clone.rates().id(), "rates_3");

    clone.rates_mut().set_value(0, 4.0);
    assert_eq!(original.rates().value(0), 1.0);
    assert!(clone.depends(1, 0));
    assert!(!original.depends(1, 0));
}

// --- PRIOR ---
#[test]
fn test_prior_counts_dependent_pairs() {
    let prior = IndependentEvolutionPrior::new(RealParameter::new("pIndependent", vec![0.75]).unwrap()).unwrap();
    let log_p_dependent = 0.25f64.ln() - 0.75f64.ln();

    let mut model = model(vec![1.0; 8], vec![1.0; 4]);
    assert_eq!(prior.calculate_log_p(&model).log_p(), 0.0);

    model.rates_mut().set_value(0, 2.0);
    assert_relative_eq!(prior.calculate_log_p(&model).log_p(), log_p_dependent, epsilon = 1e-12);

    model.rates_mut().set_value(1, 2.0);
    assert_relative_eq!(prior.calculate_log_p(&model).log_p(), 2.0 * log_p_dependent, epsilon = 1e-12);
}

// --- LOGGERS ---
#[test]
fn test_trace_rows() {
    let mut model = model(vec![0.5, 1.0, 1.5, 2.0, 0.5, 1.0, 1.5, 2.0], vec![1.0; 4]);
    let independency = IndependencyLogger::new("pagel");

    let mut out = Vec::new();
    RateLogger.init(&mut out).unwrap();
    independency.init(&mut out).unwrap();
    out.push(b'\n');
    RateLogger.log(&mut model, &mut out).unwrap();
    independency.log(&mut model, &mut out).unwrap();

    let trace = String::from_utf8(out).unwrap();
    let mut lines = trace.lines();
    let headers: Vec<&str> = lines.next().unwrap().split_terminator('\t').collect();
    let values: Vec<&str> = lines.next().unwrap().split_terminator('\t').collect();

    assert_eq!(headers.len(), 10);
    assert_eq!(headers[0], "rate_00->01");
    assert_eq!(headers[7], "rate_11->10");
    assert_eq!(headers[8], "pagel_1_depends_on_0");
    assert_eq!(headers[9], "pagel_0_depends_on_1");
    assert_eq!(values, ["0.5", "1", "1.5", "2", "0.5", "1", "1.5", "2", "1", "1"]);
}

#[test]
fn test_stationary_frequencies_logger_dim() {
    let mut model = model(vec![1.0; 8], vec![1.0; 4]);
    let logger = StationaryFrequenciesLogger::for_model("pi", &model).with_dim(2).unwrap();
    assert_eq!(logger.headers(), ["statFreqspi.1", "statFreqspi.2"]);
    assert_relative_eq!(logger.value(&mut model, 0).unwrap(), 0.25, epsilon = 1e-9);
    assert!(logger.value(&mut model, 2).is_err());
    assert!(StationaryFrequenciesLogger::for_model("pi", &model).with_dim(5).is_err());
}
