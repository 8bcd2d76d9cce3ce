use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use treeset::parameter::RealParameter;
use treeset::site_model::{SiteModel, StrictClock};
use treeset::substitution::Frequencies;
use treeset::{
    Alignment, CorrelatedSubstitutionModel, ThreadCount, ThreadedTreeSetLikelihood, TreeEnsemble,
    TreeEnsembleBuilder, TreeLikelihood, TreeSetLikelihood,
};

const NUM_TAXA: usize = 64;
const NUM_TREES: usize = 256;

/// Caterpillar and balanced-ish trees with varying branch lengths.
fn newick_trees() -> String {
    let mut trees = String::new();
    for t in 0..NUM_TREES {
        let mut newick = format!("T0:{}", 0.1 + (t % 7) as f64 * 0.05);
        for taxon in 1..NUM_TAXA {
            let length = 0.05 + ((t + taxon) % 11) as f64 * 0.02;
            newick = if (t + taxon) % 2 == 0 {
                format!("({newick},T{taxon}:{length}):{length}")
            } else {
                format!("(T{taxon}:{length},{newick}):{length}")
            };
        }
        trees.push_str(&newick);
        trees.push_str(";\n");
    }
    trees
}

fn setup() -> (TreeLikelihood<CorrelatedSubstitutionModel>, TreeEnsemble) {
    let trait0: Vec<(String, &str)> = (0..NUM_TAXA).map(|i| (format!("T{i}"), ["0", "1"][i % 2])).collect();
    let trait1: Vec<(String, &str)> = (0..NUM_TAXA).map(|i| (format!("T{i}"), ["0", "1", "?"][i % 3])).collect();
    let alignment = Arc::new(Alignment::compound("traits", &trait0, &trait1).unwrap());

    let ensemble = TreeEnsembleBuilder::for_str(&newick_trees())
        .with_reference_taxa(alignment.taxa().labels().to_vec())
        .build()
        .unwrap();

    let rates = RealParameter::new("rates", vec![0.5, 1.5, 1.0, 2.0, 0.8, 1.2, 0.6, 0.4]).unwrap();
    let model = CorrelatedSubstitutionModel::new("pagel", rates, Frequencies::uniform(4)).unwrap();
    let pipeline = TreeLikelihood::new(
        "treeLikelihood",
        alignment,
        ensemble.trees()[0].clone(),
        SiteModel::new("siteModel", model).with_category_rates(vec![0.25, 1.0, 1.75]).unwrap(),
        StrictClock::default(),
    )
    .unwrap();
    (pipeline, ensemble)
}

fn tree_set_likelihood(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_set_likelihood");

    let (pipeline, ensemble) = setup();
    let mut sequential = TreeSetLikelihood::new(pipeline, ensemble).unwrap();
    group.bench_function("sequential", |b| {
        b.iter(|| black_box(sequential.calculate_log_p().unwrap()));
    });

    for threads in [2, 4, 8] {
        let (pipeline, ensemble) = setup();
        let mut threaded = ThreadedTreeSetLikelihood::new(pipeline, ensemble, ThreadCount::Fixed(threads)).unwrap();
        group.bench_with_input(BenchmarkId::new("threaded", threads), &threads, |b, _| {
            b.iter(|| black_box(threaded.calculate_log_p().unwrap()));
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = tree_set_likelihood
}
criterion_main!(benches);
