use rstest::rstest;
use std::path::Path;
use treeset::ensemble::reconcile;
use treeset::{ConfigurationError, TreeEnsembleBuilder, TreeSetError};

const PRIMATES: [&str; 5] = [
    "Homo_sapiens",
    "Pan_troglodytes",
    "Gorilla_gorilla",
    "Pongo_abelii",
    "Hylobates lar",
];

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new("tests").join("fixtures").join(name)
}

#[rstest]
#[case(0.0, 5)]
#[case(20.0, 4)]
#[case(50.0, 3)]
#[case(90.0, 1)]
fn test_burnin_drops_leading_trees(#[case] burnin: f64, #[case] expected: usize) {
    let ensemble = TreeEnsembleBuilder::for_file(fixture("primates_t5_n5.trees"))
        .unwrap()
        .with_burnin(burnin)
        .build()
        .unwrap();
    assert_eq!(ensemble.len(), expected);
    assert_eq!(ensemble.trees().last().unwrap().name(), Some("STATE_4000"));
}

#[rstest]
#[case(-1.0)]
#[case(100.5)]
fn test_burnin_out_of_range(#[case] burnin: f64) {
    let result = TreeEnsembleBuilder::for_str("(A:1,B:1);").with_burnin(burnin).build();
    assert!(matches!(
        result,
        Err(TreeSetError::Configuration(ConfigurationError::BurnInOutOfRange(_)))
    ));
}

#[test]
fn test_full_burnin_leaves_nothing() {
    let result = TreeEnsembleBuilder::for_str("(A:1,B:1);\n(A:2,B:2);")
        .with_burnin(100.0)
        .build();
    assert!(matches!(
        result,
        Err(TreeSetError::Configuration(ConfigurationError::EmptyEnsemble(_)))
    ));
}

#[test]
fn test_nexus_and_newick_agree() {
    let from_nexus = TreeEnsembleBuilder::for_file(fixture("primates_t5_n5.trees"))
        .unwrap()
        .with_reference_taxa(PRIMATES)
        .build()
        .unwrap();
    let from_newick = TreeEnsembleBuilder::for_file(fixture("primates_t3_n5.nwk"))
        .unwrap()
        .with_reference_taxa(PRIMATES)
        .build()
        .unwrap();

    // trees 0, 2, 4 of the NEXUS file are the Newick file's trees
    for (newick_tree, nexus_index) in from_newick.trees().iter().zip([0, 2, 4]) {
        let nexus_tree = &from_nexus.trees()[nexus_index];
        assert_eq!(
            newick_tree.to_newick(from_newick.taxa()),
            nexus_tree.to_newick(from_nexus.taxa())
        );
    }
}

#[test]
fn test_reference_defines_leaf_indices() {
    let reversed: Vec<&str> = PRIMATES.iter().rev().copied().collect();
    let ensemble = TreeEnsembleBuilder::for_file(fixture("primates_t3_n5.nwk"))
        .unwrap()
        .with_reference_taxa(reversed.clone())
        .build()
        .unwrap();

    assert_eq!(ensemble.taxa().labels(), reversed.as_slice());
    for tree in ensemble.trees() {
        assert!(tree.is_valid());
        for taxon in 0..5 {
            assert_eq!(tree[taxon].taxon(), Some(taxon));
        }
        assert_eq!(tree.root_index(), 8);
    }
}

#[test]
fn test_reconcile_drops_excluded_taxon() {
    let raw = treeset::newick::parse_str("((A:1,B:1):1,(C:1.5,D:1.5):0.5);").unwrap();
    let reference = ["A", "B", "C"].map(String::from);
    let ensemble = reconcile(raw, &reference, 0.0).unwrap();
    let tree = &ensemble.trees()[0];

    assert_eq!(tree.num_leaves(), 3);
    assert_eq!(tree.num_vertices(), 5);
    assert!(tree.is_valid());
    assert!(tree.vertices().iter().all(|v| v.is_leaf() || v.children().is_some()));
    assert!((tree[2].length() - 2.0).abs() < 1e-12);
}

#[test]
fn test_missing_taxon() {
    let result = TreeEnsembleBuilder::for_str("((A:1,B:1):1,C:2);")
        .with_reference_taxa(["A", "B", "c"])
        .build();
    match result {
        Err(TreeSetError::Configuration(ConfigurationError::MissingTaxon(taxon))) => assert_eq!(taxon, "c"),
        other => panic!("expected missing taxon, got {other:?}"),
    }
}

#[test]
fn test_too_few_taxa() {
    let result = TreeEnsembleBuilder::for_str("((A:1,B:1):1,C:2);")
        .with_reference_taxa(["A"])
        .build();
    assert!(matches!(
        result,
        Err(TreeSetError::Configuration(ConfigurationError::TooFewTaxa(1)))
    ));
}

#[test]
fn test_ensemble_shares_trees() {
    let ensemble = TreeEnsembleBuilder::for_str("(A:1,B:1);\n(A:2,B:2);").build().unwrap();
    let copy = ensemble.clone();
    assert!(std::sync::Arc::ptr_eq(&ensemble.shared_trees(), &copy.shared_trees()));
    assert_eq!(ensemble.num_taxa(), 2);
    assert!(ensemble.tree(2).is_none());
}
