//! Treeset is a library to evaluate the likelihood of discrete trait data
//! averaged over a set of phylogenetic trees, e.g. the posterior sample of
//! an earlier analysis.
//!
//! Core functionality provided:
//! - Tree sets: Read NEXUS files or lists of Newick strings, drop burn-in,
//!   and reconcile all trees against the taxa of the data
//!   (see [TreeEnsembleBuilder]).
//! - Tree-set likelihood:
//!   `logP = ln((1/N) Σ_i exp(logL_i))` over the `N` trees of an ensemble,
//!   - sequentially ([TreeSetLikelihood]),
//!   - split over a fixed pool of workers ([ThreadedTreeSetLikelihood]),
//!   - or for the single tree picked by an index ([IndexedTreeSetLikelihood]).
//! - Tree likelihood: Felsenstein pruning with a site model and strict clock
//!   ([TreeLikelihood]).
//! - Substitution models:
//!   - [CorrelatedSubstitutionModel]: two binary traits that may evolve dependently
//!   - [GeneralSubstitutionModel] and [NoChangeSubstitutionModel]
//! - MCMC building blocks: the [RatesFreqsOperator], the
//!   [IndependentEvolutionPrior], and trace [loggers].
//!
//! Limitations:
//! - Only binary trees
//! - Only leaf labels are read; vertex annotations are skipped
//!
//! # Usage patterns
//! 1. Quick functions read a tree set with default settings,
//!    see [read_tree_set] and the [newick] and [nexus] modules.
//! 2. Configure an ensemble with [TreeEnsembleBuilder] for burn-in and
//!    reference taxa, then plug a [TreeLikelihood] into one of the tree-set
//!    likelihoods.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use treeset::{Alignment, ThreadCount, ThreadedTreeSetLikelihood, TreeEnsembleBuilder, TreeLikelihood};
//! use treeset::parameter::RealParameter;
//! use treeset::site_model::{SiteModel, StrictClock};
//! use treeset::substitution::{CorrelatedSubstitutionModel, Frequencies};
//!
//! let trait0 = [("A", "0"), ("B", "1"), ("C", "1")];
//! let trait1 = [("A", "0"), ("B", "0"), ("C", "1")];
//! let alignment = Arc::new(Alignment::compound("data", &trait0, &trait1)?);
//!
//! let ensemble = TreeEnsembleBuilder::for_str("((A:1,B:1):1,C:2);\n(A:2,(B:1,C:1):1);")
//!     .with_reference_taxa(alignment.taxa().labels().to_vec())
//!     .build()?;
//!
//! let rates = RealParameter::new("rates", vec![1.0; 8])?;
//! let model = CorrelatedSubstitutionModel::new("pagel", rates, Frequencies::uniform(4))?;
//! let pipeline = TreeLikelihood::new(
//!     "treeLikelihood",
//!     alignment,
//!     ensemble.trees()[0].clone(),
//!     SiteModel::new("siteModel", model),
//!     StrictClock::default(),
//! )?;
//!
//! let mut likelihood = ThreadedTreeSetLikelihood::new(pipeline, ensemble, ThreadCount::Fixed(2))?;
//! let log_p = likelihood.calculate_log_p()?;
//! assert!(log_p < 0.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod alignment;
pub mod clone;
pub mod ensemble;
pub mod error;
pub mod likelihood;
pub mod loggers;
pub mod model;
pub mod newick;
pub mod nexus;
pub mod operators;
pub mod parameter;
pub mod parser;
pub mod prior;
pub mod site_model;
pub mod substitution;

pub use crate::alignment::Alignment;
pub use crate::clone::StructuralClone;
pub use crate::ensemble::{TreeEnsemble, TreeEnsembleBuilder};
pub use crate::error::{ConfigurationError, LikelihoodError, TreeSetError};
pub use crate::likelihood::{
    Evaluation, IndexedTreeSetLikelihood, ThreadCount, ThreadedTreeSetLikelihood, TreeEvaluator, TreeLikelihood,
    TreeSetLikelihood,
};
pub use crate::operators::{Proposal, RatesFreqsOperator};
pub use crate::prior::IndependentEvolutionPrior;
pub use crate::substitution::{
    CorrelatedSubstitutionModel, GeneralSubstitutionModel, NoChangeSubstitutionModel, SubstitutionModel,
};

use std::path::Path;

// ============================================================================
// Quick Tree Set API
// ============================================================================
/// Reads a tree set (NEXUS or Newick list) with default settings: no burn-in,
/// taxa in the order of the file.
///
/// See [TreeEnsembleBuilder] for configuration.
pub fn read_tree_set<P: AsRef<Path>>(path: P) -> Result<TreeEnsemble, TreeSetError> {
    TreeEnsembleBuilder::for_file(path)?.build()
}

/// Reads a tree set from a file, drops the first `burnin_percentage` percent
/// of trees, and indexes leaves by `reference_taxa`.
pub fn read_tree_set_for_taxa<P, I, S>(
    path: P,
    burnin_percentage: f64,
    reference_taxa: I,
) -> Result<TreeEnsemble, TreeSetError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    TreeEnsembleBuilder::for_file(path)?
        .with_burnin(burnin_percentage)
        .with_reference_taxa(reference_taxa)
        .build()
}
