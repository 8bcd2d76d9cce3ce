//! Felsenstein pruning likelihood of an alignment on one tree.

use crate::alignment::Alignment;
use crate::clone::StructuralClone;
use crate::error::{ConfigurationError, LikelihoodError};
use crate::likelihood::TreeEvaluator;
use crate::model::{LeafLabelMap, Tree, TreeIndex};
use crate::site_model::{SiteModel, StrictClock};
use crate::substitution::SubstitutionModel;
use nalgebra::DMatrix;
use std::sync::Arc;

/// Log-likelihood of an alignment on one tree via Felsenstein's pruning algorithm.
///
/// 1. Leaf partials are the indicator of the observed state, or all ones if missing
/// 2. In post-order, `L[v, s] = Π_children Σ_t P_child(s, t) · L[child, t]`
///    with `P = exp(Q · length · clock rate · category rate)`
/// 3. At the root, the site likelihood is `Σ_s π_s · L[root, s]`
///
/// Partials are rescaled at every internal vertex and the scale factors are
/// accumulated in log space, so large trees do not underflow. Categories of
/// the site model are averaged with equal weights.
///
/// The result is cached until the tree or a model changes.
#[derive(Debug, Clone)]
pub struct TreeLikelihood<M> {
    id: String,
    alignment: Arc<Alignment>,
    tree: Tree,
    site_model: SiteModel<M>,
    clock: StrictClock,
    cached_log_p: Option<f64>,
}

impl<M: SubstitutionModel> TreeLikelihood<M> {
    /// Creates a pipeline for `tree`.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if the state counts of alignment and
    /// model differ, the tree is not a valid binary tree, or its leaves do
    /// not cover every taxon of the alignment exactly once.
    pub fn new(
        id: impl Into<String>,
        alignment: Arc<Alignment>,
        tree: Tree,
        site_model: SiteModel<M>,
        clock: StrictClock,
    ) -> Result<Self, ConfigurationError> {
        let likelihood = Self {
            id: id.into(),
            alignment,
            tree,
            site_model,
            clock,
            cached_log_p: None,
        };
        likelihood.validate()?;
        Ok(likelihood)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let model_states = self.site_model.substitution_model().state_count();
        if model_states != self.alignment.state_count() {
            return Err(ConfigurationError::dimension(
                format!("state count of {}", self.site_model.substitution_model().id()),
                model_states,
                self.alignment.state_count(),
            ));
        }
        self.check_tree(&self.tree)
    }

    fn check_tree(&self, tree: &Tree) -> Result<(), ConfigurationError> {
        let name = || format!("tree {} of {}", tree.name().unwrap_or(""), self.id);
        if !tree.is_valid() {
            return Err(ConfigurationError::invalid(name(), "is not a valid binary tree"));
        }

        let taxon_count = self.alignment.taxon_count();
        let mut seen = vec![false; taxon_count];
        for taxon in tree.leaf_taxa() {
            if taxon >= taxon_count {
                return Err(ConfigurationError::invalid(
                    name(),
                    format!("leaf taxon {taxon} is not in alignment {}", self.alignment.id()),
                ));
            }
            if std::mem::replace(&mut seen[taxon], true) {
                return Err(ConfigurationError::invalid(name(), format!("taxon {taxon} occurs twice")));
            }
        }
        match seen.iter().position(|&covered| !covered) {
            Some(missing) => Err(ConfigurationError::invalid(
                name(),
                format!(
                    "lacks taxon {} of alignment {}",
                    self.alignment.taxa().get_label(missing).unwrap_or_default(),
                    self.alignment.id()
                ),
            )),
            None => Ok(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    pub fn site_model(&self) -> &SiteModel<M> {
        &self.site_model
    }

    /// Returns the site model for modification and marks the likelihood dirty.
    pub fn site_model_mut(&mut self) -> &mut SiteModel<M> {
        self.cached_log_p = None;
        &mut self.site_model
    }

    /// Returns the substitution model for modification and marks the likelihood dirty.
    pub fn substitution_model_mut(&mut self) -> &mut M {
        self.cached_log_p = None;
        self.site_model.substitution_model_mut()
    }

    pub fn clock(&self) -> &StrictClock {
        &self.clock
    }

    /// Replaces the clock and marks the likelihood dirty.
    pub fn set_clock(&mut self, clock: StrictClock) {
        self.clock = clock;
        self.cached_log_p = None;
    }

    /// Forces recalculation on the next evaluation.
    pub fn make_dirty(&mut self) {
        self.cached_log_p = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.cached_log_p.is_none()
    }

    /// Returns the (cached) log-likelihood of the current tree.
    pub fn log_likelihood(&mut self) -> f64 {
        if let Some(log_p) = self.cached_log_p {
            return log_p;
        }
        let log_p = self.prune();
        self.cached_log_p = Some(log_p);
        log_p
    }

    fn prune(&mut self) -> f64 {
        let alignment = Arc::clone(&self.alignment);
        let n = alignment.state_count();
        let order: Vec<TreeIndex> = self.tree.post_order_iter().map(|v| v.index()).collect();
        let mut partials = vec![0.0; self.tree.num_vertices() * n];
        let frequencies = self.site_model.substitution_model().frequencies().as_slice().to_vec();

        let log_weight = self.site_model.category_weight().ln();
        let mut site_log_p = vec![Vec::with_capacity(self.site_model.category_count()); alignment.site_count()];

        for category in 0..self.site_model.category_count() {
            let rate = self.clock.rate() * self.site_model.category_rate(category);
            let transitions = self.transition_matrices(rate);

            for (site, log_ps) in site_log_p.iter_mut().enumerate() {
                let mut log_scale = 0.0;
                for &index in &order {
                    let vertex = &self.tree[index];
                    let partial = &mut partials[index * n..(index + 1) * n];
                    match (vertex.taxon(), vertex.children()) {
                        (Some(taxon), _) => match alignment.state(taxon, site) {
                            Some(state) => {
                                partial.fill(0.0);
                                partial[state] = 1.0;
                            }
                            None => partial.fill(1.0),
                        },
                        (None, Some((left, right))) => {
                            log_scale += combine_children(&mut partials, n, index, [left, right], &transitions);
                        }
                        (None, None) => {}
                    }
                }

                let root = self.tree.root_index();
                let root_partial = &partials[root * n..(root + 1) * n];
                let likelihood: f64 = root_partial.iter().zip(&frequencies).map(|(l, f)| l * f).sum();
                log_ps.push(log_weight + likelihood.ln() + log_scale);
            }
        }

        site_log_p
            .iter()
            .map(|log_ps| log_sum_exp(log_ps))
            .sum()
    }

    /// Transition matrices per vertex, `None` for the root.
    fn transition_matrices(&mut self, rate: f64) -> Vec<Option<DMatrix<f64>>> {
        let model = self.site_model.substitution_model_mut();
        self.tree
            .vertices()
            .iter()
            .map(|vertex| {
                (!vertex.is_root()).then(|| model.transition_probabilities(vertex.length() * rate))
            })
            .collect()
    }
}

/// Computes the partial of `parent` from its two children, rescaled so its
/// maximum is one. Returns the log of the scale factor.
fn combine_children(
    partials: &mut [f64],
    n: usize,
    parent: TreeIndex,
    children: [TreeIndex; 2],
    transitions: &[Option<DMatrix<f64>>],
) -> f64 {
    let mut combined = vec![1.0; n];
    for child in children {
        let child_partial = &partials[child * n..(child + 1) * n];
        if let Some(p) = &transitions[child] {
            for (s, value) in combined.iter_mut().enumerate() {
                let sum: f64 = (0..n).map(|t| p[(s, t)] * child_partial[t]).sum();
                *value *= sum;
            }
        }
    }

    let max = combined.iter().copied().fold(0.0, f64::max);
    let log_scale = if max > 0.0 {
        combined.iter_mut().for_each(|v| *v /= max);
        max.ln()
    } else {
        0.0
    };
    partials[parent * n..(parent + 1) * n].copy_from_slice(&combined);
    log_scale
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

impl<M: SubstitutionModel> TreeEvaluator for TreeLikelihood<M> {
    fn set_tree(&mut self, tree: &Tree) -> Result<(), LikelihoodError> {
        self.check_tree(tree)?;
        self.tree.clone_from(tree);
        self.cached_log_p = None;
        Ok(())
    }

    fn calculate_log_p(&mut self) -> Result<f64, LikelihoodError> {
        Ok(self.log_likelihood())
    }

    fn taxa(&self) -> &LeafLabelMap {
        self.alignment.taxa()
    }
}

impl<M: SubstitutionModel> StructuralClone for TreeLikelihood<M> {
    fn structural_clone(&self, worker: usize) -> Result<Self, ConfigurationError> {
        let clone = Self {
            id: format!("{}_{worker}", self.id),
            alignment: Arc::clone(&self.alignment),
            tree: self.tree.structural_clone(worker)?,
            site_model: self.site_model.structural_clone(worker)?,
            clock: self.clock.structural_clone(worker)?,
            cached_log_p: None,
        };
        clone.validate()?;
        Ok(clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BranchLength;
    use crate::parameter::RealParameter;
    use crate::substitution::{Frequencies, GeneralSubstitutionModel, NoChangeSubstitutionModel};
    use approx::assert_relative_eq;

    fn cherry(length: f64) -> Tree {
        let mut tree = Tree::new(2);
        let a = tree.add_leaf(0, BranchLength::new(length));
        let b = tree.add_leaf(1, BranchLength::new(length));
        tree.add_root((a, b));
        tree
    }

    fn binary_alignment(states: [Option<usize>; 2]) -> Arc<Alignment> {
        let sequences = vec![("A".to_string(), vec![states[0]]), ("B".to_string(), vec![states[1]])];
        Arc::new(Alignment::new("data", 2, sequences).unwrap())
    }

    fn symmetric_model() -> GeneralSubstitutionModel {
        let rates = RealParameter::new("rates", vec![1.0, 1.0]).unwrap();
        GeneralSubstitutionModel::new("binary", rates, Frequencies::uniform(2)).unwrap()
    }

    #[test]
    fn cherry_matches_closed_form() {
        // symmetric two-state chain normalized to one substitution per unit time:
        // P(same, t) = (1 + exp(-2t)) / 2
        let t = 0.3;
        let mut likelihood = TreeLikelihood::new(
            "cherry",
            binary_alignment([Some(0), Some(1)]),
            cherry(t),
            SiteModel::new("site", symmetric_model()),
            StrictClock::default(),
        )
        .unwrap();

        let p_same = (1.0 + (-2.0 * 2.0 * t).exp()) / 2.0;
        assert_relative_eq!(likelihood.log_likelihood(), (0.5 * (1.0 - p_same)).ln(), epsilon = 1e-10);
    }

    #[test]
    fn missing_data_sums_to_one() {
        let mut likelihood = TreeLikelihood::new(
            "cherry",
            binary_alignment([None, None]),
            cherry(1.0),
            SiteModel::new("site", symmetric_model()),
            StrictClock::default(),
        )
        .unwrap();
        assert_relative_eq!(likelihood.log_likelihood(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn no_change_model_forbids_differences() {
        let mut likelihood = TreeLikelihood::new(
            "cherry",
            binary_alignment([Some(0), Some(1)]),
            cherry(1.0),
            SiteModel::new("site", NoChangeSubstitutionModel::new("frozen", Frequencies::uniform(2))),
            StrictClock::default(),
        )
        .unwrap();
        assert_eq!(likelihood.log_likelihood(), f64::NEG_INFINITY);
    }

    #[test]
    fn model_mutation_invalidates_cache() {
        let mut likelihood = TreeLikelihood::new(
            "cherry",
            binary_alignment([Some(0), Some(1)]),
            cherry(0.5),
            SiteModel::new("site", symmetric_model()),
            StrictClock::default(),
        )
        .unwrap();
        let before = likelihood.log_likelihood();
        assert!(!likelihood.is_dirty());

        likelihood.substitution_model_mut().rates_mut().set_value(0, 3.0);
        assert!(likelihood.is_dirty());
        assert_ne!(likelihood.log_likelihood(), before);
    }

    #[test]
    fn rejects_tree_with_unknown_taxon() {
        let mut tree = Tree::new(2);
        let a = tree.add_leaf(0, BranchLength::new(1.0));
        let b = tree.add_leaf(5, BranchLength::new(1.0));
        tree.add_root((a, b));

        let result = TreeLikelihood::new(
            "cherry",
            binary_alignment([Some(0), Some(1)]),
            tree,
            SiteModel::new("site", symmetric_model()),
            StrictClock::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_tree_missing_or_repeating_taxa() {
        let sequences = ["A", "B", "C"].map(|taxon| (taxon.to_string(), vec![Some(0)])).to_vec();
        let alignment = Arc::new(Alignment::new("data", 2, sequences).unwrap());
        let site_model = SiteModel::new("site", symmetric_model());
        let result = TreeLikelihood::new(
            "cherry",
            Arc::clone(&alignment),
            cherry(1.0),
            site_model.clone(),
            StrictClock::default(),
        );
        assert!(result.is_err());

        let mut tree = Tree::new(3);
        let a = tree.add_leaf(0, BranchLength::new(1.0));
        let b = tree.add_leaf(1, BranchLength::new(1.0));
        let repeated = tree.add_leaf(0, BranchLength::new(2.0));
        let ab = tree.add_internal_vertex((a, b), BranchLength::new(1.0));
        tree.add_root((ab, repeated));
        assert!(TreeLikelihood::new("repeated", alignment, tree, site_model, StrictClock::default()).is_err());
    }
}
