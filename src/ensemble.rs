//! Tree ensembles: burn-in trimming and taxon reconciliation of parsed tree sets.
//!
//! - [TreeEnsemble]: reconciled, immutable list of trees on the reference taxa
//! - [TreeEnsembleBuilder]: reads NEXUS or Newick input and builds an ensemble
//! - [reconcile]: turns a [RawTreeSet] into a [TreeEnsemble]

use crate::error::{ConfigurationError, TreeSetError};
use crate::model::{BranchLength, LabelIndex, LeafLabelMap, RawTreeSet, Tree, TreeIndex, Vertex};
use crate::parser::ByteParser;
use crate::{newick, nexus};
use std::path::Path;
use std::sync::Arc;

// =#========================================================================#=
// TREE ENSEMBLE
// =#========================================================================#=
/// An ordered list of trees whose leaves match a reference taxon list.
///
/// In every tree, leaf `i` sits at arena index `i` and carries taxon `i`,
/// the position of its name in [TreeEnsemble::taxa]. Internal vertices are
/// numbered from the taxon count on in post-order, the root last.
///
/// The trees are shared by [Arc], so cloning an ensemble is cheap.
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    trees: Arc<[Tree]>,
    taxa: Arc<LeafLabelMap>,
}

impl TreeEnsemble {
    /// Returns all trees.
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Returns the tree at `index`, if present.
    pub fn tree(&self, index: usize) -> Option<&Tree> {
        self.trees.get(index)
    }

    /// Returns the number of trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Always `false` for a successfully built ensemble.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Returns the reference taxa in index order.
    pub fn taxa(&self) -> &LeafLabelMap {
        &self.taxa
    }

    /// Returns the number of taxa of every tree.
    pub fn num_taxa(&self) -> usize {
        self.taxa.num_labels()
    }

    /// Returns a shared handle to the tree list.
    pub fn shared_trees(&self) -> Arc<[Tree]> {
        Arc::clone(&self.trees)
    }
}

// =#========================================================================#=
// BUILDER
// =#========================================================================#=
/// Builder for a [TreeEnsemble] from NEXUS or Newick input.
///
/// The format is detected from the `#NEXUS` header.
///
/// # Example
/// ```
/// use treeset::ensemble::TreeEnsembleBuilder;
///
/// let newick = "((A:1,B:1):1,(C:1,D:1):1);\n((A:1,C:1):1,(B:1,D:1):1);";
/// let ensemble = TreeEnsembleBuilder::for_str(newick)
///     .with_burnin(50.0)
///     .with_reference_taxa(["A", "B", "C"])
///     .build()
///     .unwrap();
///
/// assert_eq!(ensemble.len(), 1);
/// assert_eq!(ensemble.trees()[0].num_leaves(), 3);
/// ```
pub struct TreeEnsembleBuilder {
    source: Source,
    burnin_percentage: f64,
    reference_taxa: Option<Vec<String>>,
}

enum Source {
    Bytes(ByteParser),
    Raw(RawTreeSet),
}

impl TreeEnsembleBuilder {
    /// Reads the file at `path` into memory for building.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn for_file<P: AsRef<Path>>(path: P) -> Result<Self, TreeSetError> {
        Ok(Self::with_source(Source::Bytes(ByteParser::from_file(path)?)))
    }

    /// Uses `input` (NEXUS or Newick) for building.
    pub fn for_str(input: &str) -> Self {
        Self::with_source(Source::Bytes(ByteParser::for_str(input)))
    }

    /// Uses already parsed trees for building.
    pub fn for_raw(raw: RawTreeSet) -> Self {
        Self::with_source(Source::Raw(raw))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            burnin_percentage: 0.0,
            reference_taxa: None,
        }
    }

    /// Sets the percentage (in `[0, 100]`) of trees dropped from the front.
    pub fn with_burnin(mut self, percentage: f64) -> Self {
        self.burnin_percentage = percentage;
        self
    }

    /// Sets the reference taxa (e.g. from an alignment) that define leaf indices.
    ///
    /// Without reference, the taxa of the input are used in their given order.
    pub fn with_reference_taxa<I, S>(mut self, taxa: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reference_taxa = Some(taxa.into_iter().map(Into::into).collect());
        self
    }

    /// Parses the input if needed and reconciles it.
    ///
    /// # Errors
    /// Returns a [TreeSetError] if parsing fails or reconciliation is impossible.
    pub fn build(self) -> Result<TreeEnsemble, TreeSetError> {
        let raw = match self.source {
            Source::Raw(raw) => raw,
            Source::Bytes(mut byte_parser) => {
                byte_parser.skip_comment_and_whitespace()?;
                if byte_parser.peek_is_sequence(b"#NEXUS") {
                    nexus::parse_nexus(&mut byte_parser)?
                } else {
                    newick::parse_all(byte_parser)?
                }
            }
        };
        log::info!("Read {} trees on {} taxa", raw.len(), raw.labels().num_labels());

        let reference = match self.reference_taxa {
            Some(reference) => reference,
            None => raw.labels().labels().to_vec(),
        };
        Ok(reconcile(raw, &reference, self.burnin_percentage)?)
    }
}

// =#========================================================================#=
// RECONCILIATION
// =#========================================================================#=
/// Drops burn-in trees and rebuilds every remaining tree on the `reference` taxa.
///
/// Taxa missing from `reference` are pruned: a vertex that loses one child is
/// replaced by the other, whose branch length absorbs the removed vertex's
/// branch length. Leaves are renumbered to their position in `reference`.
///
/// # Errors
/// Returns a [ConfigurationError] if
/// - `burnin_percentage` is not in `[0, 100]`
/// - no tree is left
/// - `reference` has fewer than two or duplicate taxa
/// - a reference taxon is missing from the input (matching is case sensitive)
/// - a tree does not contain every reference taxon exactly once
pub fn reconcile(
    raw: RawTreeSet,
    reference: &[String],
    burnin_percentage: f64,
) -> Result<TreeEnsemble, ConfigurationError> {
    if !(0.0..=100.0).contains(&burnin_percentage) {
        return Err(ConfigurationError::BurnInOutOfRange(burnin_percentage));
    }
    if raw.is_empty() {
        return Err(ConfigurationError::EmptyEnsemble(""));
    }
    if reference.len() < 2 {
        return Err(ConfigurationError::TooFewTaxa(reference.len()));
    }
    let taxa = LeafLabelMap::from_labels(reference);
    if taxa.num_labels() != reference.len() {
        return Err(ConfigurationError::invalid("reference taxa", "contains duplicates"));
    }

    let (trees, labels) = raw.into_parts();

    let burnin = (trees.len() as f64 * burnin_percentage / 100.0).floor() as usize;
    if burnin > 0 {
        log::warn!("Removing {burnin} trees as burn-in ({burnin_percentage}%)");
    }
    if burnin >= trees.len() {
        return Err(ConfigurationError::EmptyEnsemble(" after burn-in"));
    }

    if let Some(missing) = reference.iter().find(|taxon| !labels.contains(taxon)) {
        return Err(ConfigurationError::MissingTaxon(missing.clone()));
    }

    // raw label index -> reference index, `None` for excluded taxa
    let translation: Vec<Option<LabelIndex>> = labels.labels().iter().map(|l| taxa.get_index(l)).collect();
    let removed: Vec<&str> = labels
        .labels()
        .iter()
        .filter(|l| !taxa.contains(l))
        .map(String::as_str)
        .collect();
    if !removed.is_empty() {
        log::warn!("Removing {} taxa from trees: {}", removed.len(), removed.join(", "));
    }

    let reconciled = trees
        .iter()
        .skip(burnin)
        .map(|tree| rebuild(tree, &translation, taxa.num_labels()))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!(
        "Tree ensemble holds {} trees on {} taxa",
        reconciled.len(),
        taxa.num_labels()
    );

    Ok(TreeEnsemble {
        trees: reconciled.into(),
        taxa: Arc::new(taxa),
    })
}

/// Vertex of a pruned tree before renumbering.
enum Pruned {
    Leaf(LabelIndex),
    Internal([(usize, Option<BranchLength>); 2]),
}

/// Prunes excluded taxa from `tree` and renumbers it canonically.
fn rebuild(tree: &Tree, translation: &[Option<LabelIndex>], num_taxa: usize) -> Result<Tree, ConfigurationError> {
    let not_canonical = || {
        ConfigurationError::invalid(
            format!("tree {}", tree.name().unwrap_or("without name")),
            "does not contain every reference taxon exactly once",
        )
    };

    // 1. Prune in post-order; each original vertex maps to the surviving
    //    pruned vertex and its (possibly extended) branch length.
    let mut pruned: Vec<Pruned> = Vec::with_capacity(tree.num_vertices());
    let mut survivors: Vec<Option<(usize, Option<BranchLength>)>> = vec![None; tree.num_vertices()];
    for vertex in tree.post_order_iter() {
        let survivor = match vertex {
            Vertex::Leaf { taxon, .. } => translation.get(*taxon).copied().flatten().map(|reference_taxon| {
                pruned.push(Pruned::Leaf(reference_taxon));
                (pruned.len() - 1, vertex.branch_length())
            }),
            Vertex::Internal { children, .. } | Vertex::Root { children, .. } => {
                match (survivors[children.0], survivors[children.1]) {
                    (Some(left), Some(right)) => {
                        pruned.push(Pruned::Internal([left, right]));
                        Some((pruned.len() - 1, vertex.branch_length()))
                    }
                    (Some((id, length)), None) | (None, Some((id, length))) => {
                        Some((id, BranchLength::join(length, vertex.branch_length())))
                    }
                    (None, None) => None,
                }
            }
        };
        survivors[vertex.index()] = survivor;
    }

    let (root_id, _) = survivors[tree.root_index()].ok_or_else(not_canonical)?;

    // 2. Collect incoming branch lengths and check that each taxon occurs once.
    let mut incoming = vec![None; pruned.len()];
    let mut taxon_seen = vec![false; num_taxa];
    for node in &pruned {
        match node {
            Pruned::Leaf(taxon) => {
                if std::mem::replace(&mut taxon_seen[*taxon], true) {
                    return Err(not_canonical());
                }
            }
            Pruned::Internal(children) => {
                for &(child, length) in children {
                    incoming[child] = length;
                }
            }
        }
    }
    if taxon_seen.iter().any(|seen| !seen) {
        return Err(not_canonical());
    }

    // 3. Leaves first, at index = taxon, then internal vertices in post-order.
    let mut leaf_lengths = vec![None; num_taxa];
    for (id, node) in pruned.iter().enumerate() {
        if let Pruned::Leaf(taxon) = node {
            leaf_lengths[*taxon] = incoming[id];
        }
    }

    let mut canonical = Tree::new(num_taxa);
    if let Some(name) = tree.name() {
        canonical.set_name(Some(name.to_string()));
    }
    for (taxon, length) in leaf_lengths.into_iter().enumerate() {
        canonical.add_leaf(taxon, length);
    }

    let mut new_index: Vec<TreeIndex> = vec![0; pruned.len()];
    for (id, node) in pruned.iter().enumerate() {
        new_index[id] = match node {
            Pruned::Leaf(taxon) => *taxon,
            Pruned::Internal([(left, _), (right, _)]) => {
                let children = (new_index[*left], new_index[*right]);
                if id == root_id {
                    canonical.add_root(children)
                } else {
                    canonical.add_internal_vertex(children, incoming[id])
                }
            }
        };
    }

    if !canonical.is_valid() {
        return Err(not_canonical());
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(taxa: &[&str]) -> Vec<String> {
        taxa.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn pruning_extends_surviving_branch() {
        // D hangs next to C; removing D makes C absorb its parent's branch
        let raw = newick::parse_str("((A:1,B:1):2,(C:0.5,D:0.5):2.5);").unwrap();
        let ensemble = reconcile(raw, &reference(&["A", "B", "C"]), 0.0).unwrap();
        let tree = &ensemble.trees()[0];

        assert!(tree.is_valid());
        assert_eq!(tree.num_vertices(), 5);
        assert_eq!(tree[2].taxon(), Some(2));
        assert!((tree[2].length() - 3.0).abs() < 1e-12);
        assert!((tree.height() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn leaves_follow_reference_order() {
        let raw = newick::parse_str("((C:1,A:1):1,B:2);").unwrap();
        let ensemble = reconcile(raw, &reference(&["A", "B", "C"]), 0.0).unwrap();
        let tree = &ensemble.trees()[0];

        for taxon in 0..3 {
            assert_eq!(tree[taxon].taxon(), Some(taxon));
        }
        assert_eq!(tree.root_index(), 4);
        assert_eq!(tree.to_newick(ensemble.taxa()), "((C:1,A:1):1,B:2);");
    }

    #[test]
    fn removing_a_root_child_keeps_a_binary_tree() {
        let raw = newick::parse_str("(((A:1,B:1):1,C:2):1,D:3);").unwrap();
        let ensemble = reconcile(raw, &reference(&["A", "B", "C"]), 0.0).unwrap();
        let tree = &ensemble.trees()[0];

        assert!(tree.is_valid());
        assert!(tree.root().branch_length().is_none());
        assert_eq!(tree.num_leaves(), 3);
    }
}
