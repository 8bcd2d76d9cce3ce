//! Trees as read from a file, before reconciliation against reference taxa.

use crate::model::{LeafLabelMap, Tree};

/// Parsed trees together with the label map their leaves refer to.
///
/// Taxa may be in any order and may include taxa absent from the data; see
/// [TreeEnsemble](crate::ensemble::TreeEnsemble) for the reconciled form.
#[derive(Debug, Clone)]
pub struct RawTreeSet {
    trees: Vec<Tree>,
    labels: LeafLabelMap,
}

impl RawTreeSet {
    /// Creates a raw tree set.
    pub fn new(trees: Vec<Tree>, labels: LeafLabelMap) -> Self {
        Self { trees, labels }
    }

    /// Returns the trees in file order.
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Returns the label map shared by all trees.
    pub fn labels(&self) -> &LeafLabelMap {
        &self.labels
    }

    /// Returns the number of trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Returns whether there are no trees.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Splits into trees and label map.
    pub fn into_parts(self) -> (Vec<Tree>, LeafLabelMap) {
        (self.trees, self.labels)
    }
}
