//! Vertices of a binary phylogenetic tree.

use crate::model::tree::{LabelIndex, TreeIndex};
use std::ops::Deref;

/// During construction, internal vertices and leaves might not have a parent yet.
const NO_PARENT_SET: TreeIndex = usize::MAX;

// =#========================================================================#=
// VERTEX
// =#========================================================================#=
/// A vertex in a binary phylogenetic tree.
///
/// - **Root**: two children, no parent, no branch length
/// - **Internal**: two children and a parent, optional branch length
/// - **Leaf**: a taxon and a parent, optional branch length
///
/// The `index` of a vertex is its position in the tree arena, which is also
/// the vertex number used by likelihood calculations.
#[derive(PartialEq, Debug, Clone)]
pub enum Vertex {
    /// Root vertex of the tree
    Root {
        /// Index of this vertex in the tree arena
        index: TreeIndex,
        /// Indices of the two child vertices
        children: (TreeIndex, TreeIndex),
    },
    /// Internal vertex
    Internal {
        /// Index of this vertex in the tree arena
        index: TreeIndex,
        /// Index of the parent vertex
        parent: TreeIndex,
        /// Indices of the two child vertices
        children: (TreeIndex, TreeIndex),
        /// Distance to parent
        branch_length: Option<BranchLength>,
    },
    /// Leaf vertex
    Leaf {
        /// Index of this vertex in the tree arena
        index: TreeIndex,
        /// Index of the taxon in the label map of the tree set
        taxon: LabelIndex,
        /// Index of the parent vertex
        parent: TreeIndex,
        /// Distance to parent
        branch_length: Option<BranchLength>,
    },
}

impl Vertex {
    /// Creates a new root vertex.
    pub fn new_root(index: TreeIndex, children: (TreeIndex, TreeIndex)) -> Self {
        Vertex::Root { index, children }
    }

    /// Creates a new internal vertex without parent.
    pub fn new_internal(
        index: TreeIndex,
        children: (TreeIndex, TreeIndex),
        branch_length: Option<BranchLength>,
    ) -> Self {
        Vertex::Internal {
            index,
            parent: NO_PARENT_SET,
            children,
            branch_length,
        }
    }

    /// Creates a new leaf vertex without parent.
    pub fn new_leaf(index: TreeIndex, taxon: LabelIndex, branch_length: Option<BranchLength>) -> Self {
        Vertex::Leaf {
            index,
            taxon,
            parent: NO_PARENT_SET,
            branch_length,
        }
    }

    /// Returns the arena index of this vertex.
    pub fn index(&self) -> TreeIndex {
        match self {
            Vertex::Root { index, .. } | Vertex::Internal { index, .. } | Vertex::Leaf { index, .. } => *index,
        }
    }

    /// Returns the branch length to the parent, `None` for the root or if unset.
    pub fn branch_length(&self) -> Option<BranchLength> {
        match self {
            Vertex::Root { .. } => None,
            Vertex::Internal { branch_length, .. } | Vertex::Leaf { branch_length, .. } => *branch_length,
        }
    }

    /// Returns the branch length as plain number, treating a missing one as zero.
    pub fn length(&self) -> f64 {
        self.branch_length().map_or(0.0, |bl| *bl)
    }

    /// Returns the taxon if this is a leaf.
    pub fn taxon(&self) -> Option<LabelIndex> {
        match self {
            Vertex::Leaf { taxon, .. } => Some(*taxon),
            _ => None,
        }
    }

    /// Returns the children unless this is a leaf.
    pub fn children(&self) -> Option<(TreeIndex, TreeIndex)> {
        match self {
            Vertex::Root { children, .. } | Vertex::Internal { children, .. } => Some(*children),
            Vertex::Leaf { .. } => None,
        }
    }

    /// Returns the parent index, `None` for the root or while under construction.
    pub fn parent_index(&self) -> Option<TreeIndex> {
        match self {
            Vertex::Internal { parent, .. } | Vertex::Leaf { parent, .. } => {
                (*parent != NO_PARENT_SET).then_some(*parent)
            }
            Vertex::Root { .. } => None,
        }
    }

    /// Returns `true` if this vertex is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Vertex::Leaf { .. })
    }

    /// Returns `true` if this vertex is the root.
    pub fn is_root(&self) -> bool {
        matches!(self, Vertex::Root { .. })
    }

    /// Sets the parent of a non-root vertex; no-op on the root.
    pub(crate) fn set_parent(&mut self, parent: TreeIndex) {
        match self {
            Vertex::Internal { parent: p, .. } | Vertex::Leaf { parent: p, .. } => *p = parent,
            Vertex::Root { .. } => {}
        }
    }
}

// =#========================================================================#=
// BRANCH LENGTH
// =#========================================================================#=
/// Non-negative, finite distance between a vertex and its parent.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BranchLength(f64);

impl BranchLength {
    /// Creates a branch length, or returns `None` if `length` is negative or not finite.
    pub fn new(length: f64) -> Option<Self> {
        (length >= 0.0 && length.is_finite()).then_some(BranchLength(length))
    }

    /// Sums two optional branch lengths, where a missing one counts as absent.
    pub fn join(a: Option<BranchLength>, b: Option<BranchLength>) -> Option<BranchLength> {
        match (a, b) {
            (Some(a), Some(b)) => Some(BranchLength(a.0 + b.0)),
            (Some(x), None) | (None, Some(x)) => Some(x),
            (None, None) => None,
        }
    }
}

impl Deref for BranchLength {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}
