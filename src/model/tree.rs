//! Arena-based binary phylogenetic tree.
//!
//! - [Tree]: vertices stored in a vector, referenced by [TreeIndex]
//! - [LabelIndex]: index of a leaf's taxon in a [LeafLabelMap]

use crate::model::leaf_label_map::LeafLabelMap;
use crate::model::vertex::{BranchLength, Vertex};

/// Index of a vertex in a tree (arena).
pub type TreeIndex = usize;

/// Index of a taxon label in a [LeafLabelMap].
pub type LabelIndex = usize;

/// *During construction only*, index for unset root.
const NO_ROOT_SET_INDEX: TreeIndex = usize::MAX;

// =#========================================================================#=
// TREE
// =#========================================================================#=
/// A rooted binary phylogenetic tree using the arena pattern on [Vertex].
///
/// # Structure
/// - All vertices are stored in one vector and refer to each other by index
/// - Leaves carry a [LabelIndex] into the label map shared by a tree set
/// - Branch lengths are optional but non-negative if present
/// - Node heights are derived from branch lengths, see [Tree::node_heights]
///
/// Trees in a reconciled ensemble additionally have their leaves at indices
/// `0..n` with `taxon == index`, and internal vertices numbered from `n` on
/// in post-order with the root last.
///
/// # Construction
/// Add leaves and internal vertices bottom-up, the root last, and check the
/// result with [Tree::is_valid].
///
/// # Example
/// ```
/// use treeset::model::{BranchLength, Tree};
///
/// // ((A:0.2,B:0.2):0.2,C:0.4);
/// let mut tree = Tree::new(3);
/// let a = tree.add_leaf(0, BranchLength::new(0.2));
/// let b = tree.add_leaf(1, BranchLength::new(0.2));
/// let c = tree.add_leaf(2, BranchLength::new(0.4));
/// let ab = tree.add_internal_vertex((a, b), BranchLength::new(0.2));
/// tree.add_root((ab, c));
///
/// assert!(tree.is_valid());
/// assert!((tree.height() - 0.4).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Tree {
    /// Vertices of this tree (arena pattern)
    vertices: Vec<Vertex>,

    /// Index of the root of this tree
    root_index: TreeIndex,

    /// Name of tree, e.g. from a NEXUS `tree` command; also serves as id
    name: Option<String>,
}

// ============================================================================
// New, Construction, Getters (pub)
// ============================================================================
impl Tree {
    /// Creates an empty tree with capacity for a binary tree on `num_leaves` leaves.
    pub fn new(num_leaves: usize) -> Self {
        let capacity = (2 * num_leaves).saturating_sub(1);
        Tree {
            vertices: Vec::with_capacity(capacity),
            root_index: NO_ROOT_SET_INDEX,
            name: None,
        }
    }

    /// Attaches a name to this tree.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the name of this tree.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Returns the name of this tree, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Adds the root with the given children and returns its index.
    pub fn add_root(&mut self, children: (TreeIndex, TreeIndex)) -> TreeIndex {
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_root(index, children));

        self.root_index = index;
        self.vertices[children.0].set_parent(index);
        self.vertices[children.1].set_parent(index);

        index
    }

    /// Adds an internal vertex with the given children and returns its index.
    ///
    /// # Arguments
    /// * `children` - Indices of already added vertices
    /// * `branch_length` - Distance to the (future) parent
    pub fn add_internal_vertex(
        &mut self,
        children: (TreeIndex, TreeIndex),
        branch_length: Option<BranchLength>,
    ) -> TreeIndex {
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_internal(index, children, branch_length));

        self.vertices[children.0].set_parent(index);
        self.vertices[children.1].set_parent(index);

        index
    }

    /// Adds a leaf for `taxon` and returns its index.
    pub fn add_leaf(&mut self, taxon: LabelIndex, branch_length: Option<BranchLength>) -> TreeIndex {
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_leaf(index, taxon, branch_length));
        index
    }

    /// Validates the structure and all index references.
    ///
    /// Checks that the root is set and unique, every vertex sits at its own
    /// index, children point back to their parent, every non-root vertex has
    /// a parent listing it as child, and the tree is binary on at least two leaves.
    pub fn is_valid(&self) -> bool {
        if self.root_index >= self.vertices.len() || !self.vertices[self.root_index].is_root() {
            return false;
        }

        let mut leaf_count = 0;
        let mut root_count = 0;
        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.index() != index {
                return false;
            }

            match vertex {
                Vertex::Root { .. } => root_count += 1,
                Vertex::Leaf { .. } => leaf_count += 1,
                Vertex::Internal { .. } => {}
            }

            if let Some((left, right)) = vertex.children() {
                if left >= self.vertices.len() || right >= self.vertices.len() || left == right {
                    return false;
                }
                if self.vertices[left].parent_index() != Some(index)
                    || self.vertices[right].parent_index() != Some(index)
                {
                    return false;
                }
            }

            if !vertex.is_root() {
                let Some(parent) = vertex.parent_index() else {
                    return false;
                };
                match self.vertices.get(parent).and_then(Vertex::children) {
                    Some((left, right)) if left == index || right == index => {}
                    _ => return false,
                }
            }
        }

        root_count == 1 && leaf_count >= 2 && self.vertices.len() == 2 * leaf_count - 1
    }

    /// Returns whether the root has been set.
    pub fn is_root_set(&self) -> bool {
        self.root_index != NO_ROOT_SET_INDEX
    }

    /// Returns the index of the root.
    pub fn root_index(&self) -> TreeIndex {
        self.root_index
    }

    /// Returns the root vertex.
    ///
    /// # Panics
    /// Panics if the root has not been set yet.
    pub fn root(&self) -> &Vertex {
        &self.vertices[self.root_index]
    }

    /// Returns all vertices in arena order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the number of leaves in this tree.
    pub fn num_leaves(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_leaf()).count()
    }

    /// Returns the number of vertices in this tree.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the taxa of all leaves, in arena order.
    pub fn leaf_taxa(&self) -> impl Iterator<Item = LabelIndex> + '_ {
        self.vertices.iter().filter_map(Vertex::taxon)
    }

    /// Returns the height of every vertex, indexed like the arena.
    ///
    /// The root gets the largest root-to-leaf distance as height, and each
    /// other vertex its parent's height minus its branch length. Missing
    /// branch lengths count as zero.
    pub fn node_heights(&self) -> Vec<f64> {
        let mut depths = vec![0.0; self.vertices.len()];
        for vertex in self.pre_order_iter() {
            if let Some(parent) = vertex.parent_index() {
                depths[vertex.index()] = depths[parent] + vertex.length();
            }
        }

        let max_depth = depths.iter().copied().fold(0.0, f64::max);
        depths.iter().map(|depth| max_depth - depth).collect()
    }

    /// Returns the height of the root, the largest distance from root to any leaf.
    pub fn height(&self) -> f64 {
        if !self.is_root_set() {
            return 0.0;
        }
        self.node_heights()[self.root_index]
    }

    /// Returns the sum of all branch lengths.
    pub fn total_branch_length(&self) -> f64 {
        self.vertices.iter().map(Vertex::length).sum()
    }

    /// Returns an iterator over the tree in post-order (children before parents).
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the tree in pre-order (parents before children).
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }
}

impl std::ops::Index<TreeIndex> for Tree {
    type Output = Vertex;

    fn index(&self, index: TreeIndex) -> &Self::Output {
        &self.vertices[index]
    }
}

// ============================================================================
// Printing (pub)
// ============================================================================
impl Tree {
    /// Converts the tree to a Newick string, labelling leaves via `labels`.
    ///
    /// Leaves whose taxon is unknown to `labels` are written by their
    /// taxon index. Labels with Newick delimiters are quoted.
    ///
    /// # Example
    /// ```
    /// use treeset::model::{BranchLength, LeafLabelMap, Tree};
    ///
    /// let mut labels = LeafLabelMap::new();
    /// let mut tree = Tree::new(2);
    /// let a = tree.add_leaf(labels.get_or_insert("A"), BranchLength::new(1.0));
    /// let b = tree.add_leaf(labels.get_or_insert("B"), BranchLength::new(2.0));
    /// tree.add_root((a, b));
    ///
    /// assert_eq!(tree.to_newick(&labels), "(A:1,B:2);");
    /// ```
    pub fn to_newick(&self, labels: &LeafLabelMap) -> String {
        fn push_label(newick: &mut String, label: &str) {
            if label.bytes().any(|b| b" ():;,[]'".contains(&b)) {
                newick.push('\'');
                newick.push_str(&label.replace('\'', "''"));
                newick.push('\'');
            } else {
                newick.push_str(label);
            }
        }

        fn build(tree: &Tree, index: TreeIndex, labels: &LeafLabelMap, newick: &mut String) {
            let vertex = &tree[index];
            match vertex.children() {
                None => match vertex.taxon().and_then(|t| labels.get_label(t)) {
                    Some(label) => push_label(newick, label),
                    None => newick.push_str(&vertex.taxon().unwrap_or_default().to_string()),
                },
                Some((left, right)) => {
                    newick.push('(');
                    build(tree, left, labels, newick);
                    newick.push(',');
                    build(tree, right, labels, newick);
                    newick.push(')');
                }
            }
            if let Some(branch_length) = vertex.branch_length() {
                newick.push(':');
                newick.push_str(&branch_length.to_string());
            }
        }

        let mut newick = String::new();
        if self.is_root_set() {
            build(self, self.root_index, labels, &mut newick);
        }
        newick.push(';');
        newick
    }
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// Iterator for post-order traversal (children before parents), without recursion.
pub struct PostOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<(TreeIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a Tree) -> Self {
        let mut stack = Vec::with_capacity(tree.num_vertices());
        if tree.is_root_set() {
            stack.push((tree.root_index, false));
        }
        PostOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            let vertex = &self.tree[index];
            match vertex.children() {
                Some((left, right)) if !children_visited => {
                    self.stack.push((index, true));
                    self.stack.push((right, false));
                    self.stack.push((left, false));
                }
                _ => return Some(vertex),
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children), without recursion.
pub struct PreOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<TreeIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a Tree) -> Self {
        let mut stack = Vec::with_capacity(tree.num_vertices());
        if tree.is_root_set() {
            stack.push(tree.root_index);
        }
        PreOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let vertex = &self.tree[index];

        if let Some((left, right)) = vertex.children() {
            self.stack.push(right);
            self.stack.push(left);
        }

        Some(vertex)
    }
}
