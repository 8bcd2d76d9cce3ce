//! Tree data structures.
//!
//! - [Tree]: arena-based rooted binary tree whose leaves refer to taxa by [LabelIndex]
//! - [Vertex] and [BranchLength]: the arena's elements
//! - [LeafLabelMap]: taxon names shared by all trees of a set
//! - [RawTreeSet]: parsed trees plus their label map, before reconciliation

pub mod leaf_label_map;
pub mod raw_tree_set;
pub mod tree;
pub mod vertex;

pub use leaf_label_map::LeafLabelMap;
pub use raw_tree_set::RawTreeSet;
pub use tree::{LabelIndex, Tree, TreeIndex};
pub use vertex::{BranchLength, Vertex};
