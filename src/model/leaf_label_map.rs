//! Leaf labels shared by all trees of a tree set.
//!
//! - `LeafLabelMap`: bidirectional mapping between taxon names and [LabelIndex]

use crate::model::tree::LabelIndex;
use std::collections::HashMap;
use std::fmt;

// =#========================================================================#=
// LEAF LABEL MAP
// =#========================================================================#=
/// Maps taxon labels to compact indices, so that the trees of one set can
/// refer to their leaves by [LabelIndex].
///
/// Labels are deduplicated and matching is case sensitive.
///
/// # Example
/// ```
/// use treeset::model::LeafLabelMap;
///
/// let mut labels = LeafLabelMap::new();
///
/// let a = labels.get_or_insert("A");
/// let b = labels.get_or_insert("B");
/// assert_eq!(labels.get_or_insert("A"), a);
/// assert_ne!(labels.get_index("a"), Some(a));
/// assert_eq!(labels.get_label(b), Some("B"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafLabelMap {
    /// Unique labels in insertion order
    labels: Vec<String>,
    /// Map from label to its index
    map: HashMap<String, LabelIndex>,
}

impl LeafLabelMap {
    /// Creates an empty label map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a label map holding `labels` in the given order.
    ///
    /// Duplicates keep the index of their first occurrence.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for label in labels {
            map.get_or_insert(label.as_ref());
        }
        map
    }

    /// Returns the index of `label`, inserting it as next index if it is new.
    pub fn get_or_insert(&mut self, label: &str) -> LabelIndex {
        if let Some(&index) = self.map.get(label) {
            return index;
        }
        let index = self.labels.len();
        self.labels.push(label.to_string());
        self.map.insert(label.to_string(), index);
        index
    }

    /// Returns the index of `label` if present.
    pub fn get_index(&self, label: &str) -> Option<LabelIndex> {
        self.map.get(label).copied()
    }

    /// Returns the label at `index` if present.
    pub fn get_label(&self, index: LabelIndex) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Returns whether `label` is present.
    pub fn contains(&self, label: &str) -> bool {
        self.map.contains_key(label)
    }

    /// Returns the number of labels.
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Returns whether no label has been added yet.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns all labels in index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl std::ops::Index<LabelIndex> for LeafLabelMap {
    type Output = str;

    fn index(&self, index: LabelIndex) -> &Self::Output {
        &self.labels[index]
    }
}

impl fmt::Display for LeafLabelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LeafLabelMap({} labels: [", self.labels.len())?;
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{label}")?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_labels_keeps_order_and_dedups() {
        let labels = LeafLabelMap::from_labels(["C", "A", "C", "B"]);
        assert_eq!(labels.num_labels(), 3);
        assert_eq!(labels.labels(), &["C", "A", "B"]);
        assert_eq!(&labels[1], "A");
    }

    #[test]
    fn matching_is_case_sensitive() {
        let labels = LeafLabelMap::from_labels(["Homo"]);
        assert!(labels.contains("Homo"));
        assert!(!labels.contains("homo"));
    }
}
