//! Structural cloning of likelihood pipelines for worker threads.

use crate::error::ConfigurationError;
use crate::model::Tree;

/// Duplicates a component for exclusive use by one worker.
///
/// A structural clone
/// - copies scalar settings,
/// - shares immutable data such as alignments and tree lists by `Arc`,
/// - deep-copies mutable state such as substitution models,
/// - reruns the component's validation, and
/// - suffixes ids with `_{worker}`.
///
/// Implementors must leave `self` untouched, so that one original can be
/// cloned once per worker.
pub trait StructuralClone: Sized {
    /// Returns a copy of `self` for worker `worker`.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if the clone fails validation.
    fn structural_clone(&self, worker: usize) -> Result<Self, ConfigurationError>;
}

impl StructuralClone for Tree {
    fn structural_clone(&self, worker: usize) -> Result<Self, ConfigurationError> {
        if !self.is_valid() {
            return Err(ConfigurationError::invalid(
                self.name().unwrap_or("tree"),
                "is not a valid binary tree",
            ));
        }
        let mut clone = self.clone();
        clone.set_name(Some(format!("{}_{worker}", self.name().unwrap_or("tree"))));
        Ok(clone)
    }
}
