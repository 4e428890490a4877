use crate::{ArrayError, StorageView};
use std::fmt::Debug;

/// # Operation
///
/// A metadata-only transformation of a view descriptor: slicing,
/// broadcasting, permuting and copy-free reshaping all implement it. The
/// resulting view shares the source buffer.
///
/// The Rust type system is not sufficient to check shape invariants at
/// compile time, so they are checked at runtime in [`Operation::check_invariants`]
/// before [`Operation::compute_view`] runs.
pub trait Operation: Debug {
    /// # Check Invariants
    ///
    /// Validates the operation against the source layout.
    fn check_invariants(&self, _src: &StorageView) -> Result<(), ArrayError> {
        Ok(())
    }

    /// # Compute View
    ///
    /// Determine the shape, strides & offset of the resultant view.
    fn compute_view(&self, src: &StorageView) -> Result<StorageView, ArrayError>;
}
