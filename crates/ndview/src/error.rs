use std::ops::RangeInclusive;

use crate::{Shape, Strides};

/// Coarse classification of [`ArrayError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Shape or rank mismatch: broadcast incompatibility, reshape size mismatch,
    /// output/assignment shape mismatch.
    Rank,
    /// A resolved coordinate fell outside `[0, shape[axis])`.
    Index,
    /// Invalid slice bounds, disallowed copies, malformed arguments.
    Argument,
    /// A documented limitation.
    NotImplemented,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArrayError {
    #[error("Cannot broadcast shapes {lhs:?} and {rhs:?}.")]
    Broadcast { lhs: Shape, rhs: Shape },
    #[error("Output shape {actual:?} does not match broadcast shape {expected:?}.")]
    OutputShape { expected: Shape, actual: Shape },
    #[error("Cannot reshape {from:?} into {to:?}, element counts differ.")]
    SizeMismatch { from: Shape, to: Vec<isize> },
    #[error("Data of length {len} does not fill shape {shape:?}.")]
    DataLength { shape: Shape, len: usize },
    #[error("Rank mismatch. {accepted:?} != {actual}.")]
    RankMismatch {
        accepted: RangeInclusive<usize>,
        actual: usize,
    },
    #[error("Index {index} out of bounds for axis {axis} with size {len}.")]
    IndexOutOfBounds {
        axis: usize,
        index: isize,
        len: usize,
    },
    #[error("Invalid slice on axis {axis}: start {start}, stop {stop}, step {step} for size {len}.")]
    SliceBounds {
        axis: usize,
        start: isize,
        stop: isize,
        step: isize,
        len: usize,
    },
    #[error("{given} slices supplied for a tensor of rank {rank}.")]
    SliceArity { given: usize, rank: usize },
    #[error("Axis {axis} out of range for rank {rank}.")]
    AxisOutOfRange { axis: usize, rank: usize },
    #[error("Reshape of {shape:?} with strides {strides:?} requires a copy.")]
    CopyRequired { shape: Shape, strides: Strides },
    #[error("Invalid permutation {dims:?} for rank {rank}.")]
    InvalidPermutation { dims: Vec<usize>, rank: usize },
    #[error("Output view broadcasts along axis {axis}, writes would overlap.")]
    OverlappingOutput { axis: usize },
    #[error("View {shape:?} with strides {strides:?} at offset {offset} exceeds buffer of length {len}.")]
    OutOfBuffer {
        shape: Shape,
        strides: Strides,
        offset: usize,
        len: usize,
    },
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl ArrayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArrayError::Broadcast { .. }
            | ArrayError::OutputShape { .. }
            | ArrayError::SizeMismatch { .. }
            | ArrayError::DataLength { .. }
            | ArrayError::RankMismatch { .. } => ErrorKind::Rank,
            ArrayError::IndexOutOfBounds { .. } => ErrorKind::Index,
            ArrayError::SliceBounds { .. }
            | ArrayError::SliceArity { .. }
            | ArrayError::AxisOutOfRange { .. }
            | ArrayError::CopyRequired { .. }
            | ArrayError::InvalidPermutation { .. }
            | ArrayError::OverlappingOutput { .. }
            | ArrayError::OutOfBuffer { .. }
            | ArrayError::InvalidArgument(_) => ErrorKind::Argument,
            ArrayError::NotImplemented(_) => ErrorKind::NotImplemented,
        }
    }

    pub fn is_rank_error(&self) -> bool {
        self.kind() == ErrorKind::Rank
    }

    pub fn is_index_error(&self) -> bool {
        self.kind() == ErrorKind::Index
    }

    pub fn is_argument_error(&self) -> bool {
        self.kind() == ErrorKind::Argument
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape;

    #[test]
    fn broadcast_message_names_both_shapes() {
        let err = ArrayError::Broadcast {
            lhs: shape![2, 3],
            rhs: shape![3, 2],
        };
        assert_eq!(err.kind(), ErrorKind::Rank);
        assert_eq!(err.to_string(), "Cannot broadcast shapes [2x3] and [3x2].");
    }

    #[test]
    fn slice_bounds_is_argument_error() {
        let err = ArrayError::SliceBounds {
            axis: 0,
            start: -1,
            stop: -1,
            step: -1,
            len: 2,
        };
        assert!(err.is_argument_error());
        assert!(!err.is_rank_error());
    }
}
