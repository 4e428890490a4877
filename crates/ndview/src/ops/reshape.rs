use derive_new::new;

use crate::{ArrayError, Operation, Shape, StorageView, Strides, Tensor, TensorDType};

/// When [`Tensor::reshape_with`] may allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CopyPolicy {
    /// Fail with [`ArrayError::CopyRequired`] rather than copy.
    Never,
    /// Copy only when the layout cannot be reinterpreted in place.
    #[default]
    IfNeeded,
    /// Always return a fresh contiguous buffer.
    Always,
}

/// Resolves a requested shape against `numel` elements. At most one entry may
/// be `-1`; it takes whatever size makes the element counts match.
pub fn resolve_shape(from: &Shape, to: &[isize]) -> Result<Shape, ArrayError> {
    let mismatch = || ArrayError::SizeMismatch {
        from: from.clone(),
        to: to.to_vec(),
    };
    let mut placeholder = None;
    let mut known = 1usize;
    for (i, &d) in to.iter().enumerate() {
        match d {
            -1 if placeholder.is_none() => placeholder = Some(i),
            -1 => {
                return Err(ArrayError::InvalidArgument(format!(
                    "only one -1 allowed in reshape target {:?}",
                    to
                )))
            }
            d if d < 0 => {
                return Err(ArrayError::InvalidArgument(format!(
                    "negative dimension {} in reshape target {:?}",
                    d, to
                )))
            }
            d => known *= d as usize,
        }
    }

    let numel = from.numel();
    let mut shape: Shape = to.iter().map(|&d| d.max(0) as usize).collect();
    if let Some(i) = placeholder {
        if known == 0 || numel % known != 0 {
            return Err(mismatch());
        }
        shape[i] = numel / known;
    }
    if shape.numel() != numel {
        return Err(mismatch());
    }
    Ok(shape)
}

/// # Reshape
///
/// Reinterprets a view under a new shape without moving data. Only views
/// that are not transposed and whose elements form one evenly spaced run
/// qualify; see [`StorageView::inner_stride`].
#[derive(new, Debug, Clone)]
pub struct Reshape {
    to: Shape,
}

impl Operation for Reshape {
    fn check_invariants(&self, src: &StorageView) -> Result<(), ArrayError> {
        if src.size() != self.to.numel() {
            return Err(ArrayError::SizeMismatch {
                from: src.shape().clone(),
                to: self.to.iter().map(|&d| d as isize).collect(),
            });
        }
        Ok(())
    }

    fn compute_view(&self, src: &StorageView) -> Result<StorageView, ArrayError> {
        match src.inner_stride().filter(|_| !src.is_transposed()) {
            Some(inner) => Ok(StorageView::new(
                self.to.clone(),
                Strides::row_major(&self.to, inner),
                src.offset(),
            )),
            None => Err(ArrayError::CopyRequired {
                shape: src.shape().clone(),
                strides: src.strides().clone(),
            }),
        }
    }
}

impl<T: TensorDType> Tensor<T> {
    /// Reshape, copying only if the layout demands it.
    pub fn reshape(&self, shape: &[isize]) -> Result<Tensor<T>, ArrayError> {
        self.reshape_with(shape, CopyPolicy::IfNeeded)
    }

    pub fn reshape_with(&self, shape: &[isize], policy: CopyPolicy) -> Result<Tensor<T>, ArrayError> {
        let to = resolve_shape(self.shape(), shape)?;
        if policy == CopyPolicy::Always {
            log::debug!("reshape {:?} -> {:?}: forced copy", self.shape(), to);
            return Tensor::from_vec(self.to_vec(), to);
        }
        match self.apply_view(&Reshape::new(to.clone())) {
            Err(ArrayError::CopyRequired { .. }) if policy == CopyPolicy::IfNeeded => {
                log::debug!(
                    "reshape {:?} (strides {:?}) -> {:?}: layout requires a copy",
                    self.shape(),
                    self.strides(),
                    to
                );
                Tensor::from_vec(self.to_vec(), to)
            }
            other => other,
        }
    }

    /// Rank-1 view or copy of every element.
    pub fn flatten(&self) -> Result<Tensor<T>, ArrayError> {
        self.reshape(&[-1])
    }
}
