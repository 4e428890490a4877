use derive_new::new;

use crate::{ArrayError, Operation, RVec, Shape, StorageView, Strides, Tensor, TensorDType};

#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct Permute {
    pub dims: Vec<usize>,
}

impl Permute {
    pub fn is_identity(&self) -> bool {
        self.dims.iter().enumerate().all(|(i, &d)| i == d)
    }

    /// The permutation undoing this one.
    pub fn inverse(&self) -> Permute {
        let mut inv = vec![0; self.dims.len()];
        for (i, &d) in self.dims.iter().enumerate() {
            inv[d] = i;
        }
        Permute::new(inv)
    }
}

impl Operation for Permute {
    fn check_invariants(&self, src: &StorageView) -> Result<(), ArrayError> {
        let rank = src.rank();
        if self.dims.len() != rank {
            return Err(ArrayError::RankMismatch {
                accepted: rank..=rank,
                actual: self.dims.len(),
            });
        }
        let mut seen: RVec<bool> = RVec::from_elem(false, rank);
        for &d in self.dims.iter() {
            if d >= rank || seen[d] {
                return Err(ArrayError::InvalidPermutation {
                    dims: self.dims.clone(),
                    rank,
                });
            }
            seen[d] = true;
        }
        Ok(())
    }

    fn compute_view(&self, src: &StorageView) -> Result<StorageView, ArrayError> {
        let shape: Shape = self.dims.iter().map(|&d| src.shape()[d]).collect();
        let strides: Strides = self.dims.iter().map(|&d| src.strides()[d]).collect();
        Ok(StorageView::new(shape, strides, src.offset()))
    }
}

impl<T: TensorDType> Tensor<T> {
    /// Axis `i` of the result is axis `dims[i]` of `self`. Never copies; the
    /// identity permutation hands back this very descriptor.
    pub fn transpose(&self, dims: &[usize]) -> Result<Tensor<T>, ArrayError> {
        let op = Permute::new(dims.to_vec());
        op.check_invariants(self.view())?;
        if op.is_identity() {
            return Ok(self.clone());
        }
        self.apply_view(&op)
    }

    /// Reverses the axis order.
    pub fn t(&self) -> Tensor<T> {
        if self.rank() < 2 {
            return self.clone();
        }
        let shape: Shape = self.shape().iter().rev().copied().collect();
        let strides: Strides = self.strides().iter().rev().copied().collect();
        self.with_view(StorageView::new(shape, strides, self.offset()))
    }
}
