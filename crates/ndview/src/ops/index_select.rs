use num_traits::PrimInt;

use crate::{broadcast_shapes, ArrayError, RVec, Shape, SliceArg, Tensor, TensorDType};

/// Index arrays above this rank are rejected.
pub const MAX_INDEX_ARRAY_RANK: usize = 3;

impl<T: TensorDType> Tensor<T> {
    /// Integer-array ("fancy") indexing. Always copies.
    ///
    /// `indices[j]` selects along axis `j`. The index arrays are broadcast
    /// together and their common shape leads the result, followed by the
    /// axes left un-indexed. Negative entries count from the end of their axis.
    pub fn index_arrays<I: TensorDType + PrimInt>(
        &self,
        indices: &[&Tensor<I>],
    ) -> Result<Tensor<T>, ArrayError> {
        self.index_arrays_with(indices, &[])
    }

    /// Like [`Tensor::index_arrays`], with `rest` applied as a plain slice to
    /// the trailing axes first.
    pub fn index_arrays_with<I: TensorDType + PrimInt>(
        &self,
        indices: &[&Tensor<I>],
        rest: &[SliceArg],
    ) -> Result<Tensor<T>, ArrayError> {
        let k = indices.len();
        if k > self.rank() {
            return Err(ArrayError::SliceArity {
                given: k,
                rank: self.rank(),
            });
        }
        if let Some(big) = indices.iter().find(|ix| ix.rank() > MAX_INDEX_ARRAY_RANK) {
            return Err(ArrayError::NotImplemented(format!(
                "index arrays of rank {} (at most {} supported)",
                big.rank(),
                MAX_INDEX_ARRAY_RANK
            )));
        }

        let mut args: RVec<SliceArg> = (0..k).map(|_| SliceArg::full()).collect();
        args.extend(rest.iter().copied());
        let sliced = self.slice(&args)?;
        if k == 0 {
            return Ok(sliced.copy());
        }

        let shapes: RVec<&Shape> = indices.iter().map(|ix| ix.shape()).collect();
        let lead = broadcast_shapes(&shapes)?;
        let columns = indices
            .iter()
            .map(|ix| {
                Ok(ix
                    .broadcast_to(&lead)?
                    .to_vec()
                    .into_iter()
                    .map(|i| i.to_isize().unwrap_or(isize::MAX))
                    .collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, ArrayError>>()?;

        let tail = sliced.shape().slice(k..sliced.rank());
        let mut data = Vec::with_capacity(lead.numel() * tail.numel());
        let mut coords: RVec<isize> = RVec::from_elem(0, k);
        for p in 0..lead.numel() {
            for (c, column) in coords.iter_mut().zip(columns.iter()) {
                *c = column[p];
            }
            data.extend(sliced.at(&coords)?.to_vec());
        }

        let shape: Shape = lead.iter().chain(tail.iter()).copied().collect();
        Tensor::from_vec(data, shape)
    }
}
