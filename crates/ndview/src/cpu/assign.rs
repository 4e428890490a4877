use crate::{apply_lanes0, apply_lanes1, ArrayError, SliceArg, Tensor, TensorDType};

impl<T: TensorDType> Tensor<T> {
    /// Copies `value`, broadcast to this view's shape, into the existing
    /// buffer. Every alias of the buffer sees the write.
    pub fn assign(&self, value: &Tensor<T>) -> Result<(), ArrayError> {
        if value.rank() == 0 {
            return self.fill(value.item()?);
        }
        apply_lanes1(self, value, |mut out, src| {
            if let (Some(run), Some(from)) = (out.as_mut_slice(), src.as_slice()) {
                run.copy_from_slice(from);
                return Ok(());
            }
            for i in 0..out.len() {
                out.set(i, src.get(i));
            }
            Ok(())
        })
    }

    pub fn fill(&self, value: T) -> Result<(), ArrayError> {
        apply_lanes0(self, |mut out| {
            if let Some(run) = out.as_mut_slice() {
                run.fill(value);
                return Ok(());
            }
            for i in 0..out.len() {
                out.set(i, value);
            }
            Ok(())
        })
    }

    /// `self[args] = value`.
    pub fn slice_assign(&self, args: &[SliceArg], value: &Tensor<T>) -> Result<(), ArrayError> {
        self.slice(args)?.assign(value)
    }
}
