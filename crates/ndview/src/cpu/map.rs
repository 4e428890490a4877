#[cfg(feature = "parallel")]
use crate::min_size_for_parallelism;
use crate::{
    apply_lanes0, apply_lanes1, apply_lanes2, apply_lanes3, apply_lanes4, broadcast_shapes,
    ArrayError, Tensor, TensorDType,
};

#[cfg(feature = "parallel")]
mod parallel {
    use rayon::prelude::*;

    /// Writes `g(i)` to `out[i]`, one contiguous chunk per rayon worker.
    pub(crate) fn fill_chunks<T: Send, G: Fn(usize) -> T + Sync>(out: &mut [T], g: G) {
        let chunk = out.len().div_ceil(rayon::current_num_threads()).max(1);
        log::trace!("parallel lane of {} in chunks of {}", out.len(), chunk);
        out.par_chunks_mut(chunk)
            .enumerate()
            .for_each(|(c, part)| {
                let start = c * chunk;
                for (k, o) in part.iter_mut().enumerate() {
                    *o = g(start + k);
                }
            });
    }
}

macro_rules! impl_map_into {
    ($(#[$meta:meta])* $name:ident, $lanes:ident; $(($src:ident, $S:ident)),+) => {
        $(#[$meta])*
        pub fn $name<T, $($S,)+ F>(dst: &Tensor<T>, $($src: &Tensor<$S>,)+ f: F) -> Result<(), ArrayError>
        where
            T: TensorDType,
            $($S: TensorDType,)+
            F: Fn($($S),+) -> T + Sync,
        {
            $lanes(dst, $($src,)+ |mut out, $($src),+| {
                #[cfg(feature = "parallel")]
                if out.len() >= min_size_for_parallelism() {
                    if let (Some(run), $(Some($src),)+) = (out.as_mut_slice(), $($src.as_slice(),)+) {
                        parallel::fill_chunks(run, |i| f($($src[i]),+));
                        return Ok(());
                    }
                }
                for i in 0..out.len() {
                    out.set(i, f($($src.get(i)),+));
                }
                Ok(())
            })
        }
    };
}

impl_map_into!(
    /// `dst[i] = f(a[i])`, with `a` broadcast to `dst`.
    map_into, apply_lanes1;
    (a, A)
);
impl_map_into!(
    /// `dst[i] = f(a[i], b[i])` over operands broadcast to `dst`.
    zip_map_into, apply_lanes2;
    (a, A),
    (b, B)
);
impl_map_into!(
    zip3_map_into, apply_lanes3;
    (a, A),
    (b, B),
    (c, C)
);
impl_map_into!(
    zip4_map_into, apply_lanes4;
    (a, A),
    (b, B),
    (c, C),
    (d, D)
);

/// `dst[i] = f(dst[i])` in place.
pub fn map_inplace<T, F>(dst: &Tensor<T>, f: F) -> Result<(), ArrayError>
where
    T: TensorDType,
    F: Fn(T) -> T + Sync,
{
    apply_lanes0(dst, |mut out| {
        for i in 0..out.len() {
            let v = out.get(i);
            out.set(i, f(v));
        }
        Ok(())
    })
}

/// `dst[i] = f(dst[i], a[i])` in place, `a` broadcast to `dst`.
pub fn zip_apply<T, A, F>(dst: &Tensor<T>, a: &Tensor<A>, f: F) -> Result<(), ArrayError>
where
    T: TensorDType,
    A: TensorDType,
    F: Fn(T, A) -> T + Sync,
{
    apply_lanes1(dst, a, |mut out, a| {
        #[cfg(feature = "parallel")]
        if out.len() >= min_size_for_parallelism() {
            if let (Some(run), Some(a)) = (out.as_mut_slice(), a.as_slice()) {
                use rayon::prelude::*;
                run.par_iter_mut()
                    .zip(a.par_iter())
                    .for_each(|(o, &x)| *o = f(*o, x));
                return Ok(());
            }
        }
        for i in 0..out.len() {
            let v = out.get(i);
            out.set(i, f(v, a.get(i)));
        }
        Ok(())
    })
}

impl<T: TensorDType> Tensor<T> {
    /// A new contiguous tensor of `f` applied to every element.
    pub fn map<U: TensorDType, F: Fn(T) -> U + Sync>(&self, f: F) -> Result<Tensor<U>, ArrayError> {
        let out = Tensor::zeros(self.shape().clone());
        map_into(&out, self, f)?;
        Ok(out)
    }

    /// `f` over `self` and `b` broadcast together.
    pub fn zip_map<B, U, F>(&self, b: &Tensor<B>, f: F) -> Result<Tensor<U>, ArrayError>
    where
        B: TensorDType,
        U: TensorDType,
        F: Fn(T, B) -> U + Sync,
    {
        let out = Tensor::zeros(broadcast_shapes(&[self.shape(), b.shape()])?);
        zip_map_into(&out, self, b, f)?;
        Ok(out)
    }

    pub fn zip3_map<B, C, U, F>(&self, b: &Tensor<B>, c: &Tensor<C>, f: F) -> Result<Tensor<U>, ArrayError>
    where
        B: TensorDType,
        C: TensorDType,
        U: TensorDType,
        F: Fn(T, B, C) -> U + Sync,
    {
        let out = Tensor::zeros(broadcast_shapes(&[self.shape(), b.shape(), c.shape()])?);
        zip3_map_into(&out, self, b, c, f)?;
        Ok(out)
    }

    pub fn zip4_map<B, C, D, U, F>(
        &self,
        b: &Tensor<B>,
        c: &Tensor<C>,
        d: &Tensor<D>,
        f: F,
    ) -> Result<Tensor<U>, ArrayError>
    where
        B: TensorDType,
        C: TensorDType,
        D: TensorDType,
        U: TensorDType,
        F: Fn(T, B, C, D) -> U + Sync,
    {
        let shape = broadcast_shapes(&[self.shape(), b.shape(), c.shape(), d.shape()])?;
        let out = Tensor::zeros(shape);
        zip4_map_into(&out, self, b, c, d, f)?;
        Ok(out)
    }
}
