use std::convert::Infallible;

use crate::cpu::dispatch::Traversal;
use crate::{ArrayError, Lane, LaneMut, RVec, Shape, StorageView, Strides, Tensor, TensorDType};

impl<T: TensorDType> Tensor<T> {
    /// Folds every element in logical order. Accumulators are `Copy`, which
    /// covers the numeric and `Option` states reductions need.
    pub fn fold<A: Copy, F: FnMut(A, T) -> A>(&self, init: A, mut f: F) -> A {
        let traversal = Traversal::new([self.view()]);
        let data = self.buffer().read();
        let mut acc = init;
        let walked = traversal.for_each::<Infallible, _>(|len, offsets, strides| {
            let lane = Lane::new(&data, offsets[0], strides[0], len);
            for x in lane.iter() {
                acc = f(acc, x);
            }
            Ok(())
        });
        if let Err(never) = walked {
            match never {}
        }
        acc
    }

    pub fn sum(&self) -> T {
        self.fold(T::zero(), |acc, x| acc + x)
    }

    /// Largest element, `None` when empty. Ties keep the first occurrence.
    pub fn max(&self) -> Option<T> {
        self.fold(None, |best: Option<T>, x| match best {
            Some(b) if b >= x => Some(b),
            _ => Some(x),
        })
    }

    /// Smallest element, `None` when empty. Ties keep the first occurrence.
    pub fn min(&self) -> Option<T> {
        self.fold(None, |best: Option<T>, x| match best {
            Some(b) if b <= x => Some(b),
            _ => Some(x),
        })
    }

    /// Coordinates of the first largest element.
    pub fn argmax(&self) -> Option<RVec<usize>> {
        let (best, _) = self.fold((None, 0usize), |(best, i): (Option<(T, usize)>, usize), x| {
            let best = match best {
                Some((b, at)) if b >= x => Some((b, at)),
                _ => Some((x, i)),
            };
            (best, i + 1)
        });
        best.map(|(_, flat)| self.shape().unravel(flat))
    }

    /// Folds along `axis`, keeping it with extent 1.
    pub fn fold_axis<F: Fn(T, T) -> T>(&self, axis: usize, init: T, f: F) -> Result<Tensor<T>, ArrayError> {
        if axis >= self.rank() {
            return Err(ArrayError::AxisOutOfRange {
                axis,
                rank: self.rank(),
            });
        }
        let mut kept = self.shape().clone();
        kept[axis] = 1;
        let out = Tensor::full(kept, init);

        // The accumulator, stretched back over the reduced axis.
        let mut strides: Strides = out.strides().clone();
        strides[axis] = 0;
        let stretched = StorageView::new(self.shape().clone(), strides, 0);

        let traversal = Traversal::new([&stretched, self.view()]);
        let src = self.buffer().read();
        let mut acc = out.buffer().write();
        let walked = traversal.for_each::<Infallible, _>(|len, offsets, strides| {
            let mut dst = LaneMut::new(&mut acc, offsets[0], strides[0], len);
            let lane = Lane::new(&src, offsets[1], strides[1], len);
            for i in 0..len {
                let v = dst.get(i);
                dst.set(i, f(v, lane.get(i)));
            }
            Ok(())
        });
        if let Err(never) = walked {
            match never {}
        }
        drop(acc);
        Ok(out)
    }

    pub fn sum_axis(&self, axis: usize) -> Result<Tensor<T>, ArrayError> {
        self.fold_axis(axis, T::zero(), |acc, x| acc + x)
    }

    /// Shape of a keep-dims reduction over `axis`.
    pub fn reduced_shape(&self, axis: usize) -> Option<Shape> {
        (axis < self.rank()).then(|| {
            let mut s = self.shape().clone();
            s[axis] = 1;
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{s, shape, ErrorKind, SliceArg, Tensor};

    #[test]
    fn whole_tensor_reductions() -> anyhow::Result<()> {
        let a = Tensor::<i32>::arange(12)?.reshape(&[3, 4])?;
        assert_eq!(a.sum(), 66);
        assert_eq!(a.t().sum(), 66);
        assert_eq!(a.max(), Some(11));
        assert_eq!(a.min(), Some(0));
        assert_eq!(a.argmax().map(|c| c.to_vec()), Some(vec![2, 3]));
        assert_eq!(Tensor::<f32>::zeros(shape![0]).max(), None);
        Ok(())
    }

    #[test]
    fn argmax_follows_logical_order() -> anyhow::Result<()> {
        let a = Tensor::from_vec(vec![1.0f32, 9.0, 9.0, 2.0], shape![2, 2])?;
        assert_eq!(a.argmax().map(|c| c.to_vec()), Some(vec![0, 1]));
        let rev = a.slice(&s![SliceArg::rev()])?;
        assert_eq!(rev.argmax().map(|c| c.to_vec()), Some(vec![0, 0]));
        Ok(())
    }

    #[test]
    fn axis_reductions_keep_dims() -> anyhow::Result<()> {
        let a = Tensor::<i64>::arange(12)?.reshape(&[3, 4])?;
        let rows = a.sum_axis(1)?;
        assert_eq!(rows.shape(), &shape![3, 1]);
        assert_eq!(rows.to_vec(), vec![6, 22, 38]);

        let cols = a.sum_axis(0)?;
        assert_eq!(cols.shape(), &shape![1, 4]);
        assert_eq!(cols.to_vec(), vec![12, 15, 18, 21]);

        let maxes = a.t().fold_axis(1, i64::MIN, |m, x| m.max(x))?;
        assert_eq!(maxes.to_vec(), vec![8, 9, 10, 11]);

        assert_eq!(a.sum_axis(2).unwrap_err().kind(), ErrorKind::Argument);
        assert_eq!(a.reduced_shape(0), Some(shape![1, 4]));
        Ok(())
    }
}
