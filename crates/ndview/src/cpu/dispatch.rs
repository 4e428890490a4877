use std::convert::Infallible;

use crate::{
    broadcast_shape, check_shapes, rvec, same_buffer, ArrayError, RVec, Shape, StorageView,
    Tensor, TensorDType,
};

/// A read-only strided run of elements handed to lane operations.
///
/// Element `i` of the lane lives at `buffer[offset + i * stride]`. The stride
/// may be negative (reversed axis) or zero (broadcast operand).
#[derive(Clone, Copy)]
pub struct Lane<'a, T> {
    data: &'a [T],
    offset: isize,
    stride: isize,
    len: usize,
}

impl<'a, T: Copy> Lane<'a, T> {
    pub(crate) fn new(data: &'a [T], offset: isize, stride: isize, len: usize) -> Self {
        Self {
            data,
            offset,
            stride,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn offset(&self) -> isize {
        self.offset
    }

    pub fn stride(&self) -> isize {
        self.stride
    }

    /// The whole underlying buffer.
    pub fn buffer(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn get(&self, i: usize) -> T {
        self.data[(self.offset + i as isize * self.stride) as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        let lane = *self;
        (0..lane.len).map(move |i| lane.get(i))
    }

    /// The lane as a plain slice when its elements are adjacent.
    pub fn as_slice(&self) -> Option<&'a [T]> {
        if self.stride != 1 && self.len > 1 {
            return None;
        }
        let start = self.offset as usize;
        Some(&self.data[start..start + self.len])
    }
}

/// The writable counterpart of [`Lane`], always the output operand.
pub struct LaneMut<'a, T> {
    data: &'a mut [T],
    offset: isize,
    stride: isize,
    len: usize,
}

impl<'a, T: Copy> LaneMut<'a, T> {
    pub(crate) fn new(data: &'a mut [T], offset: isize, stride: isize, len: usize) -> Self {
        Self {
            data,
            offset,
            stride,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn offset(&self) -> isize {
        self.offset
    }

    pub fn stride(&self) -> isize {
        self.stride
    }

    #[inline]
    fn index(&self, i: usize) -> usize {
        (self.offset + i as isize * self.stride) as usize
    }

    #[inline]
    pub fn get(&self, i: usize) -> T {
        self.data[self.index(i)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, value: T) {
        let at = self.index(i);
        self.data[at] = value;
    }

    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        if self.stride != 1 && self.len > 1 {
            return None;
        }
        let start = self.offset as usize;
        Some(&mut self.data[start..start + self.len])
    }
}

/// Walk plan shared by `N` views, `views[0]` being the output.
///
/// Operands are right-aligned to the output. An operand axis of extent 1
/// under an output axis of larger extent, or an axis the operand lacks
/// entirely, is walked with stride 0. Trailing unit output axes are dropped
/// from the walk.
pub(crate) struct Traversal<const N: usize> {
    shape: RVec<usize>,
    strides: RVec<[isize; N]>,
    offsets: [isize; N],
    #[cfg(test)]
    fast: bool,
}

impl<const N: usize> Traversal<N> {
    /// Every view in `views[1..]` must broadcast to `views[0]`.
    pub(crate) fn new(views: [&StorageView; N]) -> Self {
        let out = views[0];
        let offsets = views.map(|v| v.offset() as isize);
        let fast = views
            .iter()
            .all(|v| v.is_contiguous() && v.shape() == out.shape());
        if fast {
            log::trace!("dispatch {:?}: contiguous, one lane of {}", out.shape(), out.size());
            return Self {
                shape: rvec![out.size()],
                strides: rvec![[1; N]],
                offsets,
                #[cfg(test)]
                fast,
            };
        }

        let rank = out.shape().trimmed_rank();
        let out_rank = out.rank();
        let shape: RVec<usize> = out.shape().iter().take(rank).copied().collect();
        let strides: RVec<[isize; N]> = (0..rank)
            .map(|i| {
                views.map(|v| {
                    let pad = out_rank - v.rank();
                    if i < pad || (v.shape()[i - pad] == 1 && shape[i] != 1) {
                        0
                    } else {
                        v.strides()[i - pad]
                    }
                })
            })
            .collect();
        log::trace!(
            "dispatch {:?}: strided, depth {}, lanes of {}",
            out.shape(),
            rank,
            shape.last().copied().unwrap_or(1)
        );
        Self {
            shape,
            strides,
            offsets,
            #[cfg(test)]
            fast,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_fast(&self) -> bool {
        self.fast
    }

    /// Calls `f(len, offsets, strides)` once per innermost lane, outer axes
    /// in row-major order.
    pub(crate) fn for_each<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(usize, [isize; N], [isize; N]) -> Result<(), E>,
    {
        if self.shape.iter().any(|&d| d == 0) {
            return Ok(());
        }
        if self.shape.is_empty() {
            return f(1, self.offsets, [0; N]);
        }
        self.walk(0, self.offsets, &mut f)
    }

    fn walk<E, F>(&self, axis: usize, mut offsets: [isize; N], f: &mut F) -> Result<(), E>
    where
        F: FnMut(usize, [isize; N], [isize; N]) -> Result<(), E>,
    {
        let strides = self.strides[axis];
        if axis + 1 == self.shape.len() {
            return f(self.shape[axis], offsets, strides);
        }
        for _ in 0..self.shape[axis] {
            self.walk(axis + 1, offsets, f)?;
            for (o, s) in offsets.iter_mut().zip(strides.iter()) {
                *o += s;
            }
        }
        Ok(())
    }
}

/// Fails unless `input` broadcasts to exactly `out`.
pub(crate) fn check_operand(out: &Shape, input: &Shape) -> Result<(), ArrayError> {
    if check_shapes(out, input, out) {
        return Ok(());
    }
    let expected = broadcast_shape(out, input)?;
    Err(ArrayError::OutputShape {
        expected,
        actual: out.clone(),
    })
}

/// An output repeating an element along a non-unit axis would be written
/// more than once per traversal.
pub(crate) fn check_output(view: &StorageView) -> Result<(), ArrayError> {
    match view
        .shape()
        .iter()
        .zip(view.strides().iter())
        .position(|(&d, &s)| d > 1 && s == 0)
    {
        Some(axis) => Err(ArrayError::OverlappingOutput { axis }),
        None => Ok(()),
    }
}

/// A source sharing the destination's buffer is read from a private copy.
fn detach_alias<T: TensorDType, S: TensorDType>(dst: &Tensor<T>, src: &Tensor<S>) -> Tensor<S> {
    if same_buffer(dst.buffer(), src.buffer()) {
        log::debug!(
            "source {:?} aliases destination {:?}, copying {} elements",
            src.id(),
            dst.id(),
            src.size()
        );
        src.copy()
    } else {
        src.clone()
    }
}

macro_rules! impl_apply_lanes {
    ($(#[$meta:meta])* $name:ident, $n:literal; $(($src:ident, $S:ident, $guard:ident, $idx:literal)),*) => {
        $(#[$meta])*
        pub fn $name<T, $($S,)* E, F>(dst: &Tensor<T>, $($src: &Tensor<$S>,)* mut f: F) -> Result<(), E>
        where
            T: TensorDType,
            $($S: TensorDType,)*
            E: From<ArrayError>,
            F: FnMut(LaneMut<'_, T>, $(Lane<'_, $S>),*) -> Result<(), E>,
        {
            check_output(dst.view())?;
            $(check_operand(dst.shape(), $src.shape())?;)*
            $(let $src = detach_alias(dst, $src);)*

            let traversal = Traversal::<$n>::new([dst.view(), $($src.view()),*]);
            $(let $guard = $src.buffer().read();)*
            let mut out = dst.buffer().write();
            traversal.for_each(|len, offsets, strides| {
                f(
                    LaneMut::new(&mut out, offsets[0], strides[0], len),
                    $(Lane::new(&$guard, offsets[$idx], strides[$idx], len)),*
                )
            })
        }
    };
}

impl_apply_lanes!(
    /// Runs `f` over every lane of `dst` alone.
    apply_lanes0, 1;
);
impl_apply_lanes!(
    /// Runs `f` over matching lanes of `dst` and one input broadcast to it.
    ///
    /// `dst` must have exactly the broadcast shape; mismatches fail before
    /// any element is touched. Errors returned by `f` stop the walk and are
    /// passed through unchanged.
    apply_lanes1, 2;
    (a, A, ga, 1)
);
impl_apply_lanes!(
    /// Two-input form of [`apply_lanes1`].
    apply_lanes2, 3;
    (a, A, ga, 1),
    (b, B, gb, 2)
);
impl_apply_lanes!(
    /// Three-input form of [`apply_lanes1`].
    apply_lanes3, 4;
    (a, A, ga, 1),
    (b, B, gb, 2),
    (c, C, gc, 3)
);
impl_apply_lanes!(
    /// Four-input form of [`apply_lanes1`].
    apply_lanes4, 5;
    (a, A, ga, 1),
    (b, B, gb, 2),
    (c, C, gc, 3),
    (d, D, gd, 4)
);

/// Elements of `src` in logical order.
pub(crate) fn collect_logical<T: TensorDType>(src: &Tensor<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(src.size());
    let traversal = Traversal::new([src.view()]);
    let data = src.buffer().read();
    let walked = traversal.for_each::<Infallible, _>(|len, offsets, strides| {
        let lane = Lane::new(&data, offsets[0], strides[0], len);
        match lane.as_slice() {
            Some(run) => out.extend_from_slice(run),
            None => out.extend(lane.iter()),
        }
        Ok(())
    });
    if let Err(never) = walked {
        match never {}
    }
    out
}
