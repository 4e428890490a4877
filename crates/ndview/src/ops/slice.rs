use crate::{ArrayError, Operation, RVec, StorageView, Tensor, TensorDType};
use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo};

/// One end of a slice range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// Non-negative indices count from the start, negative ones from the end.
    Index(isize),
    /// One past the last element, `shape[axis]`.
    End,
    /// One before the first element, `-1`. Lets a reversed range run through 0.
    BeforeStart,
    /// Unspecified: the natural start or stop for the step's direction.
    Open,
}

impl From<isize> for Bound {
    fn from(i: isize) -> Self {
        Bound::Index(i)
    }
}

/// Per-axis argument to [`Tensor::slice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceArg {
    /// `start..stop` stepping by `step`. A step of 0 selects `start` alone and
    /// collapses the axis.
    Range { start: Bound, stop: Bound, step: isize },
    /// A single index, collapsing the axis.
    Index(isize),
    /// Inserts a length-1 axis with stride 0.
    NewAxis,
}

pub const NEW_AXIS: SliceArg = SliceArg::NewAxis;

impl SliceArg {
    pub fn new(start: impl Into<Bound>, stop: impl Into<Bound>, step: isize) -> Self {
        SliceArg::Range {
            start: start.into(),
            stop: stop.into(),
            step,
        }
    }

    pub const fn full() -> Self {
        SliceArg::Range {
            start: Bound::Open,
            stop: Bound::Open,
            step: 1,
        }
    }

    /// The whole axis, last element first.
    pub const fn rev() -> Self {
        SliceArg::Range {
            start: Bound::Open,
            stop: Bound::Open,
            step: -1,
        }
    }

    /// Replaces the step of a range. Indices and new axes are unchanged.
    pub fn step_by(self, step: isize) -> Self {
        match self {
            SliceArg::Range { start, stop, .. } => SliceArg::Range { start, stop, step },
            other => other,
        }
    }

    fn consumes_axis(&self) -> bool {
        !matches!(self, SliceArg::NewAxis)
    }
}

impl From<isize> for SliceArg {
    fn from(i: isize) -> Self {
        SliceArg::Index(i)
    }
}

impl From<Range<isize>> for SliceArg {
    fn from(r: Range<isize>) -> Self {
        SliceArg::new(r.start, r.end, 1)
    }
}

impl From<RangeInclusive<isize>> for SliceArg {
    fn from(r: RangeInclusive<isize>) -> Self {
        let stop = match *r.end() {
            -1 => Bound::End,
            end => Bound::Index(end + 1),
        };
        SliceArg::new(*r.start(), stop, 1)
    }
}

impl From<RangeFrom<isize>> for SliceArg {
    fn from(r: RangeFrom<isize>) -> Self {
        SliceArg::new(r.start, Bound::Open, 1)
    }
}

impl From<RangeTo<isize>> for SliceArg {
    fn from(r: RangeTo<isize>) -> Self {
        SliceArg::new(Bound::Open, r.end, 1)
    }
}

impl From<RangeFull> for SliceArg {
    fn from(_: RangeFull) -> Self {
        SliceArg::full()
    }
}

/// # Slice
///
/// Resolves a list of [`SliceArg`]s against a view. Axes not covered by the
/// list are kept whole. Never copies.
#[derive(derive_new::new, Debug, Clone)]
pub struct Slice {
    indices: RVec<SliceArg>,
}

impl Slice {
    pub fn indices(&self) -> &[SliceArg] {
        &self.indices
    }
}

impl Operation for Slice {
    fn check_invariants(&self, src: &StorageView) -> Result<(), ArrayError> {
        let given = self.indices.iter().filter(|a| a.consumes_axis()).count();
        if given > src.rank() {
            return Err(ArrayError::SliceArity {
                given,
                rank: src.rank(),
            });
        }
        Ok(())
    }

    fn compute_view(&self, src: &StorageView) -> Result<StorageView, ArrayError> {
        let mut shape = RVec::with_capacity(src.rank());
        let mut strides = RVec::with_capacity(src.rank());
        let mut offset = src.offset() as isize;
        let mut axis = 0;

        for arg in self.indices.iter() {
            match *arg {
                SliceArg::NewAxis => {
                    shape.push(1);
                    strides.push(0);
                }
                SliceArg::Index(i) => {
                    offset += resolve_singleton(src, axis, Bound::Index(i))? * src.strides()[axis];
                    axis += 1;
                }
                SliceArg::Range { start, step: 0, .. } => {
                    offset += resolve_singleton(src, axis, start)? * src.strides()[axis];
                    axis += 1;
                }
                SliceArg::Range { start, stop, step } => {
                    let (a, len) = resolve_range(src, axis, start, stop, step)?;
                    offset += a * src.strides()[axis];
                    shape.push(len);
                    strides.push(src.strides()[axis] * step);
                    axis += 1;
                }
            }
        }
        for rest in axis..src.rank() {
            shape.push(src.shape()[rest]);
            strides.push(src.strides()[rest]);
        }

        let size = shape.iter().product::<usize>();
        // An empty selection may start one past the end of a reversed axis.
        let offset = if size == 0 { offset.max(0) } else { offset };
        Ok(StorageView::new(shape.into(), strides.into(), offset as usize))
    }
}

fn resolve_singleton(src: &StorageView, axis: usize, at: Bound) -> Result<isize, ArrayError> {
    let len = src.shape()[axis];
    let a = src.absolute_index(at, axis);
    if a < 0 || a >= len as isize {
        return Err(ArrayError::SliceBounds {
            axis,
            start: a,
            stop: a,
            step: 0,
            len,
        });
    }
    Ok(a)
}

/// Resolved start and element count of a stepped range on `axis`.
fn resolve_range(
    src: &StorageView,
    axis: usize,
    start: Bound,
    stop: Bound,
    step: isize,
) -> Result<(isize, usize), ArrayError> {
    let len = src.shape()[axis] as isize;
    let a = match start {
        Bound::Open if step < 0 => len - 1,
        b => src.absolute_index(b, axis),
    };
    let b = match stop {
        Bound::Open if step > 0 => len,
        Bound::Open => -1,
        b => src.absolute_index(b, axis),
    };

    let valid = if step > 0 {
        (0 <= a && a < len && a <= b && b <= len) || (a == len && b == len)
    } else {
        (0 <= a && a < len && b <= a && b >= -1) || (len == 0 && a == -1 && b == -1)
    };
    if !valid {
        return Err(ArrayError::SliceBounds {
            axis,
            start: a,
            stop: b,
            step,
            len: len as usize,
        });
    }

    let count = ((b - a).abs() + step.abs() - 1) / step.abs();
    Ok((a, count as usize))
}

impl<T: TensorDType> Tensor<T> {
    /// A view selecting `args` along the leading axes.
    ///
    /// ```ignore
    /// let a = Tensor::<i32>::arange(12)?.reshape(&[4, 3])?;
    /// let inner = a.slice(&s![1..3, 1..3])?;          // [[4, 5], [7, 8]]
    /// let flipped = a.slice(&s![SliceArg::rev()])?;   // rows reversed
    /// ```
    pub fn slice(&self, args: &[SliceArg]) -> Result<Tensor<T>, ArrayError> {
        self.apply_view(&Slice::new(args.into()))
    }

    /// Inserts a length-1 axis before `axis`.
    pub fn unsqueeze(&self, axis: usize) -> Result<Tensor<T>, ArrayError> {
        if axis > self.rank() {
            return Err(ArrayError::AxisOutOfRange {
                axis,
                rank: self.rank(),
            });
        }
        let mut args: RVec<SliceArg> = (0..axis).map(|_| SliceArg::full()).collect();
        args.push(SliceArg::NewAxis);
        self.slice(&args)
    }

    /// Removes the length-1 axis `axis`.
    pub fn squeeze(&self, axis: usize) -> Result<Tensor<T>, ArrayError> {
        if axis >= self.rank() {
            return Err(ArrayError::AxisOutOfRange {
                axis,
                rank: self.rank(),
            });
        }
        if self.shape()[axis] != 1 {
            return Err(ArrayError::InvalidArgument(format!(
                "cannot squeeze axis {} of shape {:?}",
                axis,
                self.shape()
            )));
        }
        let mut args: RVec<SliceArg> = (0..axis).map(|_| SliceArg::full()).collect();
        args.push(SliceArg::Index(0));
        self.slice(&args)
    }
}
