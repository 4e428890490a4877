use crate::{ArrayError, Bound, RVec, Shape, Strides};

/// # StorageView
///
/// The layout half of a view descriptor: which elements of a flat buffer a
/// tensor covers and in what logical order.
///
/// Logical element `idx` lives at `offset + Σ idx[i] * strides[i]`. The
/// `contiguous` and `transposed` flags are derived once here and never
/// updated; every view operation produces a fresh `StorageView`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageView {
    shape: Shape,
    strides: Strides,
    offset: usize,
    contiguous: bool,
    transposed: bool,
}

impl StorageView {
    /// Callers guarantee `shape` and `strides` have equal rank; public
    /// construction goes through [`crate::Tensor::from_strided`].
    pub(crate) fn new(shape: Shape, strides: Strides, offset: usize) -> Self {
        debug_assert_eq!(
            shape.rank(),
            strides.rank(),
            "shape {:?} and strides {:?} differ in rank",
            shape,
            strides
        );
        let contiguous = is_row_major(&shape, &strides);
        let transposed = has_inverted_axes(&shape, &strides);
        Self {
            shape,
            strides,
            offset,
            contiguous,
            transposed,
        }
    }

    /// Dense row-major layout starting at element 0.
    pub fn row_major(shape: Shape) -> Self {
        let strides = Strides::from(&shape);
        Self::new(shape, strides, 0)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn size(&self) -> usize {
        self.shape.numel()
    }

    /// Row-major dense: `strides[d] == shape[d + 1] * strides[d + 1]` with a
    /// unit innermost stride. Unit axes are ignored.
    pub fn is_contiguous(&self) -> bool {
        self.contiguous
    }

    /// Some pair of non-unit axes has `strides[d] < strides[d + 1]`.
    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// Resolves a bound on `axis` to a plain index.
    ///
    /// Non-negative indices are kept, negative ones count from the end,
    /// [`Bound::End`] maps to `shape[axis]` and [`Bound::BeforeStart`] to `-1`.
    /// [`Bound::Open`] is treated like the start of the axis.
    pub fn absolute_index(&self, bound: Bound, axis: usize) -> isize {
        let len = self.shape[axis] as isize;
        match bound {
            Bound::Index(i) if i >= 0 => i,
            Bound::Index(i) => len + i,
            Bound::End => len,
            Bound::BeforeStart => -1,
            Bound::Open => 0,
        }
    }

    /// Buffer address of the element at `indices`. Negative indices count
    /// from the end of their axis.
    pub fn ravel(&self, indices: &[isize]) -> Result<usize, ArrayError> {
        if indices.len() != self.rank() {
            return Err(ArrayError::SliceArity {
                given: indices.len(),
                rank: self.rank(),
            });
        }
        let mut address = self.offset as isize;
        for (axis, &index) in indices.iter().enumerate() {
            let resolved = self.absolute_index(Bound::Index(index), axis);
            if resolved < 0 || resolved >= self.shape[axis] as isize {
                return Err(ArrayError::IndexOutOfBounds {
                    axis,
                    index,
                    len: self.shape[axis],
                });
            }
            address += resolved * self.strides[axis];
        }
        Ok(address as usize)
    }

    /// Coordinates of the `flat`-th element in logical (shape) order.
    pub fn unravel(&self, flat: usize) -> RVec<usize> {
        self.shape.unravel(flat)
    }

    /// Buffer address of in-range coordinates.
    pub(crate) fn address(&self, coords: &[usize]) -> usize {
        let delta: isize = coords
            .iter()
            .zip(self.strides.iter())
            .map(|(&c, &s)| c as isize * s)
            .sum();
        (self.offset as isize + delta) as usize
    }

    /// Stride between logically consecutive elements when the view can be
    /// read as one evenly spaced run, i.e. reinterpreted under any other
    /// row-major shape without a copy.
    pub fn inner_stride(&self) -> Option<isize> {
        if self.size() <= 1 {
            return Some(1);
        }
        let mut axes = self
            .shape
            .iter()
            .zip(self.strides.iter())
            .filter(|(&dim, _)| dim != 1)
            .rev();
        let (&dim, &inner) = axes.next()?;
        if inner == 0 {
            return None;
        }
        let mut expected = inner * dim as isize;
        for (&dim, &stride) in axes {
            if stride != expected {
                return None;
            }
            expected *= dim as isize;
        }
        Some(inner)
    }

    /// Lowest and highest buffer addresses the view can reach, `None` when it
    /// covers no elements.
    pub fn address_span(&self) -> Option<(isize, isize)> {
        if self.size() == 0 {
            return None;
        }
        let (mut lo, mut hi) = (self.offset as isize, self.offset as isize);
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()) {
            let reach = (dim as isize - 1) * stride;
            if reach < 0 {
                lo += reach;
            } else {
                hi += reach;
            }
        }
        Some((lo, hi))
    }

    /// Checks every reachable address lies inside a buffer of `len` elements.
    pub fn check_fits(&self, len: usize) -> Result<(), ArrayError> {
        match self.address_span() {
            Some((lo, hi)) if lo < 0 || hi >= len as isize => Err(ArrayError::OutOfBuffer {
                shape: self.shape.clone(),
                strides: self.strides.clone(),
                offset: self.offset,
                len,
            }),
            _ => Ok(()),
        }
    }
}

fn is_row_major(shape: &Shape, strides: &Strides) -> bool {
    if shape.numel() == 0 {
        return true;
    }
    let mut expected = 1isize;
    for (&dim, &stride) in shape.iter().zip(strides.iter()).rev() {
        if dim != 1 && stride != expected {
            return false;
        }
        expected *= dim as isize;
    }
    true
}

fn has_inverted_axes(shape: &Shape, strides: &Strides) -> bool {
    let live: RVec<isize> = shape
        .iter()
        .zip(strides.iter())
        .filter(|(&dim, _)| dim > 1)
        .map(|(_, &stride)| stride)
        .collect();
    live.windows(2).any(|w| w[0] < w[1])
}
