use crate::{rvec, RVec, Shape};

/// Per-axis element steps. Negative strides walk an axis backwards, zero
/// strides repeat a single element along a broadcast axis.
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Strides(RVec<isize>);

impl Strides {
    pub fn new(strides: RVec<isize>) -> Self {
        Self(strides)
    }

    pub fn inner(&self) -> &RVec<isize> {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<isize> {
        self.0.to_vec()
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &isize> + ExactSizeIterator {
        self.0.iter()
    }

    pub fn push(&mut self, stride: isize) {
        self.0.push(stride);
    }

    /// Row-major strides for `shape`, scaled by `inner`.
    pub fn row_major(shape: &Shape, inner: isize) -> Self {
        let mut strides = rvec![];
        let mut stride = inner;
        for size in shape.iter().rev() {
            strides.push(stride);
            stride *= *size as isize;
        }
        strides.reverse();
        Self(strides)
    }
}

impl std::fmt::Debug for Strides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dims = self.0.iter();
        let mut strides = match dims.next() {
            Some(first) => format!("[{}", first),
            None => return write!(f, "[]"),
        };
        for dim in dims {
            strides.push_str(&format!("x{}", dim));
        }
        write!(f, "{}]", strides)
    }
}

impl std::ops::Index<usize> for Strides {
    type Output = isize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Strides {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl From<&Shape> for Strides {
    fn from(shape: &Shape) -> Self {
        Self::row_major(shape, 1)
    }
}

impl From<Vec<isize>> for Strides {
    fn from(strides: Vec<isize>) -> Self {
        Self(strides.into())
    }
}

impl From<RVec<isize>> for Strides {
    fn from(strides: RVec<isize>) -> Self {
        Self(strides)
    }
}

impl FromIterator<isize> for Strides {
    fn from_iter<I: IntoIterator<Item = isize>>(iter: I) -> Self {
        Strides(iter.into_iter().collect())
    }
}
