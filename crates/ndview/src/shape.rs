use crate::RVec;
use std::ops::{RangeFrom, RangeTo};

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(RVec<usize>);

impl Shape {
    pub fn new(shape: RVec<usize>) -> Self {
        Self(shape)
    }

    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.0.to_vec()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &usize> + ExactSizeIterator {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rank(&self) -> usize {
        self.len()
    }

    pub fn push(&mut self, dim: usize) {
        self.0.push(dim);
    }

    pub fn slice(&self, range: std::ops::Range<usize>) -> Self {
        Shape(self.0[range].into())
    }

    /// Number of axes left once trailing unit axes are dropped.
    pub fn trimmed_rank(&self) -> usize {
        self.0.iter().rposition(|&d| d != 1).map_or(0, |p| p + 1)
    }

    pub fn trim_trailing_ones(&self) -> Shape {
        self.slice(0..self.trimmed_rank())
    }

    /// Coordinates of the `flat`-th element in row-major (logical) order.
    pub fn unravel(&self, flat: usize) -> RVec<usize> {
        let mut coords: RVec<usize> = self.0.iter().map(|_| 0).collect();
        let mut rem = flat;
        for (coord, &dim) in coords.iter_mut().zip(self.0.iter()).rev() {
            if dim == 0 {
                continue;
            }
            *coord = rem % dim;
            rem /= dim;
        }
        coords
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dims = self.0.iter();
        let mut shape = match dims.next() {
            Some(first) => format!("[{}", first),
            None => return write!(f, "[]"),
        };
        for dim in dims {
            shape.push_str(&format!("x{}", dim));
        }
        write!(f, "{}]", shape)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl std::ops::Index<usize> for Shape {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Shape {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl std::ops::Index<RangeTo<usize>> for Shape {
    type Output = [usize];

    fn index(&self, index: RangeTo<usize>) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::Index<RangeFrom<usize>> for Shape {
    type Output = [usize];

    fn index(&self, index: RangeFrom<usize>) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for Shape {
    type Item = usize;
    type IntoIter = smallvec::IntoIter<[usize; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Shape(iter.into_iter().collect())
    }
}

impl From<Vec<usize>> for Shape {
    fn from(shape: Vec<usize>) -> Self {
        Self(shape.into())
    }
}

impl From<RVec<usize>> for Shape {
    fn from(shape: RVec<usize>) -> Self {
        Self(shape)
    }
}

impl From<&[usize]> for Shape {
    fn from(slice: &[usize]) -> Self {
        Shape(slice.into())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape(dims.iter().copied().collect())
    }
}

macro_rules! impl_try_into_for_shape {
    ($($N:expr),*) => {
        $(
            impl TryInto<[usize; $N]> for &Shape {
                type Error = anyhow::Error;

                fn try_into(self) -> Result<[usize; $N], Self::Error> {
                    if self.0.len() == $N {
                        let mut arr = [0; $N];
                        for (i, &item) in self.0.iter().enumerate().take($N) {
                            arr[i] = item;
                        }
                        Ok(arr)
                    } else {
                        Err(anyhow::anyhow!("Shape has length {} but expected {}", self.0.len(), $N))
                    }
                }
            }
        )*
    };
}

impl_try_into_for_shape!(0, 1, 2, 3, 4);

#[cfg(test)]
pub(crate) mod tests {
    use crate::{shape, Shape};
    use proptest::prelude::*;
    use proptest::strategy::{BoxedStrategy, Strategy};
    use std::ops::RangeInclusive;
    use test_strategy::proptest;

    impl Arbitrary for Shape {
        type Parameters = Vec<RangeInclusive<usize>>;
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
            args.prop_map(Into::<Shape>::into).boxed()
        }
    }

    #[test]
    fn debug_renders_dims() {
        assert_eq!(format!("{:?}", shape![2, 3, 4]), "[2x3x4]");
        assert_eq!(format!("{:?}", shape![]), "[]");
        assert_eq!(format!("{}", shape![5, 1]), "[5, 1]");
    }

    #[test]
    fn trims_trailing_unit_axes() {
        assert_eq!(shape![3, 1, 4, 1, 1].trim_trailing_ones(), shape![3, 1, 4]);
        assert_eq!(shape![1, 1].trimmed_rank(), 0);
    }

    #[test]
    fn unravel_is_row_major() {
        let s = shape![4, 3];
        assert_eq!(s.unravel(0).to_vec(), vec![0, 0]);
        assert_eq!(s.unravel(5).to_vec(), vec![1, 2]);
        assert_eq!(s.unravel(11).to_vec(), vec![3, 2]);
        assert!(shape![].unravel(0).is_empty());
    }

    #[test]
    fn try_into_fixed_rank() -> anyhow::Result<()> {
        let dims: [usize; 3] = (&shape![1, 2, 3]).try_into()?;
        assert_eq!(dims, [1, 2, 3]);
        let bad: anyhow::Result<[usize; 2]> = (&shape![1, 2, 3]).try_into();
        assert!(bad.is_err());
        Ok(())
    }

    #[proptest(cases = 64)]
    fn unravel_inverts_row_major_offset(
        #[any(vec![1..=5usize, 1..=5, 1..=5])] shape: Shape,
        #[strategy(0usize..125)] flat: usize,
    ) {
        let flat = flat % shape.numel();
        let coords = shape.unravel(flat);
        let mut back = 0;
        for (c, d) in coords.iter().zip(shape.iter()) {
            prop_assert!(c < d);
            back = back * d + c;
        }
        prop_assert_eq!(back, flat);
    }
}
