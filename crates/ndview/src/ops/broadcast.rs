use derive_new::new;

use crate::{ArrayError, Operation, RVec, Shape, StorageView, Strides, Tensor, TensorDType};

/// Result shape of broadcasting `a` against `b`.
///
/// Shapes are right-aligned. Each pair of dims must be equal or contain a 1,
/// and the larger wins. Leading axes of the longer shape pass through.
pub fn broadcast_shape(a: &Shape, b: &Shape) -> Result<Shape, ArrayError> {
    let rank = a.rank().max(b.rank());
    let mut out = RVec::with_capacity(rank);
    for i in 0..rank {
        let da = dim_from_right(a, rank, i);
        let db = dim_from_right(b, rank, i);
        let d = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => {
                return Err(ArrayError::Broadcast {
                    lhs: a.clone(),
                    rhs: b.clone(),
                })
            }
        };
        out.push(d);
    }
    Ok(Shape::new(out))
}

/// Pairwise left-to-right fold of [`broadcast_shape`].
pub fn broadcast_shapes(shapes: &[&Shape]) -> Result<Shape, ArrayError> {
    match shapes.split_first() {
        None => Ok(Shape::default()),
        Some((first, rest)) => rest
            .iter()
            .try_fold((*first).clone(), |acc, s| broadcast_shape(&acc, s)),
    }
}

/// Whether `result` is exactly the broadcast of `a` and `b`. Allocation free.
pub fn check_shapes(a: &Shape, b: &Shape, result: &Shape) -> bool {
    let rank = a.rank().max(b.rank());
    if result.rank() != rank {
        return false;
    }
    (0..rank).all(|i| {
        let da = dim_from_right(a, rank, i);
        let db = dim_from_right(b, rank, i);
        let r = result[i];
        (da == db && r == da) || (da == 1 && r == db) || (db == 1 && r == da)
    })
}

/// Dim of `shape` at position `i` once left-padded with ones to `rank`.
#[inline]
pub(crate) fn dim_from_right(shape: &Shape, rank: usize, i: usize) -> usize {
    let pad = rank - shape.rank();
    if i < pad {
        1
    } else {
        shape[i - pad]
    }
}

/// # Broadcast
///
/// Stretches a view to `to` by giving every expanded axis stride 0.
/// For rules, see https://numpy.org/doc/stable/user/basics.broadcasting.html
#[derive(new, Debug, Clone)]
pub struct Broadcast {
    to: Shape,
}

impl Broadcast {
    pub fn to(&self) -> &Shape {
        &self.to
    }
}

impl Operation for Broadcast {
    fn check_invariants(&self, src: &StorageView) -> Result<(), ArrayError> {
        if !check_shapes(src.shape(), &self.to, &self.to) {
            return Err(ArrayError::Broadcast {
                lhs: src.shape().clone(),
                rhs: self.to.clone(),
            });
        }
        Ok(())
    }

    fn compute_view(&self, src: &StorageView) -> Result<StorageView, ArrayError> {
        if *src.shape() == self.to {
            return Ok(src.clone());
        }
        let pad = self.to.rank() - src.rank();
        let strides: Strides = (0..self.to.rank())
            .map(|i| {
                if i < pad || src.shape()[i - pad] != self.to[i] {
                    0
                } else {
                    src.strides()[i - pad]
                }
            })
            .collect();
        Ok(StorageView::new(self.to.clone(), strides, src.offset()))
    }
}

impl<T: TensorDType> Tensor<T> {
    /// A read-only-in-spirit view stretched to `to`. Writing through it hits
    /// the same element from several coordinates.
    pub fn broadcast_to(&self, to: &Shape) -> Result<Tensor<T>, ArrayError> {
        self.apply_view(&Broadcast::new(to.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{shape, ErrorKind};
    use proptest::prelude::*;
    use test_strategy::proptest;

    #[test]
    fn right_aligned_broadcast() {
        assert_eq!(
            broadcast_shape(&shape![2, 3, 1], &shape![3, 4]).unwrap(),
            shape![2, 3, 4]
        );
        assert_eq!(
            broadcast_shape(&shape![3, 4, 5, 6, 7], &shape![7]).unwrap(),
            shape![3, 4, 5, 6, 7]
        );
        assert_eq!(broadcast_shape(&shape![], &shape![2]).unwrap(), shape![2]);
    }

    #[test]
    fn incompatible_shapes_are_rank_errors() {
        let err = broadcast_shape(&shape![2, 3], &shape![3, 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rank);
        assert_eq!(
            err,
            ArrayError::Broadcast {
                lhs: shape![2, 3],
                rhs: shape![3, 2]
            }
        );
    }

    #[test]
    fn n_ary_folds_pairwise() {
        let (a, b, c) = (shape![4, 1, 1], shape![5, 1], shape![6]);
        assert_eq!(broadcast_shapes(&[&a, &b, &c]).unwrap(), shape![4, 5, 6]);
        assert_eq!(broadcast_shapes(&[]).unwrap(), shape![]);
        assert_eq!(broadcast_shapes(&[&a, &shape![2, 2]]).unwrap(), shape![4, 2, 2]);
        assert!(broadcast_shapes(&[&a, &b, &shape![3, 1]]).is_err());
    }

    #[test]
    fn check_shapes_rejects_wrong_result() {
        assert!(check_shapes(&shape![2, 1], &shape![3], &shape![2, 3]));
        assert!(!check_shapes(&shape![2, 1], &shape![3], &shape![2, 1]));
        assert!(!check_shapes(&shape![2, 1], &shape![3], &shape![1, 2, 3]));
        assert!(!check_shapes(&shape![2], &shape![3], &shape![3]));
    }

    #[test]
    fn broadcast_to_zeroes_stretched_strides() -> anyhow::Result<()> {
        let row = Tensor::from_vec(vec![1, 2, 3], shape![1, 3])?;
        let b = row.broadcast_to(&shape![2, 2, 3])?;
        assert_eq!(b.strides().to_vec(), vec![0, 0, 1]);
        assert_eq!(b.to_vec(), vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 1, 2, 3]);
        assert!(b.is_alias_of(&row));
        assert!(row.broadcast_to(&shape![2, 4]).is_err());
        assert!(row.broadcast_to(&shape![3]).is_err());
        Ok(())
    }

    #[derive(Debug, Clone)]
    struct BroadcastProblem {
        original: Shape,
        to: Shape,
    }

    impl Arbitrary for BroadcastProblem {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_args: ()) -> Self::Strategy {
            Shape::arbitrary_with(vec![1..=2, 1..=4, 1..=2, 1..=6])
                .prop_flat_map(|original| {
                    let create_broadcast_range = |dim: usize| {
                        if original[dim] == 1 {
                            1..=4
                        } else {
                            original[dim]..=original[dim]
                        }
                    };
                    let to = Shape::arbitrary_with(vec![
                        create_broadcast_range(0),
                        create_broadcast_range(1),
                        create_broadcast_range(2),
                        create_broadcast_range(3),
                    ]);
                    (Just(original), to)
                })
                .prop_map(|(original, to)| BroadcastProblem { original, to })
                .boxed()
        }
    }

    #[proptest(cases = 32)]
    fn broadcast_matches_ndarray(prob: BroadcastProblem) {
        let BroadcastProblem { original, to } = prob;
        let src = Tensor::<f32>::from_fn(original.clone(), |c| {
            c.iter().fold(0.0, |acc, &x| acc * 10.0 + x as f32)
        });
        let ours = src.broadcast_to(&to).unwrap();

        let nd = ndarray::ArrayD::from_shape_vec(original.to_vec(), src.to_vec()).unwrap();
        let expected = nd.broadcast(to.to_vec()).unwrap();
        prop_assert_eq!(ours.to_vec(), expected.iter().copied().collect::<Vec<_>>());
    }
}
