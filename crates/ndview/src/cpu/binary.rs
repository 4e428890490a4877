use crate::{zip_apply, ArrayError, Tensor, TensorDType};

macro_rules! impl_binary_op {
    ($method:ident, $scalar:ident, $inplace:ident, $op:tt) => {
        impl<T: TensorDType> Tensor<T> {
            /// Broadcasting elementwise operation into a new contiguous tensor.
            pub fn $method(&self, rhs: &Tensor<T>) -> Result<Tensor<T>, ArrayError> {
                self.zip_map(rhs, |l, r| l $op r)
            }

            pub fn $scalar(&self, rhs: T) -> Result<Tensor<T>, ArrayError> {
                self.map(move |l| l $op rhs)
            }

            /// In place through this view; `rhs` must broadcast to `self`.
            pub fn $inplace(&self, rhs: &Tensor<T>) -> Result<(), ArrayError> {
                zip_apply(self, rhs, |l, r| l $op r)
            }
        }
    };
}

impl_binary_op!(add, add_scalar, add_assign, +);
impl_binary_op!(sub, sub_scalar, sub_assign, -);
impl_binary_op!(mul, mul_scalar, mul_assign, *);
impl_binary_op!(div, div_scalar, div_assign, /);

#[cfg(test)]
mod tests {
    use crate::{shape, ErrorKind, Shape, SliceArg, Tensor};
    use half::bf16;
    use proptest::prelude::*;
    use test_strategy::proptest;

    #[test]
    fn mixed_rank_alignment() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let big = Tensor::<f32>::ones(shape![3, 4, 5, 6, 7]);
        let out = big.add(&Tensor::zeros(shape![7]))?;
        assert_eq!(out.shape(), &shape![3, 4, 5, 6, 7]);
        assert_eq!(out.sum(), (3 * 4 * 5 * 6 * 7) as f32);
        Ok(())
    }

    #[test]
    fn incompatible_operands() -> anyhow::Result<()> {
        let a = Tensor::from_vec(vec![1, 2, 3, 4, 5, 6], shape![2, 3])?;
        let b = Tensor::from_vec(vec![1, 2, 3, 4, 5, 6], shape![3, 2])?;
        assert_eq!(a.add(&b).unwrap_err().kind(), ErrorKind::Rank);
        assert_eq!(a.add_assign(&b).unwrap_err().kind(), ErrorKind::Rank);
        Ok(())
    }

    #[test]
    fn scalar_and_in_place() -> anyhow::Result<()> {
        let a = Tensor::from_vec(vec![bf16::from_f32(1.0), bf16::from_f32(2.0)], shape![2])?;
        let doubled = a.mul_scalar(bf16::from_f32(2.0))?;
        assert_eq!(doubled.to_vec(), vec![bf16::from_f32(2.0), bf16::from_f32(4.0)]);
        a.sub_assign(&doubled)?;
        assert_eq!(a.to_vec(), vec![bf16::from_f32(-1.0), bf16::from_f32(-2.0)]);

        let q = Tensor::from_vec(vec![7i32, 9], shape![2])?.div_scalar(2)?;
        assert_eq!(q.to_vec(), vec![3, 4]);
        Ok(())
    }

    #[derive(Debug, Clone)]
    struct BinaryProblem {
        lhs: Shape,
        rhs: Shape,
    }

    impl Arbitrary for BinaryProblem {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_args: ()) -> Self::Strategy {
            Shape::arbitrary_with(vec![1..=3, 1..=4, 1..=5])
                .prop_flat_map(|lhs| {
                    let squash = |dim: usize| {
                        prop_oneof![Just(1usize), Just(lhs[dim])].boxed()
                    };
                    let rhs = (squash(0), squash(1), squash(2), 0usize..=2).prop_map(
                        |(a, b, c, skip)| -> Shape { [a, b, c][skip..].iter().copied().collect() },
                    );
                    (Just(lhs), rhs)
                })
                .prop_map(|(lhs, rhs)| BinaryProblem { lhs, rhs })
                .boxed()
        }
    }

    #[proptest(cases = 32)]
    fn add_matches_ndarray_under_every_path(prob: BinaryProblem) {
        let BinaryProblem { lhs, rhs } = prob;
        let a = Tensor::<f64>::from_fn(lhs.clone(), |c| c.iter().fold(1.0, |acc, &x| acc * 3.0 + x as f64));
        let b = Tensor::<f64>::from_fn(rhs.clone(), |c| c.iter().fold(0.5, |acc, &x| acc * 7.0 - x as f64));

        let nd_a = ndarray::ArrayD::from_shape_vec(lhs.to_vec(), a.to_vec()).unwrap();
        let nd_b = ndarray::ArrayD::from_shape_vec(rhs.to_vec(), b.to_vec()).unwrap();
        let expected: Vec<f64> = (&nd_a + &nd_b).iter().copied().collect();

        // strided path: same data behind a reversed, non-contiguous view
        let rev_a = a.slice(&[SliceArg::rev()]).unwrap().copy();
        let strided_a = rev_a.slice(&[SliceArg::rev()]).unwrap();

        for lhs_view in [a.clone(), strided_a] {
            let ours = lhs_view.add(&b).unwrap();
            prop_assert_eq!(ours.shape(), &lhs);
            prop_assert_eq!(ours.to_vec(), expected.clone());
        }

        // scalar add agrees with broadcasting a rank-0 tensor
        let s = a.add_scalar(2.0).unwrap();
        let t = a.add(&Tensor::scalar(2.0)).unwrap();
        prop_assert_eq!(s.to_vec(), t.to_vec());
    }
}
