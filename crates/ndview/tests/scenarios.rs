use ndview::prelude::*;
use ndview::{apply_lanes2, broadcast_shape, broadcast_shapes, check_shapes, Buffer};
use proptest::prelude::*;
use test_strategy::proptest;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn grid() -> anyhow::Result<Tensor<i32>> {
    Ok(Tensor::<i32>::arange(12)?.reshape(&[4, 3])?)
}

#[test]
fn inner_block_slice() -> anyhow::Result<()> {
    init();
    let a = grid()?;
    let block = a.slice(&s![1..3, 1..3])?;
    assert_eq!(block.shape(), &shape![2, 2]);
    assert!(!block.is_contiguous());
    assert_eq!(block, Tensor::from_vec(vec![4, 5, 7, 8], shape![2, 2])?);

    let copied = block.copy();
    assert!(copied.is_contiguous());
    assert_eq!(copied.buffer().to_vec(), vec![4, 5, 7, 8]);
    Ok(())
}

#[test]
fn reversed_rows() -> anyhow::Result<()> {
    init();
    let rev = grid()?.slice(&[SliceArg::rev()])?;
    let expected = Tensor::from_vec(vec![9, 10, 11, 6, 7, 8, 3, 4, 5, 0, 1, 2], shape![4, 3])?;
    assert_eq!(rev, expected);
    assert_eq!(rev.to_string(), "[[9, 10, 11], [6, 7, 8], [3, 4, 5], [0, 1, 2]]");
    Ok(())
}

#[test]
fn broadcast_shape_rules() {
    assert_eq!(
        broadcast_shape(&shape![2, 3, 1], &shape![3, 4]).unwrap(),
        shape![2, 3, 4]
    );
    let err = broadcast_shape(&shape![2, 3], &shape![3, 2]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rank);
    assert_eq!(
        broadcast_shapes(&[&shape![5, 1, 4], &shape![1], &shape![3, 1]]).unwrap(),
        shape![5, 3, 4]
    );
    assert!(check_shapes(&shape![5, 1, 4], &shape![3, 1], &shape![5, 3, 4]));
}

#[test]
fn high_rank_plus_vector() -> anyhow::Result<()> {
    init();
    let out = Tensor::<f64>::ones(shape![3, 4, 5, 6, 7]).add(&Tensor::zeros(shape![7]))?;
    assert_eq!(out.shape(), &shape![3, 4, 5, 6, 7]);
    assert_eq!(out, Tensor::scalar(1.0));
    Ok(())
}

#[test]
fn mismatched_matrices_do_not_add() -> anyhow::Result<()> {
    let a = Tensor::from_vec(vec![1, 2, 3, 4, 5, 6], shape![2, 3])?;
    let b = Tensor::from_vec(vec![1, 2, 3, 4, 5, 6], shape![3, 2])?;
    let err = a.add(&b).unwrap_err();
    assert!(err.is_rank_error());
    Ok(())
}

#[test]
fn reverse_slice_before_start_mismatch() {
    let y = Tensor::<f32>::zeros(shape![2, 2]);
    let err = y
        .slice(&[SliceArg::new(-3, Bound::BeforeStart, -1)])
        .unwrap_err();
    assert!(err.is_argument_error());
}

#[test]
fn transpose_identity_and_involution() -> anyhow::Result<()> {
    let a = Tensor::<f32>::from_fn(shape![2, 3, 4], |c| (c[0] * 100 + c[1] * 10 + c[2]) as f32);
    assert!(a.transpose(&[0, 1, 2])?.ptr_eq(&a));
    let p = a.transpose(&[2, 0, 1])?;
    assert_eq!(p.shape(), &shape![4, 2, 3]);
    assert_eq!(p.get(&[3, 1, 2])?, 123.0);
    let back = p.transpose(&[1, 2, 0])?;
    assert_eq!(back.strides(), a.strides());
    assert_eq!(back, a);
    assert_eq!(a.t().t(), a);
    Ok(())
}

#[test]
fn reshape_round_trip_shares_buffer() -> anyhow::Result<()> {
    let a = Tensor::<u32>::arange(24)?;
    let r = a.reshape(&[2, -1, 4])?.reshape(&[24])?;
    assert!(r.is_alias_of(&a));
    assert_eq!(r.buffer().ref_count(), a.buffer().ref_count());
    assert_eq!(r, a);

    let t = a.reshape(&[4, 6])?.t();
    let err = t.reshape_with(&[24], CopyPolicy::Never).unwrap_err();
    assert!(err.is_argument_error());
    Ok(())
}

#[test]
fn writes_through_views_reach_every_alias() -> anyhow::Result<()> {
    let a = grid()?;
    let col = a.slice(&s![.., -1])?;
    let alias = a.reshape(&[12])?;
    col.fill(0)?;
    assert_eq!(alias.to_vec(), vec![0, 1, 0, 3, 4, 0, 6, 7, 0, 9, 10, 0]);

    a.slice_assign(&s![0], &Tensor::from_vec(vec![7, 8, 9], shape![3])?)?;
    assert_eq!(alias.slice(&s![..3])?.to_vec(), vec![7, 8, 9]);
    Ok(())
}

#[test]
fn lane_level_kernel() -> anyhow::Result<()> {
    // a saxpy-style kernel written against lanes
    let x = Tensor::<f32>::arange(6)?.reshape(&[2, 3])?;
    let y = Tensor::from_vec(vec![10.0f32, 20.0], shape![2, 1])?;
    let out = Tensor::<f32>::zeros(shape![2, 3]);
    apply_lanes2(&out, &x, &y, |mut o, x, y| {
        for i in 0..o.len() {
            o.set(i, 2.0 * x.get(i) + y.get(i));
        }
        Ok::<(), ArrayError>(())
    })?;
    assert_eq!(out.to_vec(), vec![10.0, 12.0, 14.0, 26.0, 28.0, 30.0]);
    Ok(())
}

#[test]
fn fancy_indexing_copies() -> anyhow::Result<()> {
    let a = grid()?;
    let idx = Tensor::from_vec(vec![3i64, 0], shape![2])?;
    let rows = a.index_arrays(&[&idx])?;
    assert_eq!(rows.to_vec(), vec![9, 10, 11, 0, 1, 2]);
    rows.fill(-1)?;
    assert_eq!(a.get(&[0, 0])?, 0);
    Ok(())
}

#[test]
fn raw_bytes_round_trip() -> anyhow::Result<()> {
    let a = Tensor::from_vec(vec![1.5f32, -2.0, 4.25], shape![3])?;
    let bytes = a.buffer().to_bytes();
    assert_eq!(bytes.len(), a.num_bytes());
    let back = Buffer::<f32>::from_bytes(&bytes)?;
    let t = Tensor::from_strided(back, shape![3], vec![1].into(), 0)?;
    assert_eq!(t, a);
    Ok(())
}

#[derive(Debug, Clone)]
struct StridedAddProblem {
    shape: Shape,
    reverse_axis: usize,
}

impl Arbitrary for StridedAddProblem {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: ()) -> Self::Strategy {
        (
            prop::collection::vec(1usize..=6, 1..=4).prop_map(Shape::from),
            any::<prop::sample::Index>(),
        )
            .prop_map(|(shape, pick)| {
                let reverse_axis = pick.index(shape.rank());
                StridedAddProblem {
                    shape,
                    reverse_axis,
                }
            })
            .boxed()
    }
}

#[proptest(cases = 64)]
fn add_agrees_across_fast_and_strided_paths(prob: StridedAddProblem) {
    init();
    let StridedAddProblem {
        shape,
        reverse_axis,
    } = prob;
    let a = Tensor::<i64>::from_fn(shape.clone(), |c| c.iter().fold(0, |acc, &x| acc * 7 + x as i64));
    let b = Tensor::<i64>::from_fn(shape.clone(), |c| c.iter().fold(3, |acc, &x| acc * 5 - x as i64));
    let fast = a.add(&b).unwrap();

    // same logical values behind reversed strides
    let mut flip: Vec<SliceArg> = vec![SliceArg::full(); shape.rank()];
    flip[reverse_axis] = SliceArg::rev();
    let a_rev = a.slice(&flip).unwrap().copy().slice(&flip).unwrap();
    let b_t = b.t().copy().t();
    prop_assert_eq!(a_rev.to_vec(), a.to_vec());
    let general = a_rev.add(&b_t).unwrap();

    prop_assert_eq!(fast.to_vec(), general.to_vec());
    prop_assert!(fast == general);
    let elementwise: Vec<i64> = a.to_vec().iter().zip(b.to_vec()).map(|(x, y)| x + y).collect();
    prop_assert_eq!(fast.to_vec(), elementwise);
}

#[proptest(cases = 32)]
fn slice_then_copy_keeps_order(
    #[strategy(2usize..=8)] rows: usize,
    #[strategy(2usize..=8)] cols: usize,
    #[strategy(1isize..=3)] step: isize,
) {
    let a = Tensor::<u32>::from_fn(shape![rows, cols], |c| (c[0] * cols + c[1]) as u32);
    let v = a.slice(&[SliceArg::new(1, Bound::End, step), SliceArg::rev()]).unwrap();
    let c = v.copy();
    prop_assert!(c.is_contiguous());
    prop_assert_eq!(c.shape(), v.shape());

    let mut expected = vec![];
    let mut r = 1;
    while r < rows {
        for k in (0..cols).rev() {
            expected.push((r * cols + k) as u32);
        }
        r += step as usize;
    }
    prop_assert_eq!(c.to_vec(), expected);
}
