use crate::{
    collect_logical, ArrayError, Bound, Buffer, DType, Operation, RVec, Shape, StorageView,
    Strides, TensorDType,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Identity of one view descriptor. Views over the same buffer have distinct ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(usize);

impl ViewId {
    fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> usize {
        self.0
    }
}

impl std::fmt::Debug for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{}", self.0)
    }
}

/// A view descriptor over a shared, flat element buffer.
///
/// A tensor is a `StorageView` (shape, strides, offset) paired with a
/// [`Buffer`]. Slicing, transposing, broadcasting and most reshapes produce
/// new tensors over the *same* buffer: writes through one are visible through
/// every other tensor aliasing it. Cloning a `Tensor` clones the handle, not
/// the data; use [`Tensor::copy`] for an independent, contiguous copy.
///
/// No locking discipline is enforced across views. Mutating a buffer through
/// one tensor while another thread reads it through an alias is the caller's
/// responsibility.
pub struct Tensor<T: TensorDType> {
    inner: Arc<Inner<T>>,
}

pub struct Inner<T: TensorDType> {
    id: ViewId,
    view: StorageView,
    buffer: Buffer<T>,
}

impl<T: TensorDType> Clone for Tensor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: TensorDType> Tensor<T> {
    pub(crate) fn from_parts(view: StorageView, buffer: Buffer<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: ViewId::next(),
                view,
                buffer,
            }),
        }
    }

    /// A new descriptor over this tensor's buffer.
    pub(crate) fn with_view(&self, view: StorageView) -> Self {
        Self::from_parts(view, self.inner.buffer.clone())
    }

    /// Applies a view-only operation to this tensor.
    pub(crate) fn apply_view<O: Operation>(&self, op: &O) -> Result<Self, ArrayError> {
        op.check_invariants(self.view())?;
        let view = op.compute_view(self.view())?;
        Ok(self.with_view(view))
    }

    /// Takes ownership of `data`, laid out row-major for `shape`.
    pub fn from_vec(data: Vec<T>, shape: Shape) -> Result<Self, ArrayError> {
        if data.len() != shape.numel() {
            return Err(ArrayError::DataLength {
                shape,
                len: data.len(),
            });
        }
        Ok(Self::from_parts(
            StorageView::row_major(shape),
            Buffer::from_vec(data),
        ))
    }

    pub fn from_slice(data: &[T], shape: Shape) -> Result<Self, ArrayError> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// A view with explicit strides and offset over an existing buffer.
    pub fn from_strided(
        buffer: Buffer<T>,
        shape: Shape,
        strides: Strides,
        offset: usize,
    ) -> Result<Self, ArrayError> {
        if shape.rank() != strides.rank() {
            return Err(ArrayError::RankMismatch {
                accepted: shape.rank()..=shape.rank(),
                actual: strides.rank(),
            });
        }
        let view = StorageView::new(shape, strides, offset);
        view.check_fits(buffer.len())?;
        Ok(Self::from_parts(view, buffer))
    }

    /// Rank-0 tensor holding `value`.
    pub fn scalar(value: T) -> Self {
        Self::from_parts(
            StorageView::row_major(Shape::default()),
            Buffer::from_vec(vec![value]),
        )
    }

    pub fn full(shape: Shape, value: T) -> Self {
        let len = shape.numel();
        Self::from_parts(
            StorageView::row_major(shape),
            Buffer::from_vec(vec![value; len]),
        )
    }

    pub fn zeros(shape: Shape) -> Self {
        Self::full(shape, T::zero())
    }

    pub fn ones(shape: Shape) -> Self {
        Self::full(shape, T::one())
    }

    /// `[0, 1, .., n - 1]` as a rank-1 tensor.
    pub fn arange(n: usize) -> Result<Self, ArrayError> {
        let data = (0..n)
            .map(|i| {
                <T as num_traits::NumCast>::from(i).ok_or_else(|| {
                    ArrayError::InvalidArgument(format!("{} does not fit in {:?}", i, T::dt()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_vec(data, Shape::from([n]))
    }

    /// Fills a new row-major tensor by calling `f` with each coordinate in order.
    pub fn from_fn<F: FnMut(&[usize]) -> T>(shape: Shape, mut f: F) -> Self {
        let data = (0..shape.numel())
            .map(|flat| f(&shape.unravel(flat)))
            .collect::<Vec<_>>();
        Self::from_parts(StorageView::row_major(shape), Buffer::from_vec(data))
    }
}

impl<T: TensorDType> Tensor<T> {
    pub fn id(&self) -> ViewId {
        self.inner.id
    }

    pub fn view(&self) -> &StorageView {
        &self.inner.view
    }

    pub fn buffer(&self) -> &Buffer<T> {
        &self.inner.buffer
    }

    pub fn shape(&self) -> &Shape {
        self.inner.view.shape()
    }

    pub fn strides(&self) -> &Strides {
        self.inner.view.strides()
    }

    pub fn offset(&self) -> usize {
        self.inner.view.offset()
    }

    pub fn rank(&self) -> usize {
        self.inner.view.rank()
    }

    pub fn size(&self) -> usize {
        self.inner.view.size()
    }

    pub fn dt(&self) -> DType {
        T::dt()
    }

    pub fn num_bytes(&self) -> usize {
        self.size() * T::dt().size_of()
    }

    pub fn is_contiguous(&self) -> bool {
        self.inner.view.is_contiguous()
    }

    pub fn is_transposed(&self) -> bool {
        self.inner.view.is_transposed()
    }

    /// Same descriptor: one is a clone of the other.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether both tensors view the same buffer.
    pub fn is_alias_of(&self, other: &Self) -> bool {
        self.buffer().ptr_eq(other.buffer())
    }

    pub fn get(&self, indices: &[isize]) -> Result<T, ArrayError> {
        let address = self.view().ravel(indices)?;
        Ok(self.buffer().read()[address])
    }

    /// Writes a single element through this view.
    pub fn set(&self, indices: &[isize], value: T) -> Result<(), ArrayError> {
        let address = self.view().ravel(indices)?;
        self.buffer().write()[address] = value;
        Ok(())
    }

    /// The only element of a single-element tensor.
    pub fn item(&self) -> Result<T, ArrayError> {
        if self.size() != 1 {
            return Err(ArrayError::InvalidArgument(format!(
                "item() needs exactly one element, tensor {:?} has {}",
                self.shape(),
                self.size()
            )));
        }
        let coords: RVec<usize> = self.shape().iter().map(|_| 0).collect();
        Ok(self.buffer().read()[self.view().address(&coords)])
    }

    /// Elements in logical (row-major) order.
    pub fn to_vec(&self) -> Vec<T> {
        collect_logical(self)
    }

    /// A contiguous copy with its own buffer.
    pub fn copy(&self) -> Self {
        Self::from_parts(
            StorageView::row_major(self.shape().clone()),
            Buffer::from_vec(self.to_vec()),
        )
    }

    /// A view of this tensor with index `i` applied to each leading axis.
    ///
    /// The indexed axes disappear from the result; indexing every axis gives a
    /// rank-0 view of a single element.
    pub fn at(&self, indices: &[isize]) -> Result<Self, ArrayError> {
        if indices.len() > self.rank() {
            return Err(ArrayError::SliceArity {
                given: indices.len(),
                rank: self.rank(),
            });
        }
        let mut offset = self.offset() as isize;
        for (axis, &index) in indices.iter().enumerate() {
            let len = self.shape()[axis];
            let resolved = self.view().absolute_index(Bound::Index(index), axis);
            if resolved < 0 || resolved >= len as isize {
                return Err(ArrayError::IndexOutOfBounds { axis, index, len });
            }
            offset += resolved * self.strides()[axis];
        }
        let k = indices.len();
        let view = StorageView::new(
            self.shape().slice(k..self.rank()),
            self.strides().iter().skip(k).copied().collect(),
            offset as usize,
        );
        Ok(self.with_view(view))
    }
}

impl<T: TensorDType> std::fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.id())
            .field("dt", &self.dt())
            .field("shape", self.shape())
            .field("strides", self.strides())
            .field("offset", &self.offset())
            .field("values", &format_args!("{}", self))
            .finish()
    }
}

impl<T: TensorDType> std::fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values = self.to_vec();
        if self.rank() == 0 {
            return match values.first() {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "[]"),
            };
        }
        write_nested(f, self.shape(), &values, 0)
    }
}

fn write_nested<T: std::fmt::Display>(
    f: &mut std::fmt::Formatter<'_>,
    shape: &Shape,
    values: &[T],
    axis: usize,
) -> std::fmt::Result {
    write!(f, "[")?;
    if axis + 1 == shape.rank() {
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
    } else {
        let block = shape[axis + 1..].iter().product::<usize>();
        for i in 0..shape[axis] {
            if i > 0 {
                write!(f, ", ")?;
            }
            write_nested(f, shape, &values[i * block..(i + 1) * block], axis + 1)?;
        }
    }
    write!(f, "]")
}
