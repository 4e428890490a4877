use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use crate::{ArrayError, TensorDType};

/// Flat element storage shared by every view that aliases it.
///
/// Cloning a `Buffer` is shallow: the clone refers to the same elements. The
/// elements are freed once the last handle is dropped. Use
/// [`Buffer::deep_clone`] for an independent copy.
pub struct Buffer<T: TensorDType> {
    inner: Arc<RwLock<Vec<T>>>,
}

impl<T: TensorDType> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: TensorDType> Buffer<T> {
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    pub fn from_slice(data: &[T]) -> Self {
        Self::from_vec(data.to_vec())
    }

    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![T::zero(); len])
    }

    /// Reinterprets little-endian native bytes as elements.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArrayError> {
        let size = std::mem::size_of::<T>();
        if bytes.len() % size != 0 {
            return Err(ArrayError::InvalidArgument(format!(
                "{} bytes is not a whole number of {:?} elements",
                bytes.len(),
                T::dt()
            )));
        }
        Ok(Self::from_vec(bytemuck::pod_collect_to_vec(bytes)))
    }

    /// Shared read access. Several readers may hold the buffer at once,
    /// including readers on the same thread.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.inner.read_recursive()
    }

    /// Exclusive write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.inner.write()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address of the shared allocation, stable for the buffer's lifetime.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles (owning tensors and views) on this buffer.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn deep_clone(&self) -> Self {
        Self::from_vec(self.read().clone())
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.read().clone()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice::<T, u8>(&self.read()).to_vec()
    }

    pub fn dump(&self, full: bool) -> String {
        let data = self.read();
        let length = if data.len() < 64 { data.len() } else { 64 };
        if full || length == data.len() {
            format!("{:?}", &data[..])
        } else {
            format!("{:?}...{:?}", &data[..length], &data[data.len() - length..])
        }
    }
}

impl<T: TensorDType> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("dt", &T::dt())
            .field("data", &self.dump(false))
            .finish()
    }
}

/// True when both handles refer to the same allocation, whatever their element types.
pub(crate) fn same_buffer<A: TensorDType, B: TensorDType>(a: &Buffer<A>, b: &Buffer<B>) -> bool {
    a.addr() == b.addr()
}
