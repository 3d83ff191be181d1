//! Storage: host memory with Arc-based sharing

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Storage for tensor data
///
/// Storage wraps a host buffer with reference counting, enabling zero-copy
/// views (transpose, broadcast, etc.) that share the underlying buffer.
/// Writing requires the buffer to be unshared, see [`Storage::bytes_mut`].
///
/// The buffer is kept as `u64` words so that every element type is properly
/// aligned when the bytes are reinterpreted.
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    /// Backing words; at least `len * dtype.size_in_bytes()` bytes
    words: Vec<u64>,
    /// Number of elements (not bytes)
    len: usize,
    /// Element type
    dtype: DType,
}

impl Storage {
    /// Create new zero-filled storage for `len` elements of `dtype`
    pub fn new(len: usize, dtype: DType) -> Self {
        let size_bytes = len * dtype.size_in_bytes();
        Self {
            inner: Arc::new(StorageInner {
                words: vec![0u64; size_bytes.div_ceil(8)],
                len,
                dtype,
            }),
        }
    }

    /// Create storage from existing data with inferred dtype
    pub fn from_slice<T: Element>(data: &[T]) -> Self {
        let mut storage = Self::new(data.len(), T::DTYPE);
        // Freshly created storage has exactly one owner
        if let Some(dst) = storage.typed_mut::<T>() {
            dst.copy_from_slice(data);
        }
        storage
    }

    /// Create storage from raw bytes with explicit dtype
    ///
    /// Returns an error if `data` is not a whole number of elements.
    pub fn from_bytes(data: &[u8], dtype: DType) -> Result<Self> {
        let elem_size = dtype.size_in_bytes();
        if data.len() % elem_size != 0 {
            return Err(Error::InvalidArgument {
                arg: "data",
                reason: format!(
                    "{} bytes is not a multiple of the {dtype} element size {elem_size}",
                    data.len()
                ),
            });
        }

        let mut storage = Self::new(data.len() / elem_size, dtype);
        if let Some(dst) = storage.bytes_mut() {
            dst.copy_from_slice(data);
        }
        Ok(storage)
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.len * self.inner.dtype.size_in_bytes()
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check if this is the only reference
    #[inline]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    /// Check if two handles refer to the same buffer
    #[inline]
    pub fn same_buffer(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Raw bytes of every element
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        let size = self.size_in_bytes();
        &bytemuck::cast_slice::<u64, u8>(&self.inner.words)[..size]
    }

    /// Mutable raw bytes, or None if the buffer is shared with another handle
    #[inline]
    pub fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        let inner = Arc::get_mut(&mut self.inner)?;
        let size = inner.len * inner.dtype.size_in_bytes();
        Some(&mut bytemuck::cast_slice_mut::<u64, u8>(&mut inner.words)[..size])
    }

    /// Elements viewed as `T`, or None if `T` does not match the storage dtype
    #[inline]
    pub fn typed<T: Element>(&self) -> Option<&[T]> {
        if T::DTYPE != self.inner.dtype {
            return None;
        }
        Some(bytemuck::cast_slice(self.bytes()))
    }

    /// Mutable elements viewed as `T`
    ///
    /// None if `T` does not match the storage dtype or the buffer is shared.
    #[inline]
    pub fn typed_mut<T: Element>(&mut self) -> Option<&mut [T]> {
        if T::DTYPE != self.inner.dtype {
            return None;
        }
        Some(bytemuck::cast_slice_mut(self.bytes_mut()?))
    }
}

impl Clone for Storage {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.inner.len)
            .field("dtype", &self.inner.dtype)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
