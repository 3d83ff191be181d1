//! Core Tensor type

use super::{Layout, ShapeDynamism, Storage, checked_elem_count};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::ops::broadcast::{BroadcastPlan, StridedIndexes};
use std::fmt;

/// N-dimensional array in host memory
///
/// `Tensor` consists of:
/// - **Storage**: Reference-counted host buffer
/// - **Layout**: Shape, strides, and offset defining the view into storage
/// - **DType**: Element type (determined at runtime)
/// - **ShapeDynamism**: Whether the tensor may be resized when used as an output
///
/// # Zero-Copy Views
///
/// Operations like `transpose`, `permute`, and `broadcast_to` create new tensors
/// that share the same underlying storage. A tensor can only be written to
/// while no other handle shares its storage.
///
/// # Example
///
/// ```
/// use numr_where::tensor::Tensor;
///
/// let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2]);
/// let b = a.transpose(-1, -2).unwrap(); // Zero-copy, shares storage with a
/// assert_eq!(b.to_vec::<f32>(), [1.0, 3.0, 2.0, 4.0]);
/// ```
pub struct Tensor {
    /// Host memory
    storage: Storage,
    /// Shape, strides, offset
    layout: Layout,
    /// Resize policy when used as an output
    dynamism: ShapeDynamism,
}

impl Tensor {
    /// Create a tensor from storage and layout
    ///
    /// Returns an error if the layout addresses elements outside the storage,
    /// in either direction, or has more elements than can be addressed.
    pub fn from_parts(storage: Storage, layout: Layout) -> Result<Self> {
        let out_of_bounds = |reason: String| Error::InvalidArgument {
            arg: "layout",
            reason,
        };
        let numel = checked_elem_count(layout.shape())
            .ok_or_else(|| out_of_bounds(format!("{layout:?} has too many elements")))?;

        if numel > 0 {
            let (lo, hi) = layout
                .address_bounds()
                .ok_or_else(|| out_of_bounds(format!("{layout:?} overflows storage offsets")))?;
            if lo < 0 {
                return Err(out_of_bounds(format!(
                    "{layout:?} addresses element {lo}, before the start of storage"
                )));
            }
            if hi as usize >= storage.len() {
                return Err(out_of_bounds(format!(
                    "{layout:?} needs {} elements but storage holds {}",
                    hi + 1,
                    storage.len()
                )));
            }
        }

        Ok(Self {
            storage,
            layout,
            dynamism: ShapeDynamism::default(),
        })
    }

    /// Create a tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape).expect("Tensor::from_slice failed")
    }

    /// Create a tensor from a slice of data (fallible version)
    pub fn try_from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        let expected_len = checked_elem_count(shape);
        if expected_len != Some(data.len()) {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        Ok(Self {
            storage: Storage::from_slice(data),
            layout: Layout::contiguous(shape),
            dynamism: ShapeDynamism::default(),
        })
    }

    /// Create a Bool tensor from Rust booleans
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    pub fn from_bools(data: &[bool], shape: &[usize]) -> Self {
        let bytes: Vec<crate::dtype::Bool8> = data.iter().map(|&b| b.into()).collect();
        Self::from_slice(&bytes, shape)
    }

    /// Create a zero-filled contiguous tensor
    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        let layout = Layout::contiguous(shape);
        Self {
            storage: Storage::new(layout.elem_count(), dtype),
            layout,
            dynamism: ShapeDynamism::default(),
        }
    }

    /// Create a zero-filled tensor in channels-last order
    ///
    /// Returns an error unless `shape` has rank 4.
    pub fn zeros_channels_last(shape: &[usize], dtype: DType) -> Result<Self> {
        let layout = Layout::channels_last(shape).ok_or(Error::InvalidDimension {
            dim: 4,
            ndim: shape.len(),
        })?;
        Ok(Self {
            storage: Storage::new(layout.elem_count(), dtype),
            layout,
            dynamism: ShapeDynamism::default(),
        })
    }

    /// Create an empty (0-element) output tensor that `where_out` may resize
    pub fn empty(dtype: DType) -> Self {
        Self::zeros(&[0], dtype)
    }

    /// Set the resize policy
    pub fn with_dynamism(mut self, dynamism: ShapeDynamism) -> Self {
        self.dynamism = dynamism;
        self
    }

    // ===== Accessors =====

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Resize policy
    #[inline]
    pub fn dynamism(&self) -> ShapeDynamism {
        self.dynamism
    }

    /// Check if memory is row-major contiguous
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    pub(crate) fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub(crate) fn replace_parts(&mut self, storage: Storage, layout: Layout) {
        self.storage = storage;
        self.layout = layout;
    }

    pub(crate) fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    // ===== Views =====

    fn view_with(&self, layout: Layout) -> Self {
        Self {
            storage: self.storage.clone(),
            layout,
            dynamism: ShapeDynamism::Static,
        }
    }

    /// Swap two dimensions (zero-copy)
    pub fn transpose(&self, dim0: isize, dim1: isize) -> Result<Self> {
        let layout = self.layout.transpose(dim0, dim1).ok_or_else(|| {
            let bad = if self.layout.normalize_dim(dim0).is_none() { dim0 } else { dim1 };
            Error::InvalidDimension {
                dim: bad,
                ndim: self.ndim(),
            }
        })?;
        Ok(self.view_with(layout))
    }

    /// Reorder dimensions (zero-copy)
    pub fn permute(&self, dims: &[usize]) -> Result<Self> {
        let layout = self.layout.permute(dims).ok_or_else(|| Error::InvalidArgument {
            arg: "dims",
            reason: format!("{dims:?} is not a permutation of 0..{}", self.ndim()),
        })?;
        Ok(self.view_with(layout))
    }

    /// Reshape a contiguous tensor (zero-copy)
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        let layout = self
            .layout
            .reshape(shape)
            .ok_or_else(|| Error::shape_mismatch(shape, self.shape()))?;
        Ok(self.view_with(layout))
    }

    /// Restrict one dimension to `start..start + length` (zero-copy)
    pub fn narrow(&self, dim: isize, start: usize, length: usize) -> Result<Self> {
        let layout = self
            .layout
            .narrow(dim, start, length)
            .ok_or_else(|| Error::InvalidArgument {
                arg: "length",
                reason: format!(
                    "narrow({dim}, {start}, {length}) out of range for {:?}",
                    self.shape()
                ),
            })?;
        Ok(self.view_with(layout))
    }

    /// Broadcast to a larger shape (zero-copy, stride 0 on expanded dimensions)
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        let layout = self
            .layout
            .broadcast_to(shape)
            .ok_or_else(|| Error::incompatible_shapes(&[self.shape(), shape]))?;
        Ok(self.view_with(layout))
    }

    /// Materialize into a fresh row-major buffer
    pub fn contiguous(&self) -> Self {
        let elem_size = self.dtype().size_in_bytes();
        let src = self.storage.bytes();
        let mut storage = Storage::new(self.numel(), self.dtype());
        // Freshly created storage has exactly one owner
        if let Some(dst) = storage.bytes_mut() {
            let plan = BroadcastPlan::of_layout(&self.layout);
            let offsets = StridedIndexes::new(self.shape(), [&plan]);
            for (chunk, [index]) in dst.chunks_exact_mut(elem_size).zip(offsets) {
                chunk.copy_from_slice(&src[index * elem_size..(index + 1) * elem_size]);
            }
        }

        Self {
            storage,
            layout: Layout::contiguous(self.shape()),
            dynamism: ShapeDynamism::default(),
        }
    }

    // ===== Data access =====

    /// Copy elements out in logical (row-major) order
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match the tensor dtype. For a fallible
    /// alternative, use [`Self::try_to_vec`].
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        self.try_to_vec().expect("Tensor::to_vec failed")
    }

    /// Copy elements out in logical (row-major) order (fallible version)
    pub fn try_to_vec<T: Element>(&self) -> Result<Vec<T>> {
        let data = self.storage.typed::<T>().ok_or(Error::DTypeMismatch {
            lhs: self.dtype(),
            rhs: T::DTYPE,
        })?;
        let plan = BroadcastPlan::of_layout(&self.layout);
        Ok(StridedIndexes::new(self.shape(), [&plan])
            .map(|[i]| data[i])
            .collect())
    }

    /// Copy a Bool tensor out as Rust booleans
    pub fn to_bools(&self) -> Result<Vec<bool>> {
        Ok(self
            .try_to_vec::<crate::dtype::Bool8>()?
            .into_iter()
            .map(bool::from)
            .collect())
    }
}

impl Clone for Tensor {
    /// Clone shares storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            layout: self.layout.clone(),
            dynamism: self.dynamism,
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("dtype", &self.dtype())
            .field("dynamism", &self.dynamism)
            .finish()
    }
}

/// Check whether tensors agree on a dense memory order
///
/// True when one dense format (row-major or channels-last) is matched by every
/// tensor that is dense at all. Strided views are exempt: kernels read them
/// through their own strides.
pub fn same_memory_order(tensors: &[&Tensor]) -> bool {
    let mut row_major_ok = true;
    let mut channels_last_ok = true;
    for tensor in tensors {
        match tensor.layout().memory_formats() {
            (false, false) => {}
            (row_major, channels_last) => {
                row_major_ok &= row_major;
                channels_last_ok &= channels_last;
            }
        }
    }
    row_major_ok || channels_last_ok
}
