//! Layout: shape, strides, and offset for tensor memory layout

use smallvec::SmallVec;
use std::fmt;

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a tensor
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Strides type: element offsets between consecutive elements along each dimension
/// Signed so views may walk storage backwards
/// NOTE: Strides are in ELEMENTS, not bytes
pub type Strides = SmallVec<[isize; STACK_DIMS]>;

/// Element count of `shape`, or None when the shape cannot be addressed
///
/// Dense strides are products of the dimension sizes (size 0 counted as 1),
/// so that product must also fit in `isize`.
pub fn checked_elem_count(shape: &[usize]) -> Option<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim.max(1)))
        .filter(|&span| span <= isize::MAX as usize)?;
    Some(shape.iter().product())
}

/// Dense element orderings a layout can be recognised as
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemoryFormat {
    /// Row-major: the last dimension varies fastest
    Contiguous,
    /// Rank-4 NCHW shape stored in NHWC order: the channel dimension varies fastest
    ChannelsLast,
    /// Any other stride pattern (transposed or broadcast views, gaps)
    Strided,
}

/// Layout describes the memory layout of a tensor
///
/// A tensor's elements are stored in a contiguous buffer, but not necessarily
/// in row-major order. The layout specifies how to compute the memory address
/// of any element given its indices.
///
/// Address of element at indices [i0, i1, ..., in]:
///   offset + i0 * strides[0] + i1 * strides[1] + ... + in * strides[n]
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    /// Shape: size along each dimension
    shape: Shape,
    /// Strides: offset (in elements) between consecutive elements along each dimension
    strides: Strides,
    /// Offset: starting element index in the underlying storage
    offset: usize,
}

impl Layout {
    /// Create a new contiguous (row-major/C-order) layout from a shape
    ///
    /// # Example
    /// ```
    /// use numr_where::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4]);
    /// assert_eq!(layout.shape(), &[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Self {
        let shape: Shape = shape.iter().copied().collect();
        let strides = Self::compute_contiguous_strides(&shape);
        Self {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create a dense channels-last layout for a rank-4 (N, C, H, W) shape
    ///
    /// Returns None for any other rank.
    ///
    /// # Example
    /// ```
    /// use numr_where::tensor::Layout;
    /// let layout = Layout::channels_last(&[2, 3, 4, 5]).unwrap();
    /// assert_eq!(layout.strides(), &[60, 1, 15, 3]);
    /// ```
    pub fn channels_last(shape: &[usize]) -> Option<Self> {
        let shape: Shape = shape.iter().copied().collect();
        let strides = Self::compute_channels_last_strides(&shape)?;
        Some(Self {
            shape,
            strides,
            offset: 0,
        })
    }

    /// Create a layout with explicit shape, strides, and offset
    pub fn new(shape: Shape, strides: Strides, offset: usize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Create a scalar (0-dimensional) layout
    pub fn scalar() -> Self {
        Self {
            shape: SmallVec::new(),
            strides: SmallVec::new(),
            offset: 0,
        }
    }

    /// Compute contiguous strides for a given shape (row-major order)
    fn compute_contiguous_strides(shape: &[usize]) -> Strides {
        if shape.is_empty() {
            return SmallVec::new();
        }

        let mut strides: Strides = SmallVec::with_capacity(shape.len());
        let mut stride = 1isize;

        // Compute strides from last dimension to first
        for &dim in shape.iter().rev() {
            strides.push(stride);
            stride *= dim.max(1) as isize;
        }

        strides.reverse();
        strides
    }

    /// Compute channels-last strides: C fastest, then W, H, N
    fn compute_channels_last_strides(shape: &[usize]) -> Option<Strides> {
        let &[_, c, h, w] = shape else {
            return None;
        };
        let (c, h, w) = (c.max(1) as isize, h.max(1) as isize, w.max(1) as isize);
        Some(SmallVec::from_slice(&[h * w * c, 1, w * c, c]))
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Get the offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Check if the tensor is a scalar (0 dimensions)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Check if memory is contiguous (row-major order) and starts at offset 0
    ///
    /// Strides of size-1 dimensions are ignored: they are never stepped along.
    pub fn is_contiguous(&self) -> bool {
        if self.is_scalar() {
            return self.offset == 0;
        }

        let expected = Self::compute_contiguous_strides(&self.shape);
        self.offset == 0 && self.strides_match(&expected)
    }

    /// Check if memory is dense channels-last order and starts at offset 0
    pub fn is_channels_last(&self) -> bool {
        match Self::compute_channels_last_strides(&self.shape) {
            Some(expected) => self.offset == 0 && self.strides_match(&expected),
            None => false,
        }
    }

    fn strides_match(&self, expected: &[isize]) -> bool {
        self.shape
            .iter()
            .zip(self.strides.iter().zip(expected))
            .all(|(&dim, (&st, &exp))| dim <= 1 || st == exp)
    }

    /// Dense memory formats this layout satisfies, as (row-major, channels-last)
    ///
    /// A rank-4 layout with a single non-unit dimension (e.g. `[1, 1, 1, 8]`)
    /// matches both.
    pub fn memory_formats(&self) -> (bool, bool) {
        (self.is_contiguous(), self.is_channels_last())
    }

    /// Classify the layout, preferring row-major when both dense formats match
    pub fn memory_format(&self) -> MemoryFormat {
        match self.memory_formats() {
            (true, _) => MemoryFormat::Contiguous,
            (false, true) => MemoryFormat::ChannelsLast,
            (false, false) => MemoryFormat::Strided,
        }
    }

    /// Check whether two distinct indices can address the same storage element
    ///
    /// True when any dimension of size > 1 has stride 0, which is what
    /// broadcast views look like.
    pub fn has_internal_overlap(&self) -> bool {
        self.shape
            .iter()
            .zip(self.strides.iter())
            .any(|(&dim, &st)| dim > 1 && st == 0)
    }

    /// Lowest and highest storage offsets addressed by a non-empty layout
    ///
    /// Negative strides pull the lower bound below `offset`, so the lower bound
    /// may be negative. Returns None if the shape has a zero dimension or the
    /// offsets overflow `isize`.
    pub fn address_bounds(&self) -> Option<(isize, isize)> {
        if self.shape.contains(&0) {
            return None;
        }
        let base = isize::try_from(self.offset).ok()?;
        self.shape
            .iter()
            .zip(self.strides.iter())
            .try_fold((base, base), |(lo, hi), (&dim, &st)| {
                let span = isize::try_from(dim - 1).ok()?.checked_mul(st)?;
                if span < 0 {
                    Some((lo.checked_add(span)?, hi))
                } else {
                    Some((lo, hi.checked_add(span)?))
                }
            })
    }

    /// Normalize a dimension index (handle negative indices)
    pub fn normalize_dim(&self, d: isize) -> Option<usize> {
        let ndim = self.ndim() as isize;
        let idx = if d < 0 { ndim + d } else { d };
        if idx >= 0 && idx < ndim {
            Some(idx as usize)
        } else {
            None
        }
    }

    /// Compute the linear index (element offset) for given indices
    pub fn index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.ndim() {
            return None;
        }

        // Check bounds
        for (idx, &dim) in indices.iter().zip(self.shape.iter()) {
            if *idx >= dim {
                return None;
            }
        }

        let mut linear = self.offset as isize;
        for (&idx, &stride) in indices.iter().zip(self.strides.iter()) {
            linear += idx as isize * stride;
        }

        Some(linear as usize)
    }

    /// Create a transposed layout (swap two dimensions)
    pub fn transpose(&self, dim0: isize, dim1: isize) -> Option<Self> {
        let d0 = self.normalize_dim(dim0)?;
        let d1 = self.normalize_dim(dim1)?;

        let mut new_shape = self.shape.clone();
        let mut new_strides = self.strides.clone();

        new_shape.swap(d0, d1);
        new_strides.swap(d0, d1);

        Some(Self {
            shape: new_shape,
            strides: new_strides,
            offset: self.offset,
        })
    }

    /// Create a permuted layout: dimension `i` of the result is `dims[i]` of self
    ///
    /// Returns None unless `dims` is a permutation of `0..ndim`.
    pub fn permute(&self, dims: &[usize]) -> Option<Self> {
        if dims.len() != self.ndim() {
            return None;
        }
        let mut seen: SmallVec<[bool; STACK_DIMS]> = SmallVec::from_elem(false, dims.len());
        for &d in dims {
            if d >= dims.len() || seen[d] {
                return None;
            }
            seen[d] = true;
        }

        Some(Self {
            shape: dims.iter().map(|&d| self.shape[d]).collect(),
            strides: dims.iter().map(|&d| self.strides[d]).collect(),
            offset: self.offset,
        })
    }

    /// Create a reshaped layout (if contiguous)
    ///
    /// Returns None if the tensor is not contiguous or shapes don't match
    pub fn reshape(&self, new_shape: &[usize]) -> Option<Self> {
        // Must be contiguous to reshape without copying
        if !self.is_contiguous() {
            return None;
        }

        // Element count must match
        if checked_elem_count(new_shape)? != self.elem_count() {
            return None;
        }

        Some(Self::contiguous(new_shape))
    }

    /// Create a layout for elements `start..start + length` of one dimension
    pub fn narrow(&self, dim: isize, start: usize, length: usize) -> Option<Self> {
        let d = self.normalize_dim(dim)?;
        if start.checked_add(length)? > self.shape[d] {
            return None;
        }

        let mut new_shape = self.shape.clone();
        new_shape[d] = length;
        let offset = self.offset as isize + start as isize * self.strides[d];

        Some(Self {
            shape: new_shape,
            strides: self.strides.clone(),
            offset: offset as usize,
        })
    }

    /// Create a broadcast layout to a target shape
    ///
    /// Returns None if shapes are not broadcastable or the target has more
    /// elements than can be addressed
    pub fn broadcast_to(&self, target: &[usize]) -> Option<Self> {
        if target.len() < self.ndim() {
            return None;
        }
        checked_elem_count(target)?;

        let mut new_shape = Shape::new();
        let mut new_strides = Strides::new();

        // Pad with leading 1s
        let pad = target.len() - self.ndim();
        for &t in &target[..pad] {
            new_shape.push(t);
            new_strides.push(0); // Stride 0 for broadcast dimensions
        }

        // Check compatibility and compute strides
        for ((&s, &st), &t) in self
            .shape
            .iter()
            .zip(self.strides.iter())
            .zip(&target[pad..])
        {
            if s == t {
                new_shape.push(t);
                new_strides.push(st);
            } else if s == 1 {
                new_shape.push(t);
                new_strides.push(0); // Broadcast: stride 0
            } else {
                return None; // Incompatible shapes
            }
        }

        Some(Self::new(new_shape, new_strides, self.offset))
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.offset
        )
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.shape.as_slice())
    }
}
