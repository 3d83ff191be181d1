//! Broadcasting: common output shapes and per-operand index plans
//!
//! Shapes are right-aligned and compared from the trailing dimension backward.
//! Each input then gets a [`BroadcastPlan`]: its strides padded to the output
//! rank with zeros on every broadcast dimension. [`StridedIndexes`] walks
//! several plans in lockstep, producing one storage offset per operand for each
//! output position in row-major order.

use crate::error::{Error, Result};
use crate::tensor::{Layout, STACK_DIMS, Shape, Strides, checked_elem_count};
use smallvec::{SmallVec, smallvec};

/// Compute the broadcast shape of any number of shapes
///
/// Missing leading dimensions count as 1. Per dimension, sizes must be equal
/// or 1, and the result must have an addressable element count; otherwise
/// every participating shape is reported in [`Error::IncompatibleShapes`].
///
/// # Example
/// ```
/// use numr_where::ops::broadcast_shapes;
/// let shape = broadcast_shapes(&[&[1], &[2, 3], &[3]]).unwrap();
/// assert_eq!(shape.as_slice(), &[2, 3]);
/// assert!(broadcast_shapes(&[&[2], &[3]]).is_err());
/// ```
pub fn broadcast_shapes(shapes: &[&[usize]]) -> Result<Shape> {
    let max_ndim = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut result: Shape = SmallVec::with_capacity(max_ndim);

    // Iterate from right to left
    for i in 0..max_ndim {
        let mut size = 1usize;
        for shape in shapes {
            let dim = if i < shape.len() { shape[shape.len() - 1 - i] } else { 1 };
            if dim == size || dim == 1 {
                continue;
            }
            if size != 1 {
                return Err(Error::incompatible_shapes(shapes));
            }
            size = dim;
        }
        result.push(size);
    }

    result.reverse();
    if checked_elem_count(&result).is_none() {
        return Err(Error::incompatible_shapes(shapes));
    }
    Ok(result)
}

/// Mapping from output positions to one operand's storage offsets
///
/// Built from the operand's own layout, so operands stored in different
/// physical orders (transposed, channels-last, sliced) are read correctly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastPlan {
    strides: Strides,
    offset: usize,
    identity: bool,
}

impl BroadcastPlan {
    /// Plan reading `input` at every position of a tensor laid out as `out`
    ///
    /// The plan is the identity when `input` already has the output shape and
    /// shares a dense memory format with `out`: output storage offset `i` then
    /// reads input storage offset `i`.
    pub fn new(input: &Layout, out: &Layout) -> Result<Self> {
        let expanded = input
            .broadcast_to(out.shape())
            .ok_or_else(|| Error::incompatible_shapes(&[input.shape(), out.shape()]))?;

        let identity = input.shape() == out.shape() && {
            let (in_row_major, in_channels_last) = input.memory_formats();
            let (out_row_major, out_channels_last) = out.memory_formats();
            (in_row_major && out_row_major) || (in_channels_last && out_channels_last)
        };

        Ok(Self {
            strides: expanded.strides().iter().copied().collect(),
            offset: expanded.offset(),
            identity,
        })
    }

    /// Plan walking a layout over its own shape
    pub fn of_layout(layout: &Layout) -> Self {
        Self {
            strides: layout.strides().iter().copied().collect(),
            offset: layout.offset(),
            identity: layout.is_contiguous() || layout.is_channels_last(),
        }
    }

    /// True when output storage offsets map one-to-one onto input storage offsets
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Strides per output dimension (0 on broadcast dimensions)
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Storage offset of the first element
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Storage offset for a multi-dimensional output index
    pub fn index_of(&self, indices: &[usize]) -> usize {
        let linear = indices
            .iter()
            .zip(self.strides.iter())
            .fold(self.offset as isize, |acc, (&i, &st)| acc + i as isize * st);
        linear as usize
    }
}

/// Lockstep iterator over `N` plans sharing one output shape
///
/// Yields `[usize; N]`: the storage offset of each operand for consecutive
/// output positions in row-major order. Offsets are updated incrementally, so
/// the hot loop does no multiplication.
pub struct StridedIndexes<'a, const N: usize> {
    shape: &'a [usize],
    strides: [&'a [isize]; N],
    counter: SmallVec<[usize; STACK_DIMS]>,
    current: [isize; N],
    remaining: usize,
}

impl<'a, const N: usize> StridedIndexes<'a, N> {
    /// Iterate from the first output position
    pub fn new(shape: &'a [usize], plans: [&'a BroadcastPlan; N]) -> Self {
        Self::starting_at(shape, plans, 0)
    }

    /// Iterate from output position `start` (row-major linear index)
    ///
    /// Used to hand disjoint ranges of the output to parallel workers.
    pub fn starting_at(shape: &'a [usize], plans: [&'a BroadcastPlan; N], start: usize) -> Self {
        let total: usize = shape.iter().product();
        let start = start.min(total);

        let mut counter: SmallVec<[usize; STACK_DIMS]> = smallvec![0; shape.len()];
        if total > 0 {
            let mut rest = start;
            for dim in (0..shape.len()).rev() {
                counter[dim] = rest % shape[dim];
                rest /= shape[dim];
            }
        }

        let current = plans.map(|plan| plan.index_of(&counter) as isize);

        Self {
            shape,
            strides: plans.map(|plan| plan.strides()),
            counter,
            current,
            remaining: total - start,
        }
    }
}

impl<const N: usize> Iterator for StridedIndexes<'_, N> {
    type Item = [usize; N];

    #[inline]
    fn next(&mut self) -> Option<[usize; N]> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let item = self.current.map(|c| c as usize);

        // Increment multi-dimensional index with incremental offset updates
        for dim in (0..self.shape.len()).rev() {
            self.counter[dim] += 1;
            for (cur, strides) in self.current.iter_mut().zip(self.strides.iter()) {
                *cur += strides[dim];
            }
            if self.counter[dim] < self.shape[dim] {
                break;
            }

            // Reset this dimension and adjust offsets
            self.counter[dim] = 0;
            let extent = self.shape[dim] as isize;
            for (cur, strides) in self.current.iter_mut().zip(self.strides.iter()) {
                *cur -= extent * strides[dim];
            }
        }

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const N: usize> ExactSizeIterator for StridedIndexes<'_, N> {}
