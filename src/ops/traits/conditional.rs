//! Conditional operations trait.

use crate::error::Result;
use crate::tensor::Tensor;

/// Conditional operations
pub trait ConditionalOps {
    /// Conditional select into an existing output: `out = cond ? x : y`
    ///
    /// For each output position, writes the element of `x` if the condition is
    /// true (non-zero), otherwise the element of `y`. The three inputs are
    /// broadcast together; `x` and `y` are promoted to a common dtype, which
    /// must equal `out.dtype()`.
    ///
    /// `out` is resized to the broadcast shape if needed (see
    /// [`resize_to_fit`](crate::tensor::resize_to_fit)) and is returned for
    /// chaining.
    ///
    /// # Condition Dtype
    ///
    /// The condition accepts any dtype: zero is false, non-zero is true. Only
    /// Bool conditions are eligible for the typed fast path; `U8` masks and
    /// other numeric conditions are evaluated by the converting fallback.
    ///
    /// # Errors
    ///
    /// - `UnsupportedType` - `x` and `y` have no common dtype, or it differs
    ///   from `out.dtype()`
    /// - `IncompatibleShapes` - `cond`, `x` and `y` cannot be broadcast together,
    ///   or their broadcast shape has more elements than can be addressed
    /// - `MismatchedLayout` - operands disagree on their dense memory order, or
    ///   `out` has elements aliasing the same storage
    /// - `InvalidArgument` - `out` shares its storage with another tensor
    /// - `ResizeFailed` - `out` has the wrong shape and may not be resized
    ///
    /// Every check runs before the first write; on error `out` is unchanged.
    fn where_out<'o>(
        &self,
        cond: &Tensor,
        x: &Tensor,
        y: &Tensor,
        out: &'o mut Tensor,
    ) -> Result<&'o mut Tensor>;

    /// Conditional select: where(cond, x, y) = cond ? x : y
    ///
    /// Allocates an output of the broadcast shape and the promoted dtype of
    /// `x` and `y`, then behaves like [`Self::where_out`]. The output is
    /// row-major unless a rank-4 input is stored channels-last.
    ///
    /// ```
    /// use numr_where::prelude::*;
    ///
    /// let client = CpuClient::new(CpuDevice::new());
    /// let cond = Tensor::from_bools(&[true], &[1]);
    /// let x = Tensor::from_slice(&[1i32, 2, 3], &[3]);
    /// let y = Tensor::from_slice(&[4i32, 5, 6], &[3]);
    /// let out = client.where_cond(&cond, &x, &y).unwrap();
    /// assert_eq!(out.to_vec::<i32>(), [1, 2, 3]);
    /// ```
    fn where_cond(&self, cond: &Tensor, x: &Tensor, y: &Tensor) -> Result<Tensor>;
}
