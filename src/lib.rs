//! # numr-where
//!
//! **Broadcasting, type-promoting conditional select over n-dimensional arrays.**
//!
//! numr-where implements `where(cond, x, y)`: for every output position, take
//! the element of `x` where the condition holds and the element of `y`
//! elsewhere. The three operands may differ in shape (NumPy-style broadcasting)
//! and `x` and `y` may differ in dtype (type promotion).
//!
//! ## Features
//!
//! - **Tensors**: N-dimensional arrays with strided views, broadcasting and
//!   channels-last layouts
//! - **Multiple dtypes**: f64, f32, f16, bf16, signed and unsigned integers, bool
//! - **Fast path**: same-dtype operands with a Bool condition run a typed loop,
//!   split across threads for large outputs
//! - **Fallback**: every other dtype combination converts per element through
//!   the compute dtype
//!
//! ## Quick Start
//!
//! ```rust
//! use numr_where::prelude::*;
//!
//! let client = CpuClient::new(CpuDevice::new());
//!
//! let cond = Tensor::from_bools(&[true, false, true], &[3]);
//! let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3]);
//! let y = Tensor::from_slice(&[0.0f32], &[1]);
//!
//! let mut out = Tensor::empty(DType::F32);
//! client.where_out(&cond, &x, &y, &mut out)?;
//! assert_eq!(out.to_vec::<f32>(), [1.0, 0.0, 3.0]);
//! # Ok::<(), numr_where::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cpu` (default): CPU backend
//! - `rayon` (default): Multi-threaded CPU operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod ops;
pub mod runtime;
pub mod tensor;

#[doc(hidden)]
pub use half;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{Bool8, DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::ops::{ConditionalOps, SelectPath};
    pub use crate::tensor::{Layout, MemoryFormat, ShapeDynamism, Tensor};

    #[cfg(feature = "cpu")]
    pub use crate::runtime::cpu::{CpuClient, CpuDevice, ParallelismConfig};
}
