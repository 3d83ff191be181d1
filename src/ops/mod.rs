//! Tensor operations
//!
//! This module defines the conditional select operation and the pieces it is
//! assembled from.
//!
//! # Design
//!
//! Operations are defined as traits implemented by a runtime client:
//!
//! ```text
//! CpuClient
//!   └── implements ConditionalOps
//!         ├── where_out   (select into a caller-provided output)
//!         └── where_cond  (select into a fresh output)
//! ```
//!
//! A call runs in fixed stages:
//!
//! 1. [`TypePromotion`](crate::dtype::TypePromotion) of the value operands
//! 2. [`broadcast_shapes`] of condition and values
//! 3. layout checks and [`resize_to_fit`](crate::tensor::resize_to_fit) of the output
//! 4. one [`BroadcastPlan`] per operand and [`SelectPath::choose`]
//! 5. the selected CPU kernel
//!
//! Every failure happens before stage 5, so a rejected call never touches the
//! output.

pub mod broadcast;
#[cfg(feature = "cpu")]
pub(crate) mod cpu;
mod dispatch;
mod select;
pub mod traits;

pub use broadcast::{BroadcastPlan, StridedIndexes, broadcast_shapes};
pub use select::SelectPath;
pub use traits::ConditionalOps;
