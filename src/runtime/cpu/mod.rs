//! CPU runtime implementation
//!
//! The CPU runtime keeps tensors in host memory and provides the reference
//! implementation of every operation.
//!
//! # Broadcasting
//!
//! NumPy-style broadcasting is fully supported: shapes are right-aligned and
//! expanded where an operand has size 1 or a missing leading dimension.
//!
//! # Non-contiguous Tensors
//!
//! Operations handle non-contiguous tensors via strided memory access. For
//! broadcasting, a strided kernel is used that correctly handles stride-0
//! dimensions (where a single value is broadcast across the dimension).
//!
//! # Parallelism
//!
//! With the `rayon` feature, large same-dtype selections are split across the
//! rayon thread pool according to the client's [`ParallelismConfig`].

mod client;
mod device;
pub(crate) mod kernels;

pub use crate::tensor::Tensor;
pub use client::{CpuClient, ParallelismConfig};
pub use device::CpuDevice;
