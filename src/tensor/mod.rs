//! Tensor types and operations
//!
//! This module provides the core `Tensor` type, which represents an n-dimensional
//! array in host memory, together with the layout and resize machinery that
//! output-producing operations rely on.

mod core;
mod layout;
mod resize;
mod storage;

pub use core::{Tensor, same_memory_order};
pub use layout::{Layout, MemoryFormat, Shape, Strides, checked_elem_count};
pub use resize::{ShapeDynamism, resize_to_fit};
pub use storage::Storage;

pub(crate) use layout::STACK_DIMS;
