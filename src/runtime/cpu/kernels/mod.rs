//! CPU kernel implementations
//!
//! This module provides low-level compute kernels for CPU operations.
//! Typed kernels are generic over `T: Element`; the converting fallback is
//! generic over the compute dtype only.

pub mod elementwise;
pub mod where_select;

// Re-export all kernel functions for convenient access
pub use elementwise::{RawOperand, where_fallback};
pub use where_select::{SelectPlans, where_broadcast, where_contiguous};
