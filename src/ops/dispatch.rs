//! DType dispatch utilities
//!
//! This module provides the `dispatch_dtype!` macro for runtime type dispatch.
//! Kernels are written once, generic over [`Element`](crate::dtype::Element),
//! and the macro converts a `DType` value into the matching concrete type.
//!
//! # Usage
//!
//! ```
//! use numr_where::dispatch_dtype;
//! use numr_where::dtype::DType;
//!
//! fn elem_size(dtype: DType) -> usize {
//!     dispatch_dtype!(dtype, T => { std::mem::size_of::<T>() })
//! }
//!
//! assert_eq!(elem_size(DType::BF16), 2);
//! assert_eq!(elem_size(DType::Bool), 1);
//! ```
//!
//! ## Supported Types
//!
//! - `F64` -> `f64`, `F32` -> `f32`
//! - `F16` -> `half::f16`, `BF16` -> `half::bf16`
//! - `I64`..`I8` -> `i64`..`i8`
//! - `U64`..`U8` -> `u64`..`u8`
//! - `Bool` -> [`Bool8`](crate::dtype::Bool8)
//!
//! The dtype set is closed, so every arm expands the body and the macro
//! cannot fail.

/// Macro for runtime dtype dispatch to typed operations.
///
/// Executes `$body` with `$T` bound to the Rust element type of `$dtype`.
/// Each arm is a separate monomorphization of the body.
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                type $T = $crate::half::f16;
                $body
            }
            $crate::dtype::DType::BF16 => {
                type $T = $crate::half::bf16;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::Bool => {
                type $T = $crate::dtype::Bool8;
                $body
            }
        }
    };
}
