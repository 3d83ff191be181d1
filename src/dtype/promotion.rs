//! Type promotion rules for mixed-dtype operations

use super::DType;
use crate::error::{Error, Result};

/// Promote two dtypes to a common dtype
///
/// - Bool is absorbed by any other type
/// - Floats always win over integers; among floats the wider wins, and F16
///   meeting BF16 promotes to F32 since neither holds the other
/// - Among integers of one signedness the wider wins
/// - Signed meets unsigned: the signed type if it is strictly wider, otherwise
///   the signed type twice the unsigned width. There is no signed type wider
///   than 64 bits, so any signed integer meeting U64 is rejected.
pub fn promote(lhs: DType, rhs: DType) -> Result<DType> {
    use DType::*;

    if lhs == rhs {
        return Ok(lhs);
    }

    match (lhs, rhs) {
        (Bool, other) | (other, Bool) => Ok(other),

        (F16, BF16) | (BF16, F16) => Ok(F32),
        (a, b) if a.is_float() && b.is_float() => Ok(if a.bits() >= b.bits() { a } else { b }),
        (a, b) if a.is_float() && b.is_int() => Ok(a),
        (a, b) if a.is_int() && b.is_float() => Ok(b),

        (a, b) if a.is_signed_int() == b.is_signed_int() => {
            Ok(if a.bits() >= b.bits() { a } else { b })
        }

        (a, b) => {
            let (signed, unsigned) = if a.is_signed_int() { (a, b) } else { (b, a) };
            if signed.bits() > unsigned.bits() {
                return Ok(signed);
            }
            DType::signed_int_of_bits(unsigned.bits() * 2).ok_or_else(|| {
                Error::unsupported_type(
                    "promote",
                    format!("no common type for {lhs} and {rhs}"),
                )
            })
        }
    }
}

/// Dtype that arithmetic on `common` is carried out in
///
/// Reduced-precision storage formats (F16, BF16) compute in F32; every other
/// dtype computes in itself.
#[inline]
pub const fn compute_type(common: DType) -> DType {
    if common.is_reduced_precision() {
        DType::F32
    } else {
        common
    }
}

/// Result of promoting the two value operands of an operation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypePromotion {
    /// Storage-compatible result dtype
    pub common: DType,
    /// Dtype the per-element work is done in
    pub compute: DType,
}

impl TypePromotion {
    /// Promote the dtypes of two value operands
    pub fn of(lhs: DType, rhs: DType) -> Result<Self> {
        let common = promote(lhs, rhs)?;
        Ok(Self {
            common,
            compute: compute_type(common),
        })
    }
}

/// Check if a dtype can be cast to another without data loss
pub fn can_cast_safely(from: DType, to: DType) -> bool {
    use DType::*;

    if from == to {
        return true;
    }

    match (from, to) {
        // Floats can always accept wider floats
        (F16 | BF16, F32 | F64) => true,
        (F32, F64) => true,

        // Small integers fit in float mantissas
        (I8 | U8, F16 | BF16 | F32 | F64) => true,
        (I16 | U16, F32 | F64) => true,
        (I32 | U32, F64) => true,

        // Integer widening
        (I8, I16 | I32 | I64) => true,
        (I16, I32 | I64) => true,
        (I32, I64) => true,
        (U8, U16 | U32 | U64 | I16 | I32 | I64) => true,
        (U16, U32 | U64 | I32 | I64) => true,
        (U32, U64 | I64) => true,

        // Bool to anything numeric
        (Bool, _) => true,

        _ => false,
    }
}
