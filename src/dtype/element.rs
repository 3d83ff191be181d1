//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Trait for types that can be elements of a tensor
///
/// This trait connects Rust's type system to numr-where's runtime dtype system.
/// It's implemented for all primitive numeric types, `half::f16`, `half::bf16`
/// and [`Bool8`].
///
/// # Conversions
///
/// [`Element::cast`] converts between any two element types without going
/// through a lossy intermediate:
/// - integer and boolean sources widen to `i128` (exact for every integer)
/// - float sources widen to `f64` (exact for every supported float)
///
/// Narrowing follows Rust `as` semantics: float to integer saturates,
/// integer to integer wraps. Anything cast to [`Bool8`] is `value != 0`.
pub trait Element: Copy + Clone + Send + Sync + Pod + Zeroable + PartialEq + fmt::Debug + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;

    /// Convert to i128 (floats truncate toward zero and saturate)
    fn to_i128(self) -> i128;

    /// Convert from i128 to this type
    fn from_i128(v: i128) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;

    /// Non-zero test used for condition operands
    #[inline]
    fn is_truthy(self) -> bool {
        self != Self::zero()
    }

    /// Convert to another element type
    #[inline]
    fn cast<U: Element>(self) -> U {
        if Self::DTYPE.is_float() {
            U::from_f64(self.to_f64())
        } else {
            U::from_i128(self.to_i128())
        }
    }
}

macro_rules! impl_float_element {
    ($t:ty, $dtype:expr) => {
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }

            #[inline]
            fn from_i128(v: i128) -> Self {
                v as $t
            }

            #[inline]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn one() -> Self {
                1.0
            }
        }
    };
}

macro_rules! impl_int_element {
    ($t:ty, $dtype:expr) => {
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }

            #[inline]
            fn from_i128(v: i128) -> Self {
                v as $t
            }

            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn one() -> Self {
                1
            }
        }
    };
}

impl_float_element!(f64, DType::F64);
impl_float_element!(f32, DType::F32);

impl_int_element!(i64, DType::I64);
impl_int_element!(i32, DType::I32);
impl_int_element!(i16, DType::I16);
impl_int_element!(i8, DType::I8);
impl_int_element!(u64, DType::U64);
impl_int_element!(u32, DType::U32);
impl_int_element!(u16, DType::U16);
impl_int_element!(u8, DType::U8);

// ============================================================================
// Half-precision floating point types
// ============================================================================

impl Element for half::f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn to_f64(self) -> f64 {
        half::f16::to_f64(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        half::f16::from_f64(v)
    }

    #[inline]
    fn to_i128(self) -> i128 {
        half::f16::to_f64(self) as i128
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        half::f16::from_f64(v as f64)
    }

    #[inline]
    fn zero() -> Self {
        half::f16::ZERO
    }

    #[inline]
    fn one() -> Self {
        half::f16::ONE
    }
}

impl Element for half::bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn to_f64(self) -> f64 {
        half::bf16::to_f64(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        half::bf16::from_f64(v)
    }

    #[inline]
    fn to_i128(self) -> i128 {
        half::bf16::to_f64(self) as i128
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        half::bf16::from_f64(v as f64)
    }

    #[inline]
    fn zero() -> Self {
        half::bf16::ZERO
    }

    #[inline]
    fn one() -> Self {
        half::bf16::ONE
    }
}

// ============================================================================
// Bool8
// ============================================================================

/// One-byte boolean element backing [`DType::Bool`].
///
/// `bool` cannot be `Pod` (only 0 and 1 are valid bit patterns), so Bool tensors
/// store bytes. Any non-zero byte reads as true; values produced by this crate
/// are always 0 or 1.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Bool8(pub u8);

// Safety: Bool8 is a transparent wrapper around u8, which is Pod
unsafe impl Pod for Bool8 {}
unsafe impl Zeroable for Bool8 {}

impl Bool8 {
    /// False
    pub const FALSE: Self = Self(0);
    /// True
    pub const TRUE: Self = Self(1);

    /// Read as a Rust bool
    #[inline]
    pub const fn get(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for Bool8 {
    #[inline]
    fn from(value: bool) -> Self {
        Self(value as u8)
    }
}

impl From<Bool8> for bool {
    #[inline]
    fn from(value: Bool8) -> Self {
        value.get()
    }
}

impl fmt::Debug for Bool8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl Element for Bool8 {
    const DTYPE: DType = DType::Bool;

    #[inline]
    fn to_f64(self) -> f64 {
        if self.get() { 1.0 } else { 0.0 }
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        Self::from(v != 0.0)
    }

    #[inline]
    fn to_i128(self) -> i128 {
        self.get() as i128
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        Self::from(v != 0)
    }

    #[inline]
    fn zero() -> Self {
        Self::FALSE
    }

    #[inline]
    fn one() -> Self {
        Self::TRUE
    }

    #[inline]
    fn is_truthy(self) -> bool {
        self.get()
    }
}
