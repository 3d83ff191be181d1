//! Evaluator selection for conditional select

use crate::dtype::{DType, TypePromotion};
use std::fmt;

/// Which evaluator a `where` call runs
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SelectPath {
    /// Same-dtype operands, Bool condition, every operand laid out like the
    /// output: one linear pass over storage
    Contiguous,
    /// Same-dtype operands and Bool condition, but at least one operand is
    /// broadcast or laid out differently: strided pass
    Broadcast,
    /// Anything else: per-element conversion through the compute dtype
    Fallback,
}

impl SelectPath {
    /// Decide the evaluator for a call
    ///
    /// The typed paths need `x`, `y` and `out` to share one dtype equal to the
    /// compute dtype, and a Bool condition. Conditions stored as `U8` (or any
    /// other numeric dtype) are always evaluated by the fallback even though
    /// they are read truthily there.
    ///
    /// # Example
    /// ```
    /// use numr_where::dtype::{DType, TypePromotion};
    /// use numr_where::ops::SelectPath;
    ///
    /// let promo = TypePromotion::of(DType::F32, DType::F32).unwrap();
    /// let path = SelectPath::choose(DType::Bool, DType::F32, DType::F32, DType::F32, promo, true);
    /// assert_eq!(path, SelectPath::Contiguous);
    ///
    /// let path = SelectPath::choose(DType::U8, DType::F32, DType::F32, DType::F32, promo, true);
    /// assert_eq!(path, SelectPath::Fallback);
    /// ```
    pub fn choose(
        cond: DType,
        x: DType,
        y: DType,
        out: DType,
        promotion: TypePromotion,
        all_identity: bool,
    ) -> Self {
        let typed = cond.is_bool() && x == y && y == out && out == promotion.compute;
        match (typed, all_identity) {
            (false, _) => SelectPath::Fallback,
            (true, true) => SelectPath::Contiguous,
            (true, false) => SelectPath::Broadcast,
        }
    }

    /// True for the two same-dtype evaluators
    #[inline]
    pub fn is_fast(self) -> bool {
        !matches!(self, SelectPath::Fallback)
    }
}

impl fmt::Display for SelectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectPath::Contiguous => "contiguous",
            SelectPath::Broadcast => "broadcast",
            SelectPath::Fallback => "fallback",
        };
        f.write_str(name)
    }
}
