//! Converting element-wise kernel for mixed-dtype `where`
//!
//! Each operand is read through a function pointer chosen once per call from
//! its storage dtype, so the loop body is monomorphized only over the compute
//! dtype rather than over every (cond, x, y, out) combination.

use super::where_select::SelectPlans;
use crate::dispatch_dtype;
use crate::dtype::{DType, Element};
use crate::ops::broadcast::StridedIndexes;

/// Raw storage of one input operand
#[derive(Copy, Clone, Debug)]
pub struct RawOperand<'a> {
    /// Storage bytes
    pub bytes: &'a [u8],
    /// Storage dtype
    pub dtype: DType,
}

type LoadFn<C> = fn(&[u8], usize) -> C;
type TruthyFn = fn(&[u8], usize) -> bool;
type StoreFn<C> = fn(&mut [u8], usize, C);

#[inline]
fn element_at<S: Element>(bytes: &[u8], index: usize) -> S {
    let size = std::mem::size_of::<S>();
    bytemuck::pod_read_unaligned(&bytes[index * size..(index + 1) * size])
}

fn load_as<S: Element, C: Element>(bytes: &[u8], index: usize) -> C {
    element_at::<S>(bytes, index).cast::<C>()
}

fn truthy_as<S: Element>(bytes: &[u8], index: usize) -> bool {
    element_at::<S>(bytes, index).is_truthy()
}

fn store_as<C: Element, D: Element>(bytes: &mut [u8], index: usize, value: C) {
    let size = std::mem::size_of::<D>();
    let converted: D = value.cast();
    bytes[index * size..(index + 1) * size].copy_from_slice(bytemuck::bytes_of(&converted));
}

fn loader<C: Element>(dtype: DType) -> LoadFn<C> {
    dispatch_dtype!(dtype, S => { load_as::<S, C> as LoadFn<C> })
}

fn truthiness(dtype: DType) -> TruthyFn {
    dispatch_dtype!(dtype, S => { truthy_as::<S> as TruthyFn })
}

fn storer<C: Element>(dtype: DType) -> StoreFn<C> {
    dispatch_dtype!(dtype, D => { store_as::<C, D> as StoreFn<C> })
}

/// Where over arbitrary dtypes: `out = truthy(cond) ? C(x) : C(y)`, stored as `out_dtype`
///
/// `x` and `y` are converted to the `compute` dtype before selection and the
/// result is converted to `out_dtype` on store. Runs serially.
#[allow(clippy::too_many_arguments)]
pub fn where_fallback(
    compute: DType,
    cond: RawOperand<'_>,
    x: RawOperand<'_>,
    y: RawOperand<'_>,
    out: &mut [u8],
    out_dtype: DType,
    shape: &[usize],
    plans: &SelectPlans,
) {
    dispatch_dtype!(compute, C => {
        where_fallback_typed::<C>(cond, x, y, out, out_dtype, shape, plans)
    })
}

fn where_fallback_typed<C: Element>(
    cond: RawOperand<'_>,
    x: RawOperand<'_>,
    y: RawOperand<'_>,
    out: &mut [u8],
    out_dtype: DType,
    shape: &[usize],
    plans: &SelectPlans,
) {
    let is_true = truthiness(cond.dtype);
    let load_x = loader::<C>(x.dtype);
    let load_y = loader::<C>(y.dtype);
    let store = storer::<C>(out_dtype);

    for [o, c, a, b] in StridedIndexes::new(shape, [&plans.out, &plans.cond, &plans.x, &plans.y]) {
        let value = if is_true(cond.bytes, c) {
            load_x(x.bytes, a)
        } else {
            load_y(y.bytes, b)
        };
        store(out, o, value);
    }
}
