//! Where (conditional select) kernels for same-dtype operands
//!
//! Provides the typed kernels used when `x`, `y` and `out` share one dtype and
//! the condition is Bool:
//! - `where_contiguous<T>` - every operand laid out like the output
//! - `where_broadcast<T>` - arbitrary strides, including broadcast (stride 0) dims

use crate::dtype::{Bool8, Element};
use crate::ops::broadcast::{BroadcastPlan, StridedIndexes};
use crate::runtime::cpu::ParallelismConfig;

/// Per-operand index plans for one `where` call, all against the output shape
#[derive(Clone, Debug)]
pub struct SelectPlans {
    /// Output plan (its own layout)
    pub out: BroadcastPlan,
    /// Condition plan
    pub cond: BroadcastPlan,
    /// Plan for values taken where the condition is true
    pub x: BroadcastPlan,
    /// Plan for values taken where the condition is false
    pub y: BroadcastPlan,
    /// Output storage order is row-major, so chunks of storage are chunks of
    /// logical positions
    pub out_row_major: bool,
}

impl SelectPlans {
    /// Every operand reads storage offset `i` for output storage offset `i`
    pub fn all_identity(&self) -> bool {
        self.out.is_identity()
            && self.cond.is_identity()
            && self.x.is_identity()
            && self.y.is_identity()
    }
}

#[inline]
fn select_into<T: Element>(cond: &[Bool8], x: &[T], y: &[T], out: &mut [T]) {
    for (((o, &c), &a), &b) in out.iter_mut().zip(cond).zip(x).zip(y) {
        *o = if c.get() { a } else { b };
    }
}

/// Where over operands sharing the output's dense layout: `out[i] = cond[i] ? x[i] : y[i]`
///
/// All slices hold exactly the output's elements in storage order.
#[inline]
pub fn where_contiguous<T: Element>(
    cond: &[Bool8],
    x: &[T],
    y: &[T],
    out: &mut [T],
    parallelism: ParallelismConfig,
) {
    debug_assert!(cond.len() == out.len() && x.len() == out.len() && y.len() == out.len());

    #[cfg(feature = "rayon")]
    if parallelism.should_split(out.len()) {
        use rayon::prelude::*;

        let chunk = parallelism.chunk_size();
        out.par_chunks_mut(chunk)
            .zip(cond.par_chunks(chunk))
            .zip(x.par_chunks(chunk))
            .zip(y.par_chunks(chunk))
            .for_each(|(((out_chunk, c), a), b)| select_into(c, a, b, out_chunk));
        return;
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallelism;

    select_into(cond, x, y, out);
}

/// Where with broadcasting support
///
/// Every operand is read through its plan's strides; a stride of 0 means the
/// dimension is broadcast. Slices are whole storage buffers.
#[inline]
pub fn where_broadcast<T: Element>(
    cond: &[Bool8],
    x: &[T],
    y: &[T],
    out: &mut [T],
    shape: &[usize],
    plans: &SelectPlans,
    parallelism: ParallelismConfig,
) {
    let numel: usize = shape.iter().product();
    if numel == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    if plans.out_row_major && parallelism.should_split(numel) {
        use rayon::prelude::*;

        let chunk = parallelism.chunk_size();
        let inputs = [&plans.cond, &plans.x, &plans.y];
        out[..numel]
            .par_chunks_mut(chunk)
            .enumerate()
            .for_each(|(i, out_chunk)| {
                let indexes = StridedIndexes::starting_at(shape, inputs, i * chunk);
                for (o, [c, a, b]) in out_chunk.iter_mut().zip(indexes) {
                    *o = if cond[c].get() { x[a] } else { y[b] };
                }
            });
        return;
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallelism;

    for [o, c, a, b] in StridedIndexes::new(shape, [&plans.out, &plans.cond, &plans.x, &plans.y]) {
        out[o] = if cond[c].get() { x[a] } else { y[b] };
    }
}
