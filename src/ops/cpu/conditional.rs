//! CPU implementation of conditional operations.

use crate::dispatch_dtype;
use crate::dtype::{Bool8, Element, TypePromotion};
use crate::error::{Error, Result};
use crate::ops::broadcast::{BroadcastPlan, broadcast_shapes};
use crate::ops::{ConditionalOps, SelectPath};
use crate::runtime::cpu::CpuClient;
use crate::runtime::cpu::kernels::{self, RawOperand, SelectPlans};
use crate::tensor::{MemoryFormat, Tensor, resize_to_fit, same_memory_order};

const OP: &str = "where";

/// ConditionalOps implementation for CPU runtime.
impl ConditionalOps for CpuClient {
    fn where_out<'o>(
        &self,
        cond: &Tensor,
        x: &Tensor,
        y: &Tensor,
        out: &'o mut Tensor,
    ) -> Result<&'o mut Tensor> {
        where_out_impl(self, cond, x, y, out).map_err(rejected)?;
        Ok(out)
    }

    fn where_cond(&self, cond: &Tensor, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        let promotion = TypePromotion::of(x.dtype(), y.dtype()).map_err(rejected)?;
        let out_shape =
            broadcast_shapes(&[cond.shape(), x.shape(), y.shape()]).map_err(rejected)?;

        // Follow the inputs into channels-last so the output does not force a
        // layout mismatch
        let channels_last = out_shape.len() == 4
            && [cond, x, y]
                .iter()
                .any(|t| t.layout().memory_format() == MemoryFormat::ChannelsLast);
        let mut out = if channels_last {
            Tensor::zeros_channels_last(&out_shape, promotion.common)?
        } else {
            Tensor::zeros(&out_shape, promotion.common)
        };

        self.where_out(cond, x, y, &mut out)?;
        Ok(out)
    }
}

fn rejected(err: Error) -> Error {
    tracing::debug!(op = OP, error = %err, "validation failed");
    err
}

/// Validate, resize and dispatch. Nothing is written to `out` before the
/// last check passes.
fn where_out_impl(
    client: &CpuClient,
    cond: &Tensor,
    x: &Tensor,
    y: &Tensor,
    out: &mut Tensor,
) -> Result<()> {
    let promotion = TypePromotion::of(x.dtype(), y.dtype())?;
    if out.dtype() != promotion.common {
        return Err(Error::unsupported_type(
            OP,
            format!(
                "output dtype {} does not match the promoted dtype {} of {} and {}",
                out.dtype(),
                promotion.common,
                x.dtype(),
                y.dtype()
            ),
        ));
    }

    let out_shape = broadcast_shapes(&[cond.shape(), x.shape(), y.shape()])?;

    if !same_memory_order(&[cond, x, y, &*out]) {
        return Err(Error::mismatched_layout(
            OP,
            format!(
                "operands use different dense memory orders: cond {:?}, x {:?}, y {:?}, out {:?}",
                cond.layout().memory_format(),
                x.layout().memory_format(),
                y.layout().memory_format(),
                out.layout().memory_format()
            ),
        ));
    }
    if out.layout().has_internal_overlap() {
        return Err(Error::mismatched_layout(
            OP,
            format!("output {:?} has elements sharing storage", out.layout()),
        ));
    }

    if !out.storage().is_unique() {
        return Err(shared_output());
    }

    resize_to_fit(&out_shape, out)?;

    let plans = SelectPlans {
        out: BroadcastPlan::of_layout(out.layout()),
        cond: BroadcastPlan::new(cond.layout(), out.layout())?,
        x: BroadcastPlan::new(x.layout(), out.layout())?,
        y: BroadcastPlan::new(y.layout(), out.layout())?,
        out_row_major: out.is_contiguous(),
    };
    let path = SelectPath::choose(
        cond.dtype(),
        x.dtype(),
        y.dtype(),
        out.dtype(),
        promotion,
        plans.all_identity(),
    );

    let numel = out.numel();
    tracing::trace!(
        op = OP,
        %path,
        numel,
        shape = ?out.shape(),
        cond = %cond.dtype(),
        x = %x.dtype(),
        y = %y.dtype(),
        out = %out.dtype(),
        compute = %promotion.compute,
        "dispatch"
    );

    if numel == 0 {
        return Ok(());
    }

    let parallelism = client.parallelism;
    match path {
        SelectPath::Contiguous => dispatch_dtype!(out.dtype(), T => {
            let c = typed::<Bool8>(cond)?;
            let a = typed::<T>(x)?;
            let b = typed::<T>(y)?;
            let o = typed_out::<T>(out)?;
            kernels::where_contiguous(
                &c[..numel],
                &a[..numel],
                &b[..numel],
                &mut o[..numel],
                parallelism,
            );
        }),
        SelectPath::Broadcast => dispatch_dtype!(out.dtype(), T => {
            let shape = out.layout().shape().to_vec();
            let c = typed::<Bool8>(cond)?;
            let a = typed::<T>(x)?;
            let b = typed::<T>(y)?;
            let o = typed_out::<T>(out)?;
            kernels::where_broadcast(c, a, b, o, &shape, &plans, parallelism);
        }),
        SelectPath::Fallback => {
            let shape = out.layout().shape().to_vec();
            let out_dtype = out.dtype();
            let out_bytes = out.storage_mut().bytes_mut().ok_or_else(shared_output)?;
            kernels::where_fallback(
                promotion.compute,
                raw(cond),
                raw(x),
                raw(y),
                out_bytes,
                out_dtype,
                &shape,
                &plans,
            );
        }
    }

    Ok(())
}

fn shared_output() -> Error {
    Error::InvalidArgument {
        arg: "out",
        reason: "output storage is shared with another tensor".to_string(),
    }
}

fn raw(tensor: &Tensor) -> RawOperand<'_> {
    RawOperand {
        bytes: tensor.storage().bytes(),
        dtype: tensor.dtype(),
    }
}

fn typed<T: Element>(tensor: &Tensor) -> Result<&[T]> {
    tensor.storage().typed::<T>().ok_or(Error::DTypeMismatch {
        lhs: tensor.dtype(),
        rhs: T::DTYPE,
    })
}

fn typed_out<T: Element>(out: &mut Tensor) -> Result<&mut [T]> {
    let dtype = out.dtype();
    if dtype != T::DTYPE {
        return Err(Error::DTypeMismatch {
            lhs: dtype,
            rhs: T::DTYPE,
        });
    }
    out.storage_mut().typed_mut::<T>().ok_or_else(shared_output)
}
