//! Output resizing under a per-tensor shape policy

use super::{Layout, MemoryFormat, Storage, Tensor};
use crate::error::{Error, Result};

/// Whether, and how far, a tensor's shape may change after creation
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShapeDynamism {
    /// Shape is fixed
    Static,
    /// Shape may change while the element count fits the existing storage
    DynamicBound,
    /// Shape may change freely; storage is reallocated when it is too small
    #[default]
    DynamicUnbound,
}

/// Resize `out` so its shape equals `target`
///
/// A matching shape is left alone, even when `out` is `Static`. Otherwise the
/// tensor's [`ShapeDynamism`] decides whether the resize is allowed. On success
/// `out` gets a dense layout in its previous memory format: channels-last
/// survives when `target` has rank 4, everything else becomes row-major.
///
/// Rejected resizes return [`Error::ResizeFailed`] and leave `out` untouched.
pub fn resize_to_fit(target: &[usize], out: &mut Tensor) -> Result<()> {
    if out.shape() == target {
        return Ok(());
    }

    let new_len: usize = target.iter().product();
    let capacity = out.storage().len();
    let grows = new_len > capacity;

    match out.dynamism() {
        ShapeDynamism::Static => {
            return Err(Error::resize_failed(out.shape(), target, "shape is static"));
        }
        ShapeDynamism::DynamicBound if grows => {
            return Err(Error::resize_failed(
                out.shape(),
                target,
                "element count exceeds the bound of the existing storage",
            ));
        }
        ShapeDynamism::DynamicBound | ShapeDynamism::DynamicUnbound => {}
    }

    let layout = match out.layout().memory_format() {
        MemoryFormat::ChannelsLast => {
            Layout::channels_last(target).unwrap_or_else(|| Layout::contiguous(target))
        }
        MemoryFormat::Contiguous | MemoryFormat::Strided => Layout::contiguous(target),
    };

    tracing::debug!(
        from = ?out.shape(),
        to = ?target,
        dynamism = ?out.dynamism(),
        realloc = grows,
        "resizing output tensor"
    );

    if grows {
        let storage = Storage::new(new_len, out.dtype());
        out.replace_parts(storage, layout);
    } else {
        out.set_layout(layout);
    }
    Ok(())
}
