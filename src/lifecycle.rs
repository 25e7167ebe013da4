//! Copying and moving callables between facades of either strategy.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
use core::mem;
#[cfg(feature = "std")]
use std::sync::Arc;

use crate::error::Error;
use crate::facade::sealed::Slot;
use crate::prototype::Compatible;
use crate::region::Region;
use crate::thread::ConvertsTo;

/// Makes `dst` hold a copy of `src`'s callable.
///
/// Two shared facades end up sharing one region. Otherwise the callee is
/// cloned into `dst`'s buffer; an undersized inline buffer leaves `dst`
/// untouched.
pub(crate) fn copy_assign<D, L>(dst: &mut D, src: &L) -> Result<(), Error>
where
    D: Slot,
    L: Slot,
    L::Prototype: Compatible<D::Prototype>,
    L::Thread: ConvertsTo<D::Thread>,
{
    if let (Some(from), Some(into)) = (src.shared(), dst.shared_mut()) {
        if !Arc::ptr_eq(from, into) {
            *into = Arc::clone(from);
        }
        return Ok(());
    }
    src.holder().copy_into(dst.target())
}

/// Moves `src`'s callable into `dst`, leaving `src` empty.
///
/// On error both facades are untouched.
pub(crate) fn move_assign<D, L>(dst: &mut D, src: &mut L) -> Result<(), Error>
where
    D: Slot,
    L: Slot,
    L::Prototype: Compatible<D::Prototype>,
    L::Thread: ConvertsTo<D::Thread>,
{
    if let (Some(from), Some(into)) = (src.shared_mut(), dst.shared_mut()) {
        *into = mem::replace(from, Arc::new(Region::vacant()));
        return Ok(());
    }

    if let Some(holder) = src.holder_mut() {
        unsafe {
            holder.move_into(dst.target())?;
            src.vacate();
        }
        return Ok(());
    }

    // the source region has other owners, which keep the callable
    copy_assign(dst, &*src)?;
    clear(src);
    Ok(())
}

/// Replaces the callable of `slot` with nothing.
pub(crate) fn clear<L: Slot>(slot: &mut L) {
    slot.target().place_empty()
}
