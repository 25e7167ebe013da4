use core::alloc::Layout;
use core::fmt;
use core::mem;

use crate::error::{BufferMismatch, Error};
use crate::space::DefaultSpace;

/// Size and alignment of a buffer, or of a holder living in one.
///
/// The alignment is always a power of two: an `Extent` can only be taken from a
/// real type or combined from other extents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Extent {
    size: usize,
    align: usize,
}

impl Extent {
    /// The inline footprint of [`DefaultSpace`], and the smallest region a
    /// [`SharedFn`](crate::SharedFn) allocates.
    pub const DEFAULT: Extent = Extent::of::<DefaultSpace>();

    /// Extent of the type `T`.
    pub const fn of<T>() -> Extent {
        Extent {
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
        }
    }

    /// Size in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Alignment in bytes.
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Component-wise maximum of two extents.
    pub const fn max(self, other: Extent) -> Extent {
        Extent {
            size: if self.size > other.size { self.size } else { other.size },
            align: if self.align > other.align { self.align } else { other.align },
        }
    }

    /// Returns true if something of this extent can be placed in `buffer`.
    pub const fn fits_in(&self, buffer: Extent) -> bool {
        self.size <= buffer.size && self.align <= buffer.align
    }

    /// Like [`fits_in`](Extent::fits_in), reporting which dimension falls short.
    pub fn check_fits(&self, buffer: Extent) -> Result<(), Error> {
        if self.size > buffer.size {
            return Err(Error::IncompatibleBuffer(BufferMismatch::Size {
                required: self.size,
                available: buffer.size,
            }));
        }
        if self.align > buffer.align {
            return Err(Error::IncompatibleBuffer(BufferMismatch::Alignment {
                required: self.align,
                available: buffer.align,
            }));
        }
        Ok(())
    }

    pub(crate) fn layout(&self) -> Layout {
        // SAFETY: `align` comes from `align_of` and `size` from `size_of`,
        // so both satisfy the `Layout` invariants.
        unsafe { Layout::from_size_align_unchecked(self.size, self.align) }
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} bytes aligned to {}", self.size, self.align)
    }
}
