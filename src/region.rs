//! Heap regions shared by [`SharedFn`](crate::SharedFn)s.

use core::ptr::{self, NonNull};

#[cfg(not(feature = "std"))]
use alloc::alloc::{self, handle_alloc_error};
#[cfg(feature = "std")]
use std::alloc::{self, handle_alloc_error};

use crate::extent::Extent;
use crate::holder::{self, Buffer, Dispatch, Empty, Shared};
use crate::prototype::Signature;

/// An aligned heap allocation, freed on drop.
struct Allocation {
    base: NonNull<u8>,
    extent: Extent,
}

impl Allocation {
    fn new(extent: Extent) -> Allocation {
        let layout = extent.layout();
        // every holder records its buffer, so no extent here is zero-sized
        let base = unsafe { alloc::alloc(layout) };
        let base = NonNull::new(base).unwrap_or_else(|| handle_alloc_error(layout));
        log::trace!("allocated a region of {}", extent);
        Allocation { base, extent }
    }

    fn buffer(&self) -> Buffer {
        Buffer {
            base: self.base.as_ptr(),
            extent: self.extent,
        }
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.base.as_ptr(), self.extent.layout()) }
    }
}

/// A growable heap buffer and the holder living in it.
pub struct Region<S: Signature> {
    memory: Allocation,
    holder: *mut dyn Dispatch<S>,
}

impl<S: Signature> Region<S> {
    /// A region of [`Extent::DEFAULT`] holding nothing.
    pub fn vacant() -> Region<S> {
        Region::with_holder(Empty::<Shared>::new)
    }

    /// A region holding `make(extent)`, at least [`Extent::DEFAULT`] large.
    pub fn with_holder<H>(make: impl FnOnce(Extent) -> H) -> Region<S>
    where
        H: Dispatch<S> + 'static,
    {
        let memory = Allocation::new(Extent::DEFAULT.max(Extent::of::<H>()));
        let holder = make(memory.extent);
        let typed = memory.base.as_ptr().cast::<H>();
        unsafe { typed.write(holder) };
        Region {
            memory,
            holder: typed,
        }
    }

    pub fn holder(&self) -> &dyn Dispatch<S> {
        unsafe { &*self.holder }
    }

    pub fn holder_mut(&mut self) -> &mut dyn Dispatch<S> {
        unsafe { &mut *self.holder }
    }

    /// Replaces the holder with `make(extent)`.
    ///
    /// When the new holder does not fit, memory of exactly its extent is
    /// allocated before the current holder is dropped.
    pub fn emplace<H>(&mut self, make: impl FnOnce(Extent) -> H)
    where
        H: Dispatch<S> + 'static,
    {
        let required = Extent::of::<H>();
        let current = self.holder;
        let buffer = self.memory.buffer();

        if required.fits_in(buffer.extent) {
            unsafe { holder::replace::<S, Shared, H>(&mut self.holder, current, buffer, buffer, make) }
            return;
        }

        let grown = Allocation::new(required);
        log::trace!("growing a region of {} to {}", buffer.extent, required);
        unsafe {
            holder::replace::<S, Shared, H>(&mut self.holder, current, buffer, grown.buffer(), make)
        }
        // the old memory is freed here
        drop(core::mem::replace(&mut self.memory, grown));
    }

    /// Installs an empty holder without dropping the current one.
    ///
    /// # Safety
    ///
    /// The current holder must have been moved out.
    pub unsafe fn vacate(&mut self) {
        holder::install(
            self.memory.base.as_ptr(),
            &mut self.holder,
            Empty::<Shared>::new(self.memory.extent),
        )
    }
}

impl<S: Signature> Drop for Region<S> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(self.holder) }
    }
}

// Regions only hold `Send + Sync` callees: `SharedFn` admits no others and
// only takes callables from `thread::Safe` sources.
unsafe impl<S: Signature> Send for Region<S> {}
unsafe impl<S: Signature> Sync for Region<S> {}

#[cfg(test)]
mod tests {
    use super::Region;
    use crate::callable::Plain;
    use crate::error::Error;
    use crate::extent::Extent;
    use crate::holder::{Concrete, Shared};

    type Sig = fn() -> usize;

    #[test]
    fn test_vacant() {
        let region = Region::<Sig>::vacant();
        assert!(!region.holder().is_present());
        assert!(region.holder().allocates());
        assert_eq!(region.holder().buffer(), Extent::DEFAULT);
        assert_eq!(region.holder().invoke(()), Err(Error::Uninitialized));
    }

    #[test]
    fn test_grow() {
        let mut region = Region::<Sig>::vacant();
        let small = 7usize;
        region.emplace(|buffer| Concrete::<_, Shared>::new(buffer, Plain(move || small)));
        assert_eq!(region.holder().buffer(), Extent::DEFAULT);
        assert_eq!(region.holder().invoke(()), Ok(7));

        let large = [3usize; 64];
        region.emplace(|buffer| {
            Concrete::<_, Shared>::new(buffer, Plain(move || large.iter().sum::<usize>()))
        });
        let grown = region.holder().buffer();
        assert!(grown.size() > Extent::DEFAULT.size());
        assert_eq!(grown, region.holder().occupied());
        assert_eq!(region.holder().invoke(()), Ok(192));

        // shrinking keeps the grown memory
        region.emplace(|buffer| Concrete::<_, Shared>::new(buffer, Plain(move || small)));
        assert_eq!(region.holder().buffer(), grown);
    }
}
