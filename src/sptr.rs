//! Rebuilds a trait object pointer for a holder whose buffer has moved.
//!
//! An inline buffer travels with its facade, so only the metadata half of the
//! holder pointer is meaningful; the address half is refreshed on every access.

#[cfg(feature = "nightly")]
mod implementation {
    pub fn with_addr_of_mut<U: ?Sized>(addr: *mut u8, meta: *mut U) -> *mut U {
        addr.with_metadata_of(meta.cast_const())
    }
}

#[cfg(not(feature = "nightly"))]
#[allow(clippy::as_conversions)]
mod implementation {
    use core::ptr::addr_of_mut;

    pub fn with_addr_of_mut<U: ?Sized>(addr: *mut u8, mut meta: *mut U) -> *mut U {
        let meta_ptr = addr_of_mut!(meta).cast::<usize>();
        unsafe { meta_ptr.write(addr as usize) }
        meta
    }
}

pub use implementation::*;
