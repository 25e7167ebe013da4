//! What [`StackFn`](crate::StackFn) and [`SharedFn`](crate::SharedFn) have in common.

pub(crate) mod sealed {
    #[cfg(not(feature = "std"))]
    use alloc::sync::Arc;
    #[cfg(feature = "std")]
    use std::sync::Arc;

    use crate::holder::{Dispatch, Target};
    use crate::prototype::Prototype;
    use crate::region::Region;
    use crate::thread::Mode;

    pub type SignatureOf<L> = <<L as Slot>::Prototype as Prototype>::Signature;

    /// Access to the buffer behind a facade.
    pub trait Slot: Sized {
        type Prototype: Prototype;
        type Thread: Mode;

        /// A facade holding nothing.
        fn vacant() -> Self;

        fn holder(&self) -> &dyn Dispatch<SignatureOf<Self>>;

        /// The holder, unless other facades refer to it as well.
        fn holder_mut(&mut self) -> Option<&mut dyn Dispatch<SignatureOf<Self>>>;

        /// The holder, copied into a buffer of its own first if other
        /// facades refer to it as well.
        fn holder_exclusive(&mut self) -> &mut dyn Dispatch<SignatureOf<Self>>;

        /// The buffer, detached from other facades first.
        fn target(&mut self) -> Target<'_, SignatureOf<Self>>;

        fn shared(&self) -> Option<&Arc<Region<SignatureOf<Self>>>>;

        fn shared_mut(&mut self) -> Option<&mut Arc<Region<SignatureOf<Self>>>>;

        /// Installs an empty holder without dropping the current one.
        ///
        /// # Safety
        ///
        /// The current holder must have been moved out through
        /// [`holder_mut`](Slot::holder_mut).
        unsafe fn vacate(&mut self);
    }
}

/// A callable wrapper: a [`StackFn`](crate::StackFn) or a
/// [`SharedFn`](crate::SharedFn).
///
/// Used to bound the sources of [`assign`](crate::StackFn::assign),
/// [`take_from`](crate::StackFn::take_from) and their kin. It is sealed.
pub trait Facade: sealed::Slot {}

