use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr;

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use crate::callable::Callable;
use crate::error::Error;
use crate::extent::Extent;
use crate::facade::sealed::{SignatureOf, Slot};
use crate::facade::Facade;
use crate::holder::{Concrete, Dispatch, Empty, Inline, InlineSlot, Target};
use crate::lifecycle;
use crate::prototype::{Compatible, Prototype};
use crate::region::Region;
use crate::space::DefaultSpace;
use crate::sptr;
use crate::thread::{self, Admits, ConvertsTo, Mode};

/// Holder `H` fits the inline space `Space`, checked when monomorphized.
struct Fits<H, Space>(PhantomData<(H, Space)>);

impl<H, Space> Fits<H, Space> {
    const OK: () = assert!(
        Extent::of::<H>().fits_in(Extent::of::<Space>()),
        "the callable does not fit the inline space of this StackFn"
    );
}

/// A callable stored inline, without heap allocation.
///
/// `P` is the [prototype](crate::Prototype) and `Space` the inline buffer:
/// its size and alignment bound what can be stored. Assigning a callable too
/// large for `Space` is a compile error; copying one out of a
/// [`SharedFn`](crate::SharedFn) is checked at run time. `M` is the
/// [thread mode](crate::thread).
///
/// # Example
///
/// ```
/// use smallfn::StackFn;
/// use smallfn::space::S4;
///
/// fn add(a: i32, b: i32) -> i32 {
///     a + b
/// }
///
/// let mut f: StackFn<fn(i32, i32) -> i32, S4> = StackFn::new(add);
/// assert_eq!(f.call(2, 3), Ok(5));
///
/// let offset = 10;
/// f.set(move |a: i32, b: i32| a + b + offset);
/// assert_eq!(f.call(2, 3), Ok(15));
/// ```
///
/// A callable larger than the space is rejected when the program is built:
///
/// ```compile_fail
/// use smallfn::StackFn;
/// use smallfn::space::S8;
///
/// let table = [7u8; 256];
/// let _ = StackFn::<fn() -> u8, S8>::new(move || table[255]);
/// ```
///
/// A no-unwind guarantee is never gained by conversion:
///
/// ```compile_fail
/// use smallfn::{NoUnwind, StackFn};
///
/// let plain: StackFn<fn(u8) -> u8> = StackFn::new(|x: u8| x);
/// let _ = plain.convert::<StackFn<NoUnwind<fn(u8) -> u8>>>();
/// ```
///
/// ```compile_fail
/// use smallfn::{NoUnwind, StackFn};
///
/// let plain: StackFn<fn(u8) -> u8> = StackFn::new(|x: u8| x);
/// let mut vouched: StackFn<NoUnwind<fn(u8) -> u8>> = StackFn::empty();
/// let _ = vouched.assign(&plain);
/// ```
///
/// ```compile_fail
/// use smallfn::{NoUnwind, SharedFn, StackFn};
///
/// let mut plain: SharedFn<fn(u8) -> u8> = SharedFn::new(|x: u8| x);
/// let mut vouched: StackFn<NoUnwind<fn(u8) -> u8>> = StackFn::empty();
/// let _ = vouched.take_from(&mut plain);
/// ```
pub struct StackFn<P: Prototype, Space = DefaultSpace, M = thread::Safe> {
    space: UnsafeCell<MaybeUninit<Space>>,
    /// Only the metadata half is meaningful; see [`sptr`].
    holder: *mut dyn Dispatch<P::Signature>,
    prototype: PhantomData<P>,
    mode: PhantomData<M>,
}

impl<P: Prototype, Space, M: Mode> StackFn<P, Space, M> {
    /// Extent of the inline buffer.
    pub const CAPACITY: Extent = Extent::of::<Space>();

    /// A wrapper holding nothing.
    ///
    /// # Example
    ///
    /// ```
    /// use smallfn::{Error, StackFn};
    ///
    /// let f: StackFn<fn()> = StackFn::empty();
    /// assert!(!f.is_present());
    /// assert_eq!(f.call(), Err(Error::Uninitialized));
    /// ```
    pub fn empty() -> StackFn<P, Space, M> {
        #[allow(clippy::let_unit_value)]
        let () = Fits::<Empty<Inline>, Space>::OK;

        let mut this = StackFn {
            space: UnsafeCell::new(MaybeUninit::uninit()),
            holder: ptr::null_mut::<Empty<Inline>>(),
            prototype: PhantomData,
            mode: PhantomData,
        };
        unsafe { this.slot().vacate() };
        this
    }

    /// A wrapper holding `f`.
    pub fn new<F, K>(f: F) -> StackFn<P, Space, M>
    where
        F: Callable<P, K>,
        M: Admits<F::Callee>,
    {
        let mut this = StackFn::empty();
        this.set(f);
        this
    }

    /// Replaces the stored callable with `f`.
    pub fn set<F, K>(&mut self, f: F)
    where
        F: Callable<P, K>,
        M: Admits<F::Callee>,
    {
        #[allow(clippy::let_unit_value)]
        let () = Fits::<Concrete<F::Callee, Inline>, Space>::OK;

        let callee = f.into_callee();
        unsafe {
            self.slot()
                .emplace_unchecked(|buffer| Concrete::<_, Inline>::new(buffer, callee))
        }
    }

    /// Replaces the stored callable with a clone of `f`.
    pub fn set_cloned<F, K>(&mut self, f: &F)
    where
        F: Callable<P, K> + Clone,
        M: Admits<F::Callee>,
    {
        self.set(f.clone())
    }

    /// A wrapper holding a copy of `source`'s callable.
    ///
    /// Fails with [`Error::IncompatibleBuffer`] if the callable of a
    /// [`SharedFn`](crate::SharedFn) does not fit `Space`.
    ///
    /// # Example
    ///
    /// ```
    /// use smallfn::{NoUnwind, SharedFn, StackFn};
    ///
    /// let shared: SharedFn<NoUnwind<fn(u8) -> u8>> = SharedFn::new(NoUnwind(|x: u8| x * 2));
    /// let inline = StackFn::<fn(u8) -> u8>::from_facade(&shared).unwrap();
    /// assert_eq!(inline.call(4), Ok(8));
    /// ```
    pub fn from_facade<L>(source: &L) -> Result<StackFn<P, Space, M>, Error>
    where
        L: Facade,
        L::Prototype: Compatible<P>,
        L::Thread: ConvertsTo<M>,
    {
        let mut this = StackFn::empty();
        lifecycle::copy_assign(&mut this, source)?;
        Ok(this)
    }

    /// Replaces the stored callable with a copy of `source`'s.
    ///
    /// On error `self` is unchanged.
    pub fn assign<L>(&mut self, source: &L) -> Result<(), Error>
    where
        L: Facade,
        L::Prototype: Compatible<P>,
        L::Thread: ConvertsTo<M>,
    {
        lifecycle::copy_assign(self, source)
    }

    /// Moves `source`'s callable into `self`, leaving `source` empty.
    ///
    /// On error both sides are unchanged.
    pub fn take_from<L>(&mut self, source: &mut L) -> Result<(), Error>
    where
        L: Facade,
        L::Prototype: Compatible<P>,
        L::Thread: ConvertsTo<M>,
    {
        lifecycle::move_assign(self, source)
    }

    /// A wrapper of another prototype or strategy holding a copy of the
    /// stored callable.
    pub fn convert<L>(&self) -> Result<L, Error>
    where
        L: Facade,
        P: Compatible<L::Prototype>,
        M: ConvertsTo<L::Thread>,
    {
        let mut target = L::vacant();
        lifecycle::copy_assign(&mut target, self)?;
        Ok(target)
    }

    /// Drops the stored callable.
    pub fn clear(&mut self) {
        lifecycle::clear(self)
    }

    /// Returns true if a callable is stored.
    pub fn is_present(&self) -> bool {
        self.holder().is_present()
    }

    /// Always false: a `StackFn` never allocates.
    pub fn allocates(&self) -> bool {
        self.holder().allocates()
    }

    /// Extent of the buffer, which is [`CAPACITY`](StackFn::CAPACITY).
    pub fn buffer(&self) -> Extent {
        self.holder().buffer()
    }

    /// Extent of the buffer in use by the stored callable.
    pub fn occupied(&self) -> Extent {
        self.holder().occupied()
    }
}

impl<P: Prototype, Space, M> StackFn<P, Space, M> {
    fn slot(&mut self) -> InlineSlot<'_, P::Signature> {
        let capacity = Extent::of::<Space>();
        unsafe { InlineSlot::new(self.space.get().cast(), capacity, &mut self.holder) }
    }

    fn holder_ptr(&self) -> *mut dyn Dispatch<P::Signature> {
        sptr::with_addr_of_mut(self.space.get().cast(), self.holder)
    }
}

impl<P: Prototype, Space, M: Mode> Slot for StackFn<P, Space, M> {
    type Prototype = P;
    type Thread = M;

    fn vacant() -> Self {
        StackFn::empty()
    }

    fn holder(&self) -> &dyn Dispatch<SignatureOf<Self>> {
        unsafe { &*self.holder_ptr() }
    }

    fn holder_mut(&mut self) -> Option<&mut dyn Dispatch<SignatureOf<Self>>> {
        Some(self.holder_exclusive())
    }

    fn holder_exclusive(&mut self) -> &mut dyn Dispatch<SignatureOf<Self>> {
        unsafe { &mut *self.holder_ptr() }
    }

    fn target(&mut self) -> Target<'_, SignatureOf<Self>> {
        Target::Inline(self.slot())
    }

    fn shared(&self) -> Option<&Arc<Region<SignatureOf<Self>>>> {
        None
    }

    fn shared_mut(&mut self) -> Option<&mut Arc<Region<SignatureOf<Self>>>> {
        None
    }

    unsafe fn vacate(&mut self) {
        self.slot().vacate()
    }
}

impl<P: Prototype, Space, M: Mode> Facade for StackFn<P, Space, M> {}

impl<P: Prototype, Space, M: Mode> Default for StackFn<P, Space, M> {
    fn default() -> Self {
        StackFn::empty()
    }
}

impl<P: Prototype, Space, M: Mode> Clone for StackFn<P, Space, M> {
    fn clone(&self) -> Self {
        let mut clone = StackFn::empty();
        clone.clone_from(self);
        clone
    }

    fn clone_from(&mut self, source: &Self) {
        if source.holder().copy_into(self.target()).is_err() {
            unreachable!("a holder always fits the buffer it was copied from");
        }
    }
}

impl<P: Prototype, Space, M: Mode> fmt::Debug for StackFn<P, Space, M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StackFn")
            .field("present", &self.is_present())
            .field("occupied", &self.occupied())
            .field("capacity", &Self::CAPACITY)
            .finish()
    }
}

impl<P: Prototype, Space, M> Drop for StackFn<P, Space, M> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(self.holder_ptr()) }
    }
}

// `Safe` only admits `Send + Sync` callees, directly or through conversion.
unsafe impl<P: Prototype, Space> Send for StackFn<P, Space, thread::Safe> {}
unsafe impl<P: Prototype, Space> Sync for StackFn<P, Space, thread::Safe> {}

#[cfg(test)]
mod tests {
    use super::StackFn;
    use crate::error::{BufferMismatch, Error};
    use crate::extent::Extent;
    use crate::space::*;
    use crate::SharedFn;

    #[test]
    fn test_basic() {
        let f: StackFn<fn(usize) -> usize, S2> = StackFn::new(|x: usize| x + 1);
        assert_eq!(f.call(1), Ok(2));
        assert!(f.is_present());
        assert!(!f.allocates());
        assert_eq!(f.buffer(), Extent::of::<S2>());
    }

    #[test]
    fn test_move_keeps_holder_reachable() {
        #[inline(never)]
        fn make(base: u64) -> StackFn<fn() -> u64, S4> {
            StackFn::new(move || base * 3)
        }

        let fs = [make(1), make(2), make(3)];
        let results: [Result<u64, Error>; 3] = [fs[0].call(), fs[1].call(), fs[2].call()];
        assert_eq!(results, [Ok(3), Ok(6), Ok(9)]);
    }

    #[test]
    fn test_dont_drop_space() {
        struct NoDrop(S4);
        impl Drop for NoDrop {
            fn drop(&mut self) {
                unreachable!();
            }
        }

        drop(StackFn::<fn() -> bool, NoDrop>::new(|| true));
    }

    #[test]
    fn test_runtime_mismatch() {
        let table = [1u64; 16];
        let shared: SharedFn<fn() -> u64> = SharedFn::new(move || table.iter().sum::<u64>());
        let result = StackFn::<fn() -> u64, S4>::from_facade(&shared);
        assert!(matches!(
            result,
            Err(Error::IncompatibleBuffer(BufferMismatch::Size { .. }))
        ));
    }
}
