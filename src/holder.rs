//! Holders: the objects living in a callable's buffer.
//!
//! A buffer always contains exactly one holder, reached through a
//! `*mut dyn Dispatch<S>`. An [`Empty`] holder answers calls with an error,
//! a [`Concrete`] holder owns a callee. Both record the extent of the buffer
//! they live in, so a holder can report its surroundings without knowing
//! which facade owns it.

use core::marker::PhantomData;
use core::mem;
use core::ptr;

use crate::abort;
use crate::callable::{CallableKind, Invoke, Stored};
use crate::error::Error;
use crate::extent::Extent;
use crate::prototype::Signature;
use crate::region::Region;
use crate::sptr;

/// Where a holder lives: inline in a facade, or in a shared heap region.
pub trait Strategy: 'static {
    /// Whether holders of this strategy live in heap memory.
    const ALLOCATES: bool;
}

/// Holders living in a [`StackFn`](crate::StackFn) buffer.
pub enum Inline {}

/// Holders living in a [`SharedFn`](crate::SharedFn) region.
pub enum Shared {}

impl Strategy for Inline {
    const ALLOCATES: bool = false;
}

impl Strategy for Shared {
    const ALLOCATES: bool = true;
}

/// The protocol every holder implements for signature `S`.
pub trait Dispatch<S: Signature> {
    /// Calls the callee, or reports [`Error::Uninitialized`].
    fn invoke(&self, args: S::Args<'_>) -> Result<S::Output, Error>;

    /// Calls the callee; aborts if there is none or if it unwinds.
    fn invoke_no_unwind(&self, args: S::Args<'_>) -> S::Output;

    /// Borrows the callee for a variadic call.
    fn thunk(&self) -> Result<Thunk<'_, S>, Error>;

    /// Calls the callee through exclusive access, or reports
    /// [`Error::Uninitialized`].
    fn invoke_mut(&mut self, args: S::Args<'_>) -> Result<S::Output, Error>;

    /// Calls the callee through exclusive access; aborts if there is none or
    /// if it unwinds.
    fn invoke_mut_no_unwind(&mut self, args: S::Args<'_>) -> S::Output;

    /// Whether a callee is stored.
    fn is_present(&self) -> bool;

    /// Whether the holder lives in heap memory.
    fn allocates(&self) -> bool;

    /// Extent of the holder itself.
    fn occupied(&self) -> Extent;

    /// Extent of the buffer the holder lives in.
    fn buffer(&self) -> Extent;

    /// Places a holder with a clone of the callee into `target`.
    fn copy_into(&self, target: Target<'_, S>) -> Result<(), Error>;

    /// Places a holder with the callee moved out of `self` into `target`.
    ///
    /// # Safety
    ///
    /// On `Ok`, the callee has been moved bitwise; the caller must overwrite
    /// `self` without dropping it. On `Err`, `self` is untouched.
    unsafe fn move_into(&mut self, target: Target<'_, S>) -> Result<(), Error>;
}

/// A borrowed callee, resolved for a single call.
pub struct Thunk<'h, S: Signature> {
    callee: &'h dyn Invoke<S>,
}

impl<'h, S: Signature> Thunk<'h, S> {
    pub fn call(self, args: S::Args<'_>) -> S::Output {
        self.callee.invoke(args)
    }

    /// Calls the callee behind a no-unwind call site.
    ///
    /// Only `NoUnwind` callees reach one, and they abort on unwinding
    /// themselves.
    pub fn call_no_unwind(self, args: S::Args<'_>) -> S::Output {
        debug_assert_eq!(self.callee.kind(), CallableKind::NoUnwind);
        self.callee.invoke(args)
    }
}

/// The holder of a buffer without a callee.
pub struct Empty<St> {
    buffer: Extent,
    strategy: PhantomData<St>,
}

impl<St: Strategy> Empty<St> {
    pub fn new(buffer: Extent) -> Empty<St> {
        Empty {
            buffer,
            strategy: PhantomData,
        }
    }
}

impl<S: Signature, St: Strategy> Dispatch<S> for Empty<St> {
    fn invoke(&self, _: S::Args<'_>) -> Result<S::Output, Error> {
        Err(Error::Uninitialized)
    }

    fn invoke_no_unwind(&self, _: S::Args<'_>) -> S::Output {
        abort::abort(format_args!(
            "{} at a no-unwind call site",
            Error::Uninitialized
        ))
    }

    fn thunk(&self) -> Result<Thunk<'_, S>, Error> {
        Err(Error::Uninitialized)
    }

    fn invoke_mut(&mut self, _: S::Args<'_>) -> Result<S::Output, Error> {
        Err(Error::Uninitialized)
    }

    fn invoke_mut_no_unwind(&mut self, args: S::Args<'_>) -> S::Output {
        Dispatch::<S>::invoke_no_unwind(self, args)
    }

    fn is_present(&self) -> bool {
        false
    }

    fn allocates(&self) -> bool {
        St::ALLOCATES
    }

    fn occupied(&self) -> Extent {
        Extent::of::<Self>()
    }

    fn buffer(&self) -> Extent {
        self.buffer
    }

    fn copy_into(&self, target: Target<'_, S>) -> Result<(), Error> {
        target.place_empty();
        Ok(())
    }

    unsafe fn move_into(&mut self, target: Target<'_, S>) -> Result<(), Error> {
        self.copy_into(target)
    }
}

/// The holder of a callee `C`.
pub struct Concrete<C, St> {
    buffer: Extent,
    callee: C,
    strategy: PhantomData<St>,
}

impl<C, St: Strategy> Concrete<C, St> {
    pub fn new(buffer: Extent, callee: C) -> Concrete<C, St> {
        Concrete {
            buffer,
            callee,
            strategy: PhantomData,
        }
    }

    fn shared<S: Signature>(&self) -> Thunk<'_, S>
    where
        C: Stored<S>,
    {
        match self.callee.shared() {
            Some(callee) => Thunk { callee },
            None => unreachable!("a mutable callable is only called through `call_mut`"),
        }
    }
}

impl<S, C, St> Dispatch<S> for Concrete<C, St>
where
    S: Signature,
    C: Stored<S>,
    St: Strategy,
{
    fn invoke(&self, args: S::Args<'_>) -> Result<S::Output, Error> {
        Ok(self.shared::<S>().call(args))
    }

    fn invoke_no_unwind(&self, args: S::Args<'_>) -> S::Output {
        self.shared::<S>().call_no_unwind(args)
    }

    fn thunk(&self) -> Result<Thunk<'_, S>, Error> {
        Ok(self.shared::<S>())
    }

    fn invoke_mut(&mut self, args: S::Args<'_>) -> Result<S::Output, Error> {
        Ok(self.callee.invoke_mut(args))
    }

    fn invoke_mut_no_unwind(&mut self, args: S::Args<'_>) -> S::Output {
        debug_assert_eq!(self.callee.kind(), CallableKind::NoUnwind);
        self.callee.invoke_mut(args)
    }

    fn is_present(&self) -> bool {
        true
    }

    fn allocates(&self) -> bool {
        St::ALLOCATES
    }

    fn occupied(&self) -> Extent {
        Extent::of::<Self>()
    }

    fn buffer(&self) -> Extent {
        self.buffer
    }

    fn copy_into(&self, target: Target<'_, S>) -> Result<(), Error> {
        target.place(|| self.callee.clone())
    }

    unsafe fn move_into(&mut self, target: Target<'_, S>) -> Result<(), Error> {
        let callee = ptr::addr_of!(self.callee);
        target.place(|| ptr::read(callee))
    }
}

/// A buffer's base address and extent.
#[derive(Clone, Copy)]
pub struct Buffer {
    pub base: *mut u8,
    pub extent: Extent,
}

/// Writes `holder` at `base` and records it in `record`.
///
/// # Safety
///
/// `base` must be valid for writes of `H` and suitably aligned.
pub unsafe fn install<S, H>(base: *mut u8, record: &mut *mut (dyn Dispatch<S> + 'static), holder: H)
where
    S: Signature,
    H: Dispatch<S> + 'static,
{
    let typed = base.cast::<H>();
    typed.write(holder);
    *record = typed;
}

/// Installs an empty holder if dropped.
struct Reinstate<'a, S: Signature, St: Strategy> {
    buffer: Buffer,
    record: &'a mut *mut (dyn Dispatch<S> + 'static),
    strategy: PhantomData<St>,
}

impl<S: Signature, St: Strategy> Drop for Reinstate<'_, S, St> {
    fn drop(&mut self) {
        unsafe {
            install(
                self.buffer.base,
                self.record,
                Empty::<St>::new(self.buffer.extent),
            )
        }
    }
}

/// Drops the holder at `current` and installs `make(into.extent)` at `into`.
///
/// Until the new holder is installed, an unwind installs an empty holder at
/// `fallback` instead, so `record` never points at a destroyed holder.
///
/// # Safety
///
/// `current` must be the live holder recorded in `record`. `into` must fit
/// `H` and `fallback` must fit `Empty<St>`; `into` and `fallback` are either
/// the same buffer or disjoint.
pub unsafe fn replace<S, St, H>(
    record: &mut *mut (dyn Dispatch<S> + 'static),
    current: *mut (dyn Dispatch<S> + 'static),
    fallback: Buffer,
    into: Buffer,
    make: impl FnOnce(Extent) -> H,
) where
    S: Signature,
    St: Strategy,
    H: Dispatch<S> + 'static,
{
    let guard = Reinstate::<S, St> {
        buffer: fallback,
        record: &mut *record,
        strategy: PhantomData,
    };
    ptr::drop_in_place(current);
    let holder = make(into.extent);
    mem::forget(guard);
    install(into.base, record, holder);
}

/// Where [`Dispatch::copy_into`] and [`Dispatch::move_into`] place a holder.
pub enum Target<'a, S: Signature> {
    Inline(InlineSlot<'a, S>),
    /// A region nobody else refers to.
    Shared(&'a mut Region<S>),
}

impl<S: Signature> Target<'_, S> {
    /// Places a holder for the callee made by `callee`.
    ///
    /// `callee` is only run once the holder is known to fit.
    pub fn place<C>(self, callee: impl FnOnce() -> C) -> Result<(), Error>
    where
        C: Stored<S>,
    {
        match self {
            Target::Inline(slot) => {
                slot.emplace(|buffer| Concrete::<C, Inline>::new(buffer, callee()))
            }
            Target::Shared(region) => {
                region.emplace(|buffer| Concrete::<C, Shared>::new(buffer, callee()));
                Ok(())
            }
        }
    }

    /// Replaces the current holder with an empty one.
    pub fn place_empty(self) {
        match self {
            // an inline buffer always fits an empty holder
            Target::Inline(slot) => unsafe { slot.emplace_unchecked(Empty::<Inline>::new) },
            Target::Shared(region) => region.emplace(Empty::<Shared>::new),
        }
    }
}

/// The inline buffer of a [`StackFn`](crate::StackFn), borrowed for placement.
pub struct InlineSlot<'a, S: Signature> {
    buffer: Buffer,
    /// Only the metadata half is meaningful; the address is refreshed from
    /// `buffer` on every access.
    record: &'a mut *mut (dyn Dispatch<S> + 'static),
}

impl<'a, S: Signature> InlineSlot<'a, S> {
    /// # Safety
    ///
    /// `base` must point to a buffer of `extent` that holds the live holder
    /// whose metadata is in `record`, and stay valid for `'a`.
    pub unsafe fn new(
        base: *mut u8,
        extent: Extent,
        record: &'a mut *mut (dyn Dispatch<S> + 'static),
    ) -> InlineSlot<'a, S> {
        InlineSlot {
            buffer: Buffer { base, extent },
            record,
        }
    }

    /// Replaces the current holder with `make(extent)` if it fits.
    pub fn emplace<H>(self, make: impl FnOnce(Extent) -> H) -> Result<(), Error>
    where
        H: Dispatch<S> + 'static,
    {
        let required = Extent::of::<H>();
        if let Err(error) = required.check_fits(self.buffer.extent) {
            log::debug!(
                "rejected a {} holder for an inline buffer of {}",
                required,
                self.buffer.extent
            );
            return Err(error);
        }
        unsafe { self.emplace_unchecked(make) };
        Ok(())
    }

    /// # Safety
    ///
    /// `H` must fit the buffer.
    pub unsafe fn emplace_unchecked<H>(self, make: impl FnOnce(Extent) -> H)
    where
        H: Dispatch<S> + 'static,
    {
        let current = sptr::with_addr_of_mut(self.buffer.base, *self.record);
        replace::<S, Inline, H>(self.record, current, self.buffer, self.buffer, make)
    }

    /// Installs an empty holder without dropping the current one.
    ///
    /// # Safety
    ///
    /// The current holder must have been moved out.
    pub unsafe fn vacate(self) {
        install(
            self.buffer.base,
            self.record,
            Empty::<Inline>::new(self.buffer.extent),
        )
    }
}
