use core::fmt;
use core::marker::PhantomData;

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use crate::callable::Callable;
use crate::error::Error;
use crate::extent::Extent;
use crate::facade::sealed::{SignatureOf, Slot};
use crate::facade::Facade;
use crate::holder::{Concrete, Dispatch, Shared, Target};
use crate::lifecycle;
use crate::prototype::{Compatible, Prototype};
use crate::region::Region;
use crate::thread::{self, ConvertsTo};

/// A callable stored in a reference-counted heap region.
///
/// Clones share the region, so cloning is cheap and never copies the
/// callable. Assigning to a `SharedFn` whose region is shared gives that
/// `SharedFn` a region of its own and leaves the others untouched. A region
/// grows when a callable larger than it is assigned.
///
/// Stored callables must be `Send + Sync`, so a `SharedFn` can be sent and
/// shared across threads.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use smallfn::SharedFn;
///
/// let table: HashMap<i32, i32> = [(7, 70)].into_iter().collect();
/// let lookup: SharedFn<fn(i32) -> Option<i32>> =
///     SharedFn::new(move |key: i32| table.get(&key).copied());
///
/// let alias = lookup.clone();
/// assert!(alias.shares_with(&lookup));
/// assert_eq!(alias.call(7), Ok(Some(70)));
/// assert_eq!(lookup.call(8), Ok(None));
/// ```
pub struct SharedFn<P: Prototype> {
    region: Arc<Region<P::Signature>>,
    prototype: PhantomData<P>,
}

impl<P: Prototype> SharedFn<P> {
    /// A wrapper holding nothing, with a region of [`Extent::DEFAULT`].
    pub fn empty() -> SharedFn<P> {
        SharedFn::from_region(Region::vacant())
    }

    /// A wrapper holding `f`.
    pub fn new<F, K>(f: F) -> SharedFn<P>
    where
        F: Callable<P, K>,
        F::Callee: Send + Sync,
    {
        let callee = f.into_callee();
        SharedFn::from_region(Region::with_holder(|buffer| {
            Concrete::<_, Shared>::new(buffer, callee)
        }))
    }

    /// Replaces the stored callable with `f`.
    ///
    /// # Example
    ///
    /// ```
    /// use smallfn::{Extent, SharedFn};
    ///
    /// let mut f: SharedFn<fn() -> u8> = SharedFn::new(|| 1);
    /// assert_eq!(f.buffer(), Extent::DEFAULT);
    ///
    /// let table = [2u8; 256];
    /// f.set(move || table[255]);
    /// assert!(f.buffer().size() > Extent::DEFAULT.size());
    /// assert_eq!(f.call(), Ok(2));
    /// ```
    pub fn set<F, K>(&mut self, f: F)
    where
        F: Callable<P, K>,
        F::Callee: Send + Sync,
    {
        let callee = f.into_callee();
        let make = |buffer| Concrete::<_, Shared>::new(buffer, callee);
        match Arc::get_mut(&mut self.region) {
            Some(region) => region.emplace(make),
            None => {
                self.log_detach();
                self.region = Arc::new(Region::with_holder(make));
            }
        }
    }

    /// Replaces the stored callable with a clone of `f`.
    pub fn set_cloned<F, K>(&mut self, f: &F)
    where
        F: Callable<P, K> + Clone,
        F::Callee: Send + Sync,
    {
        self.set(f.clone())
    }

    /// A wrapper holding a copy of `source`'s callable.
    ///
    /// Shares `source`'s region if `source` is a `SharedFn`.
    pub fn from_facade<L>(source: &L) -> Result<SharedFn<P>, Error>
    where
        L: Facade,
        L::Prototype: Compatible<P>,
        L::Thread: ConvertsTo<thread::Safe>,
    {
        let mut this = SharedFn::empty();
        lifecycle::copy_assign(&mut this, source)?;
        Ok(this)
    }

    /// Replaces the stored callable with a copy of `source`'s.
    ///
    /// Never fails: a region grows to fit any callable.
    pub fn assign<L>(&mut self, source: &L) -> Result<(), Error>
    where
        L: Facade,
        L::Prototype: Compatible<P>,
        L::Thread: ConvertsTo<thread::Safe>,
    {
        lifecycle::copy_assign(self, source)
    }

    /// Moves `source`'s callable into `self`, leaving `source` empty.
    ///
    /// Other wrappers sharing `source`'s region keep the callable.
    pub fn take_from<L>(&mut self, source: &mut L) -> Result<(), Error>
    where
        L: Facade,
        L::Prototype: Compatible<P>,
        L::Thread: ConvertsTo<thread::Safe>,
    {
        lifecycle::move_assign(self, source)
    }

    /// A wrapper of another prototype or strategy holding a copy of the
    /// stored callable.
    pub fn convert<L>(&self) -> Result<L, Error>
    where
        L: Facade,
        P: Compatible<L::Prototype>,
        thread::Safe: ConvertsTo<L::Thread>,
    {
        let mut target = L::vacant();
        lifecycle::copy_assign(&mut target, self)?;
        Ok(target)
    }

    /// Drops the stored callable, or detaches from the shared region.
    pub fn clear(&mut self) {
        lifecycle::clear(self)
    }

    /// Returns true if a callable is stored.
    pub fn is_present(&self) -> bool {
        self.holder().is_present()
    }

    /// Always true: a `SharedFn` keeps its callable on the heap.
    pub fn allocates(&self) -> bool {
        self.holder().allocates()
    }

    /// Extent of the region.
    pub fn buffer(&self) -> Extent {
        self.holder().buffer()
    }

    /// Extent of the region in use by the stored callable.
    pub fn occupied(&self) -> Extent {
        self.holder().occupied()
    }

    /// Returns true if `self` and `other` share a region.
    pub fn shares_with<Q>(&self, other: &SharedFn<Q>) -> bool
    where
        Q: Prototype<Signature = P::Signature>,
    {
        Arc::ptr_eq(&self.region, &other.region)
    }

    /// Number of wrappers sharing the region, including `self`.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.region)
    }

    fn from_region(region: Region<P::Signature>) -> SharedFn<P> {
        SharedFn {
            region: Arc::new(region),
            prototype: PhantomData,
        }
    }

    fn log_detach(&self) {
        log::debug!(
            "detaching from a region shared with {} other callables",
            Arc::strong_count(&self.region).saturating_sub(1)
        );
    }

    /// The region, made exclusive first.
    fn exclusive(&mut self) -> &mut Region<P::Signature> {
        if Arc::get_mut(&mut self.region).is_none() {
            self.log_detach();
            self.region = Arc::new(Region::vacant());
        }
        match Arc::get_mut(&mut self.region) {
            Some(region) => region,
            None => unreachable!("a fresh region has a single owner"),
        }
    }
}

impl<P: Prototype> Slot for SharedFn<P> {
    type Prototype = P;
    type Thread = thread::Safe;

    fn vacant() -> Self {
        SharedFn::empty()
    }

    fn holder(&self) -> &dyn Dispatch<SignatureOf<Self>> {
        self.region.holder()
    }

    fn holder_mut(&mut self) -> Option<&mut dyn Dispatch<SignatureOf<Self>>> {
        Arc::get_mut(&mut self.region).map(Region::holder_mut)
    }

    fn holder_exclusive(&mut self) -> &mut dyn Dispatch<SignatureOf<Self>> {
        if Arc::get_mut(&mut self.region).is_none() {
            self.log_detach();
            let mut region = Region::vacant();
            if self.region.holder().copy_into(Target::Shared(&mut region)).is_err() {
                unreachable!("a region grows to fit any holder");
            }
            self.region = Arc::new(region);
        }
        self.exclusive().holder_mut()
    }

    fn target(&mut self) -> Target<'_, SignatureOf<Self>> {
        Target::Shared(self.exclusive())
    }

    fn shared(&self) -> Option<&Arc<Region<SignatureOf<Self>>>> {
        Some(&self.region)
    }

    fn shared_mut(&mut self) -> Option<&mut Arc<Region<SignatureOf<Self>>>> {
        Some(&mut self.region)
    }

    unsafe fn vacate(&mut self) {
        match Arc::get_mut(&mut self.region) {
            Some(region) => region.vacate(),
            None => unreachable!("only an exclusive region is moved out of"),
        }
    }
}

impl<P: Prototype> Facade for SharedFn<P> {}

impl<P: Prototype> Default for SharedFn<P> {
    fn default() -> Self {
        SharedFn::empty()
    }
}

impl<P: Prototype> Clone for SharedFn<P> {
    fn clone(&self) -> Self {
        SharedFn {
            region: Arc::clone(&self.region),
            prototype: PhantomData,
        }
    }
}

impl<P: Prototype> fmt::Debug for SharedFn<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SharedFn")
            .field("present", &self.is_present())
            .field("occupied", &self.occupied())
            .field("buffer", &self.buffer())
            .field("share_count", &self.share_count())
            .finish()
    }
}
