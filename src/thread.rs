//! Whether a [`StackFn`](crate::StackFn) may cross threads.
//!
//! In [`Safe`] mode, the default, a `StackFn` only holds `Send + Sync`
//! callables and is itself `Send + Sync`. In [`Local`] mode it holds any
//! callable and stays on the thread that made it:
//!
//! ```
//! use std::rc::Rc;
//! use smallfn::space::DefaultSpace;
//! use smallfn::{thread, StackFn};
//!
//! let shared = Rc::new(5);
//! let f: StackFn<fn() -> i32, DefaultSpace, thread::Local> = StackFn::new(move || *shared);
//! assert_eq!(f.call(), Ok(5));
//! ```
//!
//! ```compile_fail
//! use std::rc::Rc;
//! use smallfn::StackFn;
//!
//! let shared = Rc::new(5);
//! let _ = StackFn::<fn() -> i32>::new(move || *shared);
//! ```
//!
//! A [`SharedFn`](crate::SharedFn) is always `Safe`, so a `Local` wrapper
//! cannot be converted into one:
//!
//! ```compile_fail
//! use smallfn::space::DefaultSpace;
//! use smallfn::{thread, SharedFn, StackFn};
//!
//! let local: StackFn<fn() -> i32, DefaultSpace, thread::Local> = StackFn::new(|| 1);
//! let _ = SharedFn::<fn() -> i32>::from_facade(&local);
//! ```

mod sealed {
    pub trait Sealed {}
}

/// A thread-safety mode. It is sealed.
pub trait Mode: sealed::Sealed + 'static {}

/// Callables are `Send + Sync`, and so is the wrapper.
pub enum Safe {}

/// Any callable; the wrapper is neither `Send` nor `Sync`.
pub enum Local {}

impl sealed::Sealed for Safe {}
impl sealed::Sealed for Local {}
impl Mode for Safe {}
impl Mode for Local {}

/// Callees of type `C` may be stored in this mode.
pub trait Admits<C>: Mode {}

impl<C: Send + Sync> Admits<C> for Safe {}
impl<C> Admits<C> for Local {}

/// Callables may be copied or moved from this mode into mode `M`.
pub trait ConvertsTo<M: Mode>: Mode {}

impl ConvertsTo<Safe> for Safe {}
impl ConvertsTo<Local> for Safe {}
impl ConvertsTo<Local> for Local {}
