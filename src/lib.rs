//! # SmallFn: Type-Erased Callables Without the Box
//!
//! `smallfn` stores functions, function pointers and closures behind a single
//! type per signature, with two ownership strategies:
//!
//! - [`StackFn`] keeps the callable inline, in a fixed buffer owned by the
//!   wrapper. It never allocates; a callable too large for the buffer is a
//!   compile error.
//! - [`SharedFn`] keeps the callable in a reference-counted heap region that
//!   grows on demand. Clones share the region.
//!
//! ## Quick Start
//!
//! ```rust
//! use smallfn::{SharedFn, StackFn};
//!
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! let inline: StackFn<fn(i32, i32) -> i32> = StackFn::new(add);
//! assert_eq!(inline.call(2, 3), Ok(5));
//!
//! let scale = 10;
//! let shared: SharedFn<fn(i32, i32) -> i32> = SharedFn::new(move |a: i32, b: i32| (a + b) * scale);
//! assert_eq!(shared.call(2, 3), Ok(50));
//! ```
//!
//! Calling an empty wrapper reports an error instead of panicking:
//!
//! ```rust
//! use smallfn::{Error, StackFn};
//!
//! let nothing: StackFn<fn()> = StackFn::default();
//! assert_eq!(nothing.call(), Err(Error::Uninitialized));
//! ```
//!
//! ## Prototypes
//!
//! The first type parameter of a wrapper is its prototype, spelled as a
//! function pointer type:
//!
//! | prototype                              | `call` returns     |
//! |----------------------------------------|--------------------|
//! | `fn(A, B) -> R`                        | `Result<R, Error>` |
//! | `NoUnwind<fn(A, B) -> R>`              | `R`                |
//! | `Variadic<fn(A, B) -> R>`              | `Result<R, Error>` |
//! | `NoUnwind<Variadic<fn(A, B) -> R>>`    | `R`                |
//!
//! Wrapping any of these in [`Mutable`] admits `FnMut` callables, called
//! through `call_mut(&mut self)` instead of `call(&self)`:
//!
//! ```rust
//! use smallfn::{Mutable, SharedFn};
//!
//! let mut total = 0;
//! let mut add: SharedFn<Mutable<fn(i32) -> i32>> = SharedFn::new(move |x: i32| {
//!     total += x;
//!     total
//! });
//! let mut copy = add.clone();
//! assert_eq!(add.call_mut(2), Ok(2));
//! assert_eq!(add.call_mut(3), Ok(5));
//! // `add` copied the callable into a region of its own before changing it
//! assert_eq!(copy.call_mut(1), Ok(1));
//! ```
//!
//! A no-unwind wrapper only accepts callables wrapped in [`NoUnwind`], and
//! aborts the process if it is called while empty. Variadic wrappers take
//! their trailing arguments as [`VarArgs`]:
//!
//! ```rust
//! use smallfn::{varargs, NoUnwind, StackFn, VarArgs, Variadic};
//!
//! let count: StackFn<NoUnwind<Variadic<fn(usize) -> usize>>> =
//!     StackFn::new(NoUnwind(|base: usize, rest: VarArgs<'_>| base + rest.len()));
//! assert_eq!(count.call(1, varargs!["a", 2, 3.0]), 4);
//! ```
//!
//! Closures need their parameter types annotated when passed straight to a
//! wrapper. Callables must be `Clone + 'static`. [`SharedFn`], and [`StackFn`]
//! in the default [`thread::Safe`] mode, also require `Send + Sync`; a
//! [`thread::Local`] `StackFn` holds anything.
//!
//! ## Copying, Moving and Converting
//!
//! Wrappers convert into each other when their prototypes are compatible:
//! equal, dropping the no-unwind guarantee, or adding [`Mutable`].
//!
//! ```rust
//! use smallfn::{NoUnwind, SharedFn, StackFn};
//!
//! let mut inline: StackFn<NoUnwind<fn(u8) -> u8>> = StackFn::new(NoUnwind(|x: u8| x + 1));
//! let mut shared: SharedFn<fn(u8) -> u8> = inline.convert().unwrap();
//! assert_eq!(shared.call(1), Ok(2));
//!
//! let mut relaxed: StackFn<fn(u8) -> u8> = StackFn::empty();
//! relaxed.take_from(&mut inline).unwrap();
//! assert!(!inline.is_present());
//! assert_eq!(relaxed.call(2), Ok(3));
//!
//! shared.assign(&relaxed).unwrap();
//! ```
//!
//! ## Configuration
//!
//! ### Feature Flags
//!
//! - **`std`** (enabled by default)
//!   - Links to the standard library and aborts with `std::process::abort`
//!   - Disable for `#![no_std]` environments: `default-features = false`
//!
//! - **`nightly`** (optional, requires nightly)
//!   - Rebuilds inline holder pointers with strict-provenance APIs
//!
//! ### Buffer Size
//!
//! The inline buffer is a type parameter. [`space::DefaultSpace`] is eight
//! pointers wide and aligned to its size unless `SMALLFN_BUFFER_SIZE` and
//! `SMALLFN_BUFFER_ALIGN` are set at build time. Any sized type can serve:
//!
//! ```rust
//! use smallfn::StackFn;
//! use smallfn::space::S16;
//!
//! let table = [1u64; 8];
//! let wide: StackFn<fn(usize) -> u64, S16> = StackFn::new(move |i: usize| table[i]);
//! assert_eq!(wide.call(3), Ok(1));
//! ```
//!
//! ## Logging
//!
//! Region growth is logged at `trace`, detaching a shared region and
//! rejected inline copies at `debug`, and fatal aborts at `error` through
//! the [`log`](https://docs.rs/log) facade.

#![cfg_attr(feature = "nightly", feature(strict_provenance, set_ptr_value))]
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(stable_features)]
#![deny(missing_docs)]
#![deny(clippy::as_conversions)]

extern crate alloc;

mod abort;
mod call;
mod callable;
mod error;
mod extent;
mod facade;
mod holder;
mod lifecycle;
mod prototype;
mod region;
mod sharedfn;
pub mod space;
mod sptr;
mod stackfn;
pub mod thread;
pub mod varargs;

use static_assertions::{assert_impl_all, assert_not_impl_any, const_assert};

pub use crate::callable::{kind, Callable, CallableKind};
pub use crate::error::{BufferMismatch, Error};
pub use crate::extent::Extent;
pub use crate::facade::Facade;
pub use crate::prototype::{Compatible, Mutable, NoUnwind, Prototype, Signature, Variadic};
pub use crate::sharedfn::SharedFn;
pub use crate::stackfn::StackFn;
pub use crate::varargs::VarArgs;

const_assert!(Extent::of::<holder::Empty<holder::Shared>>().fits_in(Extent::DEFAULT));
assert_impl_all!(StackFn<fn(u8) -> u8>: Send, Sync, Clone, Default);
assert_impl_all!(SharedFn<NoUnwind<Variadic<fn() -> u8>>>: Send, Sync, Clone, Default);
assert_impl_all!(StackFn<Mutable<fn(u8) -> u8>, space::S4, thread::Local>: Clone, Default);
assert_not_impl_any!(StackFn<fn(u8) -> u8, space::S4, thread::Local>: Send, Sync);
