//! Signature shapes a wrapper can be instantiated for.
//!
//! A prototype is named with a function pointer type, optionally wrapped:
//!
//! | shape                | prototype                             |
//! |----------------------|---------------------------------------|
//! | plain                | `fn(A, B) -> R`                       |
//! | no-unwind            | `NoUnwind<fn(A, B) -> R>`             |
//! | variadic             | `Variadic<fn(A, B) -> R>`             |
//! | variadic, no-unwind  | `NoUnwind<Variadic<fn(A, B) -> R>>`   |
//!
//! Each shape can also be wrapped in [`Mutable`], which admits `FnMut`
//! callables and is called through `call_mut`.
//!
//! Up to six fixed parameters are supported. A variadic prototype takes its
//! trailing arguments as [`VarArgs`].

use core::marker::PhantomData;

use crate::varargs::VarArgs;

/// The unwinding shape underneath a [`Prototype`].
///
/// Holders are dispatched per signature; whether a call site may unwind is a
/// property of the prototype, not of the holder.
pub trait Signature: 'static {
    /// Arguments of one call, as a tuple. Variadic signatures end with [`VarArgs`].
    type Args<'v>;
    /// Return type.
    type Output;
    /// Whether trailing [`VarArgs`] are accepted.
    const VARIADIC: bool;
}

/// A signature a wrapper can be instantiated for.
pub trait Prototype: 'static {
    /// The signature with the no-unwind qualifier removed.
    type Signature: Signature;
    /// Whether call sites promise not to unwind.
    const NO_UNWIND: bool;
}

/// `Self` can be converted into a wrapper of prototype `P`.
///
/// Holds for equal prototypes, for `NoUnwind<X>` into `X`, and for `X` into
/// `Mutable<X>`. A wrapper never gains a no-unwind guarantee through
/// conversion, and a mutable callable never becomes callable through `&self`.
pub trait Compatible<P: Prototype>: Prototype<Signature = <P as Prototype>::Signature> {}

/// Marks a prototype as variadic: `Variadic<fn(A) -> R>`.
pub struct Variadic<F>(PhantomData<F>);

/// Marks a prototype as called through `&mut self`: `Mutable<fn(A) -> R>`.
///
/// Such wrappers admit `FnMut` callables.
///
/// ```
/// use smallfn::{Mutable, StackFn};
///
/// let mut count = 0;
/// let mut next: StackFn<Mutable<fn() -> i32>> = StackFn::new(move || {
///     count += 1;
///     count
/// });
/// assert_eq!(next.call_mut(), Ok(1));
/// assert_eq!(next.call_mut(), Ok(2));
/// ```
pub struct Mutable<F>(PhantomData<F>);

/// No-unwind qualifier.
///
/// As a prototype, `NoUnwind<fn(A) -> R>` declares call sites that never
/// unwind. As a value, `NoUnwind(f)` vouches that `f` does not unwind; only
/// such values are admitted by no-unwind prototypes, and a panic escaping one
/// aborts the process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoUnwind<F>(pub F);

macro_rules! prototypes {
    ($sig: ty; $($gen: ident)*) => {
        impl<$($gen: 'static),*> Prototype for $sig {
            type Signature = $sig;
            const NO_UNWIND: bool = false;
        }

        impl<$($gen: 'static),*> Prototype for NoUnwind<$sig> {
            type Signature = $sig;
            const NO_UNWIND: bool = true;
        }

        impl<$($gen: 'static),*> Prototype for Mutable<$sig> {
            type Signature = $sig;
            const NO_UNWIND: bool = false;
        }

        impl<$($gen: 'static),*> Prototype for Mutable<NoUnwind<$sig>> {
            type Signature = $sig;
            const NO_UNWIND: bool = true;
        }

        impl<$($gen: 'static),*> Compatible<$sig> for $sig {}
        impl<$($gen: 'static),*> Compatible<NoUnwind<$sig>> for NoUnwind<$sig> {}
        impl<$($gen: 'static),*> Compatible<$sig> for NoUnwind<$sig> {}

        impl<$($gen: 'static),*> Compatible<Mutable<$sig>> for $sig {}
        impl<$($gen: 'static),*> Compatible<Mutable<$sig>> for NoUnwind<$sig> {}
        impl<$($gen: 'static),*> Compatible<Mutable<$sig>> for Mutable<$sig> {}
        impl<$($gen: 'static),*> Compatible<Mutable<$sig>> for Mutable<NoUnwind<$sig>> {}
        impl<$($gen: 'static),*> Compatible<Mutable<NoUnwind<$sig>>> for NoUnwind<$sig> {}
        impl<$($gen: 'static),*> Compatible<Mutable<NoUnwind<$sig>>> for Mutable<NoUnwind<$sig>> {}
    };
}

macro_rules! signatures {
    ($($arg: ident)*) => {
        impl<R: 'static, $($arg: 'static),*> Signature for fn($($arg),*) -> R {
            type Args<'v> = ($($arg,)*);
            type Output = R;
            const VARIADIC: bool = false;
        }

        impl<R: 'static, $($arg: 'static),*> Signature for Variadic<fn($($arg),*) -> R> {
            type Args<'v> = ($($arg,)* VarArgs<'v>,);
            type Output = R;
            const VARIADIC: bool = true;
        }

        prototypes!(fn($($arg),*) -> R; R $($arg)*);
        prototypes!(Variadic<fn($($arg),*) -> R>; R $($arg)*);
    };
}

/// Invokes `$m` once per supported parameter list.
macro_rules! for_each_arity {
    ($m: ident) => {
        $m!();
        $m!(A1);
        $m!(A1 A2);
        $m!(A1 A2 A3);
        $m!(A1 A2 A3 A4);
        $m!(A1 A2 A3 A4 A5);
        $m!(A1 A2 A3 A4 A5 A6);
    };
}

pub(crate) use for_each_arity;

for_each_arity!(signatures);
