//! `call` for every prototype shape, on both facades.

use crate::abort;
use crate::error::Error;
use crate::facade::sealed::Slot;
use crate::prototype::{for_each_arity, Mutable, NoUnwind, Variadic};
use crate::sharedfn::SharedFn;
use crate::stackfn::StackFn;
use crate::thread::Mode;
use crate::varargs::VarArgs;

macro_rules! call_methods {
    ($facade: ident [$($param: ident $(: $bound: path)?),*] $($arg: ident)*) => {
        impl<R: 'static, $($arg: 'static,)* $($param $(: $bound)?),*> $facade<fn($($arg),*) -> R $(, $param)*> {
            /// Calls the stored callable.
            ///
            /// Fails with [`Error::Uninitialized`] if there is none.
            #[inline]
            #[allow(non_snake_case)]
            pub fn call(&self, $($arg: $arg),*) -> Result<R, Error> {
                self.holder().invoke(($($arg,)*))
            }
        }

        impl<R: 'static, $($arg: 'static,)* $($param $(: $bound)?),*> $facade<NoUnwind<fn($($arg),*) -> R> $(, $param)*> {
            /// Calls the stored callable.
            ///
            /// Aborts the process if there is none or if it unwinds.
            #[inline]
            #[allow(non_snake_case)]
            pub fn call(&self, $($arg: $arg),*) -> R {
                self.holder().invoke_no_unwind(($($arg,)*))
            }
        }

        impl<R: 'static, $($arg: 'static,)* $($param $(: $bound)?),*> $facade<Variadic<fn($($arg),*) -> R> $(, $param)*> {
            /// Calls the stored callable with trailing arguments `rest`.
            ///
            /// Fails with [`Error::Uninitialized`] if there is none.
            #[inline]
            #[allow(non_snake_case)]
            pub fn call(&self, $($arg: $arg,)* rest: VarArgs<'_>) -> Result<R, Error> {
                let thunk = self.holder().thunk()?;
                Ok(thunk.call(($($arg,)* rest,)))
            }
        }

        impl<R: 'static, $($arg: 'static,)* $($param $(: $bound)?),*>
            $facade<NoUnwind<Variadic<fn($($arg),*) -> R>> $(, $param)*>
        {
            /// Calls the stored callable with trailing arguments `rest`.
            ///
            /// Aborts the process if there is none or if it unwinds.
            #[inline]
            #[allow(non_snake_case)]
            pub fn call(&self, $($arg: $arg,)* rest: VarArgs<'_>) -> R {
                match self.holder().thunk() {
                    Ok(thunk) => thunk.call_no_unwind(($($arg,)* rest,)),
                    Err(error) => abort::abort(format_args!("{} at a no-unwind call site", error)),
                }
            }
        }

        impl<R: 'static, $($arg: 'static,)* $($param $(: $bound)?),*> $facade<Mutable<fn($($arg),*) -> R> $(, $param)*> {
            /// Calls the stored callable, which may change its state.
            ///
            /// Fails with [`Error::Uninitialized`] if there is none.
            #[inline]
            #[allow(non_snake_case)]
            pub fn call_mut(&mut self, $($arg: $arg),*) -> Result<R, Error> {
                self.holder_exclusive().invoke_mut(($($arg,)*))
            }
        }

        impl<R: 'static, $($arg: 'static,)* $($param $(: $bound)?),*>
            $facade<Mutable<NoUnwind<fn($($arg),*) -> R>> $(, $param)*>
        {
            /// Calls the stored callable, which may change its state.
            ///
            /// Aborts the process if there is none or if it unwinds.
            #[inline]
            #[allow(non_snake_case)]
            pub fn call_mut(&mut self, $($arg: $arg),*) -> R {
                self.holder_exclusive().invoke_mut_no_unwind(($($arg,)*))
            }
        }

        impl<R: 'static, $($arg: 'static,)* $($param $(: $bound)?),*>
            $facade<Mutable<Variadic<fn($($arg),*) -> R>> $(, $param)*>
        {
            /// Calls the stored callable with trailing arguments `rest`.
            ///
            /// Fails with [`Error::Uninitialized`] if there is none.
            #[inline]
            #[allow(non_snake_case)]
            pub fn call_mut(&mut self, $($arg: $arg,)* rest: VarArgs<'_>) -> Result<R, Error> {
                self.holder_exclusive().invoke_mut(($($arg,)* rest,))
            }
        }

        impl<R: 'static, $($arg: 'static,)* $($param $(: $bound)?),*>
            $facade<Mutable<NoUnwind<Variadic<fn($($arg),*) -> R>>> $(, $param)*>
        {
            /// Calls the stored callable with trailing arguments `rest`.
            ///
            /// Aborts the process if there is none or if it unwinds.
            #[inline]
            #[allow(non_snake_case)]
            pub fn call_mut(&mut self, $($arg: $arg,)* rest: VarArgs<'_>) -> R {
                self.holder_exclusive().invoke_mut_no_unwind(($($arg,)* rest,))
            }
        }
    };
}

macro_rules! calls {
    ($($arg: ident)*) => {
        call_methods!(StackFn [Space, M: Mode] $($arg)*);
        call_methods!(SharedFn [] $($arg)*);
    };
}

for_each_arity!(calls);
