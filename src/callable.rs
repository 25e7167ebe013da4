//! Admission of callables into a wrapper.
//!
//! Whether a value may be stored under a prototype is decided entirely at
//! compile time by [`Callable`]. A rejected candidate is an unsatisfied trait
//! bound; there is no runtime check.

use crate::abort;
use crate::prototype::{for_each_arity, Mutable, NoUnwind, Prototype, Signature, Variadic};
use crate::varargs::VarArgs;

/// Markers selecting the admission rule of a [`Callable`] impl.
///
/// They are always inferred; naming them is never required.
pub mod kind {
    /// Any `Fn` (or, under [`Mutable`](crate::Mutable), `FnMut`) of the right shape.
    pub enum Plain {}
    /// A value wrapped in [`NoUnwind`](crate::NoUnwind).
    pub enum NoUnwind {}
}

/// Runtime tag of a stored callee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallableKind {
    /// May unwind.
    Plain,
    /// Vouched not to unwind, and aborts if it does.
    NoUnwind,
}

/// A plain callee as it is stored in a holder.
#[derive(Clone, Copy, Debug)]
pub struct Plain<F>(pub F);

/// A callee admitted under a [`Mutable`] prototype.
///
/// It is only ever called through `&mut`.
#[derive(Clone, Copy, Debug)]
pub struct Exclusive<C>(pub C);

/// Invocation of a stored callee through exclusive access.
pub trait InvokeMut<S: Signature> {
    /// Which unwinding convention the callee follows.
    fn kind(&self) -> CallableKind;

    /// Calls the callee.
    fn invoke_mut<'v>(&mut self, args: S::Args<'v>) -> S::Output;
}

/// Invocation of a stored callee through a shared reference.
pub trait Invoke<S: Signature>: InvokeMut<S> {
    /// Calls the callee.
    fn invoke<'v>(&self, args: S::Args<'v>) -> S::Output;
}

/// A callee in the form a holder keeps it.
pub trait Stored<S: Signature>: InvokeMut<S> + Clone + 'static {
    /// The callee, if it can be called through a shared reference.
    fn shared(&self) -> Option<&dyn Invoke<S>>;
}

impl<S: Signature, F> Stored<S> for Plain<F>
where
    Plain<F>: Invoke<S>,
    F: Clone + 'static,
{
    fn shared(&self) -> Option<&dyn Invoke<S>> {
        Some(self)
    }
}

impl<S: Signature, F> Stored<S> for NoUnwind<F>
where
    NoUnwind<F>: Invoke<S>,
    F: Clone + 'static,
{
    fn shared(&self) -> Option<&dyn Invoke<S>> {
        Some(self)
    }
}

impl<S: Signature, C: InvokeMut<S>> InvokeMut<S> for Exclusive<C> {
    fn kind(&self) -> CallableKind {
        self.0.kind()
    }

    fn invoke_mut<'v>(&mut self, args: S::Args<'v>) -> S::Output {
        self.0.invoke_mut(args)
    }
}

impl<S: Signature, C> Stored<S> for Exclusive<C>
where
    C: InvokeMut<S> + Clone + 'static,
{
    fn shared(&self) -> Option<&dyn Invoke<S>> {
        None
    }
}

/// Values that can be stored in a wrapper of prototype `P`.
///
/// Implemented for every `F: Fn(A..) -> R + Clone + 'static` under
/// `fn(A..) -> R`, and for `NoUnwind(f)` under both `fn(A..) -> R` and
/// `NoUnwind<fn(A..) -> R>`. [`Mutable`] prototypes take `FnMut` the same
/// way. Variadic prototypes take `F: Fn(A.., VarArgs) -> R`.
///
/// Thread safety is not part of admission: a [`SharedFn`](crate::SharedFn)
/// and a [`StackFn`](crate::StackFn) in [`thread::Safe`](crate::thread::Safe)
/// mode additionally require the stored form to be `Send + Sync`.
///
/// Closures passed directly to a constructor need their parameter types
/// annotated, since the prototype only reaches them through this trait.
///
/// ```
/// use smallfn::{NoUnwind, StackFn};
///
/// let plain: StackFn<fn(i32) -> i32> = StackFn::new(|x: i32| x + 1);
/// let vouched: StackFn<NoUnwind<fn(i32) -> i32>> = StackFn::new(NoUnwind(|x: i32| x + 1));
/// assert_eq!(plain.call(1), Ok(2));
/// assert_eq!(vouched.call(1), 2);
/// ```
///
/// Mutable closures need a [`Mutable`] prototype:
///
/// ```compile_fail
/// use smallfn::StackFn;
///
/// let mut count = 0;
/// let _ = StackFn::<fn()>::new(move || count += 1);
/// ```
///
/// An unvouched callable is rejected under a no-unwind prototype:
///
/// ```compile_fail
/// use smallfn::{NoUnwind, StackFn};
///
/// let _ = StackFn::<NoUnwind<fn(i32) -> i32>>::new(|x: i32| x + 1);
/// ```
pub trait Callable<P: Prototype, K>: Sized {
    /// The stored form of the callable.
    type Callee: Stored<P::Signature>;

    /// Converts the value into its stored form.
    fn into_callee(self) -> Self::Callee;
}

macro_rules! callables {
    ($($arg: ident)*) => {
        impl<F, R: 'static, $($arg: 'static),*> InvokeMut<fn($($arg),*) -> R> for Plain<F>
        where
            F: FnMut($($arg),*) -> R,
        {
            fn kind(&self) -> CallableKind {
                CallableKind::Plain
            }

            #[allow(non_snake_case)]
            fn invoke_mut<'v>(&mut self, ($($arg,)*): ($($arg,)*)) -> R {
                (self.0)($($arg),*)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Invoke<fn($($arg),*) -> R> for Plain<F>
        where
            F: Fn($($arg),*) -> R,
        {
            #[allow(non_snake_case)]
            fn invoke<'v>(&self, ($($arg,)*): ($($arg,)*)) -> R {
                (self.0)($($arg),*)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> InvokeMut<fn($($arg),*) -> R> for NoUnwind<F>
        where
            F: FnMut($($arg),*) -> R,
        {
            fn kind(&self) -> CallableKind {
                CallableKind::NoUnwind
            }

            #[allow(non_snake_case)]
            fn invoke_mut<'v>(&mut self, ($($arg,)*): ($($arg,)*)) -> R {
                abort::guard(|| (self.0)($($arg),*))
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Invoke<fn($($arg),*) -> R> for NoUnwind<F>
        where
            F: Fn($($arg),*) -> R,
        {
            #[allow(non_snake_case)]
            fn invoke<'v>(&self, ($($arg,)*): ($($arg,)*)) -> R {
                abort::guard(|| (self.0)($($arg),*))
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> InvokeMut<Variadic<fn($($arg),*) -> R>> for Plain<F>
        where
            F: for<'v> FnMut($($arg,)* VarArgs<'v>) -> R,
        {
            fn kind(&self) -> CallableKind {
                CallableKind::Plain
            }

            #[allow(non_snake_case)]
            fn invoke_mut<'v>(&mut self, ($($arg,)* rest,): ($($arg,)* VarArgs<'v>,)) -> R {
                (self.0)($($arg,)* rest)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Invoke<Variadic<fn($($arg),*) -> R>> for Plain<F>
        where
            F: for<'v> Fn($($arg,)* VarArgs<'v>) -> R,
        {
            #[allow(non_snake_case)]
            fn invoke<'v>(&self, ($($arg,)* rest,): ($($arg,)* VarArgs<'v>,)) -> R {
                (self.0)($($arg,)* rest)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> InvokeMut<Variadic<fn($($arg),*) -> R>> for NoUnwind<F>
        where
            F: for<'v> FnMut($($arg,)* VarArgs<'v>) -> R,
        {
            fn kind(&self) -> CallableKind {
                CallableKind::NoUnwind
            }

            #[allow(non_snake_case)]
            fn invoke_mut<'v>(&mut self, ($($arg,)* rest,): ($($arg,)* VarArgs<'v>,)) -> R {
                abort::guard(|| (self.0)($($arg,)* rest))
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Invoke<Variadic<fn($($arg),*) -> R>> for NoUnwind<F>
        where
            F: for<'v> Fn($($arg,)* VarArgs<'v>) -> R,
        {
            #[allow(non_snake_case)]
            fn invoke<'v>(&self, ($($arg,)* rest,): ($($arg,)* VarArgs<'v>,)) -> R {
                abort::guard(|| (self.0)($($arg,)* rest))
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<fn($($arg),*) -> R, kind::Plain> for F
        where
            F: Fn($($arg),*) -> R + Clone + 'static,
        {
            type Callee = Plain<F>;

            fn into_callee(self) -> Plain<F> {
                Plain(self)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<fn($($arg),*) -> R, kind::NoUnwind> for NoUnwind<F>
        where
            F: Fn($($arg),*) -> R + Clone + 'static,
        {
            type Callee = NoUnwind<F>;

            fn into_callee(self) -> NoUnwind<F> {
                self
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<NoUnwind<fn($($arg),*) -> R>, kind::NoUnwind>
            for NoUnwind<F>
        where
            F: Fn($($arg),*) -> R + Clone + 'static,
        {
            type Callee = NoUnwind<F>;

            fn into_callee(self) -> NoUnwind<F> {
                self
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<Mutable<fn($($arg),*) -> R>, kind::Plain> for F
        where
            F: FnMut($($arg),*) -> R + Clone + 'static,
        {
            type Callee = Exclusive<Plain<F>>;

            fn into_callee(self) -> Exclusive<Plain<F>> {
                Exclusive(Plain(self))
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<Mutable<fn($($arg),*) -> R>, kind::NoUnwind>
            for NoUnwind<F>
        where
            F: FnMut($($arg),*) -> R + Clone + 'static,
        {
            type Callee = Exclusive<NoUnwind<F>>;

            fn into_callee(self) -> Exclusive<NoUnwind<F>> {
                Exclusive(self)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<Mutable<NoUnwind<fn($($arg),*) -> R>>, kind::NoUnwind>
            for NoUnwind<F>
        where
            F: FnMut($($arg),*) -> R + Clone + 'static,
        {
            type Callee = Exclusive<NoUnwind<F>>;

            fn into_callee(self) -> Exclusive<NoUnwind<F>> {
                Exclusive(self)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<Variadic<fn($($arg),*) -> R>, kind::Plain> for F
        where
            F: for<'v> Fn($($arg,)* VarArgs<'v>) -> R + Clone + 'static,
        {
            type Callee = Plain<F>;

            fn into_callee(self) -> Plain<F> {
                Plain(self)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<Variadic<fn($($arg),*) -> R>, kind::NoUnwind>
            for NoUnwind<F>
        where
            F: for<'v> Fn($($arg,)* VarArgs<'v>) -> R + Clone + 'static,
        {
            type Callee = NoUnwind<F>;

            fn into_callee(self) -> NoUnwind<F> {
                self
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<NoUnwind<Variadic<fn($($arg),*) -> R>>, kind::NoUnwind>
            for NoUnwind<F>
        where
            F: for<'v> Fn($($arg,)* VarArgs<'v>) -> R + Clone + 'static,
        {
            type Callee = NoUnwind<F>;

            fn into_callee(self) -> NoUnwind<F> {
                self
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<Mutable<Variadic<fn($($arg),*) -> R>>, kind::Plain> for F
        where
            F: for<'v> FnMut($($arg,)* VarArgs<'v>) -> R + Clone + 'static,
        {
            type Callee = Exclusive<Plain<F>>;

            fn into_callee(self) -> Exclusive<Plain<F>> {
                Exclusive(Plain(self))
            }
        }

        impl<F, R: 'static, $($arg: 'static),*> Callable<Mutable<Variadic<fn($($arg),*) -> R>>, kind::NoUnwind>
            for NoUnwind<F>
        where
            F: for<'v> FnMut($($arg,)* VarArgs<'v>) -> R + Clone + 'static,
        {
            type Callee = Exclusive<NoUnwind<F>>;

            fn into_callee(self) -> Exclusive<NoUnwind<F>> {
                Exclusive(self)
            }
        }

        impl<F, R: 'static, $($arg: 'static),*>
            Callable<Mutable<NoUnwind<Variadic<fn($($arg),*) -> R>>>, kind::NoUnwind> for NoUnwind<F>
        where
            F: for<'v> FnMut($($arg,)* VarArgs<'v>) -> R + Clone + 'static,
        {
            type Callee = Exclusive<NoUnwind<F>>;

            fn into_callee(self) -> Exclusive<NoUnwind<F>> {
                Exclusive(self)
            }
        }
    };
}

for_each_arity!(callables);
