//! Trailing arguments of variadic calls.

use core::any::Any;
use core::fmt;
use core::slice;

/// Trailing arguments of a [`Variadic`](crate::Variadic) call.
///
/// Rust closures cannot be C-variadic, so the trailing part of a variadic call
/// is handed over as a borrowed list of type-erased values. Build one with
/// [`varargs!`](crate::varargs) or [`VarArgs::new`].
///
/// # Example
///
/// ```
/// use smallfn::{varargs, VarArgs};
///
/// fn sum(first: i64, rest: VarArgs<'_>) -> i64 {
///     first + rest.iter().filter_map(|arg| arg.downcast_ref::<i64>()).sum::<i64>()
/// }
///
/// assert_eq!(sum(1, varargs![2i64, 3i64]), 6);
/// assert_eq!(sum(1, VarArgs::none()), 1);
/// ```
#[derive(Clone, Copy)]
pub struct VarArgs<'v> {
    args: &'v [&'v dyn Any],
}

impl<'v> VarArgs<'v> {
    /// Wraps a list of trailing arguments.
    pub const fn new(args: &'v [&'v dyn Any]) -> VarArgs<'v> {
        VarArgs { args }
    }

    /// No trailing arguments.
    pub const fn none() -> VarArgs<'static> {
        VarArgs { args: &[] }
    }

    /// Number of trailing arguments.
    pub const fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true if there are no trailing arguments.
    pub const fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The argument at `index`, if it exists and is a `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&'v T> {
        self.args.get(index)?.downcast_ref::<T>()
    }

    /// Iterates over the trailing arguments in call order.
    pub fn iter(&self) -> Iter<'v> {
        Iter {
            inner: self.args.iter(),
        }
    }
}

impl fmt::Debug for VarArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VarArgs").field("len", &self.len()).finish()
    }
}

impl<'v> IntoIterator for VarArgs<'v> {
    type Item = &'v dyn Any;
    type IntoIter = Iter<'v>;

    fn into_iter(self) -> Iter<'v> {
        self.iter()
    }
}

/// Iterator over [`VarArgs`].
#[derive(Clone, Debug)]
pub struct Iter<'v> {
    inner: slice::Iter<'v, &'v dyn Any>,
}

impl<'v> Iterator for Iter<'v> {
    type Item = &'v dyn Any;

    fn next(&mut self) -> Option<&'v dyn Any> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

#[doc(hidden)]
pub fn erase<T: Any>(value: &T) -> &dyn Any {
    value
}

/// Builds [`VarArgs`] from a list of expressions.
///
/// The values are borrowed for the rest of the enclosing statement, which is
/// exactly as long as a call needs them.
///
/// # Example
///
/// ```
/// use smallfn::varargs;
///
/// fn describe(rest: smallfn::VarArgs<'_>) -> (usize, Option<&'static str>) {
///     (rest.len(), rest.get::<&str>(1).copied())
/// }
///
/// assert_eq!(describe(varargs![1u8, "two", 3.0f32]), (3, Some("two")));
/// assert_eq!(describe(varargs![]), (0, None));
/// ```
#[macro_export]
macro_rules! varargs {
    () => {
        $crate::VarArgs::none()
    };
    ( $( $arg: expr ),+ $(,)? ) => {
        $crate::VarArgs::new(&[ $( $crate::varargs::erase(&$arg) ),+ ])
    };
}

#[cfg(test)]
mod tests {
    use super::VarArgs;
    use core::any::Any;

    #[test]
    fn test_get() {
        let args: [&dyn Any; 2] = [&7i32, &'x'];
        let rest = VarArgs::new(&args);
        assert_eq!(rest.len(), 2);
        assert_eq!(rest.get::<i32>(0), Some(&7));
        assert_eq!(rest.get::<char>(1), Some(&'x'));
        assert_eq!(rest.get::<char>(2), None);
    }

    #[test]
    fn test_none() {
        let rest = VarArgs::none();
        assert!(rest.is_empty());
        assert_eq!(rest.iter().count(), 0);
    }
}
