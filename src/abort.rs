//! Fatal termination for call sites that promised not to unwind.

use core::fmt;

/// Logs `reason` and terminates the process without unwinding.
#[cold]
#[inline(never)]
pub(crate) fn abort(reason: fmt::Arguments<'_>) -> ! {
    log::error!("aborting: {}", reason);
    terminate()
}

#[cfg(feature = "std")]
fn terminate() -> ! {
    std::process::abort()
}

#[cfg(not(feature = "std"))]
fn terminate() -> ! {
    // a panic raised while unwinding is an abort in every runtime
    struct Bomb;
    impl Drop for Bomb {
        fn drop(&mut self) {
            panic!("abort");
        }
    }

    let _bomb = Bomb;
    panic!("abort")
}

/// Runs `f`, aborting the process if it unwinds.
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> R {
    struct OnUnwind;
    impl Drop for OnUnwind {
        fn drop(&mut self) {
            abort(format_args!("callable unwound through a no-unwind call site"));
        }
    }

    let armed = OnUnwind;
    let result = f();
    core::mem::forget(armed);
    result
}
