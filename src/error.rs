use thiserror::Error;

/// Errors reported by [`StackFn`](crate::StackFn) and [`SharedFn`](crate::SharedFn).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// An empty wrapper was invoked through an unwinding call site.
    #[error("callable is uninitialized")]
    Uninitialized,

    /// A holder does not fit the receiving inline buffer.
    #[error("incompatible buffer: {0}")]
    IncompatibleBuffer(#[source] BufferMismatch),
}

/// The dimension in which a receiving buffer falls short.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BufferMismatch {
    /// The buffer is too small for the holder.
    #[error("holder needs {required} bytes but the buffer holds {available}")]
    Size {
        /// Size of the holder.
        required: usize,
        /// Size of the buffer.
        available: usize,
    },

    /// The buffer is not aligned strictly enough for the holder.
    #[error("holder needs {required}-byte alignment but the buffer is aligned to {available}")]
    Alignment {
        /// Alignment of the holder.
        required: usize,
        /// Alignment of the buffer.
        available: usize,
    },
}
