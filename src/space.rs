//! Inline buffer types for [`StackFn`](crate::StackFn).
//!
//! Any sized type can serve as a space: its size is the capacity and its
//! alignment is the strongest alignment a stored holder may require. A space
//! must at least fit an empty holder, which is two words.

/// Two words of inline space.
pub type S2 = [usize; 2];
/// Four words of inline space.
pub type S4 = [usize; 4];
/// Eight words of inline space.
pub type S8 = [usize; 8];
/// Sixteen words of inline space.
pub type S16 = [usize; 16];
/// Thirty-two words of inline space.
pub type S32 = [usize; 32];
/// Sixty-four words of inline space.
pub type S64 = [usize; 64];

include!(concat!(env!("OUT_DIR"), "/default_space.rs"));
