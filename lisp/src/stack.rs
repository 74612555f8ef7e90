//! Stack growth for recursive descent over nested forms and values.
//!
//! Evaluation, parsing and printing all recurse once per nesting level, so
//! each recursive step goes through [`ensure_sufficient_stack`], which moves
//! onto a fresh stack segment when the current one runs low.

/// Grow when less than this remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
