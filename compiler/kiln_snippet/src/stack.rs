//! Stack growth for deeply recursive evaluation and parsing.
//!
//! Snippet code may recurse up to the interpreter's call-depth limit, and
//! each interpreted call costs several native frames. On native targets the
//! `stacker` crate grows the stack before it runs out; on wasm the closure
//! is called directly.

/// Grow when less than this remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
