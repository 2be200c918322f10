//! On-demand stack growth.
//!
//! The parser descends once per nesting level and the evaluator once per
//! expression node and per script-level call, so a deeply nested program
//! or a recursive vine function can exhaust a native stack long before
//! the interpreter's own recursion limit is reached. Task threads start
//! with the platform default stack, which is smaller than the main
//! thread's on most systems.
//!
//! Wrap each recursive entry point in [`ensure_sufficient_stack`]. On
//! native targets the closure runs on a freshly allocated segment when
//! less than [`RED_ZONE`] bytes remain; on wasm it simply runs.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, growing the stack first if it is close to exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// wasm manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
