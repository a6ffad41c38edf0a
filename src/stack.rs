//! Stack growth for the recursive tree walks.
//!
//! The parser and every walk over a parsed tree recurse once per level. Wrapping each level in [`ensure_sufficient_stack`]
//! moves deep trees onto a freshly allocated segment instead of overflowing.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
