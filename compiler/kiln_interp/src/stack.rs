//! Native stack growth for nested inlining.
//!
//! Each inlined call recurses through the interpreter loop. The depth is
//! already capped by [`InterpConfig::max_inline_depth`](crate::InterpConfig),
//! but a generous cap combined with large frames can still exhaust the
//! thread's stack, so every inlined body runs behind [`ensure_sufficient_stack`].
//!
//! On wasm targets this is a passthrough.

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Grow when less than 128KB remains.
    const RED_ZONE: usize = 128 * 1024;
    /// Size of each new stack segment.
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
