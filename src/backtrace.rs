/*
 * backtrace.rs
 *
 * Walk the calling thread's stack, hand each frame to a visitor.
 *
 * Best effort all the way down: a frame can come back without a symbol
 * (stripped binary), without an ip or sp (unwinder gave us null). None of
 * that is an error, it's just a missing field. If the platform can't walk
 * the stack at all we report 0 frames and let the caller complain.
 *
 * No locking on our side. The backtrace crate serializes its own unwinder
 * state, and we only ever look at the current thread's stack.
 *
 * Innermost frame first. The visitor returns false to stop early.
 */

/// Frames are never walked past this depth.
pub const MAX_DEPTH: usize = 128;

/// Innermost frames searched for the walker's own frame.
#[cfg(feature = "backtrace")]
const ANCHOR_WINDOW: usize = 16;

/// One captured stack frame. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub ip: Option<usize>,
    pub sp: Option<usize>,
    pub symbol: Option<String>,
}

/// Where to start and stop walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceConfig {
    /// Frames to drop from the innermost end (the capturer's own frames).
    pub skip: usize,
    /// Upper bound on frames delivered to the visitor.
    pub max_depth: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            skip: 0,
            max_depth: MAX_DEPTH,
        }
    }
}

/// Anything that can walk a stack. The default handler is written against
/// this so tests can hand it canned frames.
pub trait StackWalker {
    /// Deliver frames to `visit` as `(index, frame)`, index starting at 0
    /// after `skip`. Returns how many frames were delivered, 0 when the
    /// stack could not be walked.
    fn walk(&self, skip: usize, visit: &mut dyn FnMut(usize, Frame) -> bool) -> usize;
}

/// The real stack of the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct SystemWalker {
    pub max_depth: usize,
}

impl SystemWalker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }
}

impl Default for SystemWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl StackWalker for SystemWalker {
    #[inline(never)]
    fn walk(&self, skip: usize, visit: &mut dyn FnMut(usize, Frame) -> bool) -> usize {
        trace_with(
            TraceConfig {
                skip,
                max_depth: self.max_depth,
            },
            visit,
        )
    }
}

/// Capture the current stack, skipping `skip` innermost frames.
///
/// Returns the number of frames handed to `visit`.
#[inline(never)]
pub fn capture<F>(skip: usize, mut visit: F) -> usize
where
    F: FnMut(usize, Frame) -> bool,
{
    trace_with(
        TraceConfig {
            skip,
            max_depth: MAX_DEPTH,
        },
        &mut visit,
    )
}

/// [`capture`] with an explicit depth limit.
///
/// `skip` counts from the caller of this function: the unwinder's frames and
/// this one are dropped before `skip` applies.
#[cfg(feature = "backtrace")]
#[inline(never)]
pub fn trace_with(config: TraceConfig, visit: &mut dyn FnMut(usize, Frame) -> bool) -> usize {
    let anchor = trace_with as usize;
    let limit = ANCHOR_WINDOW
        .saturating_add(config.skip)
        .saturating_add(config.max_depth);

    /* raw walk first, symbol resolution (the slow part) only for frames
     * the visitor actually gets */
    let mut raw_frames: Vec<::backtrace::Frame> = Vec::new();
    ::backtrace::trace(|raw| {
        raw_frames.push(raw.clone());
        raw_frames.len() < limit
    });

    /* everything up to and including our own frame is the walker itself.
     * no anchor (symbol_address unsupported): keep the whole walk */
    let start = raw_frames
        .iter()
        .take(ANCHOR_WINDOW)
        .position(|raw| raw.symbol_address() as usize == anchor)
        .map_or(0, |own| own + 1);

    let mut delivered = 0usize;
    for raw in raw_frames
        .iter()
        .skip(start)
        .skip(config.skip)
        .take(config.max_depth)
    {
        let index = delivered;
        delivered += 1;
        if !visit(index, resolve(raw)) {
            break;
        }
    }

    delivered
}

/// Stack walking compiled out: nothing to report.
#[cfg(not(feature = "backtrace"))]
pub fn trace_with(_config: TraceConfig, _visit: &mut dyn FnMut(usize, Frame) -> bool) -> usize {
    0
}

#[cfg(feature = "backtrace")]
fn resolve(raw: &::backtrace::Frame) -> Frame {
    let ip = non_null(raw.ip() as usize);
    let sp = non_null(raw.sp() as usize);

    /* resolve_frame may call back more than once for inlined frames; the
     * first name is the innermost one, keep that */
    let mut symbol: Option<String> = None;
    ::backtrace::resolve_frame(raw, |sym| {
        if symbol.is_none() {
            symbol = sym
                .name()
                /* {:#} drops the ::h0123abcd mangling hash */
                .map(|name| format!("{name:#}"))
                .filter(|name| !name.is_empty());
        }
    });

    Frame { ip, sp, symbol }
}

#[cfg(feature = "backtrace")]
#[inline]
const fn non_null(addr: usize) -> Option<usize> {
    if addr == 0 { None } else { Some(addr) }
}
