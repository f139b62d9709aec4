/*
 * panic.rs
 *
 * The single way to raise a panic. Looks up the active hook, runs it, and
 * makes sure the process dies afterwards no matter what the hook did.
 *
 * A well-behaved hook never returns (the default handler aborts). A hook
 * that returns, or unwinds out, still ends in abort() here. There is no
 * path from panic() back into ordinary control flow.
 *
 * abort, not exit: no unwinding, no atexit handlers, no destructors. state
 * is already broken, running more code over it is how you get corrupted
 * files on disk.
 */

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::hook::{HookRegistry, registry};
use crate::location::SourceLocation;
use crate::payload::ReportPayload;

/// Raise a panic through the process-wide registry. Does not return.
#[cold]
#[inline(never)]
pub fn panic(message: &str, payload: ReportPayload<'_>, location: SourceLocation<'_>) -> ! {
    panic_in(registry(), message, payload, location)
}

/// Raise a panic through a specific registry. Does not return.
#[cold]
#[inline(never)]
pub fn panic_in(
    registry: &HookRegistry,
    message: &str,
    payload: ReportPayload<'_>,
    location: SourceLocation<'_>,
) -> ! {
    let hook = registry.current();

    /* an unwinding hook must not carry the unwind into our caller */
    let _ = catch_unwind(AssertUnwindSafe(|| hook(message, payload, location)));

    /* the hook returned. it wasn't supposed to */
    abort()
}

/// Panic at the caller's location, no payload.
#[track_caller]
#[cold]
pub fn panic_here(message: &str) -> ! {
    panic(message, ReportPayload::empty(), SourceLocation::caller())
}

/// Panic at the caller's location with a payload.
#[track_caller]
#[cold]
pub fn panic_with<'a>(message: &str, payload: impl Into<ReportPayload<'a>>) -> ! {
    panic(message, payload.into(), SourceLocation::caller())
}

/// Kill the process with SIGABRT.
#[inline]
pub fn abort() -> ! {
    // SAFETY: abort(3) has no preconditions and never returns.
    unsafe { libc::abort() }
}

/// Raise a panic with the full location of the invocation site, including
/// the enclosing function name.
///
/// ```no_run
/// stx_panic::stx_panic!("disk full");
/// ```
///
/// ```no_run
/// stx_panic::stx_panic!("bad index", &[0x01u8, 0x02]);
/// ```
#[macro_export]
macro_rules! stx_panic {
    ($message:expr $(,)?) => {
        $crate::panic::panic(
            $message,
            $crate::payload::ReportPayload::empty(),
            $crate::location!(),
        )
    };
    ($message:expr, $payload:expr $(,)?) => {
        $crate::panic::panic(
            $message,
            $crate::payload::ReportPayload::from($payload),
            $crate::location!(),
        )
    };
}
