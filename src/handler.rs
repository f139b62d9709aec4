/*
 * handler.rs
 *
 * The built-in panic hook. Prints one block to stderr, then aborts.
 *
 *   \nthread with hash: '<n>' panicked with: '<msg>[: <payload>]' at function: '<fn>' [<file>:<line>:<col>]\n
 *
 * followed by the backtrace block when the backtrace feature is on. The
 * whole thing, backtrace included, is written under the sink lock so two
 * threads panicking at once produce two intact blocks.
 *
 * Nothing in here may panic. Every write is best effort: on failure we stop
 * writing that block and carry on to abort. Missing data prints a
 * placeholder, never an error.
 */

use core::hash::{Hash, Hasher};
use std::io::{self, BufWriter, Write};
use std::thread;

use rustc_hash::FxHasher;

#[cfg(feature = "backtrace")]
use crate::backtrace::SystemWalker;
use crate::backtrace::{Frame, StackWalker};
use crate::io::{STDERR, Sink};
use crate::location::SourceLocation;
use crate::panic::abort;
use crate::payload::ReportPayload;

/// Frames dropped from the top of the backtrace, counted from the walker's
/// caller: `SystemWalker::walk`, [`write_backtrace`], [`report`] and
/// [`default_handler`]. All four are `#[inline(never)]` so the count holds in
/// optimized builds. The first frame printed is whatever called the hook.
pub const BACKTRACE_SKIP: usize = 4;

/// Room for one report line before the buffer spills to the sink.
const FORMAT_BUFFER_SIZE: usize = 1024;

/// Printed for a zero line or column.
pub const UNKNOWN: &str = "unknown";

/// Printed for a frame field we couldn't resolve.
pub const OMITTED: &str = "<omitted>";

pub const BACKTRACE_HEADER: &str = "\nBacktrace:\nip: Instruction Pointer,  sp: Stack Pointer\n\n";

pub const FRAMES_UNAVAILABLE: &str = "WARNING >> The stack frames couldn't be identified, debug information was possibly stripped, unavailable, or elided by compiler\n";

/// Label for the calling thread: FxHash of its `ThreadId`.
///
/// Not unique, not stable across runs, not for anything but reading logs.
/// Two threads can collide.
#[must_use]
pub fn thread_hash() -> u64 {
    let mut hasher = FxHasher::default();
    thread::current().id().hash(&mut hasher);
    hasher.finish()
}

/// Everything that goes into the first line of a panic block.
#[derive(Debug, Clone, Copy)]
pub struct PanicReport<'a> {
    pub thread: u64,
    pub message: &'a str,
    pub payload: ReportPayload<'a>,
    pub location: SourceLocation<'a>,
}

impl<'a> PanicReport<'a> {
    /// Report labelled with the calling thread.
    #[must_use]
    pub fn new(message: &'a str, payload: ReportPayload<'a>, location: SourceLocation<'a>) -> Self {
        Self {
            thread: thread_hash(),
            message,
            payload,
            location,
        }
    }

    /// Write the report line. Message and payload go out byte for byte.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "\nthread with hash: '{}' panicked with: '", self.thread)?;
        out.write_all(self.message.as_bytes())?;

        if !self.payload.is_empty() {
            out.write_all(b": ")?;
            out.write_all(self.payload.data())?;
        }

        out.write_all(b"' at function: '")?;
        out.write_all(self.location.function_name().as_bytes())?;
        out.write_all(b"' [")?;
        out.write_all(self.location.file_name().as_bytes())?;
        out.write_all(b":")?;
        write_position(out, self.location.line())?;
        out.write_all(b":")?;
        write_position(out, self.location.column())?;
        out.write_all(b"]\n")
    }
}

fn write_position<W: Write + ?Sized>(out: &mut W, value: u32) -> io::Result<()> {
    if value == 0 {
        out.write_all(UNKNOWN.as_bytes())
    } else {
        write!(out, "{value}")
    }
}

fn write_address<W: Write + ?Sized>(out: &mut W, addr: Option<usize>) -> io::Result<()> {
    match addr {
        Some(addr) => write!(out, "{addr:#x}"),
        None => out.write_all(OMITTED.as_bytes()),
    }
}

/// One backtrace line: `#<i>\t\t<symbol>\t (ip: <ip>, sp: <sp>)`.
pub fn write_frame<W: Write + ?Sized>(out: &mut W, index: usize, frame: &Frame) -> io::Result<()> {
    write!(out, "#{index}\t\t")?;

    /* an empty name is as good as none */
    match frame.symbol.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => out.write_all(name.as_bytes())?,
        None => out.write_all(OMITTED.as_bytes())?,
    }

    out.write_all(b"\t (ip: ")?;
    write_address(out, frame.ip)?;
    out.write_all(b", sp: ")?;
    write_address(out, frame.sp)?;
    out.write_all(b")\n")
}

/// Header, frames (or the warning line), trailing blank line.
///
/// Returns the number of frames the walker produced.
#[inline(never)]
pub fn write_backtrace<W, S>(out: &mut W, walker: &S, skip: usize) -> io::Result<usize>
where
    W: Write + ?Sized,
    S: StackWalker + ?Sized,
{
    out.write_all(BACKTRACE_HEADER.as_bytes())?;

    let mut failed: Option<io::Error> = None;
    let frames = walker.walk(skip, &mut |index, frame| match write_frame(&mut *out, index, &frame) {
        Ok(()) => true,
        Err(err) => {
            failed = Some(err);
            false
        }
    });
    if let Some(err) = failed {
        return Err(err);
    }

    if frames == 0 {
        out.write_all(FRAMES_UNAVAILABLE.as_bytes())?;
    }
    out.write_all(b"\n")?;
    Ok(frames)
}

/// Lock the sink, write the report (and backtrace, if a walker is given),
/// flush, unlock. Does not terminate.
#[inline(never)]
pub fn report<W: Write>(sink: &Sink<W>, report: &PanicReport<'_>, walker: Option<&dyn StackWalker>) {
    let mut guard = sink.lock();
    let mut out = BufWriter::with_capacity(FORMAT_BUFFER_SIZE, &mut *guard);

    /* best effort: a failed write ends this block, nothing more */
    if report.write_to(&mut out).is_ok() && out.flush().is_ok() {
        if let Some(walker) = walker {
            let _ = write_backtrace(&mut out, walker, BACKTRACE_SKIP);
        }
    }
    let _ = out.flush();
    drop(out);

    /* other threads may log for a moment before the abort lands */
    drop(guard);
}

/// The hook every registry starts with. Reports to stderr and aborts.
#[inline(never)]
pub fn default_handler(message: &str, payload: ReportPayload<'_>, location: SourceLocation<'_>) {
    let block = PanicReport::new(message, payload, location);

    #[cfg(feature = "backtrace")]
    report(&STDERR, &block, Some(&SystemWalker::new()));
    #[cfg(not(feature = "backtrace"))]
    report(&STDERR, &block, None);

    abort()
}
