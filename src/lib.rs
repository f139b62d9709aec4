/*
 * lib.rs
 *
 * Panic plumbing for code that wants a say in how it dies: one replaceable
 * hook, a default handler that reports to stderr under a lock and aborts,
 * and best-effort backtraces.
 */

//! # stx-panic
//!
//! A process-wide panic hook with a thread-safe default handler.
//!
//! Raising a panic looks up the active hook, runs it with the message, an
//! optional byte payload and the call site, and aborts the process. The
//! default handler prints a single block to stderr:
//!
//! ```text
//! thread with hash: '1234' panicked with: 'disk full' at function: 'app::save' [src/app.rs:10:5]
//! ```
//!
//! followed by a backtrace when the `backtrace` feature is on.
//!
//! ## Quick Start
//!
//! ```rust
//! use stx_panic::{HookRegistry, ReportPayload, SourceLocation};
//!
//! fn quiet(_msg: &str, _payload: ReportPayload<'_>, _loc: SourceLocation<'_>) {}
//!
//! let registry = HookRegistry::new();
//! registry.install(quiet).unwrap();
//! assert!(registry.install(quiet).is_err());
//! ```
//!
//! ## Features
//!
//! - `backtrace` (default): walk the stack and append frames to the report
//! - `hook-override` (default): `install` a replacement hook, once
//! - `runtime-hook`: a runtime-swappable hook layered over the installed one

pub mod backtrace;
pub mod error;
pub mod handler;
pub mod hook;
pub mod io;
pub mod location;
pub mod panic;
pub mod payload;
pub mod sync;
pub mod unwrap;

pub use crate::backtrace::{Frame, StackWalker, SystemWalker, TraceConfig, capture};
pub use error::{PanicError, Result};
pub use handler::{PanicReport, default_handler};
#[cfg(feature = "hook-override")]
pub use hook::install_hook;
pub use hook::{HookRegistry, PanicHook, current_hook, registry};
pub use location::SourceLocation;
pub use panic::{panic, panic_here, panic_in, panic_with};
pub use payload::ReportPayload;
pub use unwrap::OrPanic;
