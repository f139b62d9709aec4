/*
 * library_api.rs
 *
 * integration-style tests exercising stx-panic as a library, in-process.
 *
 * nothing here may actually raise a panic: that aborts the test binary.
 * the abort path is covered by integration.rs through panic-probe.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use stx_panic::handler::{BACKTRACE_SKIP, report};
use stx_panic::io::Sink;
use stx_panic::{
    Frame, HookRegistry, OrPanic, PanicHook, PanicReport, ReportPayload, SourceLocation,
    StackWalker, capture, default_handler, location,
};

/* fixed frames so block contents don't depend on the real stack */
struct CannedWalker(usize);

impl StackWalker for CannedWalker {
    fn walk(&self, skip: usize, visit: &mut dyn FnMut(usize, Frame) -> bool) -> usize {
        let mut delivered = 0;
        for index in 0..self.0.saturating_sub(skip) {
            delivered += 1;
            let frame = Frame {
                ip: Some(0x1000 + index),
                sp: None,
                symbol: Some(format!("frame_{index}")),
            };
            if !visit(index, frame) {
                break;
            }
        }
        delivered
    }
}

fn same(a: PanicHook, b: PanicHook) -> bool {
    a as usize == b as usize
}

fn render_block(report_line: &PanicReport<'_>, walker: &dyn StackWalker) -> String {
    let sink = Sink::new(Vec::new());
    report(&sink, report_line, Some(walker));
    String::from_utf8(sink.into_inner()).unwrap()
}

/* =========================================================================
 * REGISTRY
 * ========================================================================= */

#[test]
fn library_global_registry_defaults_to_builtin_handler() {
    /* nothing in this test binary installs a global hook */
    assert!(same(stx_panic::current_hook(), default_handler));
    assert!(!stx_panic::registry().is_overridden());
}

#[cfg(feature = "hook-override")]
#[test]
fn library_install_is_once_only() {
    fn capture_hook(_: &str, _: ReportPayload<'_>, _: SourceLocation<'_>) {}

    let registry = HookRegistry::new();
    assert!(registry.install(capture_hook).is_ok());
    let err = registry.install(capture_hook).unwrap_err();
    assert_eq!(err, stx_panic::PanicError::HookAlreadyInstalled);
    assert!(same(registry.current(), capture_hook));
}

/* =========================================================================
 * BACKTRACE CAPTURE
 * ========================================================================= */

#[cfg(feature = "backtrace")]
#[test]
fn library_capture_honours_early_stop() {
    for k in 1..=3 {
        let mut visited = 0;
        let count = capture(0, |_, _| {
            visited += 1;
            visited < k
        });
        assert_eq!(count, k);
        assert_eq!(visited, k);
    }
}

#[cfg(feature = "backtrace")]
#[test]
fn library_capture_is_ordered_and_repeatable() {
    fn depth() -> (usize, Vec<usize>) {
        let mut indices = Vec::new();
        let count = capture(0, |index, _| {
            indices.push(index);
            true
        });
        (count, indices)
    }

    let (first, indices) = depth();
    let (second, _) = depth();
    assert!(first > 0);
    assert_eq!(first, second, "same call site, same depth");
    assert!(indices.windows(2).all(|w| w[1] == w[0] + 1));
}

#[cfg(feature = "backtrace")]
#[test]
fn library_capture_resolves_some_symbols() {
    let mut named = 0;
    capture(0, |_, frame: Frame| {
        if frame.symbol.is_some() {
            named += 1;
        }
        true
    });
    /* test binaries carry debug info */
    assert!(named > 0);
}

#[cfg(not(feature = "backtrace"))]
#[test]
fn library_capture_without_support_reports_zero() {
    assert_eq!(capture(0, |_, _| true), 0);
}

/* =========================================================================
 * REPORTING
 * ========================================================================= */

#[test]
fn library_location_macro_names_the_function() {
    let loc = location!();
    let block = render_block(
        &PanicReport {
            thread: 1,
            message: "here",
            payload: ReportPayload::empty(),
            location: loc,
        },
        &CannedWalker(0),
    );
    assert!(block.contains("at function: 'library_api::library_location_macro_names_the_function' [tests/library_api.rs:"));
}

#[test]
fn library_report_is_byte_identical_across_runs() {
    let line = PanicReport {
        thread: 99,
        message: "bad index",
        payload: ReportPayload::from(&[0x01u8, 0x02]),
        location: SourceLocation::new("src/vec.rs", "vec::get", 12, 4),
    };
    let walker = CannedWalker(5);
    assert_eq!(render_block(&line, &walker), render_block(&line, &walker));
}

#[test]
fn library_zero_frames_prints_warning_instead() {
    let line = PanicReport {
        thread: 1,
        message: "stripped",
        payload: ReportPayload::empty(),
        location: SourceLocation::unknown(),
    };
    let block = render_block(&line, &CannedWalker(0));
    assert!(block.contains("WARNING >> The stack frames couldn't be identified"));
    assert!(!block.contains("#0\t\t"));
}

#[test]
fn library_concurrent_reports_never_interleave() {
    const THREADS: u64 = 8;
    const PER_THREAD: usize = 25;

    let sink = Arc::new(Sink::new(Vec::new()));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let sink = Arc::clone(&sink);
            thread::spawn(move || {
                let message = format!("worker-{t}");
                let line = PanicReport {
                    thread: t,
                    message: &message,
                    payload: ReportPayload::from("payload"),
                    location: SourceLocation::new("src/pool.rs", "pool::run", 7, 3),
                };
                for _ in 0..PER_THREAD {
                    report(&*sink, &line, Some(&CannedWalker(BACKTRACE_SKIP + 6)));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    /* what each thread's block must look like on its own */
    let expected: HashMap<String, String> = (0..THREADS)
        .map(|t| {
            let message = format!("worker-{t}");
            let line = PanicReport {
                thread: t,
                message: &message,
                payload: ReportPayload::from("payload"),
                location: SourceLocation::new("src/pool.rs", "pool::run", 7, 3),
            };
            let block = render_block(&line, &CannedWalker(BACKTRACE_SKIP + 6));
            (message, block)
        })
        .collect();

    let sink = Arc::try_unwrap(sink).ok().unwrap();
    let output = String::from_utf8(sink.into_inner()).unwrap();

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut rest = output.as_str();
    while !rest.is_empty() {
        let (message, block) = expected
            .iter()
            .find(|(_, block)| rest.starts_with(block.as_str()))
            .expect("output is not a sequence of whole blocks");
        *seen.entry(message.as_str()).or_default() += 1;
        rest = &rest[block.len()..];
    }

    assert_eq!(seen.len(), THREADS as usize);
    assert!(seen.values().all(|n| *n == PER_THREAD));
}

/* =========================================================================
 * OPTION / RESULT
 * ========================================================================= */

#[test]
fn library_or_panic_passes_values_through() {
    assert_eq!(Some("cfg").or_panic(), "cfg");
    assert_eq!("42".parse::<u32>().or_panic_with("bad port"), 42);
}
