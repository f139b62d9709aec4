/*
 * main.rs
 *
 * panic-probe: raise a panic through stx-panic and let it kill us.
 *
 * Exists so the integration tests can look at real stderr and a real
 * SIGABRT instead of a mocked sink. Every mode except --trace ends in
 * abort(); exit code 0 from anything else is a bug.
 */

use std::sync::{Arc, Barrier};
use std::thread;

use clap::Parser;
#[cfg(feature = "hook-override")]
use stx_panic::install_hook;
use stx_panic::{OrPanic, ReportPayload, SourceLocation, capture, stx_panic};

#[derive(Parser, Debug)]
#[command(
    name = "panic-probe",
    version,
    about = "Raise a panic through stx-panic and abort",
    after_help = "Exit status:\n\
                  terminated by SIGABRT in every mode except --trace"
)]
struct Args {
    /// Attach these bytes to the panic as its payload.
    #[arg(long = "payload", value_name = "BYTES")]
    payload: Option<String>,

    /// Panic from this many threads at once.
    #[arg(long = "threads", value_name = "N", default_value_t = 1)]
    threads: usize,

    /// Report the panic with no source location.
    #[arg(long = "unknown-location")]
    unknown_location: bool,

    /// Install a hook that prints a marker and returns instead of aborting.
    #[cfg(feature = "hook-override")]
    #[arg(long = "returning-hook", conflicts_with = "unwinding_hook")]
    returning_hook: bool,

    /// Install a hook that prints a marker and then unwinds with a std panic.
    #[cfg(feature = "hook-override")]
    #[arg(long = "unwinding-hook")]
    unwinding_hook: bool,

    /// Panic by unwrapping a `None`.
    #[arg(long = "unwrap-none", conflicts_with = "unwrap_err")]
    unwrap_none: bool,

    /// Panic by unwrapping a failed integer parse.
    #[arg(long = "unwrap-err")]
    unwrap_err: bool,

    /// Print this thread's backtrace to stdout and exit 0.
    #[arg(long = "trace")]
    trace: bool,

    /// Panic message.
    #[arg(value_name = "MESSAGE", default_value = "explicit panic")]
    message: String,
}

#[cfg(feature = "hook-override")]
fn returning_hook(message: &str, _payload: ReportPayload<'_>, _location: SourceLocation<'_>) {
    eprintln!("returning hook saw: {message}");
}

#[cfg(feature = "hook-override")]
fn unwinding_hook(message: &str, _payload: ReportPayload<'_>, _location: SourceLocation<'_>) {
    eprintln!("unwinding hook saw: {message}");
    std::panic!("hook gave up on: {message}");
}

#[cfg(feature = "hook-override")]
fn override_hook(args: &Args) {
    let hook: stx_panic::PanicHook = if args.returning_hook {
        returning_hook
    } else if args.unwinding_hook {
        unwinding_hook
    } else {
        return;
    };

    if let Err(err) = install_hook(hook) {
        eprintln!("panic-probe: {err}");
        std::process::exit(2);
    }
}

fn print_trace() {
    let count = capture(0, |index, frame| {
        println!(
            "#{index} {}",
            frame.symbol.as_deref().unwrap_or("<omitted>")
        );
        true
    });
    println!("frames: {count}");
}

fn raise(args: &Args) -> ! {
    let message = args.message.as_str();

    if args.unwrap_none {
        let missing: Option<u8> = None;
        missing.or_panic_with(message);
        unreachable!("or_panic_with on None returned");
    }

    if args.unwrap_err {
        "not a number".parse::<u32>().or_panic_with(message);
        unreachable!("or_panic_with on Err returned");
    }

    let payload = args.payload.as_deref().unwrap_or("");
    if args.unknown_location {
        stx_panic::panic(message, ReportPayload::from(payload), SourceLocation::unknown());
    }
    stx_panic!(message, payload)
}

fn main() {
    let args = Args::parse();

    if args.trace {
        print_trace();
        return;
    }

    #[cfg(feature = "hook-override")]
    override_hook(&args);

    if args.threads <= 1 {
        raise(&args);
    }

    /* line everyone up so the panics actually overlap */
    let args = Arc::new(args);
    let barrier = Arc::new(Barrier::new(args.threads));
    let handles: Vec<_> = (0..args.threads)
        .map(|_| {
            let args = Arc::clone(&args);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                raise(&args)
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }
    unreachable!("every thread panicked and none of them aborted");
}
