/*
 * fuzz_targets/render_report.rs
 *
 * fuzz target for report formatting. the formatter runs on the panic path,
 * so it must never panic itself, whatever bytes it is handed.
 *
 * edge cases: empty message, non-UTF-8 payload, interior NULs, 0 line/column
 */

#![no_main]

use libfuzzer_sys::fuzz_target;
use stx_panic::{PanicReport, ReportPayload, SourceLocation};

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }
    let (head, rest) = data.split_at(8);
    let line = u32::from_le_bytes([head[0], head[1], head[2], head[3]]);
    let column = u32::from_le_bytes([head[4], head[5], head[6], head[7]]);

    /* first half is the message (lossy), second half the raw payload */
    let (message, payload) = rest.split_at(rest.len() / 2);
    let message = String::from_utf8_lossy(message);

    let report = PanicReport {
        thread: 0,
        message: &message,
        payload: ReportPayload::new(payload),
        location: SourceLocation::new("fuzz.rs", "fuzz", line, column),
    };

    let mut out = Vec::new();
    report.write_to(&mut out).expect("writing to a Vec cannot fail");
    assert!(out.ends_with(b"]\n"));
});
