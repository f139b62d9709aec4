/*
 * io.rs
 *
 * The diagnostic sink. Stderr by default, behind one lock.
 *
 * StderrWriter goes straight to write(2): no std::io::Stderr, no reentrant
 * lock of its own, nothing that could have been left half-locked by the
 * code that is now panicking. The Sink mutex is the only lock on the path
 * and it covers the whole block (format + write + flush), so concurrent
 * panics come out as whole blocks, never byte soup.
 *
 * parking_lot::Mutex doesn't poison. A writer that died mid-block can't turn
 * the lock into an error for the next one.
 */

use std::io::{self, Write};

use parking_lot::{Mutex, MutexGuard, const_mutex};

/// Unbuffered stderr via raw `write(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrWriter;

impl Write for StderrWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // SAFETY: buf is a valid slice for buf.len() bytes, STDERR_FILENO is
        // open for the life of the process (or write fails with EBADF).
        let n = unsafe { libc::write(libc::STDERR_FILENO, buf.as_ptr().cast(), buf.len()) };
        if n < 0 {
            /* write_all retries EINTR for us */
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)]
        Ok(n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        /* nothing buffered at this level */
        Ok(())
    }
}

/// A writer shared by every panicking thread. Holding the guard is holding
/// the sink.
pub struct Sink<W> {
    inner: Mutex<W>,
}

impl<W> Sink<W> {
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            inner: const_mutex(writer),
        }
    }

    /// Block until this thread owns the sink. No timeout: a hung writer
    /// stalls everyone queued behind it.
    pub fn lock(&self) -> MutexGuard<'_, W> {
        self.inner.lock()
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

/// Process stderr, shared by the default handler.
pub static STDERR: Sink<StderrWriter> = Sink::new(StderrWriter);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stderr_writer_accepts_bytes() {
        let mut w = StderrWriter;
        w.write_all(b"sink smoke test\n").unwrap();
        w.flush().unwrap();
    }

    #[test]
    fn test_sink_serializes_writers() {
        let sink = Arc::new(Sink::new(Vec::new()));
        let handles: Vec<_> = (0..4u8)
            .map(|tag| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let mut guard = sink.lock();
                        /* two writes under one guard must stay adjacent */
                        guard.extend_from_slice(&[tag; 8]);
                        guard.extend_from_slice(&[tag; 8]);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let sink = Arc::try_unwrap(sink).ok().unwrap();
        let bytes = sink.into_inner();
        assert_eq!(bytes.len(), 4 * 100 * 16);
        for chunk in bytes.chunks(16) {
            assert!(chunk.iter().all(|b| *b == chunk[0]));
        }
    }
}
