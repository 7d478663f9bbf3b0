//! Forwarding of child stderr with shutdown-noise suppression.
//!
//! Python-based servers print long async-cleanup tracebacks when their stdin
//! closes. Those lines are dropped; everything else the server writes to
//! stderr is forwarded unchanged, one line at a time.

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

/// Substrings that start (or belong to) a suppressed block.
pub const NOISE_MARKERS: &[&str] = &[
    "Traceback (most recent call last):",
    "asyncgen:",
    "an error occurred during closing of asynchronous generator",
    "BaseExceptionGroup:",
    "GeneratorExit",
    "RuntimeError: Attempted to exit cancel scope",
    "+-+--",
    "+----",
    "| ",
    "+-",
    "File \"",
    "raise ",
    "~~~",
    "^^^",
    "...<",
    "During handling of the above exception",
    "anyio.create_task_group",
    "cancel_scope.__exit__",
];

/// Line-oriented writer decorator that drops traceback noise.
///
/// Blank lines are always dropped. A line containing any marker starts
/// suppression; while suppressing, lines starting with `|` or `+` are also
/// dropped. Any other line ends suppression and is passed through.
#[derive(Debug)]
pub struct FilteredStderr<W: Write> {
    inner: W,
    pending: Vec<u8>,
    suppressing: bool,
}

impl<W: Write> FilteredStderr<W> {
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            suppressing: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn filter_line(&mut self, line: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(line);
        let stripped = text.trim();

        if stripped.is_empty() {
            return Ok(());
        }
        if NOISE_MARKERS.iter().any(|m| stripped.contains(m)) {
            self.suppressing = true;
            return Ok(());
        }
        if self.suppressing && (stripped.starts_with('|') || stripped.starts_with('+')) {
            return Ok(());
        }

        self.suppressing = false;
        self.inner.write_all(line)?;
        self.inner.flush()
    }
}

impl<W: Write> Write for FilteredStderr<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.filter_line(&line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.filter_line(&line)?;
        }
        self.inner.flush()
    }
}

/// Forward `stream` to the parent's stderr through the filter.
///
/// Reads bytes rather than `lines()` so a server emitting invalid UTF-8
/// cannot end the task early. The task ends at EOF.
pub fn spawn_stderr_forwarder(stream: impl AsyncRead + Unpin + Send + 'static) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut out = FilteredStderr::new(io::stderr());
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if let Err(e) = out.write_all(&buf) {
                        debug!(error = %e, "stderr forwarder cannot write, exiting");
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "stderr forwarder exiting due to read error");
                    break;
                }
            }
        }

        let _ = out.flush();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> String {
        let mut filter = FilteredStderr::new(Vec::new());
        filter.write_all(input.as_bytes()).unwrap();
        filter.flush().unwrap();
        String::from_utf8(filter.into_inner()).unwrap()
    }

    #[test]
    fn test_plain_lines_pass_through() {
        let out = run("Starting server\nListening on stdio\n");
        assert_eq!(out, "Starting server\nListening on stdio\n");
    }

    #[test]
    fn test_traceback_block_is_suppressed() {
        let input = "\
before
Traceback (most recent call last):
  File \"/x/anyio/_backends.py\", line 10, in run
    raise exc
RuntimeError: Attempted to exit cancel scope in a different task
after
";
        assert_eq!(run(input), "before\nafter\n");
    }

    #[test]
    fn test_exception_group_continuation_lines() {
        let input = "\
  + Exception Group Traceback (most recent call last):
BaseExceptionGroup: unhandled errors in a TaskGroup (1 sub-exception)
+-+---------------- 1 ----------------
    | GeneratorExit
    +------------------------------------
+ trailing frame
real message
";
        assert_eq!(run(input), "real message\n");
    }

    #[test]
    fn test_pipe_line_outside_block_is_kept() {
        // "|x" has no marker and no suppression is active
        assert_eq!(run("|x\n"), "|x\n");
    }

    #[test]
    fn test_blank_lines_dropped() {
        assert_eq!(run("\n   \nhello\n\n"), "hello\n");
    }

    #[test]
    fn test_partial_writes_are_joined() {
        let mut filter = FilteredStderr::new(Vec::new());
        filter.write_all(b"hel").unwrap();
        filter.write_all(b"lo\nwor").unwrap();
        assert_eq!(filter.inner, b"hello\n");
        filter.flush().unwrap();
        assert_eq!(filter.into_inner(), b"hello\nwor");
    }

    #[test]
    fn test_suppression_resets_after_normal_line() {
        let input = "GeneratorExit\nok\n+ kept because suppression ended\n";
        assert_eq!(run(input), "ok\n+ kept because suppression ended\n");
    }

    #[tokio::test]
    async fn test_forwarder_ends_at_eof() {
        let stream = tokio_test::io::Builder::new()
            .read(b"server starting\n")
            .read(b"partial line without newline")
            .build();
        let handle = spawn_stderr_forwarder(stream);
        let joined = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        assert!(joined.is_ok_and(|r| r.is_ok()));
    }

    #[tokio::test]
    async fn test_forwarder_stops_on_read_error() {
        let stream = tokio_test::io::Builder::new()
            .read(b"first line\n")
            .read_error(io::Error::other("pipe broke"))
            .build();
        let handle = spawn_stderr_forwarder(stream);
        let joined = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        assert!(joined.is_ok_and(|r| r.is_ok()));
    }
}
