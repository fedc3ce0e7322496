//! Async stream line readers (non-UTF8-safe).
//!
//! Python servers and the native libraries below them can emit non-UTF8
//! bytes. `BufReader::lines()` would end the reader on invalid UTF-8, so
//! lines are read as bytes and decoded lossily.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use super::diagnostics::DiagnosticsBuffer;

/// Read `stream` line by line into `buffer` until EOF.
///
/// Each line is stored prefixed with `[stream_type]`.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    pid: u32,
    stream_type: &'static str,
    buffer: DiagnosticsBuffer,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf);
                    debug!(pid, %stream_type, "{}", line);
                    buffer.push(format!("[{stream_type}] {line}"));
                }
                Err(e) => {
                    debug!(pid, %stream_type, error = %e, "Output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(pid, %stream_type, "Output reader task exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_invalid_utf8_and_crlf() {
        let input: &[u8] = b"ready\r\nbad \xff byte\nno newline";
        let buffer = DiagnosticsBuffer::new(10);
        spawn_stream_reader(input, 1, "stderr", buffer.clone())
            .await
            .unwrap();

        let lines = buffer.snapshot();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "[stderr] ready");
        assert!(lines[1].starts_with("[stderr] bad "));
        assert!(lines[1].contains('\u{FFFD}'));
        assert_eq!(lines[2], "[stderr] no newline");
    }
}
