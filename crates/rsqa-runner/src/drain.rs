//! Line-by-line draining of child process output into a [`LogSink`]
//!
//! Stdout is read in two phases: synchronously until the startup marker is
//! seen ([`drain_until_marker`]), then in a background task
//! ([`spawn_drain`]) so the server never blocks on a full pipe. Stderr is
//! drained in a background task from the moment the process is spawned.
//!
//! Lines are handled as bytes. Invalid UTF-8 from the server never aborts a
//! drain; marker matching uses a lossy view of the line.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::DrainError;
use crate::log_sink::LogSink;
use crate::types::StreamKind;

/// Strip one trailing `\n` and an optional preceding `\r`.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Read lines from `reader`, forwarding each to `sink`, until one contains `marker`.
///
/// The matching line is forwarded before returning. Returns the number of
/// lines read, including the matching one.
///
/// # Errors
///
/// [`DrainError::EofBeforeMarker`] when the stream ends first, or
/// [`DrainError::Io`] on a read or sink failure.
pub async fn drain_until_marker<R>(
    reader: &mut R,
    sink: &LogSink,
    marker: &str,
) -> Result<u64, DrainError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(256);
    let mut lines = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Err(DrainError::EofBeforeMarker {
                marker: marker.to_string(),
            });
        }

        let line = trim_line_ending(&buf);
        sink.write_line(line).await?;
        lines += 1;

        if String::from_utf8_lossy(line).contains(marker) {
            debug!(lines, marker, "Startup marker observed");
            return Ok(lines);
        }
    }
}

/// Terminal state of a background drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DrainStatus {
    /// The stream reached end-of-file.
    Finished,
    /// Reading or forwarding failed; the error was logged.
    Failed { error: String },
    /// The task was aborted before the stream closed.
    Cancelled,
}

/// Outcome of one background drain, collected during shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub stream: StreamKind,
    #[serde(flatten)]
    pub status: DrainStatus,
    /// Lines written into the sink by this task.
    pub lines_forwarded: u64,
}

impl DrainReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.status == DrainStatus::Finished
    }
}

/// Owned handle to a background drain task.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct DrainHandle {
    stream: StreamKind,
    forwarded: Arc<AtomicU64>,
    task: Option<JoinHandle<DrainStatus>>,
}

/// Start forwarding every line of `reader` into `sink` on a tokio task.
///
/// Must be called from within a tokio runtime.
pub fn spawn_drain<R>(reader: R, sink: LogSink, stream: StreamKind) -> DrainHandle
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let forwarded = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&forwarded);
    let task = tokio::spawn(forward_lines(reader, sink, stream, counter));

    DrainHandle {
        stream,
        forwarded,
        task: Some(task),
    }
}

async fn forward_lines<R>(
    mut reader: R,
    sink: LogSink,
    stream: StreamKind,
    forwarded: Arc<AtomicU64>,
) -> DrainStatus
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                debug!(%stream, lines = forwarded.load(Ordering::Relaxed), "Output stream closed");
                return DrainStatus::Finished;
            }
            Ok(_) => match sink.write_line(trim_line_ending(&buf)).await {
                Ok(true) => {
                    forwarded.fetch_add(1, Ordering::Relaxed);
                }
                // sink closed: keep reading so the child never blocks on a full pipe
                Ok(false) => {}
                Err(err) => {
                    warn!(%stream, error = %err, "Failed to write server output to log sink");
                    return DrainStatus::Failed {
                        error: err.to_string(),
                    };
                }
            },
            Err(err) => {
                warn!(%stream, error = %err, "Failed to read server output");
                return DrainStatus::Failed {
                    error: err.to_string(),
                };
            }
        }
    }
}

impl DrainHandle {
    #[must_use]
    pub const fn stream(&self) -> StreamKind {
        self.stream
    }

    #[must_use]
    pub fn lines_forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Wait up to `timeout` for the drain to end on its own, cancelling it otherwise.
    pub async fn join(mut self, timeout: Duration) -> DrainReport {
        let status = match self.task.take() {
            None => DrainStatus::Cancelled,
            Some(mut task) => match tokio::time::timeout(timeout, &mut task).await {
                Ok(Ok(status)) => status,
                Ok(Err(join_err)) if join_err.is_cancelled() => DrainStatus::Cancelled,
                Ok(Err(join_err)) => DrainStatus::Failed {
                    error: format!("drain task panicked: {join_err}"),
                },
                Err(_) => {
                    debug!(stream = %self.stream, ?timeout, "Drain still running, cancelling");
                    task.abort();
                    let _ = task.await;
                    DrainStatus::Cancelled
                }
            },
        };

        DrainReport {
            stream: self.stream,
            status,
            lines_forwarded: self.lines_forwarded(),
        }
    }
}

impl Drop for DrainHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
