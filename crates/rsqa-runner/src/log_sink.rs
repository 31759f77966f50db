//! Shared, line-oriented log sink for server output
//!
//! Both drains of a supervised process write into one sink. Every line is
//! written and flushed as a single unit while the sink lock is held, so lines
//! from stdout and stderr never interleave mid-line. No ordering is guaranteed
//! across the two streams.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Cloneable handle to the log file both drains forward lines into.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    writer: Mutex<Option<BoxedWriter>>,
    path: PathBuf,
    lines_written: AtomicU64,
    lines_dropped: AtomicU64,
}

impl LogSink {
    /// Create (or truncate) `path` and use it as the sink.
    pub async fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::create(path).await?;
        Ok(Self::build(Box::new(file), path.to_path_buf()))
    }

    fn build(writer: BoxedWriter, path: PathBuf) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                writer: Mutex::new(Some(writer)),
                path,
                lines_written: AtomicU64::new(0),
                lines_dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Append `line` followed by a newline.
    ///
    /// Returns `Ok(false)` when the sink is already closed; the line is counted
    /// as dropped.
    pub async fn write_line(&self, line: &[u8]) -> io::Result<bool> {
        let mut guard = self.inner.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            self.inner.lines_dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(false);
        };

        let mut record = Vec::with_capacity(line.len() + 1);
        record.extend_from_slice(line);
        record.push(b'\n');
        writer.write_all(&record).await?;
        writer.flush().await?;

        self.inner.lines_written.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Flush and close the sink. Closing twice is a no-op.
    pub async fn close(&self) -> io::Result<()> {
        let writer = self.inner.writer.lock().await.take();
        if let Some(mut writer) = writer {
            writer.flush().await?;
            writer.shutdown().await?;
        }
        Ok(())
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.writer.lock().await.is_none()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    #[must_use]
    pub fn lines_written(&self) -> u64 {
        self.inner.lines_written.load(Ordering::Relaxed)
    }

    /// Lines that arrived after [`close`](Self::close).
    #[must_use]
    pub fn lines_dropped(&self) -> u64 {
        self.inner.lines_dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("path", &self.inner.path)
            .field("lines_written", &self.lines_written())
            .field("lines_dropped", &self.lines_dropped())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rss.log");
        std::fs::write(&path, "stale content from a previous run\n").unwrap();

        let sink = LogSink::create(&path).await.unwrap();
        sink.write_line(b"fresh").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
        assert_eq!(sink.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_write_after_close_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LogSink::create(dir.path().join("rss.log")).await.unwrap();

        assert!(sink.write_line(b"one").await.unwrap());
        sink.close().await.unwrap();
        assert!(sink.is_closed().await);
        assert!(!sink.write_line(b"two").await.unwrap());

        assert_eq!(sink.lines_written(), 1);
        assert_eq!(sink.lines_dropped(), 1);
        // second close is harmless
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_split_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rss.log");
        let sink = LogSink::create(&path).await.unwrap();

        let mut tasks = Vec::new();
        for writer in 0..2 {
            let sink = sink.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..200 {
                    let line = format!("writer-{writer} line-{i:04} {}", "x".repeat(64));
                    sink.write_line(line.as_bytes()).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 400);
        assert!(lines.iter().all(|l| l.starts_with("writer-") && l.ends_with(&"x".repeat(64))));
    }
}
