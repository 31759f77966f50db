//! Line-based assertions on log files.
//!
//! A line matches when it contains any of the targets as a substring. A log
//! file that does not exist has no lines, so it never matches.

use encoding_rs::Encoding;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rsqa_utils::error::{AssertionError, FixtureError, QaError};

use crate::charset;

/// Maximum number of matching lines quoted in a failed absence check.
pub const MAX_REPORTED_LINES: usize = 20;

/// A log file plus the charset used to read it.
#[derive(Debug, Clone)]
pub struct LogScan {
    path: PathBuf,
    charset: Option<String>,
}

impl LogScan {
    /// Scan `path` as UTF-8, replacing malformed sequences.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            charset: None,
        }
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encoding(&self) -> Result<&'static Encoding, FixtureError> {
        self.charset
            .as_deref()
            .map_or(Ok(encoding_rs::UTF_8), charset::resolve)
    }

    fn read_lines(&self) -> Result<Vec<String>, FixtureError> {
        let encoding = self.encoding()?;
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Log file absent, treating as empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(FixtureError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let text = charset::decode(encoding, &bytes, &self.path);
        Ok(text.lines().map(str::to_string).collect())
    }

    /// Lines containing any target; every line when `targets` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the file exists but cannot be read, or
    /// the charset is unknown.
    pub fn matching_lines<S: AsRef<str>>(&self, targets: &[S]) -> Result<Vec<String>, FixtureError> {
        let lines = self.read_lines()?;
        if targets.is_empty() {
            return Ok(lines);
        }
        Ok(lines
            .into_iter()
            .filter(|line| contains_any(line, targets))
            .collect())
    }

    /// Number of lines containing any target. Empty `targets` match nothing.
    ///
    /// # Errors
    ///
    /// Same as [`LogScan::matching_lines`].
    pub fn count_matching_lines<S: AsRef<str>>(&self, targets: &[S]) -> Result<usize, FixtureError> {
        Ok(self
            .read_lines()?
            .iter()
            .filter(|line| contains_any(line, targets))
            .count())
    }

    /// Fail when any line contains any target.
    ///
    /// # Errors
    ///
    /// [`AssertionError::LogContainsUnexpected`] quoting up to
    /// [`MAX_REPORTED_LINES`] matching lines, or a [`FixtureError`].
    pub fn confirm_not_contains<S: AsRef<str>>(&self, targets: &[S]) -> Result<(), QaError> {
        let matches: Vec<String> = self
            .read_lines()?
            .into_iter()
            .filter(|line| contains_any(line, targets))
            .collect();
        if matches.is_empty() {
            return Ok(());
        }

        let total = matches.len();
        Err(AssertionError::LogContainsUnexpected {
            path: self.path.clone(),
            targets: owned(targets),
            total,
            lines: matches.into_iter().take(MAX_REPORTED_LINES).collect(),
        }
        .into())
    }

    /// Fail unless at least one line contains a target.
    ///
    /// # Errors
    ///
    /// [`AssertionError::LogMissingExpected`], or a [`FixtureError`].
    pub fn confirm_contains<S: AsRef<str>>(&self, targets: &[S]) -> Result<(), QaError> {
        if self.count_matching_lines(targets)? > 0 {
            return Ok(());
        }
        Err(AssertionError::LogMissingExpected {
            path: self.path.clone(),
            targets: owned(targets),
        }
        .into())
    }

    /// Fail unless exactly `expected` lines contain a target.
    ///
    /// # Errors
    ///
    /// [`AssertionError::LogCountMismatch`], or a [`FixtureError`].
    pub fn confirm_contains_count<S: AsRef<str>>(
        &self,
        expected: usize,
        targets: &[S],
    ) -> Result<(), QaError> {
        let actual = self.count_matching_lines(targets)?;
        if actual == expected {
            return Ok(());
        }
        Err(AssertionError::LogCountMismatch {
            path: self.path.clone(),
            targets: owned(targets),
            expected,
            actual,
        }
        .into())
    }
}

fn contains_any<S: AsRef<str>>(line: &str, targets: &[S]) -> bool {
    targets.iter().any(|target| line.contains(target.as_ref()))
}

fn owned<S: AsRef<str>>(targets: &[S]) -> Vec<String> {
    targets.iter().map(|t| t.as_ref().to_string()).collect()
}

/// [`LogScan::confirm_not_contains`] on a UTF-8 log file.
///
/// # Errors
///
/// See [`LogScan::confirm_not_contains`].
pub fn confirm_not_contains<S: AsRef<str>>(path: &Path, targets: &[S]) -> Result<(), QaError> {
    LogScan::new(path).confirm_not_contains(targets)
}

/// [`LogScan::confirm_contains`] on a UTF-8 log file.
///
/// # Errors
///
/// See [`LogScan::confirm_contains`].
pub fn confirm_contains<S: AsRef<str>>(path: &Path, targets: &[S]) -> Result<(), QaError> {
    LogScan::new(path).confirm_contains(targets)
}

/// [`LogScan::confirm_contains_count`] on a UTF-8 log file.
///
/// # Errors
///
/// See [`LogScan::confirm_contains_count`].
pub fn confirm_contains_count<S: AsRef<str>>(
    path: &Path,
    expected: usize,
    targets: &[S],
) -> Result<(), QaError> {
    LogScan::new(path).confirm_contains_count(expected, targets)
}

/// # Errors
///
/// See [`LogScan::count_matching_lines`].
pub fn count_matching_lines<S: AsRef<str>>(path: &Path, targets: &[S]) -> Result<usize, FixtureError> {
    LogScan::new(path).count_matching_lines(targets)
}

/// # Errors
///
/// See [`LogScan::matching_lines`].
pub fn matching_lines<S: AsRef<str>>(path: &Path, targets: &[S]) -> Result<Vec<String>, FixtureError> {
    LogScan::new(path).matching_lines(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LEVELS: [&str; 3] = ["| W |", "| E |", "| F |"];

    fn write_log(dir: &TempDir, content: &[u8]) -> PathBuf {
        let path = dir.path().join("rss.log");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_clean_log_passes_absence_check() {
        let dir = TempDir::new().unwrap();
        let path = write_log(
            &dir,
            b"12:00:00 | I | SYS0001 starting\n12:00:01 | I | SYS0002 ready\n",
        );
        confirm_not_contains(&path, &LEVELS).unwrap();
    }

    #[test]
    fn test_absence_check_quotes_matching_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_log(
            &dir,
            b"a | I | ok\nb | W | low disk\nc | E | broken\n",
        );
        let err = confirm_not_contains(&path, &LEVELS).unwrap_err();
        match err {
            QaError::Assertion(AssertionError::LogContainsUnexpected { total, lines, .. }) => {
                assert_eq!(total, 2);
                assert_eq!(lines, ["b | W | low disk", "c | E | broken"]);
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_absence_check_caps_reported_lines() {
        let dir = TempDir::new().unwrap();
        let content: String = (0..25).map(|i| format!("{i} | F | boom\n")).collect();
        let path = write_log(&dir, content.as_bytes());
        match confirm_not_contains(&path, &["| F |"]).unwrap_err() {
            QaError::Assertion(AssertionError::LogContainsUnexpected { total, lines, .. }) => {
                assert_eq!(total, 25);
                assert_eq!(lines.len(), MAX_REPORTED_LINES);
                assert_eq!(lines[0], "0 | F | boom");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_missing_file_counts_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.log");
        assert_eq!(count_matching_lines(&path, &["x"]).unwrap(), 0);
        confirm_not_contains(&path, &LEVELS).unwrap();
        confirm_contains_count(&path, 0, &["x"]).unwrap();
        assert!(matches!(
            confirm_contains(&path, &["x"]),
            Err(QaError::Assertion(AssertionError::LogMissingExpected { .. }))
        ));
    }

    #[test]
    fn test_count_counts_lines_not_occurrences() {
        let dir = TempDir::new().unwrap();
        let path = write_log(&dir, b"foo foo bar\nbar\nbaz\r\nfoo\r\n");
        assert_eq!(count_matching_lines(&path, &["foo", "bar"]).unwrap(), 3);
        confirm_contains_count(&path, 2, &["foo"]).unwrap();

        let err = confirm_contains_count(&path, 5, &["foo"]).unwrap_err();
        assert!(matches!(
            err,
            QaError::Assertion(AssertionError::LogCountMismatch {
                expected: 5,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_targets() {
        let dir = TempDir::new().unwrap();
        let path = write_log(&dir, b"one\ntwo\n");
        let none: [&str; 0] = [];
        assert_eq!(matching_lines(&path, &none).unwrap(), ["one", "two"]);
        assert_eq!(count_matching_lines(&path, &none).unwrap(), 0);
    }

    #[test]
    fn test_charset_and_lossy_decoding() {
        let dir = TempDir::new().unwrap();
        let path = write_log(&dir, b"caf\xe9 | W | warn\n");

        let latin = LogScan::new(&path).with_charset("ISO-8859-1");
        assert_eq!(latin.matching_lines(&["café"]).unwrap(), ["café | W | warn"]);

        // Default UTF-8 decoding replaces the invalid byte but keeps the line
        assert_eq!(count_matching_lines(&path, &["| W |"]).unwrap(), 1);
    }

    #[test]
    fn test_unknown_charset_is_fixture_error() {
        let scan = LogScan::new("rss.log").with_charset("klingon");
        assert!(matches!(
            scan.confirm_contains(&["x"]),
            Err(QaError::Fixture(FixtureError::UnknownEncoding { .. }))
        ));
    }
}
