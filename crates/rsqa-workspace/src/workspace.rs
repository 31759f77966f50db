use camino::{Utf8Path, Utf8PathBuf};

use rsqa_utils::error::DirectoryError;

use crate::fs_ops::{delete_directory, ensure_directory};

/// Name of the scratch directory inside a test directory.
pub const WORK_DIR_NAME: &str = "work";

/// A test directory and its freshly created `work/` sub-directory.
///
/// The work directory is removed on drop unless [`TestWorkspace::preserve`]
/// was called. Use [`TestWorkspace::finish`] to observe cleanup errors; drop
/// only logs them.
#[derive(Debug)]
pub struct TestWorkspace {
    test_dir: Utf8PathBuf,
    work_dir: Utf8PathBuf,
    preserve: bool,
    cleaned: bool,
}

impl TestWorkspace {
    /// Delete any stale `work/` left in `test_dir` and create it again.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the old work directory cannot be
    /// removed or the new one cannot be created.
    pub fn prepare(test_dir: impl Into<Utf8PathBuf>) -> Result<Self, DirectoryError> {
        let test_dir = test_dir.into();
        let work_dir = test_dir.join(WORK_DIR_NAME);

        delete_directory(work_dir.as_std_path())?;
        ensure_directory(work_dir.as_std_path())?;
        tracing::debug!(work_dir = %work_dir, "Prepared test work directory");

        Ok(Self {
            test_dir,
            work_dir,
            preserve: false,
            cleaned: false,
        })
    }

    #[must_use]
    pub fn test_dir(&self) -> &Utf8Path {
        &self.test_dir
    }

    #[must_use]
    pub fn work_dir(&self) -> &Utf8Path {
        &self.work_dir
    }

    /// Path of a fixture file in the test directory.
    #[must_use]
    pub fn test_file(&self, name: &str) -> Utf8PathBuf {
        self.test_dir.join(name)
    }

    /// Path of a file the server writes into the work directory.
    #[must_use]
    pub fn work_file(&self, name: &str) -> Utf8PathBuf {
        self.work_dir.join(name)
    }

    /// Keep the work directory after the test for manual inspection.
    pub fn preserve(&mut self) {
        self.preserve = true;
    }

    #[must_use]
    pub fn is_preserved(&self) -> bool {
        self.preserve
    }

    /// Clean up now and report the result.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the work directory cannot be deleted.
    pub fn finish(mut self) -> Result<(), DirectoryError> {
        self.cleanup()
    }

    fn cleanup(&mut self) -> Result<(), DirectoryError> {
        if self.cleaned {
            return Ok(());
        }
        self.cleaned = true;

        if self.preserve {
            tracing::info!(work_dir = %self.work_dir, "Keeping work directory");
            return Ok(());
        }
        delete_directory(self.work_dir.as_std_path())
    }
}

impl Drop for TestWorkspace {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!(work_dir = %self.work_dir, error = %e, "Failed to clean up work directory");
        }
    }
}
