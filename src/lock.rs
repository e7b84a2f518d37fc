//! Advisory lock serializing store saves across processes.
//!
//! The lock is an exclusive `flock` (via fs2) on `store.lock` inside the data
//! directory. Waiting callers poll until a deadline and then give up with
//! [`StoreError::LockFailed`].

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::store::{StoreError, StoreResult};

/// How long a save waits for another writer before failing.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Held lock on a file; released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Lock `path`, creating it and its directory when missing, waiting up to
    /// `timeout` for a competing holder.
    pub fn acquire(path: impl AsRef<Path>, timeout: Duration) -> StoreResult<Self> {
        let path = path.as_ref();
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            if Instant::now() >= deadline {
                tracing::warn!(path = %path.display(), "timed out waiting for store lock");
                return Err(StoreError::LockFailed(path.to_path_buf()));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Lock `path` if nobody else holds it.
    pub fn try_acquire(path: impl AsRef<Path>) -> StoreResult<Option<Self>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(err) if is_contended(&err) => Ok(None),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
