//! store::lock
//!
//! Exclusive store lock for the registry data directory.
//!
//! # Architecture
//!
//! Only one engine instance may own the store at a time. The lock is an
//! OS-level exclusive file lock at `<data_dir>/lock`, acquired when the
//! engine opens and held for its whole lifetime.
//!
//! # Invariants
//!
//! - Lock acquisition is non-blocking (fails fast if another process
//!   holds it)
//! - Lock is automatically released on drop (RAII pattern)

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// File name of the lock inside the data directory.
const LOCK_FILE: &str = "lock";

/// Errors from store locking.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already owns the store.
    #[error("store is locked by another meshline process")]
    AlreadyLocked,

    /// Failed to create the lock file or data directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on the store's data directory.
///
/// Released automatically when dropped.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl StoreLock {
    /// Attempt to acquire the store lock for `data_dir`.
    ///
    /// Creates the data directory if needed. Non-blocking: if another
    /// process holds the lock this returns [`LockError::AlreadyLocked`]
    /// immediately rather than waiting.
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        fs::create_dir_all(data_dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", data_dir.display(), e))
        })?;

        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
