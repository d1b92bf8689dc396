//! store
//!
//! Durable store adapter: snapshot persistence and store locking.
//!
//! # Architecture
//!
//! The store owns a data directory containing:
//! - `registry.json` - the serialized registry snapshot
//! - `lock` - the exclusive store lock
//!
//! Saves are atomic: the snapshot is written to a temp file in the same
//! directory, synced, then renamed over the live file, so `load` never
//! observes a partially written snapshot after a completed `save`.
//!
//! # Contract
//!
//! - `load()` returns `Ok(None)` when no snapshot exists yet; a fresh
//!   store is not an error
//! - An unreadable or tampered snapshot is a [`StoreError::Corrupt`],
//!   never silently replaced with an empty registry

pub mod lock;

pub use lock::{LockError, StoreLock};

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::core::snapshot::{parse_snapshot, RegistrySnapshot, SnapshotError};

/// File name of the snapshot inside the data directory.
const SNAPSHOT_FILE: &str = "registry.json";

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store read/write failure.
    #[error("store i/o error at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The persisted snapshot is unreadable.
    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] SnapshotError),

    /// Another process owns the store.
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Snapshot store backed by a single JSON file.
///
/// The store holds no registry state itself; it only reads and writes
/// complete [`RegistrySnapshot`] documents.
#[derive(Debug)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store over the given data directory.
    ///
    /// The directory itself is created by [`StoreLock::acquire`]; the
    /// store assumes it exists by the time `save` is called.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path to the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Load the persisted snapshot.
    ///
    /// Returns `Ok(None)` if no snapshot has ever been saved.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Io`] if the file exists but cannot be read
    /// - [`StoreError::Corrupt`] if the contents fail parsing, kind or
    ///   version checks, or digest verification
    pub fn load(&self) -> Result<Option<RegistrySnapshot>, StoreError> {
        let path = self.snapshot_path();
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot on disk, starting empty");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };

        let snapshot = parse_snapshot(&json)?;
        debug!(
            products = snapshot.products.len(),
            edges = snapshot.edges.len(),
            "loaded snapshot"
        );
        Ok(Some(snapshot))
    }

    /// Save a snapshot with atomic-replace semantics.
    ///
    /// Writes to `registry.json.tmp`, syncs, then renames over the live
    /// file. After a failure mid-save, the previous snapshot is intact.
    pub fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError> {
        let path = self.snapshot_path();
        let json = snapshot.to_json()?;

        let temp_path = self.data_dir.join(format!("{SNAPSHOT_FILE}.tmp"));
        let mut file = fs::File::create(&temp_path).map_err(|e| StoreError::Io {
            path: temp_path.clone(),
            source: e,
        })?;
        file.write_all(json.as_bytes())
            .map_err(|e| StoreError::Io {
                path: temp_path.clone(),
                source: e,
            })?;
        file.sync_all().map_err(|e| StoreError::Io {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, &path).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e,
        })?;

        debug!(
            path = %path.display(),
            products = snapshot.products.len(),
            edges = snapshot.edges.len(),
            "saved snapshot"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::product::ProductDraft;
    use crate::core::types::ProductName;
    use std::path::Path;
    use tempfile::TempDir;

    fn store_in(dir: &Path) -> SnapshotStore {
        SnapshotStore::new(dir)
    }

    fn sample_snapshot() -> RegistrySnapshot {
        let mut catalog = crate::core::catalog::ProductCatalog::new();
        catalog
            .create(ProductDraft::new(
                ProductName::new("orders").unwrap(),
                "sales",
                "owner",
                "desc",
            ))
            .unwrap();
        RegistrySnapshot::new(catalog.to_vec(), vec![]).unwrap()
    }

    #[test]
    fn load_missing_snapshot_is_none() {
        let temp = TempDir::new().unwrap();
        let store = store_in(temp.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = store_in(temp.path());
        let snapshot = sample_snapshot();

        store.save(&snapshot).unwrap();
        let loaded = store.load().unwrap().expect("snapshot present");
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        let store = store_in(temp.path());

        store.save(&sample_snapshot()).unwrap();
        let empty = RegistrySnapshot::new(vec![], vec![]).unwrap();
        store.save(&empty).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.products.is_empty());
    }

    #[test]
    fn corrupt_snapshot_is_an_error_not_empty() {
        let temp = TempDir::new().unwrap();
        let store = store_in(temp.path());
        fs::write(store.snapshot_path(), "{ not valid json").unwrap();

        let result = store.load();
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn tampered_snapshot_fails_digest_check() {
        let temp = TempDir::new().unwrap();
        let store = store_in(temp.path());
        store.save(&sample_snapshot()).unwrap();

        let json = fs::read_to_string(store.snapshot_path()).unwrap();
        fs::write(store.snapshot_path(), json.replace("sales", "other")).unwrap();

        let result = store.load();
        assert!(matches!(
            result,
            Err(StoreError::Corrupt(SnapshotError::DigestMismatch { .. }))
        ));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let temp = TempDir::new().unwrap();
        let store = store_in(temp.path());
        store.save(&sample_snapshot()).unwrap();

        assert!(!temp.path().join("registry.json.tmp").exists());
    }
}
