//! Document Storage Engine
//!
//! Owns the canonical document file and its backup directory. Every store
//! call rotates the previous document into the backup directory before
//! writing the replacement.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use super::backup::{self, BackupEntry};
use super::error::{Result, StoreError};

/// The single-document store
pub struct DocumentStore {
    /// Canonical document path
    data_file: PathBuf,

    /// Snapshot directory
    backup_dir: PathBuf,
}

impl DocumentStore {
    /// Open a store rooted at the given paths, creating directories as needed.
    pub fn new(data_file: &Path, backup_dir: &Path) -> Result<Self> {
        if let Some(parent) = data_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(backup_dir)?;

        Ok(Self {
            data_file: data_file.to_path_buf(),
            backup_dir: backup_dir.to_path_buf(),
        })
    }

    /// Replace the canonical document, rotating any existing one into the
    /// backup directory first. Returns the generated timestamp.
    ///
    /// A failed rotation is logged and swallowed; the upload must not be
    /// rejected over a lost snapshot. Concurrent stores can race the rename,
    /// in which case one snapshot may be lost.
    pub fn store(&self, document: &Value) -> Result<String> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

        if self.data_file.exists() {
            let backup_path = self.backup_dir.join(backup::snapshot_filename(&timestamp));
            match fs::rename(&self.data_file, &backup_path) {
                Ok(()) => info!("previous document backed up to {}", backup_path.display()),
                Err(e) => warn!("backup of previous document failed: {}", e),
            }
        }

        let content = serde_json::to_string_pretty(document)?;
        fs::write(&self.data_file, content)?;

        info!("document stored, timestamp {}", timestamp);
        Ok(timestamp)
    }

    /// Read the canonical document, or an empty object if none exists yet.
    pub fn fetch(&self) -> Result<Value> {
        if !self.data_file.exists() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        let content = fs::read_to_string(&self.data_file)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// List backup snapshots, most recent first.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        backup::list_snapshots(&self.backup_dir)
    }

    /// Read a backup snapshot by filename without touching the canonical
    /// document; callers re-upload the result to commit it.
    ///
    /// The name is reduced to its final path component before resolution, so
    /// lookups cannot escape the backup directory.
    pub fn restore(&self, filename: &str) -> Result<Value> {
        let name = backup::sanitize_filename(filename)
            .ok_or_else(|| StoreError::BackupNotFound(filename.to_string()))?;
        let path = self.backup_dir.join(name);

        if !path.exists() {
            return Err(StoreError::BackupNotFound(name.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        let document = serde_json::from_str(&content)?;
        info!("backup restored: {}", name);
        Ok(document)
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::tempdir;

    fn open_store(dir: &Path) -> DocumentStore {
        DocumentStore::new(&dir.join("points-data.json"), &dir.join("backups")).unwrap()
    }

    #[test]
    fn test_store_then_fetch_round_trip() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        let doc = json!({"players": [{"name": "Alice", "points": 120}], "total": 120});
        let timestamp = store.store(&doc).unwrap();
        assert_eq!(timestamp.len(), "yyyymmdd_HHMMSS".len());

        assert_eq!(store.fetch().unwrap(), doc);
    }

    #[test]
    fn test_fetch_without_document_returns_empty_object() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        assert_eq!(store.fetch().unwrap(), json!({}));
    }

    #[test]
    fn test_fetch_corrupt_document_is_json_error() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        fs::write(store.data_file(), "{broken").unwrap();

        assert!(matches!(store.fetch(), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_store_preserves_previous_document_as_snapshot() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        let first = json!({"points": 1});
        let second = json!({"points": 2});
        store.store(&first).unwrap();
        store.store(&second).unwrap();

        let backups = store.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(store.restore(&backups[0].filename).unwrap(), first);
        assert_eq!(store.fetch().unwrap(), second);
    }

    #[test]
    fn test_first_store_creates_no_snapshot() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        store.store(&json!({"points": 1})).unwrap();
        assert!(store.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_successive_stores_list_most_recent_first() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        for i in 0..4 {
            store.store(&json!({"v": i})).unwrap();
            // Snapshot order is derived from file mtimes
            sleep(Duration::from_millis(20));
        }

        let backups = store.list_backups().unwrap();
        assert_eq!(backups.len(), 3);
        assert_eq!(store.restore(&backups[0].filename).unwrap(), json!({"v": 2}));
        assert_eq!(store.restore(&backups[2].filename).unwrap(), json!({"v": 0}));
    }

    #[test]
    fn test_restore_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        assert!(matches!(
            store.restore("points-data_20990101_000000_deadbeef.json"),
            Err(StoreError::BackupNotFound(_))
        ));
    }

    #[test]
    fn test_restore_never_reads_outside_backup_dir() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        // A secret outside the backup directory with a traversal path to it
        fs::write(dir.path().join("secret.json"), r#"{"secret": true}"#).unwrap();

        assert!(matches!(
            store.restore("../secret.json"),
            Err(StoreError::BackupNotFound(_))
        ));
        assert!(matches!(
            store.restore("../../etc/passwd"),
            Err(StoreError::BackupNotFound(_))
        ));
        assert!(matches!(
            store.restore(".."),
            Err(StoreError::BackupNotFound(_))
        ));
    }

    #[test]
    fn test_restore_corrupt_snapshot_is_json_error() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        fs::write(store.backup_dir().join("bad.json"), "{broken").unwrap();

        assert!(matches!(store.restore("bad.json"), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_restore_does_not_modify_canonical_document() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        store.store(&json!({"v": 1})).unwrap();
        store.store(&json!({"v": 2})).unwrap();

        let backups = store.list_backups().unwrap();
        store.restore(&backups[0].filename).unwrap();

        assert_eq!(store.fetch().unwrap(), json!({"v": 2}));
    }
}
