//! Backup snapshot naming and enumeration

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::warn;
use uuid::Uuid;

use super::error::Result;

/// Prefix shared by all snapshot filenames
pub const SNAPSHOT_PREFIX: &str = "points-data";

/// A backup snapshot as reported to clients
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub filename: String,
    /// Human-readable modification time
    pub timestamp: String,
    /// Size in bytes
    pub size: u64,
}

/// Build a snapshot filename from a store timestamp.
///
/// The random suffix keeps rapid repeated stores within the same second from
/// colliding.
pub(crate) fn snapshot_filename(timestamp: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.json", SNAPSHOT_PREFIX, timestamp, &hex[..8])
}

/// Reduce a client-supplied filename to its final path component.
///
/// Returns `None` when nothing usable remains (empty string, `.`, `..`).
pub fn sanitize_filename(name: &str) -> Option<&str> {
    Path::new(name).file_name().and_then(|n| n.to_str())
}

/// Enumerate snapshot files in `dir`, most recent first.
///
/// Entries that fail to stat are skipped with a warning. Ties on equal
/// modification times keep enumeration order.
pub(crate) fn list_snapshots(dir: &Path) -> Result<Vec<BackupEntry>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<(SystemTime, BackupEntry)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() || path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().to_string();

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                warn!("failed to stat backup file {}: {}", filename, e);
                continue;
            }
        };
        let modified = match meta.modified() {
            Ok(modified) => modified,
            Err(e) => {
                warn!("failed to read modification time of {}: {}", filename, e);
                continue;
            }
        };

        let timestamp = DateTime::<Local>::from(modified)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        entries.push((
            modified,
            BackupEntry {
                filename,
                timestamp,
                size: meta.len(),
            },
        ));
    }

    entries.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(entries.into_iter().map(|(_, entry)| entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_filename_shape() {
        let name = snapshot_filename("20250101_120000");
        assert!(name.starts_with("points-data_20250101_120000_"));
        assert!(name.ends_with(".json"));

        let suffix = name
            .trim_start_matches("points-data_20250101_120000_")
            .trim_end_matches(".json");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_snapshot_filenames_do_not_collide() {
        let a = snapshot_filename("20250101_120000");
        let b = snapshot_filename("20250101_120000");
        assert_ne!(a, b);
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("backup.json"), Some("backup.json"));
        assert_eq!(sanitize_filename("../../etc/passwd"), Some("passwd"));
        assert_eq!(sanitize_filename("/etc/passwd"), Some("passwd"));
        assert_eq!(sanitize_filename("a/b/c.json"), Some("c.json"));
    }

    #[test]
    fn test_sanitize_rejects_unusable_names() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("a/.."), None);
    }

    #[test]
    fn test_list_skips_non_json_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("points-data_x_aaaaaaaa.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let entries = list_snapshots(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "points-data_x_aaaaaaaa.json");
        assert_eq!(entries[0].size, 2);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let entries = list_snapshots(&dir.path().join("nope")).unwrap();
        assert!(entries.is_empty());
    }
}
