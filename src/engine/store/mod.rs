//! PointSync Document Store
//!
//! A single-document JSON store with backup rotation:
//! - Canonical document replaced wholesale on every store
//! - Previous version rotated into timestamped snapshots
//! - Snapshots listed and restored by filename

pub mod backup;
pub mod error;
pub mod storage;

pub use backup::{sanitize_filename, BackupEntry};
pub use error::StoreError;
pub use storage::DocumentStore;
