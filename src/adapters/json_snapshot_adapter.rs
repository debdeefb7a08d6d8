//! Publishes the snapshot as a JSON file with an atomic replace.
//!
//! The document is written to a temporary file in the destination directory and
//! renamed over the target, so concurrent readers see the old or the new file.

use crate::domain::error::ScanError;
use crate::domain::snapshot::Snapshot;
use crate::ports::snapshot_port::SnapshotPort;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct JsonSnapshotAdapter {
    path: PathBuf,
}

impl JsonSnapshotAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotPort for JsonSnapshotAdapter {
    fn publish(&self, snapshot: &Snapshot) -> Result<(), ScanError> {
        let bytes = snapshot.to_json()?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| ScanError::Io(e.error))?;

        tracing::info!(
            path = %self.path.display(),
            stocks = snapshot.stock_count,
            bytes = bytes.len(),
            "snapshot published"
        );
        Ok(())
    }
}
