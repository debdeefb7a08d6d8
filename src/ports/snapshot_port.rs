//! Snapshot publishing port trait.

use crate::domain::error::ScanError;
use crate::domain::snapshot::Snapshot;

/// Publishes a finished snapshot. Readers must only ever observe a complete
/// document, never a partially written one.
pub trait SnapshotPort {
    fn publish(&self, snapshot: &Snapshot) -> Result<(), ScanError>;
}
