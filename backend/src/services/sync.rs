//! Feed change probe
//! Lets clients detect edits to the roster or inventory feed made outside the system

use std::path::PathBuf;

use shared::SyncStatus;

use crate::feed::{file_mtime, resolve_path};

/// Sync service
#[derive(Clone)]
pub struct SyncService {
    roster_candidates: Vec<PathBuf>,
    inventory_candidates: Vec<PathBuf>,
}

impl SyncService {
    pub fn new(roster_candidates: Vec<PathBuf>, inventory_candidates: Vec<PathBuf>) -> Self {
        Self {
            roster_candidates,
            inventory_candidates,
        }
    }

    /// Feed modification times in Unix seconds, 0 for a missing file
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            roster_mtime: file_mtime(&resolve_path(&self.roster_candidates)),
            inventory_mtime: file_mtime(&resolve_path(&self.inventory_candidates)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_zero_for_missing_feeds() {
        let dir = tempfile::tempdir().unwrap();
        let sync = SyncService::new(
            vec![dir.path().join("meibo.csv")],
            vec![dir.path().join("zaikokanri.csv")],
        );
        assert_eq!(sync.status(), SyncStatus::default());
    }

    #[test]
    fn test_status_reports_existing_feed() {
        let dir = tempfile::tempdir().unwrap();
        let inventory = dir.path().join("zaikokanri.csv");
        std::fs::write(&inventory, "item,expiry,quantity\n").unwrap();

        let sync = SyncService::new(vec![dir.path().join("meibo.csv")], vec![inventory]);
        let status = sync.status();
        assert_eq!(status.roster_mtime, 0);
        assert!(status.inventory_mtime > 0);
    }
}
