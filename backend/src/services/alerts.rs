//! Stock alerts and purchase candidates

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use shared::{purchase_candidates, summarize_lots, ItemSummary, PurchaseCandidate};

use super::inventory::InventoryService;
use crate::error::AppResult;
use crate::export::{file_timestamp, latest_artifact, write_artifact};

/// File-name prefix of purchase-candidate exports
pub const PURCHASE_CANDIDATES_PREFIX: &str = "purchase_candidates";

pub const PURCHASE_CANDIDATES_HEADER: [&str; 6] = [
    "item",
    "currentQty",
    "refillThreshold",
    "need",
    "earliestExpiry",
    "alertLevel",
];

/// Alert service
#[derive(Clone)]
pub struct AlertService {
    inventory: InventoryService,
    exports_dir: PathBuf,
}

impl AlertService {
    pub fn new(inventory: InventoryService, exports_dir: PathBuf) -> Self {
        Self {
            inventory,
            exports_dir,
        }
    }

    /// Per-item totals and alert levels, sorted by item
    pub async fn summarize(&self, today: NaiveDate) -> AppResult<Vec<ItemSummary>> {
        let lots = self.inventory.list_lots().await?;
        let summary = summarize_lots(&lots, today);
        tracing::debug!("Summarized {} lots into {} items", lots.len(), summary.len());
        Ok(summary)
    }

    /// Items below their refill threshold
    pub async fn purchase_candidates(&self, today: NaiveDate) -> AppResult<Vec<PurchaseCandidate>> {
        Ok(purchase_candidates(&self.summarize(today).await?))
    }

    /// Write `purchase_candidates_<timestamp>.csv` and return its path
    pub async fn export_purchase_candidates_csv(&self, today: NaiveDate) -> AppResult<PathBuf> {
        let candidates = self.purchase_candidates(today).await?;
        let file_name = format!("{}_{}.csv", PURCHASE_CANDIDATES_PREFIX, file_timestamp(Utc::now()));
        write_artifact(
            &self.exports_dir,
            &file_name,
            &PURCHASE_CANDIDATES_HEADER,
            candidates.iter().map(candidate_row),
        )
    }

    /// Most recently modified export with `prefix`
    pub fn latest_export(&self, prefix: &str) -> Option<PathBuf> {
        latest_artifact(&self.exports_dir, prefix)
    }

    /// Latest purchase-candidate export, generating one if none exists
    pub async fn latest_or_export(&self, today: NaiveDate) -> AppResult<PathBuf> {
        match self.latest_export(PURCHASE_CANDIDATES_PREFIX) {
            Some(path) => Ok(path),
            None => self.export_purchase_candidates_csv(today).await,
        }
    }
}

pub fn candidate_row(c: &PurchaseCandidate) -> Vec<String> {
    vec![
        c.item.clone(),
        c.current_qty.to_string(),
        c.threshold.to_string(),
        c.need.to_string(),
        c.earliest_expiry.clone(),
        c.alert_level.to_string(),
    ]
}
