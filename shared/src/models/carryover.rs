//! Month-end carryover snapshots and variance rows

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::LotKey;
use crate::dates::{days_until, parse_iso_date};

/// Frozen lot quantity at a month boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryoverSnapshot {
    /// `YYYY-MM`
    pub month: String,
    pub item: String,
    pub expiry: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// Variance of one snapshot row against current stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverRow {
    pub month: String,
    pub item: String,
    pub expiry: String,
    pub prev_qty: i64,
    pub current_qty: i64,
    pub diff: i64,
    pub days_to_expiry: Option<i64>,
    pub expired: bool,
    /// Stock still on hand for an expired lot
    pub loss_qty: i64,
}

impl CarryoverRow {
    pub fn compute(snapshot: &CarryoverSnapshot, current_qty: i64, today: NaiveDate) -> Self {
        let days_to_expiry = parse_iso_date(&snapshot.expiry).map(|d| days_until(d, today));
        let expired = days_to_expiry.map(|d| d < 0).unwrap_or(false);
        let loss_qty = if expired && current_qty > 0 { current_qty } else { 0 };

        Self {
            month: snapshot.month.clone(),
            item: snapshot.item.clone(),
            expiry: snapshot.expiry.clone(),
            prev_qty: snapshot.quantity,
            current_qty,
            diff: current_qty - snapshot.quantity,
            days_to_expiry,
            expired,
            loss_qty,
        }
    }
}

/// Carryover variance report for one month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryoverReport {
    pub month: String,
    pub has_snapshot: bool,
    pub rows: Vec<CarryoverRow>,
}

impl CarryoverReport {
    /// Diff `snapshots` against the current (item, expiry) -> quantity lookup.
    /// Lots that no longer exist count as zero current stock.
    pub fn build(
        month: &str,
        snapshots: &[CarryoverSnapshot],
        current: &HashMap<LotKey, i64>,
        today: NaiveDate,
    ) -> Self {
        let rows: Vec<CarryoverRow> = snapshots
            .iter()
            .map(|s| {
                let key = LotKey::new(s.item.clone(), s.expiry.clone());
                let current_qty = current.get(&key).copied().unwrap_or(0);
                CarryoverRow::compute(s, current_qty, today)
            })
            .collect();

        Self {
            month: month.to_string(),
            has_snapshot: !rows.is_empty(),
            rows,
        }
    }

    pub fn total_loss(&self) -> i64 {
        self.rows.iter().map(|r| r.loss_qty).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(item: &str, expiry: &str, qty: i64) -> CarryoverSnapshot {
        CarryoverSnapshot {
            month: "2025-05".to_string(),
            item: item.to_string(),
            expiry: expiry.to_string(),
            quantity: qty,
            created_at: Utc::now(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_row_diff_and_loss_for_expired_lot() {
        let row = CarryoverRow::compute(&snap("A", "2025-06-01", 5), 3, date("2025-06-10"));
        assert_eq!(row.diff, -2);
        assert_eq!(row.days_to_expiry, Some(-9));
        assert!(row.expired);
        assert_eq!(row.loss_qty, 3);
    }

    #[test]
    fn test_row_not_expired_has_no_loss() {
        let row = CarryoverRow::compute(&snap("A", "2025-06-20", 5), 7, date("2025-06-10"));
        assert_eq!(row.diff, 2);
        assert!(!row.expired);
        assert_eq!(row.loss_qty, 0);
    }

    #[test]
    fn test_row_untracked_expiry() {
        let row = CarryoverRow::compute(&snap("A", "", 5), 5, date("2025-06-10"));
        assert_eq!(row.days_to_expiry, None);
        assert!(!row.expired);
    }

    #[test]
    fn test_report_missing_lot_counts_as_zero() {
        let current = HashMap::new();
        let report = CarryoverReport::build("2025-05", &[snap("A", "2025-05-01", 4)], &current, date("2025-06-02"));
        assert!(report.has_snapshot);
        assert_eq!(report.rows[0].current_qty, 0);
        assert_eq!(report.rows[0].diff, -4);
        assert_eq!(report.rows[0].loss_qty, 0);
    }

    #[test]
    fn test_report_without_snapshot() {
        let report = CarryoverReport::build("2025-05", &[], &HashMap::new(), date("2025-06-02"));
        assert!(!report.has_snapshot);
        assert!(report.rows.is_empty());
        assert_eq!(report.total_loss(), 0);
    }
}
