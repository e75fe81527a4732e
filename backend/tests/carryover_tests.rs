//! Carryover report tests
//!
//! Tests for month-end variance including:
//! - Previous-month derivation
//! - Missing snapshot handling
//! - Diff and loss on expired lots

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;

use shared::{previous_month, CarryoverReport, CarryoverSnapshot, LotKey};
use zaiko_backend::services::carryover::resolve_month;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn snap(item: &str, expiry: &str, quantity: i64) -> CarryoverSnapshot {
    CarryoverSnapshot {
        month: "2025-05".to_string(),
        item: item.to_string(),
        expiry: expiry.to_string(),
        quantity,
        created_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_previous_month_across_year_boundary() {
        assert_eq!(previous_month(date("2025-01-01")), "2024-12");
        assert_eq!(previous_month(date("2025-03-31")), "2025-02");
    }

    /// No snapshot for the month yields an empty report
    #[test]
    fn test_report_without_snapshot() {
        let report = CarryoverReport::build("2025-05", &[], &HashMap::new(), date("2025-06-10"));
        assert_eq!(report.month, "2025-05");
        assert!(!report.has_snapshot);
        assert!(report.rows.is_empty());
        assert_eq!(report.total_loss(), 0);
    }

    /// Diff is current minus snapshot; vanished lots count as zero
    #[test]
    fn test_report_diffs_and_losses() {
        let mut current = HashMap::new();
        current.insert(LotKey::new("唐揚げ", "2025-06-30"), 3);
        current.insert(LotKey::new("鮭", "2025-06-01"), 2);

        let snapshots = vec![
            snap("ご飯 大", "", 8),
            snap("唐揚げ", "2025-06-30", 5),
            snap("鮭", "2025-06-01", 4),
        ];
        let report = CarryoverReport::build("2025-05", &snapshots, &current, date("2025-06-10"));
        assert!(report.has_snapshot);
        assert_eq!(report.rows.len(), 3);

        let rice = &report.rows[0];
        assert_eq!((rice.current_qty, rice.diff), (0, -8));
        assert_eq!(rice.days_to_expiry, None);
        assert!(!rice.expired);

        let karaage = &report.rows[1];
        assert_eq!(karaage.diff, -2);
        assert_eq!(karaage.days_to_expiry, Some(20));
        assert_eq!(karaage.loss_qty, 0);

        let salmon = &report.rows[2];
        assert!(salmon.expired);
        assert_eq!(salmon.loss_qty, 2);
        assert_eq!(report.total_loss(), 2);
    }

    #[test]
    fn test_snapshot_month_resolution() {
        assert_eq!(resolve_month(None, date("2025-06-15")).unwrap(), "2025-05");
        assert_eq!(resolve_month(Some(" 2025-04 "), date("2025-06-15")).unwrap(), "2025-04");
        assert!(resolve_month(Some("May 2025"), date("2025-06-15")).is_err());
    }
}
