//! Stock alert and purchase-candidate models

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::InventoryLot;
use crate::dates::{days_until, parse_iso_date};

/// Days before expiry at which an item is flagged WARN
pub const EXPIRY_WARN_DAYS: i64 = 3;

/// Days before expiry at which an item is flagged INFO
pub const EXPIRY_INFO_DAYS: i64 = 7;

/// Severity of an item alert, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    #[default]
    Ok,
    Info,
    Warn,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Ok => "OK",
            AlertLevel::Info => "INFO",
            AlertLevel::Warn => "WARN",
            AlertLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-item aggregate over all lots of that item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item: String,
    pub total_qty: i64,
    /// Maximum refill threshold across lots (policy value, not summed)
    pub threshold: i64,
    /// Smallest non-empty expiry, empty when no lot is dated
    pub earliest_expiry: String,
    pub lot_count: usize,
    pub alert_level: AlertLevel,
    pub reasons: Vec<String>,
}

impl ItemSummary {
    pub fn is_below_threshold(&self) -> bool {
        self.threshold > 0 && self.total_qty < self.threshold
    }
}

/// An item whose stock fell below its refill threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCandidate {
    pub item: String,
    pub current_qty: i64,
    pub threshold: i64,
    pub need: i64,
    pub earliest_expiry: String,
    pub alert_level: AlertLevel,
}

impl PurchaseCandidate {
    pub fn from_summary(summary: &ItemSummary) -> Option<Self> {
        if !summary.is_below_threshold() {
            return None;
        }
        Some(Self {
            item: summary.item.clone(),
            current_qty: summary.total_qty,
            threshold: summary.threshold,
            need: summary.threshold - summary.total_qty,
            earliest_expiry: summary.earliest_expiry.clone(),
            alert_level: summary.alert_level,
        })
    }
}

/// Classify an item with the escalate-only rule sequence.
///
/// Stock below threshold raises WARN. An expired earliest lot is always
/// CRITICAL; the near-expiry rules only ever raise the level.
pub fn classify(total_qty: i64, threshold: i64, days_to_expiry: Option<i64>) -> (AlertLevel, Vec<String>) {
    let mut level = AlertLevel::Ok;
    let mut reasons = Vec::new();

    if threshold > 0 && total_qty < threshold {
        level = AlertLevel::Warn;
        reasons.push(format!("stock {} below threshold {}", total_qty, threshold));
    }

    if let Some(days) = days_to_expiry {
        if days < 0 {
            level = AlertLevel::Critical;
            reasons.push("lot past expiry".to_string());
        } else if days <= EXPIRY_WARN_DAYS && level != AlertLevel::Critical {
            level = AlertLevel::Warn;
            reasons.push(format!("expiry within {} days", EXPIRY_WARN_DAYS));
        } else if days <= EXPIRY_INFO_DAYS && level == AlertLevel::Ok {
            level = AlertLevel::Info;
            reasons.push(format!("expiry within {} days", EXPIRY_INFO_DAYS));
        }
    }

    (level, reasons)
}

/// Group lots by item and classify each item relative to `today`.
///
/// Output is sorted by item name.
pub fn summarize_lots(lots: &[InventoryLot], today: NaiveDate) -> Vec<ItemSummary> {
    struct Acc {
        total_qty: i64,
        threshold: i64,
        earliest_expiry: String,
        lot_count: usize,
    }

    let mut by_item: BTreeMap<&str, Acc> = BTreeMap::new();
    for lot in lots {
        let acc = by_item.entry(lot.item.as_str()).or_insert(Acc {
            total_qty: 0,
            threshold: 0,
            earliest_expiry: String::new(),
            lot_count: 0,
        });
        acc.total_qty += lot.quantity;
        acc.threshold = acc.threshold.max(lot.refill_threshold);
        acc.lot_count += 1;
        if !lot.is_untracked()
            && (acc.earliest_expiry.is_empty() || lot.expiry < acc.earliest_expiry)
        {
            acc.earliest_expiry = lot.expiry.clone();
        }
    }

    by_item
        .into_iter()
        .map(|(item, acc)| {
            let days = parse_iso_date(&acc.earliest_expiry).map(|d| days_until(d, today));
            let (alert_level, reasons) = classify(acc.total_qty, acc.threshold, days);
            ItemSummary {
                item: item.to_string(),
                total_qty: acc.total_qty,
                threshold: acc.threshold,
                earliest_expiry: acc.earliest_expiry,
                lot_count: acc.lot_count,
                alert_level,
                reasons,
            }
        })
        .collect()
}

/// Items below threshold, in summary order
pub fn purchase_candidates(summaries: &[ItemSummary]) -> Vec<PurchaseCandidate> {
    summaries.iter().filter_map(PurchaseCandidate::from_summary).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_classify_ok_when_stocked_and_far_from_expiry() {
        let (level, reasons) = classify(10, 5, Some(30));
        assert_eq!(level, AlertLevel::Ok);
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_classify_below_threshold_warns() {
        let (level, reasons) = classify(2, 5, None);
        assert_eq!(level, AlertLevel::Warn);
        assert!(reasons[0].contains("below threshold"));
    }

    #[test]
    fn test_classify_zero_threshold_never_warns() {
        let (level, _) = classify(0, 0, None);
        assert_eq!(level, AlertLevel::Ok);
    }

    #[test]
    fn test_classify_expired_outranks_threshold() {
        let (level, reasons) = classify(2, 5, Some(-1));
        assert_eq!(level, AlertLevel::Critical);
        assert_eq!(reasons.len(), 2);
        assert_eq!(reasons[1], "lot past expiry");
    }

    #[test]
    fn test_classify_expiry_boundaries() {
        assert_eq!(classify(10, 0, Some(0)).0, AlertLevel::Warn);
        assert_eq!(classify(10, 0, Some(3)).0, AlertLevel::Warn);
        assert_eq!(classify(10, 0, Some(4)).0, AlertLevel::Info);
        assert_eq!(classify(10, 0, Some(7)).0, AlertLevel::Info);
        assert_eq!(classify(10, 0, Some(8)).0, AlertLevel::Ok);
    }

    #[test]
    fn test_classify_info_does_not_downgrade_warn() {
        let (level, reasons) = classify(1, 5, Some(6));
        assert_eq!(level, AlertLevel::Warn);
        assert_eq!(reasons.len(), 1);
    }

    #[test]
    fn test_summarize_groups_lots_per_item() {
        let lots = vec![
            InventoryLot::new("唐揚げ", "2025-01-20", 3).with_threshold(4),
            InventoryLot::new("唐揚げ", "2025-01-12", 2).with_threshold(6),
            InventoryLot::new("ご飯 大", "", 9),
        ];
        let summary = summarize_lots(&lots, date("2025-01-01"));

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].item, "ご飯 大");
        assert_eq!(summary[0].earliest_expiry, "");
        assert_eq!(summary[0].alert_level, AlertLevel::Ok);

        let karaage = &summary[1];
        assert_eq!(karaage.total_qty, 5);
        assert_eq!(karaage.threshold, 6);
        assert_eq!(karaage.earliest_expiry, "2025-01-12");
        assert_eq!(karaage.lot_count, 2);
        assert_eq!(karaage.alert_level, AlertLevel::Warn);
    }

    #[test]
    fn test_summarize_skips_date_rules_for_unparseable_expiry() {
        let lots = vec![InventoryLot::new("A", "2025-13-40", 1)];
        let summary = summarize_lots(&lots, date("2030-01-01"));
        assert_eq!(summary[0].earliest_expiry, "2025-13-40");
        assert_eq!(summary[0].alert_level, AlertLevel::Ok);
    }

    #[test]
    fn test_purchase_candidates_need() {
        let lots = vec![
            InventoryLot::new("A", "2025-01-10", 2).with_threshold(5),
            InventoryLot::new("B", "2025-01-10", 9).with_threshold(5),
        ];
        let summary = summarize_lots(&lots, date("2025-01-01"));
        let candidates = purchase_candidates(&summary);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].item, "A");
        assert_eq!(candidates[0].need, 3);
    }

    #[test]
    fn test_alert_level_serializes_uppercase() {
        let json = serde_json::to_string(&AlertLevel::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Past expiry is CRITICAL no matter the stock position
            #[test]
            fn prop_expired_is_always_critical(
                qty in 0i64..1000,
                threshold in 0i64..1000,
                days in -365i64..0
            ) {
                prop_assert_eq!(classify(qty, threshold, Some(days)).0, AlertLevel::Critical);
            }

            /// Adding date information never lowers the level
            #[test]
            fn prop_date_rules_only_escalate(
                qty in 0i64..1000,
                threshold in 0i64..1000,
                days in -30i64..60
            ) {
                let without = classify(qty, threshold, None).0;
                let with = classify(qty, threshold, Some(days)).0;
                prop_assert!(with >= without);
            }
        }
    }
}
