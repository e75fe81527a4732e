//! Reporting service for CSV exports
//! Order history, consumption ranking and expiry lists

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use shared::{
    days_until, parse_iso_date, DateRange, ExpiryMode, HistoryFilter, InventoryLot, Order, Ranking,
};

use super::inventory::InventoryService;
use super::orders::{OrderService, EXPORT_RANKING_LIMIT};
use crate::error::AppResult;
use crate::export::write_artifact;

/// Default window for the near-expiry export, in days
pub const DEFAULT_NEAR_EXPIRY_DAYS: i64 = 3;

pub const HISTORY_HEADER: [&str; 6] = [
    "createdAt",
    "name",
    "okazu",
    "okazuExpiry",
    "gohan",
    "gohanExpiry",
];

pub const RANKING_HEADER: [&str; 3] = ["category", "item", "count"];

pub const EXPIRY_HEADER: [&str; 4] = ["item", "expiry", "quantity", "daysLeft"];

/// One lot in an expiry export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryEntry {
    pub item: String,
    pub expiry: String,
    pub quantity: i64,
    pub days_left: i64,
}

/// Lots whose expiry falls in `mode`'s window; unparseable expiries are skipped
pub fn expiry_entries(
    lots: &[InventoryLot],
    mode: ExpiryMode,
    days: i64,
    today: NaiveDate,
) -> Vec<ExpiryEntry> {
    lots.iter()
        .filter_map(|lot| {
            let date = parse_iso_date(&lot.expiry)?;
            let days_left = days_until(date, today);
            mode.keeps(days_left, days).then(|| ExpiryEntry {
                item: lot.item.clone(),
                expiry: lot.expiry.clone(),
                quantity: lot.quantity,
                days_left,
            })
        })
        .collect()
}

pub fn history_row(order: &Order) -> Vec<String> {
    vec![
        order.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        order.customer_name.clone(),
        order.okazu.clone(),
        order.okazu_expiry.clone(),
        order.gohan.clone(),
        order.gohan_expiry.clone(),
    ]
}

/// Side-dish rows first, then rice rows
pub fn ranking_rows(ranking: &Ranking) -> Vec<Vec<String>> {
    let okazu = ranking
        .okazu
        .iter()
        .map(|e| vec!["okazu".to_string(), e.label.clone(), e.count.to_string()]);
    let gohan = ranking
        .gohan
        .iter()
        .map(|e| vec!["gohan".to_string(), e.label.clone(), e.count.to_string()]);
    okazu.chain(gohan).collect()
}

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    inventory: InventoryService,
    orders: OrderService,
    exports_dir: PathBuf,
}

impl ReportingService {
    pub fn new(inventory: InventoryService, orders: OrderService, exports_dir: PathBuf) -> Self {
        Self {
            inventory,
            orders,
            exports_dir,
        }
    }

    /// Write `order_history_<date>.csv` for the filtered history
    pub async fn export_history(&self, filter: &HistoryFilter, today: NaiveDate) -> AppResult<PathBuf> {
        let orders = self.orders.history(filter).await?;
        write_artifact(
            &self.exports_dir,
            &format!("order_history_{}.csv", today.format("%Y-%m-%d")),
            &HISTORY_HEADER,
            orders.iter().map(history_row),
        )
    }

    /// Write `ranking_<date>.csv`
    pub async fn export_ranking(&self, range: &DateRange, today: NaiveDate) -> AppResult<PathBuf> {
        let ranking = self.orders.ranking(range, EXPORT_RANKING_LIMIT).await?;
        write_artifact(
            &self.exports_dir,
            &format!("ranking_{}.csv", today.format("%Y-%m-%d")),
            &RANKING_HEADER,
            ranking_rows(&ranking),
        )
    }

    /// Write `expiry_<mode>_<date>.csv` from a fresh reload
    pub async fn export_expiry(&self, mode: ExpiryMode, days: i64, today: NaiveDate) -> AppResult<PathBuf> {
        let lots = self.inventory.list_lots().await?;
        let entries = expiry_entries(&lots, mode, days, today);
        write_artifact(
            &self.exports_dir,
            &format!("expiry_{}_{}.csv", mode.as_str(), today.format("%Y-%m-%d")),
            &EXPIRY_HEADER,
            entries.iter().map(|e| {
                vec![
                    e.item.clone(),
                    e.expiry.clone(),
                    e.quantity.to_string(),
                    e.days_left.to_string(),
                ]
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::RankingEntry;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn lots() -> Vec<InventoryLot> {
        vec![
            InventoryLot::new("唐揚げ", "2025-01-09", 3),
            InventoryLot::new("鮭", "2025-01-13", 2),
            InventoryLot::new("鮭", "2025-01-14", 2),
            InventoryLot::new("ご飯 大", "", 9),
            InventoryLot::new("煮物", "不明", 1),
        ]
    }

    #[test]
    fn test_near_expiry_window_is_inclusive() {
        let entries = expiry_entries(&lots(), ExpiryMode::Near, 3, date("2025-01-10"));
        let keys: Vec<_> = entries.iter().map(|e| (e.item.as_str(), e.days_left)).collect();
        assert_eq!(keys, vec![("鮭", 3)]);
    }

    #[test]
    fn test_expired_mode_keeps_past_lots_only() {
        let entries = expiry_entries(&lots(), ExpiryMode::Expired, 3, date("2025-01-10"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item, "唐揚げ");
        assert_eq!(entries[0].days_left, -1);
    }

    #[test]
    fn test_ranking_rows_okazu_before_gohan() {
        let ranking = Ranking {
            okazu: vec![RankingEntry {
                label: "唐揚げ".into(),
                count: 4,
            }],
            gohan: vec![RankingEntry {
                label: "ご飯 大".into(),
                count: 2,
            }],
        };
        assert_eq!(
            ranking_rows(&ranking),
            vec![
                vec!["okazu".to_string(), "唐揚げ".into(), "4".into()],
                vec!["gohan".to_string(), "ご飯 大".into(), "2".into()],
            ]
        );
    }
}
