//! Batch settlement of pending orders against the lot store

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use shared::{ConfirmOutcome, InventoryLot, LotKey};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::inventory::{InventoryService, LotSnapshot};
use crate::db::lock_lot_store;
use crate::error::{AppError, AppResult};
use crate::feed;

/// Prefix for feed backups taken before settlement rewrites the feed
pub const FEED_BACKUP_PREFIX: &str = "zaikokanri";

/// The lot references of a pending order
#[derive(Debug, Clone, FromRow)]
pub struct PendingRef {
    pub id: Uuid,
    pub okazu: String,
    pub okazu_expiry: String,
    pub gohan: String,
    pub gohan_expiry: String,
}

/// Mutable working copy of the lot store used during one settlement
#[derive(Debug, Clone)]
pub struct LotBook {
    lots: BTreeMap<LotKey, InventoryLot>,
    touched: BTreeSet<LotKey>,
}

impl LotBook {
    pub fn new(snapshot: LotSnapshot) -> Self {
        Self {
            lots: snapshot.into_map(),
            touched: BTreeSet::new(),
        }
    }

    /// Lot to decrement for (item, expiry).
    ///
    /// Exact match first. Otherwise the item's lot with the earliest expiry;
    /// an untracked lot is used only when the item has no dated lot.
    pub fn find(&self, item: &str, expiry: &str) -> Option<LotKey> {
        let exact = LotKey::new(item, expiry);
        if self.lots.contains_key(&exact) {
            return Some(exact);
        }

        let mut same_item = self
            .lots
            .range(LotKey::new(item, "")..)
            .take_while(|(k, _)| k.item == item)
            .map(|(k, _)| k);

        let first = same_item.next()?;
        if !first.expiry.is_empty() {
            return Some(first.clone());
        }
        // empty expiry sorts first; prefer the next dated lot if any
        Some(same_item.next().unwrap_or(first).clone())
    }

    /// Take one unit for (item, expiry). Blank items and unmatched lots are
    /// skipped and return `None`.
    pub fn decrement(&mut self, item: &str, expiry: &str) -> Option<LotKey> {
        if item.is_empty() {
            return None;
        }
        let Some(key) = self.find(item, expiry) else {
            tracing::debug!("No lot matches {}; skipping decrement", LotKey::new(item, expiry));
            return None;
        };

        if let Some(lot) = self.lots.get_mut(&key) {
            lot.take_one();
        }
        self.touched.insert(key.clone());
        Some(key)
    }

    /// Decrement the side dish and the rice of one order
    pub fn settle(&mut self, order: &PendingRef) {
        self.decrement(&order.okazu, &order.okazu_expiry);
        self.decrement(&order.gohan, &order.gohan_expiry);
    }

    pub fn get(&self, key: &LotKey) -> Option<&InventoryLot> {
        self.lots.get(key)
    }

    /// Lots whose quantity may have changed
    pub fn touched_lots(&self) -> impl Iterator<Item = &InventoryLot> {
        self.touched.iter().filter_map(|k| self.lots.get(k))
    }

    pub fn into_snapshot(self) -> LotSnapshot {
        LotSnapshot::from_map(self.lots)
    }
}

/// Settlement service: confirms every pending order in one transaction
#[derive(Clone)]
pub struct SettlementService {
    db: PgPool,
    inventory: InventoryService,
}

impl SettlementService {
    pub fn new(db: PgPool, inventory: InventoryService) -> Self {
        Self { db, inventory }
    }

    /// Confirm all pending orders, earliest first.
    ///
    /// Reloads the lot store, backs up the feed, decrements one unit per
    /// referenced lot, marks the orders confirmed and writes quantities back
    /// to the feed once. Any failure rolls the whole batch back; if the
    /// commit itself fails the feed is restored from the backup.
    pub async fn confirm_all(&self) -> AppResult<ConfirmOutcome> {
        let mut tx = self.db.begin().await?;
        lock_lot_store(&mut tx).await?;

        let pending = sqlx::query_as::<_, PendingRef>(
            r#"
            SELECT id, okazu, okazu_expiry, gohan, gohan_expiry
            FROM orders
            WHERE state = 'pending'
            ORDER BY created_at ASC, id ASC
            FOR UPDATE
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        if pending.is_empty() {
            tx.rollback().await?;
            tracing::info!("No pending orders to confirm");
            return Ok(ConfirmOutcome { confirmed: 0 });
        }

        self.inventory.reload_in(&mut tx).await?;
        let feed_path = self.inventory.feed_path();
        let backup = feed::backup_file(&feed_path, FEED_BACKUP_PREFIX);

        let mut book = LotBook::new(self.inventory.current_lots(&mut tx).await?);
        for order in &pending {
            book.settle(order);
        }

        for lot in book.touched_lots() {
            sqlx::query(
                r#"
                UPDATE inventory_lots
                SET quantity = $1
                WHERE item = $2 AND expiry = $3
                "#,
            )
            .bind(lot.quantity)
            .bind(&lot.item)
            .bind(&lot.expiry)
            .execute(&mut *tx)
            .await?;
        }

        let ids: Vec<Uuid> = pending.iter().map(|o| o.id).collect();
        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET state = 'confirmed', confirmed_at = $1
            WHERE id = ANY($2) AND state = 'pending'
            "#,
        )
        .bind(Utc::now())
        .bind(&ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated != ids.len() as u64 {
            return Err(AppError::Conflict(format!(
                "expected to confirm {} orders, updated {}",
                ids.len(),
                updated
            )));
        }

        crate::services::inventory::write_back_to(&feed_path, &book.into_snapshot())?;
        if let Err(e) = tx.commit().await {
            // orders stay pending, so the feed must not keep the decrements
            match &backup {
                Some(backup) => {
                    if let Err(restore_err) = feed::restore_backup(backup, &feed_path) {
                        tracing::error!("Feed restore after failed commit failed: {}", restore_err);
                    }
                }
                None => tracing::error!(
                    "Commit failed after write-back and no backup of {} exists",
                    feed_path.display()
                ),
            }
            return Err(e.into());
        }

        tracing::info!("Confirmed {} orders", updated);
        Ok(ConfirmOutcome { confirmed: updated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(lots: Vec<InventoryLot>) -> LotBook {
        LotBook::new(LotSnapshot::from_lots(lots))
    }

    #[test]
    fn test_find_exact_match() {
        let b = book(vec![
            InventoryLot::new("A", "2025-01-10", 5),
            InventoryLot::new("A", "2025-01-05", 5),
        ]);
        assert_eq!(b.find("A", "2025-01-10"), Some(LotKey::new("A", "2025-01-10")));
    }

    #[test]
    fn test_find_fallback_prefers_earliest_dated_lot() {
        let b = book(vec![
            InventoryLot::new("A", "", 5),
            InventoryLot::new("A", "2025-02-01", 5),
            InventoryLot::new("A", "2025-01-15", 5),
            InventoryLot::new("AB", "2024-01-01", 5),
        ]);
        assert_eq!(b.find("A", "2025-03-01"), Some(LotKey::new("A", "2025-01-15")));
    }

    #[test]
    fn test_find_fallback_to_untracked_lot() {
        let b = book(vec![InventoryLot::new("A", "", 5)]);
        assert_eq!(b.find("A", "2025-03-01"), Some(LotKey::new("A", "")));
        assert_eq!(b.find("B", ""), None);
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut b = book(vec![InventoryLot::new("A", "", 0)]);
        assert!(b.decrement("A", "").is_some());
        assert_eq!(b.get(&LotKey::new("A", "")).unwrap().quantity, 0);
    }

    #[test]
    fn test_decrement_skips_blank_and_unknown_items() {
        let mut b = book(vec![InventoryLot::new("A", "", 3)]);
        assert!(b.decrement("", "").is_none());
        assert!(b.decrement("missing", "2025-01-01").is_none());
        assert_eq!(b.touched_lots().count(), 0);
    }

    #[test]
    fn test_settle_decrements_both_sides() {
        let mut b = book(vec![
            InventoryLot::new("唐揚げ", "2025-01-10", 5),
            InventoryLot::new("ご飯 大", "2025-01-11", 2),
        ]);
        b.settle(&PendingRef {
            id: Uuid::new_v4(),
            okazu: "唐揚げ".into(),
            okazu_expiry: "2025-01-10".into(),
            gohan: "ご飯 大".into(),
            gohan_expiry: "2025-01-11".into(),
        });
        assert_eq!(b.get(&LotKey::new("唐揚げ", "2025-01-10")).unwrap().quantity, 4);
        assert_eq!(b.get(&LotKey::new("ご飯 大", "2025-01-11")).unwrap().quantity, 1);
        assert_eq!(b.touched_lots().count(), 2);
    }
}
