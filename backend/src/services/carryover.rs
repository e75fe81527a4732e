//! Month-end carryover snapshots and variance reports

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use shared::{previous_month, validate_month_label, CarryoverReport, CarryoverSnapshot};
use sqlx::{FromRow, PgPool};

use super::inventory::InventoryService;
use crate::db::lock_lot_store;
use crate::error::{AppError, AppResult};

/// Result of taking a snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotOutcome {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, FromRow)]
struct SnapshotRow {
    month: String,
    item: String,
    expiry: String,
    quantity: i64,
    created_at: DateTime<Utc>,
}

impl From<SnapshotRow> for CarryoverSnapshot {
    fn from(row: SnapshotRow) -> Self {
        CarryoverSnapshot {
            month: row.month,
            item: row.item,
            expiry: row.expiry,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

/// Carryover service
#[derive(Clone)]
pub struct CarryoverService {
    db: PgPool,
    inventory: InventoryService,
}

/// Month to snapshot: the given label, or the previous month when blank
pub fn resolve_month(month: Option<&str>, today: NaiveDate) -> AppResult<String> {
    let month = month
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| previous_month(today));

    validate_month_label(&month).map_err(|msg| AppError::validation("month", msg))?;
    Ok(month)
}

impl CarryoverService {
    pub fn new(db: PgPool, inventory: InventoryService) -> Self {
        Self { db, inventory }
    }

    /// Freeze current lot quantities under `month`, replacing any earlier
    /// snapshot of that month
    pub async fn snapshot(&self, month: Option<&str>, today: NaiveDate) -> AppResult<SnapshotOutcome> {
        let month = resolve_month(month, today)?;

        let mut tx = self.db.begin().await?;
        lock_lot_store(&mut tx).await?;
        self.inventory.reload_in(&mut tx).await?;
        let lots = self.inventory.current_lots(&mut tx).await?;

        sqlx::query("DELETE FROM carryover_snapshots WHERE month = $1")
            .bind(&month)
            .execute(&mut *tx)
            .await?;

        let items: Vec<String> = lots.iter().map(|l| l.item.clone()).collect();
        let expiries: Vec<String> = lots.iter().map(|l| l.expiry.clone()).collect();
        let quantities: Vec<i64> = lots.iter().map(|l| l.quantity).collect();

        sqlx::query(
            r#"
            INSERT INTO carryover_snapshots (month, item, expiry, quantity)
            SELECT $1, * FROM UNNEST($2::text[], $3::text[], $4::bigint[])
            ON CONFLICT (month, item, expiry) DO NOTHING
            "#,
        )
        .bind(&month)
        .bind(&items)
        .bind(&expiries)
        .bind(&quantities)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Snapshot {} taken with {} lots", month, lots.len());
        Ok(SnapshotOutcome {
            month,
            count: lots.len(),
        })
    }

    /// Snapshot rows of `month`, ordered by (item, expiry)
    pub async fn snapshot_rows(&self, month: &str) -> AppResult<Vec<CarryoverSnapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT month, item, expiry, quantity, created_at
            FROM carryover_snapshots
            WHERE month = $1
            ORDER BY item, expiry
            "#,
        )
        .bind(month)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(CarryoverSnapshot::from).collect())
    }

    /// Diff the previous month's snapshot against current stock
    pub async fn report(&self, today: NaiveDate) -> AppResult<CarryoverReport> {
        let month = previous_month(today);
        let current = self.inventory.fresh_lots().await?.quantities();
        let snapshots = self.snapshot_rows(&month).await?;

        let report = CarryoverReport::build(&month, &snapshots, &current, today);
        tracing::debug!(
            "Carryover report {}: {} rows, loss {}",
            month,
            report.rows.len(),
            report.total_loss()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_resolve_month_defaults_to_previous() {
        assert_eq!(resolve_month(None, date("2025-06-15")).unwrap(), "2025-05");
        assert_eq!(resolve_month(Some("  "), date("2025-01-03")).unwrap(), "2024-12");
    }

    #[test]
    fn test_resolve_month_validates_label() {
        assert_eq!(resolve_month(Some("2025-05"), date("2025-06-15")).unwrap(), "2025-05");
        let err = resolve_month(Some("2025/05"), date("2025-06-15")).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
