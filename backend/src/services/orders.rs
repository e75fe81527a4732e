//! Order intake, cancellation, listings, options and ranking

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use shared::{
    CreateOrderInput, DateRange, HistoryFilter, Order, OrderOptions, OrderState, Ranking,
    RankingEntry,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use super::inventory::InventoryService;
use crate::error::{AppError, AppResult};
use crate::feed;

/// Ranking size shown in the summary
pub const SUMMARY_RANKING_LIMIT: i64 = 50;

/// Ranking size written to the ranking export
pub const EXPORT_RANKING_LIMIT: i64 = 200;

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    customer_name: String,
    okazu: String,
    okazu_expiry: String,
    gohan: String,
    gohan_expiry: String,
    state: String,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let state = row.state.parse::<OrderState>().map_err(AppError::Internal)?;
        Ok(Order {
            id: row.id,
            customer_name: row.customer_name,
            okazu: row.okazu,
            okazu_expiry: row.okazu_expiry,
            gohan: row.gohan,
            gohan_expiry: row.gohan_expiry,
            state,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> AppResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    inventory: InventoryService,
    roster_candidates: Vec<PathBuf>,
    rice_prefix: String,
}

impl OrderService {
    pub fn new(
        db: PgPool,
        inventory: InventoryService,
        roster_candidates: Vec<PathBuf>,
        rice_prefix: impl Into<String>,
    ) -> Self {
        Self {
            db,
            inventory,
            roster_candidates,
            rice_prefix: rice_prefix.into(),
        }
    }

    /// Submit a pending order
    pub async fn create(&self, input: CreateOrderInput) -> AppResult<Order> {
        let input = input.normalized();
        input.validate()?;

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (id, customer_name, okazu, okazu_expiry, gohan, gohan_expiry, state, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
            RETURNING id, customer_name, okazu, okazu_expiry, gohan, gohan_expiry, state, created_at, confirmed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.okazu)
        .bind(&input.okazu_expiry)
        .bind(&input.gohan)
        .bind(&input.gohan_expiry)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        let order = Order::try_from(row)?;
        tracing::info!("Order {} submitted by {}", order.id, order.customer_name);
        Ok(order)
    }

    /// Cancel a pending order; confirmed, cancelled and unknown ids are not found
    pub async fn cancel(&self, id: Uuid) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT state FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let cancellable = match current {
            Some((state,)) => state
                .parse::<OrderState>()
                .map_err(AppError::Internal)?
                .can_transition_to(OrderState::Cancelled),
            None => false,
        };
        if !cancellable {
            return Err(AppError::NotFound(format!("Pending order {} not found", id)));
        }

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET state = 'cancelled'
            WHERE id = $1
            RETURNING id, customer_name, okazu, okazu_expiry, gohan, gohan_expiry, state, created_at, confirmed_at
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!("Order {} cancelled", id);
        Order::try_from(row)
    }

    /// Pending orders, newest first
    pub async fn pending(&self) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, customer_name, okazu, okazu_expiry, gohan, gohan_expiry, state, created_at, confirmed_at
            FROM orders
            WHERE state = 'pending'
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        into_orders(rows)
    }

    /// Confirmed orders, newest first, filtered by exact name and an
    /// inclusive created-date range
    pub async fn history(&self, filter: &HistoryFilter) -> AppResult<Vec<Order>> {
        let name = filter
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, customer_name, okazu, okazu_expiry, gohan, gohan_expiry, state, created_at, confirmed_at
            FROM orders
            WHERE state = 'confirmed'
              AND ($1::text IS NULL OR customer_name = $1)
              AND ($2::date IS NULL OR created_at::date >= $2)
              AND ($3::date IS NULL OR created_at::date <= $3)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(name)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_all(&self.db)
        .await?;

        into_orders(rows)
    }

    /// Confirmed-order counts per side dish and per rice item, top `limit` each
    pub async fn ranking(&self, range: &DateRange, limit: i64) -> AppResult<Ranking> {
        Ok(Ranking {
            okazu: self.rank_column("okazu", range, limit).await?,
            gohan: self.rank_column("gohan", range, limit).await?,
        })
    }

    async fn rank_column(
        &self,
        column: &'static str,
        range: &DateRange,
        limit: i64,
    ) -> AppResult<Vec<RankingEntry>> {
        let sql = format!(
            r#"
            SELECT {column} AS label, COUNT(*) AS count
            FROM orders
            WHERE state = 'confirmed'
              AND {column} <> ''
              AND ($1::date IS NULL OR created_at::date >= $1)
              AND ($2::date IS NULL OR created_at::date <= $2)
            GROUP BY {column}
            ORDER BY count DESC, label ASC
            LIMIT $3
            "#
        );

        let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
            .bind(range.start)
            .bind(range.end)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(label, count)| RankingEntry { label, count })
            .collect())
    }

    /// Names from the roster plus item, expiry and quantity choices from a
    /// fresh reload
    pub async fn options(&self) -> AppResult<OrderOptions> {
        let lots = self.inventory.list_lots().await?;
        let names = feed::load_names(&feed::resolve_path(&self.roster_candidates));
        Ok(OrderOptions::build(names, &lots, &self.rice_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(state: &str) -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            customer_name: "田中".into(),
            okazu: "唐揚げ".into(),
            okazu_expiry: "2025-01-10".into(),
            gohan: String::new(),
            gohan_expiry: String::new(),
            state: state.into(),
            created_at: Utc::now(),
            confirmed_at: None,
        }
    }

    #[test]
    fn test_row_conversion_parses_state() {
        let order = Order::try_from(row("pending")).unwrap();
        assert_eq!(order.state, OrderState::Pending);
        assert_eq!(order.customer_name, "田中");
    }

    #[test]
    fn test_row_conversion_rejects_unknown_state() {
        let err = Order::try_from(row("shipped")).unwrap_err();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
