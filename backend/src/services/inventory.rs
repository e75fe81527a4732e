//! Inventory reconciliation between the feed file and the lot store

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use shared::{InventoryLot, LotKey};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::db::lock_lot_store;
use crate::error::AppResult;
use crate::feed::{self, normalize_date, parse_lenient_int, ColumnMap, FeedTable};

/// Immutable lot set built completely before it is published
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotSnapshot {
    lots: BTreeMap<LotKey, InventoryLot>,
}

impl LotSnapshot {
    /// Collect lots; on duplicate keys the first lot wins
    pub fn from_lots(lots: impl IntoIterator<Item = InventoryLot>) -> Self {
        let mut map = BTreeMap::new();
        for lot in lots {
            map.entry(lot.key()).or_insert(lot);
        }
        Self { lots: map }
    }

    /// Parse a feed table. Returns `None` for an empty table so callers can
    /// keep the current store.
    pub fn from_table(table: &FeedTable) -> Option<Self> {
        if table.is_empty() {
            return None;
        }
        let columns = ColumnMap::resolve(&table.headers)?;

        let lots = table.rows.iter().filter_map(|row| {
            let item = FeedTable::cell(row, columns.item).trim();
            if item.is_empty() {
                return None;
            }
            let expiry = normalize_date(FeedTable::cell(row, columns.expiry));
            let quantity = parse_lenient_int(FeedTable::cell(row, columns.quantity));
            let threshold = columns
                .refill_threshold
                .map(|i| parse_lenient_int(FeedTable::cell(row, i)))
                .unwrap_or(0);
            let alert_note = columns
                .alert_note
                .map(|i| FeedTable::cell(row, i).trim())
                .filter(|note| !note.eq_ignore_ascii_case("nan"))
                .unwrap_or("")
                .to_string();

            let mut lot = InventoryLot::new(item, expiry, quantity).with_threshold(threshold);
            lot.alert_note = alert_note;
            Some(lot)
        });

        Some(Self::from_lots(lots))
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn get(&self, key: &LotKey) -> Option<&InventoryLot> {
        self.lots.get(key)
    }

    /// Lots ordered by (item, expiry)
    pub fn iter(&self) -> impl Iterator<Item = &InventoryLot> {
        self.lots.values()
    }

    pub fn to_vec(&self) -> Vec<InventoryLot> {
        self.lots.values().cloned().collect()
    }

    /// (item, expiry) -> quantity lookup
    pub fn quantities(&self) -> HashMap<LotKey, i64> {
        self.lots
            .iter()
            .map(|(k, lot)| (k.clone(), lot.quantity))
            .collect()
    }

    pub(crate) fn into_map(self) -> BTreeMap<LotKey, InventoryLot> {
        self.lots
    }

    pub(crate) fn from_map(lots: BTreeMap<LotKey, InventoryLot>) -> Self {
        Self { lots }
    }
}

/// Overwrite the quantity cell of every feed row whose key is in `snapshot`.
///
/// Returns the updated table and the number of rows matched. Row order and
/// every other cell are untouched.
pub fn apply_quantities(table: &FeedTable, snapshot: &LotSnapshot) -> (FeedTable, usize) {
    let Some(columns) = ColumnMap::resolve(&table.headers) else {
        return (table.clone(), 0);
    };
    let lookup = snapshot.quantities();

    let mut matched = 0;
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let key = LotKey::new(
                FeedTable::cell(row, columns.item).trim(),
                normalize_date(FeedTable::cell(row, columns.expiry)),
            );
            let mut row = row.clone();
            if let Some(qty) = lookup.get(&key) {
                if row.len() <= columns.quantity {
                    row.resize(columns.quantity + 1, String::new());
                }
                row[columns.quantity] = qty.to_string();
                matched += 1;
            }
            row
        })
        .collect();

    (
        FeedTable {
            headers: table.headers.clone(),
            rows,
        },
        matched,
    )
}

/// Result of a reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadOutcome {
    /// False when the feed was empty and the store was left as is
    pub applied: bool,
    pub lots: usize,
}

#[derive(Debug, FromRow)]
struct LotRow {
    item: String,
    expiry: String,
    quantity: i64,
    refill_threshold: i64,
    alert_note: String,
}

impl From<LotRow> for InventoryLot {
    fn from(row: LotRow) -> Self {
        InventoryLot {
            item: row.item,
            expiry: row.expiry,
            quantity: row.quantity,
            refill_threshold: row.refill_threshold,
            alert_note: row.alert_note,
        }
    }
}

/// Inventory service: rebuilds the lot store from the feed and writes
/// settled quantities back to it
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    candidates: Vec<PathBuf>,
}

impl InventoryService {
    /// Create a new InventoryService over ranked feed candidates
    pub fn new(db: PgPool, candidates: Vec<PathBuf>) -> Self {
        Self { db, candidates }
    }

    /// Feed path, resolved on every call so a newly created file is picked up
    pub fn feed_path(&self) -> PathBuf {
        feed::resolve_path(&self.candidates)
    }

    /// Parse the feed into a snapshot, `None` when the feed is empty
    pub fn load_feed(&self) -> Option<LotSnapshot> {
        LotSnapshot::from_table(&feed::read_table(&self.feed_path()))
    }

    /// Rebuild the lot store from the feed in its own transaction
    pub async fn reload(&self) -> AppResult<ReloadOutcome> {
        let mut tx = self.db.begin().await?;
        let outcome = self.reload_in(&mut tx).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Rebuild the lot store inside the caller's transaction.
    ///
    /// The lot-store lock is taken before the feed is read, so a settlement
    /// that rewrote the feed is always seen. An empty feed leaves the current
    /// lots untouched.
    pub async fn reload_in(&self, conn: &mut PgConnection) -> AppResult<ReloadOutcome> {
        lock_lot_store(&mut *conn).await?;

        let Some(snapshot) = self.load_feed() else {
            tracing::warn!(
                "Inventory feed {} is empty or unreadable; keeping current lots",
                self.feed_path().display()
            );
            return Ok(ReloadOutcome {
                applied: false,
                lots: 0,
            });
        };

        replace_lots(conn, &snapshot).await?;

        tracing::debug!("Reloaded {} lots from feed", snapshot.len());
        Ok(ReloadOutcome {
            applied: true,
            lots: snapshot.len(),
        })
    }

    /// Current lot store contents
    pub async fn current_lots(&self, conn: &mut PgConnection) -> AppResult<LotSnapshot> {
        let rows = sqlx::query_as::<_, LotRow>(
            r#"
            SELECT item, expiry, quantity, refill_threshold, alert_note
            FROM inventory_lots
            ORDER BY item, expiry
            "#,
        )
        .fetch_all(conn)
        .await?;

        Ok(LotSnapshot::from_lots(rows.into_iter().map(InventoryLot::from)))
    }

    /// Reload, then return the lot store as seen by that same transaction
    pub async fn fresh_lots(&self) -> AppResult<LotSnapshot> {
        let mut tx = self.db.begin().await?;
        self.reload_in(&mut tx).await?;
        let lots = self.current_lots(&mut tx).await?;
        tx.commit().await?;
        Ok(lots)
    }

    /// All lots ordered by (item, expiry), refreshed from the feed
    pub async fn list_lots(&self) -> AppResult<Vec<InventoryLot>> {
        Ok(self.fresh_lots().await?.to_vec())
    }
}

/// Write `snapshot` quantities into the feed at `path` in place.
///
/// Returns the number of feed rows updated; an empty feed is left alone.
pub fn write_back_to(path: &Path, snapshot: &LotSnapshot) -> AppResult<usize> {
    let table = feed::read_table(path);
    if table.is_empty() {
        tracing::warn!("Inventory feed {} is empty; nothing written back", path.display());
        return Ok(0);
    }

    let (updated, matched) = apply_quantities(&table, snapshot);
    feed::write_table(path, &updated)?;

    tracing::info!(
        "Wrote quantities for {}/{} feed rows to {}",
        matched,
        updated.rows.len(),
        path.display()
    );
    Ok(matched)
}

/// Replace the whole lot store with `snapshot`
async fn replace_lots(conn: &mut PgConnection, snapshot: &LotSnapshot) -> AppResult<()> {
    sqlx::query("DELETE FROM inventory_lots")
        .execute(&mut *conn)
        .await?;

    if snapshot.is_empty() {
        return Ok(());
    }

    let mut items = Vec::with_capacity(snapshot.len());
    let mut expiries = Vec::with_capacity(snapshot.len());
    let mut quantities = Vec::with_capacity(snapshot.len());
    let mut thresholds = Vec::with_capacity(snapshot.len());
    let mut notes = Vec::with_capacity(snapshot.len());
    for lot in snapshot.iter() {
        items.push(lot.item.clone());
        expiries.push(lot.expiry.clone());
        quantities.push(lot.quantity);
        thresholds.push(lot.refill_threshold);
        notes.push(lot.alert_note.clone());
    }

    sqlx::query(
        r#"
        INSERT INTO inventory_lots (item, expiry, quantity, refill_threshold, alert_note)
        SELECT * FROM UNNEST($1::text[], $2::text[], $3::bigint[], $4::bigint[], $5::text[])
        ON CONFLICT (item, expiry) DO NOTHING
        "#,
    )
    .bind(&items)
    .bind(&expiries)
    .bind(&quantities)
    .bind(&thresholds)
    .bind(&notes)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
