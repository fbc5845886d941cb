//! Tab Repository
//!
//! Tabs and their items. Totals are written only through [`set_total`],
//! which the ledger calls after every item change.

use super::{RepoError, RepoResult};
use crate::ledger::money::from_cents;
use shared::models::{Tab, TabHistoryQuery, TabItem, TabQuery, TabStatus};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;

const TAB_SELECT: &str = "SELECT t.id, t.customer, t.client_id, cl.name AS client_name, t.status, \
    t.total_cents, t.payment_method, t.amount_paid_cents, t.opened_at, t.closed_at, \
    t.deleted_at, t.updated_at FROM tabs t LEFT JOIN clients cl ON cl.id = t.client_id";

const ITEM_SELECT: &str =
    "SELECT id, tab_id, product_id, name, price_cents, quantity, added_at FROM tab_items";

#[derive(sqlx::FromRow)]
struct TabRow {
    id: i64,
    customer: String,
    client_id: Option<i64>,
    client_name: Option<String>,
    status: TabStatus,
    total_cents: i64,
    payment_method: Option<String>,
    amount_paid_cents: Option<i64>,
    opened_at: i64,
    closed_at: Option<i64>,
    deleted_at: Option<i64>,
    updated_at: i64,
}

impl TabRow {
    fn into_tab(self, items: Vec<TabItem>) -> Tab {
        let total = from_cents(self.total_cents);
        let amount_paid = self.amount_paid_cents.map(from_cents);
        let change = match (self.status, amount_paid) {
            (TabStatus::Paid, Some(paid)) => Some(paid - total),
            _ => None,
        };
        Tab {
            id: self.id,
            customer: self.customer,
            client_id: self.client_id,
            client_name: self.client_name,
            status: self.status,
            total,
            payment_method: self.payment_method,
            amount_paid,
            change,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
            deleted_at: self.deleted_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    tab_id: i64,
    product_id: Option<i64>,
    name: String,
    price_cents: i64,
    quantity: i64,
    added_at: i64,
}

impl From<ItemRow> for TabItem {
    fn from(row: ItemRow) -> Self {
        let price = from_cents(row.price_cents);
        Self {
            id: row.id,
            tab_id: row.tab_id,
            product_id: row.product_id,
            name: row.name,
            price,
            quantity: row.quantity,
            subtotal: crate::ledger::money::line_total(price, row.quantity),
            added_at: row.added_at,
        }
    }
}

/// Status columns written by a state transition
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: TabStatus,
    pub client_id: Option<i64>,
    pub payment_method: Option<String>,
    pub amount_paid_cents: Option<i64>,
    pub closed_at: Option<i64>,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub product_id: Option<i64>,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub quantity: Option<i64>,
}

// =============================================================================
// Tabs
// =============================================================================

/// Tab with its items
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Tab>> {
    let sql = format!("{TAB_SELECT} WHERE t.id = ?");
    let Some(row) = sqlx::query_as::<_, TabRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let items = find_items(&mut *conn, id).await?;
    Ok(Some(row.into_tab(items)))
}

pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<Option<Tab>> {
    let mut conn = pool.acquire().await?;
    find_by_id(&mut conn, id).await
}

/// Current status only (cheap guard read)
pub async fn find_status(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<TabStatus>> {
    let row: Option<(TabStatus,)> = sqlx::query_as("SELECT status FROM tabs WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|(s,)| s))
}

/// Tabs newest first. Without a status filter deleted tabs are left out.
pub async fn find_all(pool: &SqlitePool, query: &TabQuery) -> RepoResult<Vec<Tab>> {
    let customer = query
        .customer
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let sql = format!(
        "{TAB_SELECT} WHERE ((?1 IS NULL AND t.status <> 'deleted') OR t.status = ?1) \
         AND (?2 IS NULL OR t.customer LIKE '%' || ?2 || '%') \
         AND (?3 IS NULL OR t.client_id = ?3) \
         ORDER BY t.opened_at DESC, t.id DESC"
    );
    let rows = sqlx::query_as::<_, TabRow>(&sql)
        .bind(query.status.map(|s| s.as_str()))
        .bind(customer)
        .bind(query.client_id)
        .fetch_all(pool)
        .await?;
    attach_items(pool, rows).await
}

/// Settled and deleted tabs, most recently changed first
pub async fn find_history(pool: &SqlitePool, query: &TabHistoryQuery) -> RepoResult<Vec<Tab>> {
    let customer = query
        .customer
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let sql = format!(
        "{TAB_SELECT} WHERE t.status IN ('closed', 'paid', 'fiado', 'deleted') \
         AND (?1 IS NULL OR t.status = ?1) \
         AND (?2 IS NULL OR t.customer LIKE '%' || ?2 || '%') \
         AND (?3 IS NULL OR t.client_id = ?3) \
         AND (?4 IS NULL OR t.updated_at >= ?4) \
         AND (?5 IS NULL OR t.updated_at <= ?5) \
         ORDER BY t.updated_at DESC, t.id DESC"
    );
    let rows = sqlx::query_as::<_, TabRow>(&sql)
        .bind(query.status.map(|s| s.as_str()))
        .bind(customer)
        .bind(query.client_id)
        .bind(query.from)
        .bind(query.to)
        .fetch_all(pool)
        .await?;
    attach_items(pool, rows).await
}

/// Latest tabs of a client (client detail view)
pub async fn find_recent_by_client(
    pool: &SqlitePool,
    client_id: i64,
    limit: i64,
) -> RepoResult<Vec<Tab>> {
    let sql = format!(
        "{TAB_SELECT} WHERE t.client_id = ? AND t.status <> 'deleted' \
         ORDER BY t.opened_at DESC, t.id DESC LIMIT ?"
    );
    let rows = sqlx::query_as::<_, TabRow>(&sql)
        .bind(client_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    attach_items(pool, rows).await
}

async fn attach_items(pool: &SqlitePool, rows: Vec<TabRow>) -> RepoResult<Vec<Tab>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!("{ITEM_SELECT} WHERE tab_id IN ("));
    let mut ids = qb.separated(", ");
    for row in &rows {
        ids.push_bind(row.id);
    }
    ids.push_unseparated(") ORDER BY id ASC");

    let mut by_tab: HashMap<i64, Vec<TabItem>> = HashMap::new();
    for item in qb.build_query_as::<ItemRow>().fetch_all(pool).await? {
        by_tab.entry(item.tab_id).or_default().push(item.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = by_tab.remove(&row.id).unwrap_or_default();
            row.into_tab(items)
        })
        .collect())
}

pub async fn insert(
    pool: &SqlitePool,
    customer: &str,
    client_id: Option<i64>,
) -> RepoResult<Tab> {
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO tabs (customer, client_id, status, total_cents, opened_at, updated_at) \
         VALUES (?1, ?2, 'open', 0, ?3, ?3)",
    )
    .bind(customer)
    .bind(client_id)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();
    get(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create tab".into()))
}

// Every tab write moves `updated_at` strictly forward, even within one
// millisecond, so snapshots of the same tab are totally ordered by it.

/// Edit the label and/or owning client
pub async fn update_fields(
    conn: &mut SqliteConnection,
    id: i64,
    customer: Option<&str>,
    client_id: Option<i64>,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE tabs SET customer = COALESCE(?1, customer), client_id = COALESCE(?2, client_id), \
         updated_at = MAX(?3, updated_at + 1) WHERE id = ?4",
    )
    .bind(customer)
    .bind(client_id)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Tab {id} not found")));
    }
    Ok(())
}

/// Write the columns of a status transition
pub async fn set_status(
    conn: &mut SqliteConnection,
    id: i64,
    change: &StatusChange,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE tabs SET status = ?1, client_id = COALESCE(?2, client_id), payment_method = ?3, \
         amount_paid_cents = ?4, closed_at = ?5, deleted_at = ?6, \
         updated_at = MAX(?7, updated_at + 1) WHERE id = ?8",
    )
    .bind(change.status)
    .bind(change.client_id)
    .bind(&change.payment_method)
    .bind(change.amount_paid_cents)
    .bind(change.closed_at)
    .bind(change.deleted_at)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Tab {id} not found")));
    }
    Ok(())
}

pub async fn set_total(conn: &mut SqliteConnection, id: i64, total_cents: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE tabs SET total_cents = ?1, updated_at = MAX(?2, updated_at + 1) WHERE id = ?3",
    )
    .bind(total_cents)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Tab {id} not found")));
    }
    Ok(())
}

// =============================================================================
// Items
// =============================================================================

pub async fn find_items(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    tab_id: i64,
) -> RepoResult<Vec<TabItem>> {
    let sql = format!("{ITEM_SELECT} WHERE tab_id = ? ORDER BY id ASC");
    let rows = sqlx::query_as::<_, ItemRow>(&sql)
        .bind(tab_id)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(TabItem::from).collect())
}

pub async fn find_item(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    tab_id: i64,
    item_id: i64,
) -> RepoResult<Option<TabItem>> {
    let sql = format!("{ITEM_SELECT} WHERE tab_id = ? AND id = ?");
    let row = sqlx::query_as::<_, ItemRow>(&sql)
        .bind(tab_id)
        .bind(item_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(TabItem::from))
}

/// (price_cents, quantity) of every item, for total recomputation
pub async fn item_lines(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    tab_id: i64,
) -> RepoResult<Vec<(i64, i64)>> {
    let rows: Vec<(i64, i64)> =
        sqlx::query_as("SELECT price_cents, quantity FROM tab_items WHERE tab_id = ?")
            .bind(tab_id)
            .fetch_all(conn)
            .await?;
    Ok(rows)
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    tab_id: i64,
    data: NewItem,
) -> RepoResult<TabItem> {
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO tab_items (tab_id, product_id, name, price_cents, quantity, added_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(tab_id)
    .bind(data.product_id)
    .bind(&data.name)
    .bind(data.price_cents)
    .bind(data.quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    find_item(&mut *conn, tab_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to add item".into()))
}

pub async fn update_item(
    conn: &mut SqliteConnection,
    tab_id: i64,
    item_id: i64,
    data: ItemChanges,
) -> RepoResult<TabItem> {
    let rows = sqlx::query(
        "UPDATE tab_items SET name = COALESCE(?1, name), price_cents = COALESCE(?2, price_cents), \
         quantity = COALESCE(?3, quantity) WHERE tab_id = ?4 AND id = ?5",
    )
    .bind(data.name)
    .bind(data.price_cents)
    .bind(data.quantity)
    .bind(tab_id)
    .bind(item_id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Item {item_id} not found on tab {tab_id}"
        )));
    }
    find_item(&mut *conn, tab_id, item_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Item {item_id} not found on tab {tab_id}")))
}

pub async fn delete_item(conn: &mut SqliteConnection, tab_id: i64, item_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM tab_items WHERE tab_id = ? AND id = ?")
        .bind(tab_id)
        .bind(item_id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}
