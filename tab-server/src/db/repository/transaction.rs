//! Client Transaction Repository (append-only ledger rows)
//!
//! Rows are never updated or deleted; the schema triggers reject both.

use super::RepoResult;
use crate::ledger::money::from_cents;
use shared::models::{ClientTransaction, TransactionType};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;

const TRANSACTION_SELECT: &str = "SELECT id, client_id, tab_id, amount_cents, type AS kind, \
    description, created_at FROM client_transactions";

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    client_id: i64,
    tab_id: Option<i64>,
    amount_cents: i64,
    kind: TransactionType,
    description: String,
    created_at: i64,
}

impl From<TransactionRow> for ClientTransaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            tab_id: row.tab_id,
            amount: from_cents(row.amount_cents),
            kind: row.kind,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// Row to append; the amount is signed and already validated
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub client_id: i64,
    pub tab_id: Option<i64>,
    pub amount_cents: i64,
    pub kind: TransactionType,
    pub description: String,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    data: NewTransaction,
) -> RepoResult<ClientTransaction> {
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO client_transactions (client_id, tab_id, amount_cents, type, description, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(data.client_id)
    .bind(data.tab_id)
    .bind(data.amount_cents)
    .bind(data.kind)
    .bind(&data.description)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(ClientTransaction {
        id,
        client_id: data.client_id,
        tab_id: data.tab_id,
        amount: from_cents(data.amount_cents),
        kind: data.kind,
        description: data.description,
        created_at: now,
    })
}

/// Ledger rows of a client in insertion order
pub async fn find_by_client(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    client_id: i64,
) -> RepoResult<Vec<ClientTransaction>> {
    let sql = format!("{TRANSACTION_SELECT} WHERE client_id = ? ORDER BY id ASC");
    let rows = sqlx::query_as::<_, TransactionRow>(&sql)
        .bind(client_id)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(ClientTransaction::from).collect())
}

/// Σ amount_cents per client, for clients that have entries
pub async fn sum_by_client(pool: &SqlitePool) -> RepoResult<HashMap<i64, i64>> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT client_id, SUM(amount_cents) FROM client_transactions GROUP BY client_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}
