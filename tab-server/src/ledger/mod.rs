//! Ledger engine
//!
//! Tab totals are derived from items; client balances are derived from the
//! append-only `client_transactions` rows. This module is the only writer of
//! `tabs.total_cents` and of ledger rows.

pub mod money;


use crate::db::repository::{RepoError, client, tab, transaction};
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};
use money::{amount_to_cents, from_cents, sum_lines, to_cents};
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    ClientStatement, ClientTransaction, StatementEntry, TransactionCreate, TransactionType,
};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;

/// Recompute and store a tab's total from its items.
///
/// Runs on the caller's connection so it shares the item write's transaction.
pub async fn recompute_tab_total(conn: &mut SqliteConnection, tab_id: i64) -> AppResult<Decimal> {
    let lines = tab::item_lines(&mut *conn, tab_id).await?;
    let total = sum_lines(
        lines
            .into_iter()
            .map(|(price_cents, qty)| (from_cents(price_cents), qty)),
    );
    let cents = to_cents(total).ok_or_else(|| AppError::validation("tab total out of range"))?;
    tab::set_total(conn, tab_id, cents)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => AppError::with_message(
                ErrorCode::TabNotFound,
                format!("Tab {tab_id} not found"),
            ),
            other => other.into(),
        })?;
    Ok(total)
}

/// Current balance: Σ of the client's ledger amounts
pub async fn compute_client_balance(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    client_id: i64,
) -> AppResult<Decimal> {
    let (cents,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM client_transactions WHERE client_id = ?",
    )
    .bind(client_id)
    .fetch_one(conn)
    .await
    .map_err(RepoError::from)?;
    Ok(from_cents(cents))
}

/// Balances of every client that has ledger entries
pub async fn client_balances(pool: &SqlitePool) -> AppResult<HashMap<i64, Decimal>> {
    let sums = transaction::sum_by_client(pool).await?;
    Ok(sums
        .into_iter()
        .map(|(client_id, cents)| (client_id, from_cents(cents)))
        .collect())
}

/// Ordered ledger entries paired with the running balance after each
pub async fn client_statement(pool: &SqlitePool, client_id: i64) -> AppResult<ClientStatement> {
    ensure_client(pool, client_id).await?;
    let rows = transaction::find_by_client(pool, client_id).await?;

    let mut running = Decimal::ZERO;
    let entries = rows
        .into_iter()
        .map(|transaction| {
            running += transaction.amount;
            StatementEntry {
                transaction,
                running_balance: running,
            }
        })
        .collect();

    Ok(ClientStatement {
        client_id,
        balance: running,
        entries,
    })
}

/// Append a ledger row.
///
/// Debits (FIADO, MANUAL_DEBT) must be positive and PAYMENT negative.
pub async fn record_transaction(
    conn: &mut SqliteConnection,
    client_id: i64,
    amount: Decimal,
    kind: TransactionType,
    description: Option<&str>,
    tab_id: Option<i64>,
) -> AppResult<ClientTransaction> {
    let cents = amount_to_cents(amount)?;
    if kind.is_debit() != (cents > 0) {
        let expected = if kind.is_debit() { "positive" } else { "negative" };
        return Err(AppError::with_message(
            ErrorCode::TransactionInvalidAmount,
            format!("{kind} amount must be {expected}, got {amount}"),
        )
        .with_detail("type", kind.as_str()));
    }
    ensure_client(&mut *conn, client_id).await?;

    let description = shared::util::non_blank(description)
        .unwrap_or_else(|| kind.default_description().to_string());
    validate_required_text(&description, "description", MAX_NOTE_LEN)?;

    let recorded = transaction::insert(
        conn,
        transaction::NewTransaction {
            client_id,
            tab_id,
            amount_cents: cents,
            kind,
            description,
        },
    )
    .await?;

    tracing::info!(
        client_id,
        tab_id = ?tab_id,
        amount = %recorded.amount,
        kind = %kind,
        "Ledger entry recorded"
    );
    Ok(recorded)
}

/// Manual entry from the clients API. FIADO rows only come from closing a tab.
pub async fn record_manual(
    pool: &SqlitePool,
    client_id: i64,
    payload: TransactionCreate,
) -> AppResult<ClientTransaction> {
    let kind = payload.kind.ok_or_else(|| AppError::required("type"))?;
    if kind == TransactionType::Fiado {
        return Err(AppError::with_message(
            ErrorCode::TransactionTypeNotAllowed,
            "FIADO entries are created by closing a tab",
        ));
    }
    let amount = payload.amount.ok_or_else(|| AppError::required("amount"))?;

    let mut conn = pool.acquire().await.map_err(RepoError::from)?;
    record_transaction(
        &mut conn,
        client_id,
        amount,
        kind,
        payload.description.as_deref(),
        None,
    )
    .await
}

async fn ensure_client(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    client_id: i64,
) -> AppResult<()> {
    if client::find_by_id(conn, client_id).await?.is_none() {
        return Err(AppError::with_message(
            ErrorCode::ClientNotFound,
            format!("Client {client_id} not found"),
        ));
    }
    Ok(())
}
