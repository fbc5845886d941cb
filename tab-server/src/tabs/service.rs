//! Tab commands
//!
//! Each command runs in one SQLite transaction and returns the committed
//! state; callers publish the matching [`LiveEvent`](shared::live::LiveEvent)
//! after it returns.

use super::machine::{self, Transition};
use crate::auth::CurrentUser;
use crate::db::{self, repository::{RepoError, client, product, tab}};
use crate::ledger::{self, money};
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::live::{ItemChange, ItemRemoved};
use shared::models::{
    PAYMENT_METHOD_CASH, PAYMENT_METHOD_FIADO, Tab, TabCreate, TabItemCreate, TabItemUpdate,
    TabStatus, TabUpdate, TransactionType,
};
use shared::util::non_blank;
use sqlx::{SqliteConnection, SqlitePool};

/// Committed tab plus the transition applied, if any
#[derive(Debug, Clone)]
pub struct TabOutcome {
    pub tab: Tab,
    pub transition: Option<Transition>,
}

fn tab_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::TabNotFound, format!("Tab {id} not found"))
}

fn item_not_found(tab_id: i64, item_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::TabItemNotFound,
        format!("Item {item_id} not found on tab {tab_id}"),
    )
}

async fn load(conn: &mut SqliteConnection, id: i64) -> AppResult<Tab> {
    tab::find_by_id(conn, id)
        .await?
        .ok_or_else(|| tab_not_found(id))
}

async fn ensure_client(conn: &mut SqliteConnection, client_id: i64) -> AppResult<()> {
    if client::find_by_id(&mut *conn, client_id).await?.is_none() {
        return Err(AppError::with_message(
            ErrorCode::ClientNotFound,
            format!("Client {client_id} not found"),
        ));
    }
    Ok(())
}

/// Items may only change while the tab is open
async fn require_open(conn: &mut SqliteConnection, tab_id: i64) -> AppResult<()> {
    match tab::find_status(&mut *conn, tab_id).await? {
        None => Err(tab_not_found(tab_id)),
        Some(TabStatus::Open) => Ok(()),
        Some(status) => Err(AppError::invalid_state(
            ErrorCode::TabNotOpen,
            format!("Tab {tab_id} is {status}; items can only change on open tabs"),
        )
        .with_detail("status", status.as_str())),
    }
}

// =============================================================================
// Tabs
// =============================================================================

pub async fn create_tab(pool: &SqlitePool, payload: TabCreate) -> AppResult<Tab> {
    let customer =
        non_blank(payload.customer.as_deref()).ok_or_else(|| AppError::required("customer"))?;
    validate_required_text(&customer, "customer", MAX_NAME_LEN)?;

    let mut conn = pool.acquire().await.map_err(RepoError::from)?;
    if let Some(client_id) = payload.client_id {
        ensure_client(&mut conn, client_id).await?;
    }
    drop(conn);

    let created = tab::insert(pool, &customer, payload.client_id).await?;
    tracing::info!(tab_id = created.id, customer = %created.customer, "Tab opened");
    Ok(created)
}

/// Edit label/client and apply an optional status transition.
///
/// Reopen needs an admin. A fiado close writes the status change and the
/// ledger entry in the same transaction.
pub async fn update_tab(
    pool: &SqlitePool,
    actor: &CurrentUser,
    id: i64,
    payload: TabUpdate,
) -> AppResult<TabOutcome> {
    let mut tx = db::begin_write(pool).await.map_err(RepoError::from)?;
    let current = load(&mut tx, id).await?;

    if current.status == TabStatus::Deleted {
        return Err(AppError::invalid_state(
            ErrorCode::InvalidTransition,
            format!("Tab {id} is deleted"),
        ));
    }

    let customer = match payload.customer.as_deref() {
        Some(raw) => {
            let name = non_blank(Some(raw)).ok_or_else(|| AppError::required("customer"))?;
            validate_required_text(&name, "customer", MAX_NAME_LEN)?;
            Some(name)
        }
        None => None,
    };
    if let Some(client_id) = payload.client_id {
        ensure_client(&mut tx, client_id).await?;
    }
    if customer.is_some() || payload.client_id.is_some() {
        tab::update_fields(&mut tx, id, customer.as_deref(), payload.client_id).await?;
    }

    let requested = machine::requested_status(payload.status, payload.payment_method.as_deref())
        .filter(|status| *status != current.status);

    let transition = match requested {
        Some(target) => {
            let transition = machine::plan(current.status, target)?;
            if transition.requires_admin() && !actor.is_admin() {
                return Err(AppError::with_message(
                    ErrorCode::AdminRequired,
                    "Only admins can reopen a tab",
                ));
            }
            let customer = customer.as_deref().unwrap_or(&current.customer);
            apply_transition(&mut tx, &current, transition, &payload, customer).await?;
            Some(transition)
        }
        None => None,
    };

    let tab = load(&mut tx, id).await?;
    tx.commit().await.map_err(RepoError::from)?;

    if let Some(transition) = transition {
        tracing::info!(
            tab_id = id,
            from = %current.status,
            to = %tab.status,
            user_id = actor.id,
            total = %tab.total,
            "Tab status changed"
        );
        if transition == Transition::Reopen && current.status == TabStatus::Fiado {
            tracing::warn!(
                tab_id = id,
                client_id = ?current.client_id,
                "Fiado tab reopened; its ledger entry stays and a new close adds another"
            );
        }
    }

    Ok(TabOutcome { tab, transition })
}

async fn apply_transition(
    conn: &mut SqliteConnection,
    current: &Tab,
    transition: Transition,
    payload: &TabUpdate,
    customer: &str,
) -> AppResult<()> {
    let now = shared::util::now_millis();
    let method = non_blank(payload.payment_method.as_deref());

    let change = match transition {
        Transition::Close => tab::StatusChange {
            status: TabStatus::Closed,
            client_id: None,
            payment_method: method,
            amount_paid_cents: None,
            closed_at: Some(now),
            deleted_at: None,
        },
        Transition::Pay => {
            let tendered = payload
                .amount_paid
                .ok_or_else(|| AppError::required("amount_paid"))?;
            let tendered = money::round_money(tendered);
            if tendered < current.total {
                return Err(AppError::with_message(
                    ErrorCode::PaymentInsufficient,
                    format!("Paid {tendered}, required {}", current.total),
                )
                .with_detail("required", current.total.to_string()));
            }
            tab::StatusChange {
                status: TabStatus::Paid,
                client_id: None,
                payment_method: Some(method.unwrap_or_else(|| PAYMENT_METHOD_CASH.to_string())),
                amount_paid_cents: Some(money::price_to_cents(tendered)?),
                closed_at: Some(now),
                deleted_at: None,
            }
        }
        Transition::Fiado => {
            let client_id = payload
                .client_id
                .or(current.client_id)
                .ok_or_else(|| AppError::required("client_id"))?;
            if current.total.is_zero() {
                return Err(AppError::with_message(
                    ErrorCode::TabEmpty,
                    "A tab with no total cannot be closed as fiado",
                ));
            }
            tab::StatusChange {
                status: TabStatus::Fiado,
                client_id: Some(client_id),
                payment_method: Some(PAYMENT_METHOD_FIADO.to_string()),
                amount_paid_cents: None,
                closed_at: Some(now),
                deleted_at: None,
            }
        }
        Transition::Reopen => tab::StatusChange {
            status: TabStatus::Open,
            client_id: None,
            payment_method: None,
            amount_paid_cents: None,
            closed_at: None,
            deleted_at: None,
        },
        Transition::Delete => tab::StatusChange {
            status: TabStatus::Deleted,
            client_id: None,
            payment_method: current.payment_method.clone(),
            amount_paid_cents: current.amount_paid.and_then(money::to_cents),
            closed_at: current.closed_at,
            deleted_at: Some(now),
        },
    };

    tab::set_status(conn, current.id, &change).await?;

    if transition == Transition::Fiado
        && let Some(client_id) = change.client_id
    {
        ledger::record_transaction(
            conn,
            client_id,
            current.total,
            TransactionType::Fiado,
            Some(&format!("Fiado - {customer}")),
            Some(current.id),
        )
        .await?;
    }
    Ok(())
}

/// Soft delete from any live status
pub async fn delete_tab(pool: &SqlitePool, actor: &CurrentUser, id: i64) -> AppResult<Tab> {
    let outcome = update_tab(
        pool,
        actor,
        id,
        TabUpdate {
            status: Some(TabStatus::Deleted),
            ..Default::default()
        },
    )
    .await?;
    Ok(outcome.tab)
}

// =============================================================================
// Items
// =============================================================================

/// Add a line; name and price default to the product's current values
pub async fn add_item(
    pool: &SqlitePool,
    tab_id: i64,
    payload: TabItemCreate,
) -> AppResult<ItemChange> {
    let product_id = payload
        .product_id
        .ok_or_else(|| AppError::required("product_id"))?;
    let quantity = money::validate_quantity(payload.quantity.unwrap_or(1))?;

    let mut tx = db::begin_write(pool).await.map_err(RepoError::from)?;
    require_open(&mut tx, tab_id).await?;

    let product = product::find_by_id(&mut *tx, product_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {product_id} not found"),
            )
        })?;
    let name = non_blank(payload.name.as_deref()).unwrap_or(product.name);
    validate_required_text(&name, "name", MAX_NAME_LEN)?;
    let price_cents = money::price_to_cents(payload.price.unwrap_or(product.price))?;

    let item = tab::insert_item(
        &mut tx,
        tab_id,
        tab::NewItem {
            product_id: Some(product_id),
            name,
            price_cents,
            quantity,
        },
    )
    .await?;
    ledger::recompute_tab_total(&mut tx, tab_id).await?;
    let tab = load(&mut tx, tab_id).await?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::debug!(tab_id, item_id = item.id, total = %tab.total, "Item added");
    Ok(ItemChange { tab_id, item, tab })
}

pub async fn update_item(
    pool: &SqlitePool,
    tab_id: i64,
    item_id: i64,
    payload: TabItemUpdate,
) -> AppResult<ItemChange> {
    let name = match payload.name.as_deref() {
        Some(raw) => {
            let name = non_blank(Some(raw)).ok_or_else(|| AppError::required("name"))?;
            validate_required_text(&name, "name", MAX_NAME_LEN)?;
            Some(name)
        }
        None => None,
    };
    let price_cents = payload.price.map(money::price_to_cents).transpose()?;
    let quantity = payload.quantity.map(money::validate_quantity).transpose()?;

    let mut tx = db::begin_write(pool).await.map_err(RepoError::from)?;
    require_open(&mut tx, tab_id).await?;

    let item = tab::update_item(
        &mut tx,
        tab_id,
        item_id,
        tab::ItemChanges {
            name,
            price_cents,
            quantity,
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::NotFound(_) => item_not_found(tab_id, item_id),
        other => other.into(),
    })?;
    ledger::recompute_tab_total(&mut tx, tab_id).await?;
    let tab = load(&mut tx, tab_id).await?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::debug!(tab_id, item_id, total = %tab.total, "Item updated");
    Ok(ItemChange { tab_id, item, tab })
}

pub async fn remove_item(pool: &SqlitePool, tab_id: i64, item_id: i64) -> AppResult<ItemRemoved> {
    let mut tx = db::begin_write(pool).await.map_err(RepoError::from)?;
    require_open(&mut tx, tab_id).await?;

    if !tab::delete_item(&mut tx, tab_id, item_id).await? {
        return Err(item_not_found(tab_id, item_id));
    }
    ledger::recompute_tab_total(&mut tx, tab_id).await?;
    let tab = load(&mut tx, tab_id).await?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::debug!(tab_id, item_id, total = %tab.total, "Item removed");
    Ok(ItemRemoved {
        tab_id,
        item_id,
        tab,
    })
}
