//! Client API Handlers

use axum::{Json, extract::State, http::StatusCode};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::live::{EntityRemoved, LiveEvent};
use shared::models::{
    Client, ClientCreate, ClientDetail, ClientQuery, ClientStatement, ClientTransaction,
    ClientUpdate, ClientWithBalance, TransactionCreate,
};
use shared::util::non_blank;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::core::ServerState;
use crate::db::repository::{RepoError, client, tab};
use crate::ledger;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_email, validate_optional_text,
    validate_required_text,
};

/// Tabs shown on the client detail view
const RECENT_TABS: i64 = 10;

fn client_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ClientNotFound, format!("Client {id} not found"))
}

/// Trimmed optional contact fields; blank means "not given"
fn contact_fields(email: Option<&str>, phone: Option<&str>) -> AppResult<(Option<String>, Option<String>)> {
    let email = non_blank(email);
    if let Some(email) = &email {
        validate_email(email)?;
    }
    let phone = non_blank(phone);
    validate_optional_text(&phone, "phone", MAX_SHORT_TEXT_LEN)?;
    Ok((email, phone))
}

/// Publish `client:updated` with the committed balance; failures only log
pub(crate) async fn publish_client_updated(state: &ServerState, client_id: i64) {
    let loaded = async {
        let client = client::find_by_id(&state.pool, client_id)
            .await?
            .ok_or_else(|| client_not_found(client_id))?;
        let balance = ledger::compute_client_balance(&state.pool, client_id).await?;
        AppResult::Ok(ClientWithBalance { client, balance })
    }
    .await;

    match loaded {
        Ok(snapshot) => {
            state.live.publish(LiveEvent::ClientUpdated(snapshot));
        }
        Err(e) => {
            tracing::warn!(client_id, error = %e, "Client update not published");
        }
    }
}

/// GET /api/clients - with balances
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<ClientQuery>,
) -> AppResult<Json<Vec<ClientWithBalance>>> {
    let search = non_blank(query.search.as_deref());
    let clients = client::find_all(&state.pool, search.as_deref()).await?;
    let balances = ledger::client_balances(&state.pool).await?;

    let result = clients
        .into_iter()
        .map(|c| ClientWithBalance {
            balance: balances.get(&c.id).copied().unwrap_or_default(),
            client: c,
        })
        .collect();
    Ok(Json(result))
}

/// GET /api/clients/{id} - balance and the latest tabs
pub async fn get_by_id(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<ClientDetail>> {
    let client = client::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| client_not_found(id))?;
    let balance = ledger::compute_client_balance(&state.pool, id).await?;
    let recent_tabs = tab::find_recent_by_client(&state.pool, id, RECENT_TABS).await?;

    Ok(Json(ClientDetail {
        client,
        balance,
        recent_tabs,
    }))
}

/// POST /api/clients
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<ClientCreate>,
) -> AppResult<(StatusCode, Json<Client>)> {
    let name = non_blank(payload.name.as_deref()).ok_or_else(|| AppError::required("name"))?;
    validate_required_text(&name, "name", MAX_NAME_LEN)?;
    let (email, phone) = contact_fields(payload.email.as_deref(), payload.phone.as_deref())?;

    let client = client::create(&state.pool, client::NewClient { name, email, phone }).await?;

    tracing::info!(client_id = client.id, name = %client.name, "Client created");
    state.live.publish(LiveEvent::ClientCreated(client.clone()));
    Ok((StatusCode::CREATED, Json(client)))
}

/// PUT /api/clients/{id}
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ClientUpdate>,
) -> AppResult<Json<Client>> {
    let name = match payload.name.as_deref() {
        Some(raw) => {
            let name = non_blank(Some(raw)).ok_or_else(|| AppError::required("name"))?;
            validate_required_text(&name, "name", MAX_NAME_LEN)?;
            Some(name)
        }
        None => None,
    };
    let (email, phone) = contact_fields(payload.email.as_deref(), payload.phone.as_deref())?;

    let client = client::update(&state.pool, id, client::ClientChanges { name, email, phone })
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => client_not_found(id),
            other => other.into(),
        })?;

    publish_client_updated(&state, client.id).await;
    Ok(Json(client))
}

/// DELETE /api/clients/{id} - refused once the client has ledger history
pub async fn delete(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<EntityRemoved>> {
    let blocked = client::delete_if_no_ledger(&state.pool, id)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => client_not_found(id),
            other => other.into(),
        })?;

    if let Some(entries) = blocked {
        return Err(AppError::with_message(
            ErrorCode::ClientHasTransactions,
            format!("Client {id} has {entries} ledger entr(ies) and cannot be deleted"),
        )
        .with_detail("transaction_count", entries));
    }

    tracing::info!(client_id = id, "Client deleted");
    let removed = EntityRemoved { id };
    state.live.publish(LiveEvent::ClientDeleted(removed));
    Ok(Json(removed))
}

/// GET /api/clients/{id}/transactions - ledger with running balance
pub async fn statement(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<ClientStatement>> {
    let statement = ledger::client_statement(&state.pool, id).await?;
    Ok(Json(statement))
}

/// POST /api/clients/{id}/transactions - PAYMENT or MANUAL_DEBT
pub async fn add_transaction(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<TransactionCreate>,
) -> AppResult<(StatusCode, Json<ClientTransaction>)> {
    let transaction = ledger::record_manual(&state.pool, id, payload).await?;
    publish_client_updated(&state, id).await;
    Ok((StatusCode::CREATED, Json(transaction)))
}
