//! Tab API Handlers

use axum::{Json, extract::State, http::StatusCode};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::live::{ItemChange, ItemRemoved, LiveEvent};
use shared::models::{
    Tab, TabCreate, TabHistoryQuery, TabItemCreate, TabItemUpdate, TabQuery, TabUpdate,
};

use crate::api::clients::publish_client_updated;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::tab;
use crate::tabs::{Transition, service};

/// GET /api/tabs - tabs on the board (deleted excluded unless asked for)
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<TabQuery>,
) -> AppResult<Json<Vec<Tab>>> {
    let tabs = tab::find_all(&state.pool, &query).await?;
    Ok(Json(tabs))
}

/// GET /api/tabs/history - settled and deleted tabs, newest first
pub async fn history(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<TabHistoryQuery>,
) -> AppResult<Json<Vec<Tab>>> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && from > to
    {
        return Err(AppError::validation("`from` must not be after `to`"));
    }
    let tabs = tab::find_history(&state.pool, &query).await?;
    Ok(Json(tabs))
}

/// GET /api/tabs/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Tab>> {
    let tab = tab::get(&state.pool, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::TabNotFound, format!("Tab {id} not found"))
    })?;
    Ok(Json(tab))
}

/// POST /api/tabs - open a tab
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<TabCreate>,
) -> AppResult<(StatusCode, Json<Tab>)> {
    let tab = service::create_tab(&state.pool, payload).await?;
    state.live.publish(LiveEvent::TabCreated(Box::new(tab.clone())));
    Ok((StatusCode::CREATED, Json(tab)))
}

/// PUT /api/tabs/{id} - edit fields and/or move the status
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<TabUpdate>,
) -> AppResult<Json<Tab>> {
    let outcome = service::update_tab(&state.pool, &current, id, payload).await?;
    let event = match outcome.transition {
        Some(Transition::Delete) => LiveEvent::TabDeleted(Box::new(outcome.tab.clone())),
        _ => LiveEvent::TabUpdated(Box::new(outcome.tab.clone())),
    };
    state.live.publish(event);
    if outcome.transition == Some(Transition::Fiado)
        && let Some(client_id) = outcome.tab.client_id
    {
        publish_client_updated(&state, client_id).await;
    }
    Ok(Json(outcome.tab))
}

/// DELETE /api/tabs/{id} - soft delete
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Tab>> {
    let tab = service::delete_tab(&state.pool, &current, id).await?;
    state.live.publish(LiveEvent::TabDeleted(Box::new(tab.clone())));
    Ok(Json(tab))
}

/// POST /api/tabs/{id}/items
pub async fn add_item(
    State(state): State<ServerState>,
    ApiPath(tab_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<TabItemCreate>,
) -> AppResult<(StatusCode, Json<ItemChange>)> {
    let change = service::add_item(&state.pool, tab_id, payload).await?;
    state.live.publish(LiveEvent::ItemAdded(Box::new(change.clone())));
    state.live.publish(LiveEvent::TabUpdated(Box::new(change.tab.clone())));
    Ok((StatusCode::CREATED, Json(change)))
}

/// PUT /api/tabs/{id}/items/{item_id}
pub async fn update_item(
    State(state): State<ServerState>,
    ApiPath((tab_id, item_id)): ApiPath<(i64, i64)>,
    ApiJson(payload): ApiJson<TabItemUpdate>,
) -> AppResult<Json<ItemChange>> {
    let change = service::update_item(&state.pool, tab_id, item_id, payload).await?;
    state.live.publish(LiveEvent::ItemUpdated(Box::new(change.clone())));
    state.live.publish(LiveEvent::TabUpdated(Box::new(change.tab.clone())));
    Ok(Json(change))
}

/// DELETE /api/tabs/{id}/items/{item_id}
pub async fn remove_item(
    State(state): State<ServerState>,
    ApiPath((tab_id, item_id)): ApiPath<(i64, i64)>,
) -> AppResult<Json<ItemRemoved>> {
    let removed = service::remove_item(&state.pool, tab_id, item_id).await?;
    state.live.publish(LiveEvent::ItemDeleted(Box::new(removed.clone())));
    state.live.publish(LiveEvent::TabUpdated(Box::new(removed.tab.clone())));
    Ok(Json(removed))
}
