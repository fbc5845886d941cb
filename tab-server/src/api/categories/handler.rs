//! Category API Handlers

use axum::{Json, extract::State, http::StatusCode};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::live::{EntityRemoved, LiveEvent};
use shared::models::{Category, CategoryCreate, CategoryUpdate};
use shared::util::non_blank;

use crate::api::extract::{ApiJson, ApiPath};
use crate::core::ServerState;
use crate::db::repository::{RepoError, category};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_required_text};

fn category_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {id} not found"))
}

fn map_write_error(id: Option<i64>, name: &str, err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::with_message(
            ErrorCode::CategoryNameExists,
            format!("Category '{name}' already exists"),
        )
        .with_detail("name", name),
        RepoError::NotFound(msg) => match id {
            Some(id) => category_not_found(id),
            None => AppError::with_message(ErrorCode::CategoryNotFound, msg),
        },
        other => other.into(),
    }
}

fn required_name(raw: Option<&str>) -> AppResult<String> {
    let name = non_blank(raw).ok_or_else(|| AppError::required("name"))?;
    validate_required_text(&name, "name", MAX_SHORT_TEXT_LEN)?;
    Ok(name)
}

/// GET /api/categories - with product counts
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    let categories = category::find_all(&state.pool).await?;
    Ok(Json(categories))
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Category>> {
    let category = category::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| category_not_found(id))?;
    Ok(Json(category))
}

/// POST /api/categories - names are unique, case-insensitively
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<CategoryCreate>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let name = required_name(payload.name.as_deref())?;
    let category = category::create(&state.pool, &name)
        .await
        .map_err(|e| map_write_error(None, &name, e))?;

    state.live.publish(LiveEvent::CategoryCreated(category.clone()));
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    let name = required_name(payload.name.as_deref())?;
    let category = category::update(&state.pool, id, &name)
        .await
        .map_err(|e| map_write_error(Some(id), &name, e))?;

    state.live.publish(LiveEvent::CategoryUpdated(category.clone()));
    Ok(Json(category))
}

/// DELETE /api/categories/{id} - refused while products reference it
pub async fn delete(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<EntityRemoved>> {
    let blocked = category::delete_if_empty(&state.pool, id)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => category_not_found(id),
            other => other.into(),
        })?;

    if let Some(products) = blocked {
        return Err(AppError::with_message(
            ErrorCode::CategoryHasProducts,
            format!("Category {id} still has {products} product(s)"),
        )
        .with_detail("product_count", products));
    }

    tracing::info!(category_id = id, "Category deleted");
    let removed = EntityRemoved { id };
    state.live.publish(LiveEvent::CategoryDeleted(removed));
    Ok(Json(removed))
}
