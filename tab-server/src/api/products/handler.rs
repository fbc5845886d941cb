//! Product API Handlers

use axum::{Json, extract::State, http::StatusCode};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::live::{EntityRemoved, LiveEvent};
use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate};
use shared::util::non_blank;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::core::ServerState;
use crate::db::repository::{RepoError, product};
use crate::ledger::money;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};

fn product_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
}

/// Unknown category on create/update
fn map_category_error(err: RepoError) -> AppError {
    match err {
        RepoError::Validation(msg) => AppError::with_message(ErrorCode::CategoryNotFound, msg),
        other => other.into(),
    }
}

fn required_name(raw: Option<&str>) -> AppResult<String> {
    let name = non_blank(raw).ok_or_else(|| AppError::required("name"))?;
    validate_required_text(&name, "name", MAX_NAME_LEN)?;
    Ok(name)
}

/// GET /api/products - catalog, filtered by name and category
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let products = product::find_all(&state.pool, &query).await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Product>> {
    let product = product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| product_not_found(id))?;
    Ok(Json(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<ProductCreate>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let name = required_name(payload.name.as_deref())?;
    let price = payload.price.ok_or_else(|| AppError::required("price"))?;
    let category_id = payload
        .category_id
        .ok_or_else(|| AppError::required("category_id"))?;

    let product = product::create(
        &state.pool,
        product::NewProduct {
            name,
            price_cents: money::price_to_cents(price)?,
            category_id,
        },
    )
    .await
    .map_err(map_category_error)?;

    tracing::info!(product_id = product.id, name = %product.name, "Product created");
    state.live.publish(LiveEvent::ProductCreated(product.clone()));
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id} - new prices only affect items added afterwards
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let name = match payload.name.as_deref() {
        Some(raw) => Some(required_name(Some(raw))?),
        None => None,
    };
    let price_cents = payload.price.map(money::price_to_cents).transpose()?;

    let product = product::update(
        &state.pool,
        id,
        product::ProductChanges {
            name,
            price_cents,
            category_id: payload.category_id,
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::NotFound(_) => product_not_found(id),
        other => map_category_error(other),
    })?;

    state.live.publish(LiveEvent::ProductUpdated(product.clone()));
    Ok(Json(product))
}

/// DELETE /api/products/{id} - items already on tabs keep their snapshot
pub async fn delete(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<EntityRemoved>> {
    if !product::delete(&state.pool, id).await? {
        return Err(product_not_found(id));
    }
    tracing::info!(product_id = id, "Product deleted");
    let removed = EntityRemoved { id };
    state.live.publish(LiveEvent::ProductDeleted(removed));
    Ok(Json(removed))
}
