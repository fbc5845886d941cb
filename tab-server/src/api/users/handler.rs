//! User API Handlers

use axum::{Json, extract::State, http::StatusCode};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::live::EntityRemoved;
use shared::models::{User, UserCreate, UserRole, UserUpdate};
use shared::util::non_blank;

use crate::api::extract::{ApiJson, ApiPath};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, user};
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, validate_email, validate_required_text};

fn user_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found"))
}

fn cannot_modify_self(action: &str) -> AppError {
    AppError::with_message(
        ErrorCode::CannotModifySelf,
        format!("Admins cannot {action} their own account"),
    )
}

/// GET /api/users
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    let users = user::find_all(&state.pool).await?;
    Ok(Json(users))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<User>> {
    let user = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    Ok(Json(user))
}

/// POST /api/users - pre-provision an account before its first login
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    ApiJson(payload): ApiJson<UserCreate>,
) -> AppResult<(StatusCode, Json<User>)> {
    let email = non_blank(payload.email.as_deref()).ok_or_else(|| AppError::required("email"))?;
    validate_email(&email)?;
    let name = match non_blank(payload.name.as_deref()) {
        Some(name) => name,
        None => email.split('@').next().unwrap_or(&email).to_string(),
    };
    validate_required_text(&name, "name", MAX_NAME_LEN)?;

    let created = user::create(
        &state.pool,
        user::NewUser {
            email: email.clone(),
            name,
            role: payload.role.unwrap_or_default(),
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::Duplicate(_) => AppError::with_message(
            ErrorCode::UserEmailExists,
            format!("A user with email {email} already exists"),
        ),
        other => other.into(),
    })?;

    security_log!(
        "INFO",
        "user_created",
        actor_id = current.id,
        user_id = created.id,
        role = created.role.as_str()
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/users/{id} - admins cannot demote or deactivate themselves
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> AppResult<Json<User>> {
    if id == current.id {
        if payload.is_active == Some(false) {
            return Err(cannot_modify_self("deactivate"));
        }
        if matches!(payload.role, Some(role) if role != UserRole::Admin) {
            return Err(cannot_modify_self("demote"));
        }
    }

    let name = match payload.name.as_deref() {
        Some(raw) => {
            let name = non_blank(Some(raw)).ok_or_else(|| AppError::required("name"))?;
            validate_required_text(&name, "name", MAX_NAME_LEN)?;
            Some(name)
        }
        None => None,
    };

    let updated = user::update(
        &state.pool,
        id,
        user::UserChanges {
            name,
            role: payload.role,
            is_active: payload.is_active,
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::NotFound(_) => user_not_found(id),
        other => other.into(),
    })?;

    security_log!(
        "INFO",
        "user_updated",
        actor_id = current.id,
        user_id = updated.id,
        role = updated.role.as_str(),
        is_active = updated.is_active
    );
    Ok(Json(updated))
}

/// DELETE /api/users/{id}
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<EntityRemoved>> {
    if id == current.id {
        return Err(cannot_modify_self("delete"));
    }
    if !user::delete(&state.pool, id).await? {
        return Err(user_not_found(id));
    }

    security_log!("WARN", "user_deleted", actor_id = current.id, user_id = id);
    Ok(Json(EntityRemoved { id }))
}
