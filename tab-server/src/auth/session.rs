//! Token → user resolution and federated login completion

use shared::error::{AppError, AppResult};
use shared::models::User;
use sqlx::SqlitePool;

use crate::auth::oauth::FederatedIdentity;
use crate::auth::{Claims, CurrentUser, JwtError, JwtService};
use crate::db::repository::user;
use crate::security_log;

/// Validate a bearer token and load its user.
///
/// The role comes from the store, not the token; missing or inactive users
/// are rejected even when the token itself is still valid.
pub async fn authenticate(
    pool: &SqlitePool,
    jwt_service: &JwtService,
    token: &str,
) -> AppResult<CurrentUser> {
    authenticate_claims(pool, jwt_service, token)
        .await
        .map(|(user, _)| user)
}

/// [`authenticate`], also handing back the validated claims
pub async fn authenticate_claims(
    pool: &SqlitePool,
    jwt_service: &JwtService,
    token: &str,
) -> AppResult<(CurrentUser, Claims)> {
    let claims = jwt_service.validate_token(token).map_err(|e| {
        security_log!("WARN", "auth_failed", error = format!("{e}"));
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    let user_id = claims
        .user_id()
        .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {e}")))?;

    let Some(user) = user::find_by_id(pool, user_id).await? else {
        security_log!("WARN", "auth_unknown_user", user_id = user_id);
        return Err(AppError::invalid_token("User no longer exists"));
    };
    if !user.is_active {
        security_log!("WARN", "auth_inactive_user", user_id = user_id);
        return Err(AppError::account_disabled());
    }

    Ok((CurrentUser::from(&user), claims))
}

/// Record a successful provider login and issue a token.
///
/// First login provisions an active operator; inactive accounts are refused.
pub async fn complete_login(
    pool: &SqlitePool,
    jwt_service: &JwtService,
    identity: FederatedIdentity,
) -> AppResult<(User, String)> {
    let user = user::upsert_login(
        pool,
        user::LoginProfile {
            email: identity.email,
            name: identity.name,
            avatar_url: identity.avatar_url,
            google_id: identity.subject,
        },
    )
    .await?;

    if !user.is_active {
        security_log!("WARN", "login_inactive_user", user_id = user.id, email = user.email.clone());
        return Err(AppError::account_disabled());
    }

    let token = jwt_service
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Failed to issue token: {e}")))?;

    security_log!("INFO", "login_success", user_id = user.id, email = user.email.clone());
    Ok((user, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::db::repository::test_support::pool;
    use shared::error::ErrorCode;
    use shared::models::UserRole;

    fn identity(email: &str) -> FederatedIdentity {
        FederatedIdentity {
            subject: "sub-1".into(),
            email: email.into(),
            name: "Ana".into(),
            avatar_url: None,
        }
    }

    fn jwt() -> JwtService {
        JwtService::with_config(JwtConfig::development())
    }

    #[tokio::test]
    async fn login_then_authenticate() {
        let pool = pool().await;
        let jwt = jwt();
        let (user, token) = complete_login(&pool, &jwt, identity("ana@bar.test"))
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Operator);

        let current = authenticate(&pool, &jwt, &token).await.unwrap();
        assert_eq!(current.id, user.id);
        assert!(!current.is_admin());
    }

    #[tokio::test]
    async fn role_is_read_from_store() {
        let pool = pool().await;
        let jwt = jwt();
        let (user, token) = complete_login(&pool, &jwt, identity("ana@bar.test"))
            .await
            .unwrap();
        user::update(
            &pool,
            user.id,
            user::UserChanges {
                role: Some(UserRole::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(authenticate(&pool, &jwt, &token).await.unwrap().is_admin());
    }

    #[tokio::test]
    async fn deactivated_user_is_rejected() {
        let pool = pool().await;
        let jwt = jwt();
        let (user, token) = complete_login(&pool, &jwt, identity("ana@bar.test"))
            .await
            .unwrap();
        user::update(
            &pool,
            user.id,
            user::UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = authenticate(&pool, &jwt, &token).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountDisabled);
        let err = complete_login(&pool, &jwt, identity("ana@bar.test"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountDisabled);

        user::delete(&pool, user.id).await.unwrap();
        let err = authenticate(&pool, &jwt, &token).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[tokio::test]
    async fn bad_tokens_are_rejected() {
        let pool = pool().await;
        let jwt = jwt();
        let err = authenticate(&pool, &jwt, "not-a-jwt").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);

        let (user, _) = complete_login(&pool, &jwt, identity("ana@bar.test"))
            .await
            .unwrap();
        let expired = jwt
            .generate_token_with_ttl(&user, chrono::Duration::hours(-2))
            .unwrap();
        let err = authenticate(&pool, &jwt, &expired).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }
}
