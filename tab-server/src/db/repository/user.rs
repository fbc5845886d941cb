//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{User, UserRole};
use sqlx::{Sqlite, SqlitePool};

const USER_SELECT: &str = "SELECT id, email, name, avatar_url, google_id, role, is_active, \
    created_at, updated_at FROM users";

/// Profile returned by the identity provider at login
#[derive(Debug, Clone)]
pub struct LoginProfile {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub google_id: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let sql = format!("{USER_SELECT} ORDER BY name COLLATE NOCASE, id");
    let rows = sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Case-insensitive email lookup
pub async fn find_by_email(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    email: &str,
) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE email = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Record a federated login.
///
/// Unknown emails are provisioned as active operators. Known users get their
/// display name, avatar and provider id refreshed; role and active flag are
/// left untouched.
pub async fn upsert_login(pool: &SqlitePool, profile: LoginProfile) -> RepoResult<User> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO users (email, name, avatar_url, google_id, role, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'operator', 1, ?5, ?5) \
         ON CONFLICT(email) DO UPDATE SET name = excluded.name, avatar_url = excluded.avatar_url, \
         google_id = excluded.google_id, updated_at = excluded.updated_at",
    )
    .bind(&profile.email)
    .bind(&profile.name)
    .bind(&profile.avatar_url)
    .bind(&profile.google_id)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_email(pool, &profile.email)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record login".into()))
}

/// Pre-provision a user before their first login
pub async fn create(pool: &SqlitePool, data: NewUser) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO users (email, name, role, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, 1, ?4, ?4)",
    )
    .bind(&data.email)
    .bind(&data.name)
    .bind(data.role)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

/// Make sure `email` exists as an active admin
pub async fn ensure_admin(pool: &SqlitePool, email: &str) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let fallback_name = email.split('@').next().unwrap_or(email);
    sqlx::query(
        "INSERT INTO users (email, name, role, is_active, created_at, updated_at) \
         VALUES (?1, ?2, 'admin', 1, ?3, ?3) \
         ON CONFLICT(email) DO UPDATE SET role = 'admin', is_active = 1, updated_at = excluded.updated_at",
    )
    .bind(email)
    .bind(fallback_name)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_email(pool, email)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to provision admin".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: UserChanges) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE users SET name = COALESCE(?1, name), role = COALESCE(?2, role), \
         is_active = COALESCE(?3, is_active), updated_at = ?4 WHERE id = ?5",
    )
    .bind(data.name)
    .bind(data.role)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::pool;

    fn profile(email: &str, name: &str) -> LoginProfile {
        LoginProfile {
            email: email.into(),
            name: name.into(),
            avatar_url: Some("https://img.test/a.png".into()),
            google_id: "g-123".into(),
        }
    }

    #[tokio::test]
    async fn test_first_login_provisions_operator() {
        let pool = pool().await;
        let user = upsert_login(&pool, profile("ana@bar.test", "Ana")).await.unwrap();
        assert_eq!(user.role, UserRole::Operator);
        assert!(user.is_active);
        assert_eq!(user.google_id.as_deref(), Some("g-123"));
    }

    #[tokio::test]
    async fn test_relogin_keeps_role_and_active_flag() {
        let pool = pool().await;
        let user = upsert_login(&pool, profile("ana@bar.test", "Ana")).await.unwrap();
        update(
            &pool,
            user.id,
            UserChanges {
                role: Some(UserRole::Admin),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let again = upsert_login(&pool, profile("ANA@bar.test", "Ana Souza"))
            .await
            .unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(again.name, "Ana Souza");
        assert_eq!(again.role, UserRole::Admin);
        assert!(!again.is_active);
    }

    #[tokio::test]
    async fn test_ensure_admin_promotes_existing_user() {
        let pool = pool().await;
        create(
            &pool,
            NewUser {
                email: "dono@bar.test".into(),
                name: "Dono".into(),
                role: UserRole::Operator,
            },
        )
        .await
        .unwrap();
        let admin = ensure_admin(&pool, "dono@bar.test").await.unwrap();
        assert!(admin.is_admin());
        assert_eq!(admin.name, "Dono");

        let fresh = ensure_admin(&pool, "gerente@bar.test").await.unwrap();
        assert_eq!(fresh.name, "gerente");
        assert_eq!(find_all(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = pool().await;
        let new = NewUser {
            email: "ana@bar.test".into(),
            name: "Ana".into(),
            role: UserRole::Operator,
        };
        create(&pool, new.clone()).await.unwrap();
        let err = create(&pool, new).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }
}
