//! Client Repository

use super::{RepoError, RepoResult};
use shared::models::Client;
use sqlx::{Sqlite, SqlitePool};

const CLIENT_SELECT: &str =
    "SELECT id, name, email, phone, created_at, updated_at FROM clients";

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Clients ordered by name, optionally filtered by a name substring
pub async fn find_all(pool: &SqlitePool, search: Option<&str>) -> RepoResult<Vec<Client>> {
    let sql = format!(
        "{CLIENT_SELECT} WHERE (?1 IS NULL OR name LIKE '%' || ?1 || '%') ORDER BY name COLLATE NOCASE"
    );
    let rows = sqlx::query_as::<_, Client>(&sql)
        .bind(search)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<Client>> {
    let sql = format!("{CLIENT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Client>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: NewClient) -> RepoResult<Client> {
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO clients (name, email, phone, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
    )
    .bind(&data.name)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create client".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ClientChanges) -> RepoResult<Client> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE clients SET name = COALESCE(?1, name), email = COALESCE(?2, email), \
         phone = COALESCE(?3, phone), updated_at = ?4 WHERE id = ?5",
    )
    .bind(data.name)
    .bind(data.email)
    .bind(data.phone)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Client {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Client {id} not found")))
}

/// Delete a client that has no ledger entries.
///
/// Returns the number of entries when the delete is refused (`Ok(Some(n))`).
/// Tabs bound to the client are kept and unbound.
pub async fn delete_if_no_ledger(pool: &SqlitePool, id: i64) -> RepoResult<Option<i64>> {
    let mut tx = crate::db::begin_write(pool).await?;

    if find_by_id(&mut *tx, id).await?.is_none() {
        return Err(RepoError::NotFound(format!("Client {id} not found")));
    }

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM client_transactions WHERE client_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
    if count > 0 {
        return Ok(Some(count));
    }

    sqlx::query("DELETE FROM clients WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::pool;

    fn client(name: &str) -> NewClient {
        NewClient {
            name: name.into(),
            email: None,
            phone: Some("11 99999-0000".into()),
        }
    }

    #[tokio::test]
    async fn test_search_orders_by_name() {
        let pool = pool().await;
        create(&pool, client("Zeca")).await.unwrap();
        create(&pool, client("ana paula")).await.unwrap();
        create(&pool, client("Mariana")).await.unwrap();

        let all = find_all(&pool, None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ana paula", "Mariana", "Zeca"]);

        let found = find_all(&pool, Some("ANA")).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let pool = pool().await;
        let created = create(&pool, client("Zeca")).await.unwrap();
        let updated = update(
            &pool,
            created.id,
            ClientChanges {
                email: Some("zeca@bar.test".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Zeca");
        assert_eq!(updated.email.as_deref(), Some("zeca@bar.test"));
        assert_eq!(updated.phone, created.phone);
    }

    #[tokio::test]
    async fn test_delete_refused_with_ledger_entries() {
        let pool = pool().await;
        let c = create(&pool, client("Zeca")).await.unwrap();
        sqlx::query(
            "INSERT INTO client_transactions (client_id, amount_cents, type, description, created_at) \
             VALUES (?, 500, 'MANUAL_DEBT', 'x', 0)",
        )
        .bind(c.id)
        .execute(&pool)
        .await
        .unwrap();

        assert_eq!(delete_if_no_ledger(&pool, c.id).await.unwrap(), Some(1));

        let other = create(&pool, client("Ana")).await.unwrap();
        assert_eq!(delete_if_no_ledger(&pool, other.id).await.unwrap(), None);
        assert!(matches!(
            delete_if_no_ledger(&pool, other.id).await,
            Err(RepoError::NotFound(_))
        ));
    }
}
