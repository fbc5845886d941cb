//! Category Repository

use super::{RepoError, RepoResult};
use shared::models::Category;
use sqlx::{Sqlite, SqlitePool};

const CATEGORY_SELECT: &str = "SELECT c.id, c.name, \
    (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count, \
    c.created_at, c.updated_at FROM categories c";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let sql = format!("{CATEGORY_SELECT} ORDER BY c.name COLLATE NOCASE");
    let rows = sqlx::query_as::<_, Category>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<Category>> {
    let sql = format!("{CATEGORY_SELECT} WHERE c.id = ?");
    let row = sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Insert a category; the name must already be trimmed.
/// A case-insensitive name clash yields [`RepoError::Duplicate`].
pub async fn create(pool: &SqlitePool, name: &str) -> RepoResult<Category> {
    let now = shared::util::now_millis();
    let id = sqlx::query("INSERT INTO categories (name, created_at, updated_at) VALUES (?1, ?2, ?2)")
        .bind(name)
        .bind(now)
        .execute(pool)
        .await?
        .last_insert_rowid();
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, name: &str) -> RepoResult<Category> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE categories SET name = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(name)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
}

/// Delete a category with no products.
///
/// Returns the number of products still attached when the delete is refused
/// (`Ok(Some(n))`), `Ok(None)` once deleted.
pub async fn delete_if_empty(pool: &SqlitePool, id: i64) -> RepoResult<Option<i64>> {
    let mut tx = crate::db::begin_write(pool).await?;

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if count > 0 {
        return Ok(Some(count));
    }

    sqlx::query("DELETE FROM categories WHERE id = ?")
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

    async fn add_product(pool: &SqlitePool, category_id: i64) {
        sqlx::query(
            "INSERT INTO products (name, price_cents, category_id, created_at, updated_at) \
             VALUES ('Cerveja', 1000, ?, 0, 0)",
        )
        .bind(category_id)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_list_with_counts() {
        let pool = pool().await;
        let drinks = create(&pool, "Bebidas").await.unwrap();
        create(&pool, "Aperitivos").await.unwrap();
        add_product(&pool, drinks.id).await;

        let all = find_all(&pool).await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Aperitivos", "Bebidas"]);
        assert_eq!(all[1].product_count, 1);
        assert_eq!(all[0].product_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_case_insensitive() {
        let pool = pool().await;
        create(&pool, "Bebidas").await.unwrap();
        let err = create(&pool, "bebidas").await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_delete_blocked_while_products_exist() {
        let pool = pool().await;
        let cat = create(&pool, "Bebidas").await.unwrap();
        add_product(&pool, cat.id).await;

        assert_eq!(delete_if_empty(&pool, cat.id).await.unwrap(), Some(1));
        assert!(find_by_id(&pool, cat.id).await.unwrap().is_some());

        sqlx::query("DELETE FROM products").execute(&pool).await.unwrap();
        assert_eq!(delete_if_empty(&pool, cat.id).await.unwrap(), None);
        assert!(find_by_id(&pool, cat.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let pool = pool().await;
        let err = update(&pool, 99, "X").await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}
