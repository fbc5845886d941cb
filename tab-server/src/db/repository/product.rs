//! Product Repository

use super::{RepoError, RepoResult};
use crate::ledger::money::from_cents;
use shared::models::{Product, ProductQuery};
use sqlx::{Sqlite, SqlitePool};

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.price_cents, p.category_id, \
    c.name AS category_name, p.created_at, p.updated_at \
    FROM products p JOIN categories c ON c.id = p.category_id";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price_cents: i64,
    category_id: i64,
    category_name: String,
    created_at: i64,
    updated_at: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: from_cents(row.price_cents),
            category_id: row.category_id,
            category_name: row.category_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Validated product fields, price already in cents
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub category_id: Option<i64>,
}

pub async fn find_all(pool: &SqlitePool, query: &ProductQuery) -> RepoResult<Vec<Product>> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let sql = format!(
        "{PRODUCT_SELECT} WHERE (?1 IS NULL OR p.name LIKE '%' || ?1 || '%') \
         AND (?2 IS NULL OR p.category_id = ?2) ORDER BY p.name COLLATE NOCASE"
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(search)
        .bind(query.category_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Product::from).collect())
}

pub async fn find_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE p.id = ?");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Product::from))
}

async fn category_exists(pool: &SqlitePool, category_id: i64) -> RepoResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = ?")
        .bind(category_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn create(pool: &SqlitePool, data: NewProduct) -> RepoResult<Product> {
    if !category_exists(pool, data.category_id).await? {
        return Err(RepoError::Validation(format!(
            "Category {} does not exist",
            data.category_id
        )));
    }
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO products (name, price_cents, category_id, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?4)",
    )
    .bind(&data.name)
    .bind(data.price_cents)
    .bind(data.category_id)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductChanges) -> RepoResult<Product> {
    if let Some(category_id) = data.category_id
        && !category_exists(pool, category_id).await?
    {
        return Err(RepoError::Validation(format!(
            "Category {category_id} does not exist"
        )));
    }
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE products SET name = COALESCE(?1, name), price_cents = COALESCE(?2, price_cents), \
         category_id = COALESCE(?3, category_id), updated_at = ?4 WHERE id = ?5",
    )
    .bind(data.name)
    .bind(data.price_cents)
    .bind(data.category_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Hard delete; tab items keep their snapshot and lose the product link
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{category, test_support::pool};
    use rust_decimal::Decimal;

    async fn seed(pool: &SqlitePool) -> (i64, i64) {
        let drinks = category::create(pool, "Bebidas").await.unwrap().id;
        let food = category::create(pool, "Porções").await.unwrap().id;
        for (name, cents, cat) in [
            ("Cerveja Lata", 800, drinks),
            ("cerveja long neck", 1200, drinks),
            ("Batata Frita", 2500, food),
        ] {
            create(
                pool,
                NewProduct {
                    name: name.into(),
                    price_cents: cents,
                    category_id: cat,
                },
            )
            .await
            .unwrap();
        }
        (drinks, food)
    }

    #[tokio::test]
    async fn test_list_filters_by_search_and_category() {
        let pool = pool().await;
        let (drinks, food) = seed(&pool).await;

        let beers = find_all(
            &pool,
            &ProductQuery {
                search: Some("CERVEJA".into()),
                category_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(beers.len(), 2);
        assert_eq!(beers[0].name, "Cerveja Lata");
        assert_eq!(beers[0].price, Decimal::new(800, 2));
        assert_eq!(beers[0].category_name, "Bebidas");

        let food_only = find_all(
            &pool,
            &ProductQuery {
                search: None,
                category_id: Some(food),
            },
        )
        .await
        .unwrap();
        assert_eq!(food_only.len(), 1);
        assert_ne!(food_only[0].category_id, drinks);
    }

    #[tokio::test]
    async fn test_create_requires_existing_category() {
        let pool = pool().await;
        let err = create(
            &pool,
            NewProduct {
                name: "Água".into(),
                price_cents: 500,
                category_id: 77,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let pool = pool().await;
        seed(&pool).await;
        let updated = update(
            &pool,
            1,
            ProductChanges {
                price_cents: Some(900),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Cerveja Lata");
        assert_eq!(updated.price, Decimal::new(900, 2));
        assert!(delete(&pool, 1).await.unwrap());
        assert!(!delete(&pool, 1).await.unwrap());
    }
}
