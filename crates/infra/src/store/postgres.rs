//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (foreign key violation) | `23503` | `ForeignKeyViolation` |
//! | RowNotFound | N/A | `NotFound` |
//! | Anything else | Any other | `Backend` |
//!
//! Schema lives in `crates/infra/migrations` and is applied with
//! [`PostgresStore::migrate`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use storefront_cart::{Cart, CartLine, CartRecord, LineItem};
use storefront_core::{CartId, ProductId};
use storefront_products::{Product, ProductFilter, ProductQuery};

use super::{Store, StoreError, StoreResult, StoreTransaction};

const PRODUCT_COLUMNS: &str = "id, code, name, price, image_url, created_at, updated_at";

/// Postgres-backed store.
///
/// `Send + Sync`; all statements go through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Apply pending schema migrations.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::backend("migrate", e))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, code, name, price, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn product_by_id(&self, id: ProductId) -> StoreResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_by_id", e))?
            .ok_or(StoreError::not_found("product"))?;

        let product = ProductRow::from_row(&row).map_err(|e| StoreError::backend("decode_product", e))?;
        Ok(product.into())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET code = $2, name = $3, price = $4, image_url = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(product.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        // line_items rows go with it (ON DELETE CASCADE).
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(())
    }

    async fn query_products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let order_clause = match query.order {
            Some(order) => format!(
                "ORDER BY {} {}, id ASC",
                order.column.column_name(),
                if order.ascending { "ASC" } else { "DESC" }
            ),
            None => String::new(),
        };
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
            {order_clause}
            LIMIT $2 OFFSET $3
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(name_pattern(&query.filter))
            .bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("query_products", e))?;

        rows.iter()
            .map(|row| {
                ProductRow::from_row(row)
                    .map(Product::from)
                    .map_err(|e| StoreError::backend("decode_product", e))
            })
            .collect()
    }

    async fn count_products(&self, filter: &ProductFilter) -> StoreResult<u64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM products
            WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
            "#,
        )
        .bind(name_pattern(filter))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_products", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| StoreError::backend("count_products", e))?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    #[instrument(skip(self), fields(cart_id = %id), err)]
    async fn cart_by_id(&self, id: CartId) -> StoreResult<Cart> {
        let cart_row = sqlx::query("SELECT id, created_at, updated_at FROM carts WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("cart_by_id", e))?
            .ok_or(StoreError::not_found("cart"))?;
        let created_at: DateTime<Utc> = cart_row
            .try_get("created_at")
            .map_err(|e| StoreError::backend("decode_cart", e))?;
        let updated_at: DateTime<Utc> = cart_row
            .try_get("updated_at")
            .map_err(|e| StoreError::backend("decode_cart", e))?;

        let rows = sqlx::query(
            r#"
            SELECT li.count AS line_count,
                   p.id, p.code, p.name, p.price, p.image_url, p.created_at, p.updated_at
            FROM line_items li
            JOIN products p ON p.id = li.product_id
            WHERE li.cart_id = $1
            ORDER BY li.created_at ASC, li.product_id ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("cart_lines", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let product = ProductRow::from_row(row).map_err(|e| StoreError::backend("decode_cart_line", e))?;
            let count: i64 = row
                .try_get("line_count")
                .map_err(|e| StoreError::backend("decode_cart_line", e))?;
            items.push(CartLine {
                product: product.into(),
                count: decode_count(count)?,
            });
        }

        Ok(Cart {
            id,
            created_at,
            updated_at,
            items,
        })
    }
}

/// Open Postgres transaction. Dropping it without committing rolls it back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn insert_cart(&mut self, cart: &CartRecord) -> StoreResult<()> {
        sqlx::query("INSERT INTO carts (id, created_at, updated_at) VALUES ($1, $2, $3)")
            .bind(cart.id.as_uuid())
            .bind(cart.created_at)
            .bind(cart.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_cart", e))?;
        Ok(())
    }

    async fn line_item(&mut self, cart_id: CartId, product_id: ProductId) -> StoreResult<LineItem> {
        let row = sqlx::query(
            r#"
            SELECT count FROM line_items
            WHERE cart_id = $1 AND product_id = $2
            "#,
        )
        .bind(cart_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("line_item", e))?
        .ok_or(StoreError::not_found("line item"))?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| StoreError::backend("decode_line_item", e))?;
        Ok(LineItem {
            cart_id,
            product_id,
            count: decode_count(count)?,
        })
    }

    async fn insert_line_item(&mut self, item: &LineItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO line_items (cart_id, product_id, count)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(item.cart_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(i64::from(item.count))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_line_item", e))?;
        Ok(())
    }

    async fn update_line_item(&mut self, item: &LineItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE line_items
            SET count = $3, updated_at = now()
            WHERE cart_id = $1 AND product_id = $2
            "#,
        )
        .bind(item.cart_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(i64::from(item.count))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_line_item", e))?;
        Ok(())
    }

    async fn delete_line_item(&mut self, cart_id: CartId, product_id: ProductId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM line_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id.as_uuid())
            .bind(product_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_line_item", e))?;
        Ok(result.rows_affected())
    }

    async fn touch_cart(&mut self, cart_id: CartId, at: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE carts SET updated_at = $2 WHERE id = $1")
            .bind(cart_id.as_uuid())
            .bind(at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("touch_cart", e))?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

/// `ILIKE` pattern for the name filter, with LIKE metacharacters escaped so the
/// term matches literally.
fn name_pattern(filter: &ProductFilter) -> Option<String> {
    filter
        .name_contains
        .as_deref()
        .map(|term| format!("%{}%", escape_like(term)))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn decode_count(count: i64) -> StoreResult<u32> {
    u32::try_from(count).map_err(|e| StoreError::backend("decode_count", e))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            let code = db_err.code().map(|c| c.into_owned());
            match code.as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                Some("23503") => StoreError::ForeignKeyViolation(msg),
                _ => StoreError::backend(operation, sqlx::Error::Database(db_err)),
            }
        }
        sqlx::Error::RowNotFound => StoreError::not_found("row"),
        other => StoreError::backend(operation, other),
    }
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    code: String,
    name: String,
    price: f64,
    image_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::from_uuid(row.id),
            code: row.code,
            name: row.name,
            price: row.price,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
