use async_trait::async_trait;
use common::{OrderId, ProductId};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::error::{InventoryError, Result};
use crate::model::{Cancellation, Order, OrderStatus, Placement, Product, ProductSeed};
use crate::store::{InventoryStore, validate_order_request, validate_seed};

/// PostgreSQL-backed inventory store.
///
/// Every mutation runs inside one transaction. The conditional
/// `WHERE stock >= quantity` update plays the role of the volatile
/// backend's per-product lock: the storage engine's row-level
/// atomicity makes check-then-act a single step, so no application
/// mutex is needed.
#[derive(Debug, Clone)]
pub struct PostgresInventory {
    pool: PgPool,
}

impl PostgresInventory {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with a bounded pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from(row.try_get::<String, _>("id")?),
            stock: row.try_get("stock")?,
            initial_stock: row.try_get("initial_stock")?,
            success_count: row.try_get("success_count")?,
            fail_count: row.try_get("fail_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| InventoryError::Database(sqlx::Error::Decode(Box::new(e))))?;

        Ok(Order {
            order_id: OrderId::from(row.try_get::<String, _>("order_id")?),
            product_id: ProductId::from(row.try_get::<String, _>("product_id")?),
            user_id: row.try_get("user_id")?,
            quantity: row.try_get("quantity")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Inserts one order row within the caller's transaction.
    async fn insert_order(
        tx: &mut Transaction<'_, Postgres>,
        product_id: &ProductId,
        user_id: &str,
        quantity: i32,
        status: OrderStatus,
    ) -> Result<Order> {
        let order_id = OrderId::generate();
        let row = sqlx::query(
            r#"
            INSERT INTO orders (order_id, product_id, user_id, quantity, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING created_at, updated_at
            "#,
        )
        .bind(order_id.as_str())
        .bind(product_id.as_str())
        .bind(user_id)
        .bind(quantity)
        .bind(status.as_str())
        .fetch_one(&mut **tx)
        .await?;

        Ok(Order {
            order_id,
            product_id: product_id.clone(),
            user_id: user_id.to_string(),
            quantity,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn insert_product(
        tx: &mut Transaction<'_, Postgres>,
        id: &ProductId,
        stock: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, stock, initial_stock, success_count, fail_count)
            VALUES ($1, $2, $2, 0, 0)
            "#,
        )
        .bind(id.as_str())
        .bind(stock)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PostgresInventory {
    async fn add_product(&self, seed: ProductSeed) -> Result<Product> {
        validate_seed(&seed)?;

        let id = seed.id.unwrap_or_else(ProductId::generate);
        if let Some(existing) = self.get_product(&id).await? {
            return Ok(existing);
        }

        let mut tx = self.pool.begin().await?;
        Self::insert_product(&mut tx, &id, seed.stock).await?;
        tx.commit().await?;

        self.get_product(&id)
            .await?
            .ok_or(InventoryError::ProductNotFound(id))
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, stock, initial_stock, success_count, fail_count, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, stock, initial_stock, success_count, fail_count, created_at, updated_at
            FROM products
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    #[tracing::instrument(skip(self), fields(product_id = %product_id))]
    async fn place_order(
        &self,
        product_id: &ProductId,
        user_id: &str,
        quantity: i32,
    ) -> Result<Placement> {
        validate_order_request(user_id, quantity)?;

        let mut tx = self.pool.begin().await?;

        // The critical section: the conditional update either reserves
        // the stock and bumps the success counter in one atomic row
        // write, or affects zero rows.
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $1,
                success_count = success_count + 1,
                updated_at = now()
            WHERE id = $2 AND stock >= $1
            RETURNING stock
            "#,
        )
        .bind(quantity)
        .bind(product_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(remaining) = remaining else {
            // Zero rows: missing product (roll back, nothing to record)
            // or insufficient stock (failure bookkeeping must commit).
            let available: Option<i32> =
                sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                    .bind(product_id.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;
            let Some(available) = available else {
                return Err(InventoryError::ProductNotFound(product_id.clone()));
            };

            sqlx::query(
                r#"
                UPDATE products
                SET fail_count = fail_count + 1,
                    updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(product_id.as_str())
            .execute(&mut *tx)
            .await?;
            let order =
                Self::insert_order(&mut tx, product_id, user_id, quantity, OrderStatus::Failed)
                    .await?;
            tx.commit().await?;

            metrics::counter!("inventory_orders_failed").increment(1);
            tracing::warn!(
                order_id = %order.order_id,
                requested = quantity,
                available,
                "placement rejected: insufficient stock"
            );
            return Err(InventoryError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available,
            });
        };

        let order =
            Self::insert_order(&mut tx, product_id, user_id, quantity, OrderStatus::Placed).await?;
        tx.commit().await?;

        metrics::counter!("inventory_orders_placed").increment(1);
        tracing::info!(order_id = %order.order_id, remaining_stock = remaining, "order placed");
        Ok(Placement {
            order,
            remaining_stock: remaining,
        })
    }

    #[tracing::instrument(skip(self), fields(product_id = %product_id, order_id = %order_id))]
    async fn cancel_order(
        &self,
        product_id: &ProductId,
        order_id: &OrderId,
    ) -> Result<Cancellation> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the order serializes competing cancels: the
        // second one sees CANCELED and is rejected instead of
        // restoring stock twice.
        let row = sqlx::query(
            r#"
            SELECT quantity, status FROM orders
            WHERE order_id = $1 AND product_id = $2
            FOR UPDATE
            "#,
        )
        .bind(order_id.as_str())
        .bind(product_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            let product_exists: Option<i32> =
                sqlx::query_scalar("SELECT 1 FROM products WHERE id = $1")
                    .bind(product_id.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(if product_exists.is_none() {
                InventoryError::ProductNotFound(product_id.clone())
            } else {
                InventoryError::OrderNotFound(order_id.clone())
            });
        };

        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| InventoryError::Database(sqlx::Error::Decode(Box::new(e))))?;
        if !status.can_cancel() {
            return Err(InventoryError::NotCancelable {
                order_id: order_id.clone(),
                status,
            });
        }
        let quantity: i32 = row.try_get("quantity")?;

        let order_row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = now()
            WHERE order_id = $2
            RETURNING order_id, product_id, user_id, quantity, status, created_at, updated_at
            "#,
        )
        .bind(OrderStatus::Canceled.as_str())
        .bind(order_id.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let order = Self::row_to_order(order_row)?;

        let updated_stock: i32 = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + $1, updated_at = now()
            WHERE id = $2
            RETURNING stock
            "#,
        )
        .bind(quantity)
        .bind(product_id.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        metrics::counter!("inventory_orders_canceled").increment(1);
        tracing::info!(updated_stock, "order canceled");
        Ok(Cancellation {
            order,
            updated_stock,
        })
    }

    async fn list_orders(&self, product_id: &ProductId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, user_id, quantity, status, created_at, updated_at
            FROM orders
            WHERE product_id = $1
            ORDER BY created_at ASC, order_id ASC
            "#,
        )
        .bind(product_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    #[tracing::instrument(skip_all)]
    async fn reset(&self, seed: Vec<ProductSeed>) -> Result<()> {
        for s in &seed {
            validate_seed(s)?;
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM orders").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM products")
            .execute(&mut *tx)
            .await?;

        let count = seed.len();
        for s in seed {
            let id = s.id.unwrap_or_else(ProductId::generate);
            Self::insert_product(&mut tx, &id, s.stock).await?;
        }
        tx.commit().await?;

        tracing::info!(products = count, "inventory state reset");
        Ok(())
    }
}
