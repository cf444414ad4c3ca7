use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId};
use tokio::sync::RwLock;

use crate::error::{InventoryError, Result};
use crate::lock::ProductLocks;
use crate::model::{Cancellation, Order, OrderStatus, Placement, Product, ProductSeed};
use crate::store::{InventoryStore, validate_order_request, validate_seed};

/// Volatile in-memory inventory store.
///
/// Mutations for one product run under that product's entry in a
/// [`ProductLocks`] table, so stock and counters are never interleaved.
/// The maps themselves are guarded by short-lived `RwLock` sections
/// and the two are never held across each other, which keeps reads
/// lock-free with respect to the per-product critical sections.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    locks: Arc<ProductLocks>,
}

impl InMemoryInventory {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of products.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Returns the total number of orders, across all statuses.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventory {
    async fn add_product(&self, seed: ProductSeed) -> Result<Product> {
        validate_seed(&seed)?;

        let mut products = self.products.write().await;
        if let Some(id) = &seed.id
            && let Some(existing) = products.get(id)
        {
            return Ok(existing.clone());
        }

        let id = seed.id.unwrap_or_else(ProductId::generate);
        let product = Product::from_seed(id.clone(), seed.stock, Utc::now());
        products.insert(id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(product_id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut out: Vec<Product> = products.values().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    #[tracing::instrument(skip(self), fields(product_id = %product_id))]
    async fn place_order(
        &self,
        product_id: &ProductId,
        user_id: &str,
        quantity: i32,
    ) -> Result<Placement> {
        validate_order_request(user_id, quantity)?;
        if !self.products.read().await.contains_key(product_id) {
            return Err(InventoryError::ProductNotFound(product_id.clone()));
        }

        let _guard = self.locks.acquire(product_id).await;

        let now = Utc::now();
        let (placed, stock) = {
            let mut products = self.products.write().await;
            let product = products
                .get_mut(product_id)
                .ok_or_else(|| InventoryError::ProductNotFound(product_id.clone()))?;
            if product.stock < quantity {
                product.fail_count += 1;
                product.updated_at = now;
                (false, product.stock)
            } else {
                product.stock -= quantity;
                product.success_count += 1;
                product.updated_at = now;
                (true, product.stock)
            }
        };

        let status = if placed {
            OrderStatus::Placed
        } else {
            OrderStatus::Failed
        };
        let order = Order::record(product_id.clone(), user_id, quantity, status, now);
        self.orders
            .write()
            .await
            .insert(order.order_id.clone(), order.clone());

        if !placed {
            metrics::counter!("inventory_orders_failed").increment(1);
            tracing::warn!(
                order_id = %order.order_id,
                requested = quantity,
                available = stock,
                "placement rejected: insufficient stock"
            );
            return Err(InventoryError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available: stock,
            });
        }

        metrics::counter!("inventory_orders_placed").increment(1);
        tracing::info!(order_id = %order.order_id, remaining_stock = stock, "order placed");
        Ok(Placement {
            order,
            remaining_stock: stock,
        })
    }

    #[tracing::instrument(skip(self), fields(product_id = %product_id, order_id = %order_id))]
    async fn cancel_order(
        &self,
        product_id: &ProductId,
        order_id: &OrderId,
    ) -> Result<Cancellation> {
        if !self.products.read().await.contains_key(product_id) {
            return Err(InventoryError::ProductNotFound(product_id.clone()));
        }
        if !self.orders.read().await.contains_key(order_id) {
            return Err(InventoryError::OrderNotFound(order_id.clone()));
        }

        let _guard = self.locks.acquire(product_id).await;

        let now = Utc::now();
        let order = {
            let mut orders = self.orders.write().await;
            let order = orders
                .get_mut(order_id)
                .ok_or_else(|| InventoryError::OrderNotFound(order_id.clone()))?;
            if order.product_id != *product_id {
                return Err(InventoryError::OrderNotFound(order_id.clone()));
            }
            if !order.status.can_cancel() {
                return Err(InventoryError::NotCancelable {
                    order_id: order_id.clone(),
                    status: order.status,
                });
            }
            order.status = OrderStatus::Canceled;
            order.updated_at = now;
            order.clone()
        };

        let updated_stock = {
            let mut products = self.products.write().await;
            let product = products
                .get_mut(product_id)
                .ok_or_else(|| InventoryError::ProductNotFound(product_id.clone()))?;
            product.stock += order.quantity;
            product.updated_at = now;
            product.stock
        };

        metrics::counter!("inventory_orders_canceled").increment(1);
        tracing::info!(updated_stock, "order canceled");
        Ok(Cancellation {
            order,
            updated_stock,
        })
    }

    async fn list_orders(&self, product_id: &ProductId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut out: Vec<Order> = orders
            .values()
            .filter(|o| o.product_id == *product_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        Ok(out)
    }

    #[tracing::instrument(skip_all)]
    async fn reset(&self, seed: Vec<ProductSeed>) -> Result<()> {
        for s in &seed {
            validate_seed(s)?;
        }

        // Sole place where both maps are held at once; every other
        // operation takes at most one at a time.
        let mut products = self.products.write().await;
        let mut orders = self.orders.write().await;
        self.locks.clear().await;
        products.clear();
        orders.clear();

        let now = Utc::now();
        for s in seed {
            let id = s.id.unwrap_or_else(ProductId::generate);
            products.insert(id.clone(), Product::from_seed(id, s.stock, now));
        }

        tracing::info!(products = products.len(), "inventory state reset");
        Ok(())
    }
}
