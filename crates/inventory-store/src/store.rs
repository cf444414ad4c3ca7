use async_trait::async_trait;
use common::{OrderId, ProductId};

use crate::error::{InventoryError, Result};
use crate::model::{Cancellation, Order, Placement, Product, ProductSeed};

/// Core trait implemented by both inventory backends.
///
/// All mutations against one product are totally ordered: the volatile
/// backend holds the product's lock across the critical section, the
/// transactional backend relies on a conditional row update inside one
/// database transaction. Reads take no lock and may observe slightly
/// stale stock while a mutation is in flight; a completed mutation is
/// visible once its critical section ends.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryStore: Send + Sync + std::fmt::Debug {
    /// Creates a product with `stock == initial_stock == seed.stock`.
    ///
    /// Seeding is idempotent: if a product with the given explicit id
    /// already exists it is returned unchanged.
    async fn add_product(&self, seed: ProductSeed) -> Result<Product>;

    /// Looks up a product by id.
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Returns all products, most recently created first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Attempts to reserve `quantity` units of a product for `user_id`.
    ///
    /// Every attempt is recorded exactly once: on success a `Placed`
    /// order is stored and the remaining stock returned; on
    /// insufficient stock a `Failed` order is stored, the fail counter
    /// incremented, and `InsufficientStock` reported. The failed
    /// record is retained even though the call returns an error.
    async fn place_order(
        &self,
        product_id: &ProductId,
        user_id: &str,
        quantity: i32,
    ) -> Result<Placement>;

    /// Cancels a placed order, restoring its quantity to stock exactly
    /// once.
    ///
    /// Only `Placed` orders can be canceled. `Failed` and `Canceled`
    /// are terminal and report `NotCancelable`; a `Failed` order never
    /// held stock, so cancelling it must never restore any.
    async fn cancel_order(
        &self,
        product_id: &ProductId,
        order_id: &OrderId,
    ) -> Result<Cancellation>;

    /// Returns all orders for a product by creation time, oldest first.
    async fn list_orders(&self, product_id: &ProductId) -> Result<Vec<Order>>;

    /// Discards every product, order, and per-product lock state
    /// together, then repopulates from `seed`.
    async fn reset(&self, seed: Vec<ProductSeed>) -> Result<()>;
}

/// Validates placement input before any state is touched.
///
/// Shared by both backends so a malformed request never produces an
/// order record or touches a counter.
pub fn validate_order_request(user_id: &str, quantity: i32) -> Result<()> {
    if quantity <= 0 {
        return Err(InventoryError::InvalidQuantity(quantity));
    }
    if user_id.trim().is_empty() {
        return Err(InventoryError::EmptyUserId);
    }
    Ok(())
}

/// Validates seed data before a create or reset touches the store.
pub fn validate_seed(seed: &ProductSeed) -> Result<()> {
    if seed.stock < 0 {
        return Err(InventoryError::NegativeStock(seed.stock));
    }
    Ok(())
}
