//! Product and order entities and the order lifecycle state machine.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};

/// A product with a finite, shared pool of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Units currently available for placement. Never negative.
    pub stock: i32,
    /// The stock ceiling set at creation. At quiescence,
    /// `stock == initial_stock - Σ quantity(placed orders)`.
    pub initial_stock: i32,
    /// All-time count of successful placements. Never decremented,
    /// not even when a placed order is later canceled.
    pub success_count: i32,
    /// All-time count of placements rejected for insufficient stock.
    pub fail_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub(crate) fn from_seed(id: ProductId, stock: i32, at: DateTime<Utc>) -> Self {
        Self {
            id,
            stock,
            initial_stock: stock,
            success_count: 0,
            fail_count: 0,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Specification for creating or seeding one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSeed {
    /// Explicit id for idempotent seeding; `None` generates one.
    pub id: Option<ProductId>,
    /// Initial stock, becomes both `stock` and `initial_stock`.
    pub stock: i32,
}

impl ProductSeed {
    /// Seed with a generated id.
    pub fn new(stock: i32) -> Self {
        Self { id: None, stock }
    }

    /// Seed with an explicit id.
    pub fn with_id(id: impl Into<ProductId>, stock: i32) -> Self {
        Self {
            id: Some(id.into()),
            stock,
        }
    }
}

/// The state of an order in its lifecycle.
///
/// ```text
/// (placement, stock sufficient)   ──► Placed ──► Canceled
/// (placement, stock insufficient) ──► Failed
/// ```
///
/// `Failed` and `Canceled` are terminal. A `Failed` order never held
/// stock, so it can never be canceled into a stock restoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Stock was reserved for this order.
    Placed,
    /// Stock was insufficient at evaluation time (terminal).
    Failed,
    /// A placed order whose stock has been restored (terminal).
    Canceled,
}

impl OrderStatus {
    /// Returns true if the order can be canceled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Placed)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Failed | OrderStatus::Canceled)
    }

    /// Returns the status name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a persisted status string is unrecognized.
#[derive(Debug, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PLACED" => Ok(OrderStatus::Placed),
            "FAILED" => Ok(OrderStatus::Failed),
            "CANCELED" => Ok(OrderStatus::Canceled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A recorded placement attempt against one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub user_id: String,
    /// Units requested. Positive, immutable after creation.
    pub quantity: i32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub(crate) fn record(
        product_id: ProductId,
        user_id: &str,
        quantity: i32,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: OrderId::generate(),
            product_id,
            user_id: user_id.to_string(),
            quantity,
            status,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone)]
pub struct Placement {
    pub order: Order,
    pub remaining_stock: i32,
}

/// Result of a successful cancellation.
#[derive(Debug, Clone)]
pub struct Cancellation {
    pub order: Order,
    pub updated_stock: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_placed_can_cancel() {
        assert!(OrderStatus::Placed.can_cancel());
        assert!(!OrderStatus::Failed.can_cancel());
        assert!(!OrderStatus::Canceled.can_cancel());
    }

    #[test]
    fn failed_and_canceled_are_terminal() {
        assert!(!OrderStatus::Placed.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            OrderStatus::Placed,
            OrderStatus::Failed,
            OrderStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "SHIPPED".parse::<OrderStatus>().unwrap_err();
        assert!(err.to_string().contains("SHIPPED"));
    }

    #[test]
    fn seed_becomes_product_with_matching_ceiling() {
        let now = Utc::now();
        let product = Product::from_seed(ProductId::from("p_1"), 7, now);
        assert_eq!(product.stock, 7);
        assert_eq!(product.initial_stock, 7);
        assert_eq!(product.success_count, 0);
        assert_eq!(product.fail_count, 0);
        assert_eq!(product.created_at, product.updated_at);
    }
}
