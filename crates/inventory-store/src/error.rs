use common::{OrderId, ProductId};
use thiserror::Error;

use crate::model::OrderStatus;

/// Errors that can occur when operating on the inventory store.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist, or does not belong to the given product.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested quantity is not a positive integer.
    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i32),

    /// The user id is empty.
    #[error("user id must not be empty")]
    EmptyUserId,

    /// A product seed carried a negative initial stock.
    #[error("initial stock must be non-negative, got {0}")]
    NegativeStock(i32),

    /// Stock was insufficient at evaluation time. A `Failed` order has
    /// been recorded and the product's fail counter incremented.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// The order is in a state that does not permit cancellation.
    #[error("order {order_id} cannot be canceled from status {status}")]
    NotCancelable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// The backend configuration is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Coarse error classification for the external request layer.
///
/// Callers map these onto transport responses without matching every
/// variant of [`InventoryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown product or order, or order/product mismatch.
    NotFound,
    /// Malformed request input.
    InvalidArgument,
    /// Business-level rejection: insufficient stock. Not a fault.
    Conflict,
    /// The operation is not valid for the order's current state.
    InvalidState,
    /// Infrastructure or configuration failure.
    Internal,
}

impl InventoryError {
    /// Classifies this error for the request layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::ProductNotFound(_) | InventoryError::OrderNotFound(_) => {
                ErrorKind::NotFound
            }
            InventoryError::InvalidQuantity(_)
            | InventoryError::EmptyUserId
            | InventoryError::NegativeStock(_) => ErrorKind::InvalidArgument,
            InventoryError::InsufficientStock { .. } => ErrorKind::Conflict,
            InventoryError::NotCancelable { .. } => ErrorKind::InvalidState,
            InventoryError::Configuration(_)
            | InventoryError::Database(_)
            | InventoryError::Migration(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_error_contract() {
        assert_eq!(
            InventoryError::ProductNotFound(ProductId::from("p_1")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            InventoryError::OrderNotFound(OrderId::from("o_1")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            InventoryError::InvalidQuantity(0).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            InventoryError::InsufficientStock {
                product_id: ProductId::from("p_1"),
                requested: 3,
                available: 1,
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            InventoryError::NotCancelable {
                order_id: OrderId::from("o_1"),
                status: OrderStatus::Failed,
            }
            .kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            InventoryError::Configuration("no url".into()).kind(),
            ErrorKind::Internal
        );
    }
}
