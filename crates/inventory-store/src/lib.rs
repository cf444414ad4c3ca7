//! Concurrency-safe inventory core.
//!
//! A finite pool of stock per product, mutated only through serialized
//! critical sections so stock never goes negative, every placement
//! attempt (accepted or rejected) is recorded as an order, and
//! cancellations restore stock exactly once.
//!
//! Two interchangeable backends implement the [`InventoryStore`] trait:
//! [`InMemoryInventory`] serializes mutations with a per-product lock
//! table, [`PostgresInventory`] with a conditional row update inside a
//! database transaction. [`backend::connect`] selects one at startup
//! from configuration.

pub mod backend;
pub mod config;
pub mod error;
pub mod lock;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{OrderId, ProductId};

pub use backend::connect;
pub use config::{BackendKind, InventoryConfig};
pub use error::{ErrorKind, InventoryError, Result};
pub use lock::ProductLocks;
pub use memory::InMemoryInventory;
pub use model::{Cancellation, Order, OrderStatus, Placement, Product, ProductSeed};
pub use postgres::PostgresInventory;
pub use store::InventoryStore;
