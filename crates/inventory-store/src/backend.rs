//! Backend selection: one store chosen at startup, held behind the
//! shared trait for the process lifetime.

use std::sync::Arc;

use crate::config::{BackendKind, InventoryConfig};
use crate::error::{InventoryError, Result};
use crate::memory::InMemoryInventory;
use crate::postgres::PostgresInventory;
use crate::store::InventoryStore;

/// Connects the configured backend and returns it behind the trait.
///
/// Selection happens exactly once; call sites hold the returned Arc
/// rather than branching on the backend kind. The postgres backend
/// runs its migrations before being handed out.
pub async fn connect(config: &InventoryConfig) -> Result<Arc<dyn InventoryStore>> {
    match config.backend {
        BackendKind::Memory => {
            tracing::info!("using in-memory inventory backend");
            Ok(Arc::new(InMemoryInventory::new()))
        }
        BackendKind::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                InventoryError::Configuration(
                    "DATABASE_URL is required for the postgres backend".to_string(),
                )
            })?;
            let store = PostgresInventory::connect(url, config.max_connections).await?;
            store.run_migrations().await?;
            tracing::info!(
                max_connections = config.max_connections,
                "using postgres inventory backend"
            );
            Ok(Arc::new(store))
        }
    }
}
