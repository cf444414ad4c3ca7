//! Backend configuration loaded from environment variables.

use crate::error::{InventoryError, Result};

/// Which inventory backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Volatile in-process store, serialized by a per-product lock.
    #[default]
    Memory,
    /// Transactional store over PostgreSQL.
    Postgres,
}

impl std::str::FromStr for BackendKind {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendKind::Memory),
            "postgres" | "pg" => Ok(BackendKind::Postgres),
            other => Err(InventoryError::Configuration(format!(
                "unknown inventory backend: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Postgres => write!(f, "postgres"),
        }
    }
}

/// Store configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `INVENTORY_BACKEND` — `"memory"` or `"postgres"` (default: `"memory"`)
/// - `DATABASE_URL` — connection string, required for postgres
/// - `DATABASE_MAX_CONNECTIONS` — pool size (default: `10`)
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub backend: BackendKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl InventoryConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Result<Self> {
        let backend = match std::env::var("INVENTORY_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => BackendKind::default(),
        };
        Ok(Self {
            backend,
            database_url: std::env::var("DATABASE_URL").ok(),
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            database_url: None,
            max_connections: 10,
        }
    }
}
