//! Product persistence: the `productos` table behind a small async trait.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | Driver signal | StoreError | Scenario |
//! |------------|---------------|------------|----------|
//! | Database (unique violation) | Postgres `23505`, SQLite `2067` | `UniqueViolation` | Duplicate `codigo_barras` on insert |
//! | Database (other) | Any other | `Database` | Constraint/type/syntax failures |
//! | PoolClosed | N/A | `PoolClosed` | Connection pool was closed |
//! | Other | N/A | `Database` | Network errors, acquire timeouts, decode failures |
//!
//! Each call checks a connection out of the pool for exactly one statement; the
//! connection goes back to the pool when the call returns, on success or failure.

pub mod postgres;
pub mod sqlite;

use std::sync::Arc;

use thiserror::Error;

use inventario_core::ProductId;
use inventario_products::{NewProduct, Product, ProductUpdate};

use crate::config::DatabaseConfig;

pub use postgres::PostgresProductStore;
pub use sqlite::SqliteProductStore;

/// Table name shared by every backend.
pub const PRODUCTS_TABLE: &str = "productos";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the statement (duplicate barcode).
    #[error("unique constraint violated in {operation}: {message}")]
    UniqueViolation {
        operation: &'static str,
        message: String,
    },

    #[error("connection pool closed in {0}")]
    PoolClosed(&'static str),

    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn database(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Database {
            operation,
            message: message.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

/// Async persistence interface for products.
///
/// Every method issues a single parameterized statement. `update` and `delete`
/// report affected rows rather than failing on a missing id; the caller decides
/// what zero means.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Create the `productos` table if it does not exist yet.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Insert a row; the database assigns `id` and `fecha_ingreso`.
    async fn insert(&self, product: &NewProduct) -> Result<ProductId, StoreError>;

    /// All rows, ordered by `nombre` ascending (database collation).
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Overwrite the mutable columns of one row. Returns affected rows.
    async fn update(&self, update: &ProductUpdate) -> Result<u64, StoreError>;

    /// Remove one row. Returns affected rows.
    async fn delete(&self, id: ProductId) -> Result<u64, StoreError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Supported database backends, chosen by URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else {
            Err(StoreError::database(
                "connect",
                "unsupported DATABASE_URL scheme (expected sqlite: or postgres://)",
            ))
        }
    }
}

/// Open a pool for the configured database and make sure the table exists.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn ProductStore>, StoreError> {
    let store: Arc<dyn ProductStore> = match Backend::from_url(&config.url)? {
        Backend::Sqlite => Arc::new(SqliteProductStore::connect(config).await?),
        Backend::Postgres => Arc::new(PostgresProductStore::connect(config).await?),
    };
    store.ensure_schema().await?;
    tracing::info!(backend = store.backend(), "product store ready");
    Ok(store)
}

/// Map SQLx errors to StoreError.
pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                StoreError::UniqueViolation {
                    operation,
                    message: db_err.message().to_string(),
                }
            } else {
                StoreError::database(operation, db_err.message())
            }
        }
        sqlx::Error::PoolClosed => StoreError::PoolClosed(operation),
        other => StoreError::database(operation, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_chosen_by_scheme() {
        assert_eq!(Backend::from_url("sqlite::memory:").unwrap(), Backend::Sqlite);
        assert_eq!(Backend::from_url("sqlite://data/inventario.db").unwrap(), Backend::Sqlite);
        assert_eq!(Backend::from_url("postgres://u:p@localhost/db").unwrap(), Backend::Postgres);
        assert_eq!(Backend::from_url("postgresql://localhost/db").unwrap(), Backend::Postgres);
        assert!(Backend::from_url("mysql://localhost/db").is_err());
    }

    #[test]
    fn pool_closed_is_classified() {
        let err = map_sqlx_error("insert", sqlx::Error::PoolClosed);
        assert_eq!(err, StoreError::PoolClosed("insert"));
        assert!(!err.is_unique_violation());
    }
}
