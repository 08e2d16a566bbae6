//! Infrastructure layer: database adapters and configuration.

pub mod config;
pub mod product_store;

pub use config::{AppConfig, ConfigError, DatabaseConfig};
pub use product_store::{connect, ProductStore, StoreError};
