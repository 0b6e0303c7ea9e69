// src/database/mod.rs
//! Store access for the `products` table.
//!
//! Handlers never talk to a connection directly. They open a [`ProductStore`]
//! session through [`Database::session`], read or stage changes, and call
//! [`ProductStore::save`] to commit. A session that is dropped without saving
//! leaves the table untouched.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::product::{NewProduct, Product};

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("unsupported database url: {0}")]
    UnsupportedUrl(String),
    #[error("product {0} no longer exists")]
    RowMissing(i32),
    #[error("no product ids left to assign")]
    IdsExhausted,
}

#[async_trait]
pub trait Database: Send + Sync {
    async fn session(&self) -> Result<Box<dyn ProductStore>, StoreError>;
}

/// One unit of work over the `products` table.
#[async_trait]
pub trait ProductStore: Send {
    async fn list(&mut self) -> Result<Vec<Product>, StoreError>;

    async fn find(&mut self, id: i32) -> Result<Option<Product>, StoreError>;

    /// Inserts a row and returns it with the id assigned by the store.
    async fn add(&mut self, product: NewProduct) -> Result<Product, StoreError>;

    /// Overwrites `name`, `price` and `qty` of the row with `product.id`.
    /// Fails with [`StoreError::RowMissing`] if the row is gone, either here
    /// or on `save`.
    async fn update(&mut self, product: &Product) -> Result<(), StoreError>;

    async fn remove(&mut self, product: &Product) -> Result<(), StoreError>;

    async fn save(self: Box<Self>) -> Result<(), StoreError>;
}

/// Picks a backend from the connection string: `memory` for the in-process
/// table, anything `postgres://` for a pooled PostgreSQL connection.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
) -> Result<Arc<dyn Database>, StoreError> {
    if database_url == "memory" || database_url.starts_with("memory:") {
        tracing::info!("Using in-memory product store");
        return Ok(Arc::new(MemoryDatabase::new()));
    }

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        let pool = postgres::create_pool(database_url, max_connections).await?;
        tracing::info!(max_connections, "Connected to PostgreSQL");
        return Ok(Arc::new(PgDatabase::new(pool)));
    }

    Err(StoreError::UnsupportedUrl(database_url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_url_selects_memory_backend() {
        let db = connect("memory", 5).await.unwrap();
        let mut session = db.session().await.unwrap();
        assert!(session.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let err = connect("mysql://localhost/shop", 5).await.err().unwrap();
        assert!(matches!(err, StoreError::UnsupportedUrl(_)));
        assert_eq!(err.to_string(), "unsupported database url: mysql://localhost/shop");
    }
}
