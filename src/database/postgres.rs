use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, instrument};

use super::{Database, ProductStore, StoreError};
use crate::models::product::{NewProduct, Product};

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn session(&self) -> Result<Box<dyn ProductStore>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgProductStore { tx }))
    }
}

/// Session backed by a single transaction; `save` commits it and dropping
/// the session rolls it back.
pub struct PgProductStore {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&mut self) -> Result<Vec<Product>, StoreError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, price, qty FROM products ORDER BY id"
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(products)
    }

    async fn find(&mut self, id: i32) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, price, qty FROM products WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(product)
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn add(&mut self, product: NewProduct) -> Result<Product, StoreError> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (name, price, qty)
             VALUES ($1, $2, $3) RETURNING id, name, price, qty"
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(product.qty)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!(id = product.id, "Product row inserted");
        Ok(product)
    }

    async fn update(&mut self, product: &Product) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE products SET name = $1, price = $2, qty = $3 WHERE id = $4")
            .bind(&product.name)
            .bind(product.price)
            .bind(product.qty)
            .bind(product.id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowMissing(product.id));
        }
        Ok(())
    }

    async fn remove(&mut self, product: &Product) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product.id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowMissing(product.id));
        }
        Ok(())
    }

    async fn save(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
