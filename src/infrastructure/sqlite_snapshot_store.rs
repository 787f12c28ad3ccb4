//! Relational snapshot store backed by the `products` table
//!
//! `save` replaces every row inside one transaction; `position` keeps the
//! snapshot's insertion order across loads.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::product::ProductRecord;
use crate::domain::repositories::{SnapshotStore, StoreError};

#[derive(Clone)]
pub struct SqliteSnapshotStore {
    pool: Arc<SqlitePool>,
}

impl SqliteSnapshotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn load(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_title, product_price, path_to_image
            FROM products
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| {
                let title: String = row.try_get("product_title")?;
                let price: f64 = row.try_get("product_price")?;
                let image_path: String = row.try_get("path_to_image")?;
                ProductRecord::new(title.clone(), price, image_path)
                    .map_err(|e| StoreError::InvalidRow(format!("{}: {}", title, e)))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        debug!("📂 Loaded {} records from products table", records.len());
        Ok(records)
    }

    async fn save(&self, records: &[ProductRecord]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
        for (position, record) in records.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO products
                (position, product_title, product_price, path_to_image)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(i64::try_from(position).unwrap_or(i64::MAX))
            .bind(record.title())
            .bind(record.price())
            .bind(record.image_path())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("💾 Saved {} records to products table", records.len());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sql"
    }
}
