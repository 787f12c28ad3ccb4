// Database connection and pool management
// SQLite connections for the SQL snapshot store and the SQLite change cache

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

#[derive(Clone)]
pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db_path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);
        let db_path = db_path.split('?').next().unwrap_or(db_path);

        // In-memory databases have no file to prepare
        if !db_path.is_empty() && db_path != ":memory:" {
            let path = Path::new(db_path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            if !path.exists() {
                tokio::fs::File::create(path).await?;
            }
        }

        // 단일 연결: 메모리 DB도 연결 간에 공유되도록
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        debug!("🗄️ Connected to {}", database_url);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_products_sql = r#"
            CREATE TABLE IF NOT EXISTS products (
                position INTEGER NOT NULL,
                product_title TEXT PRIMARY KEY,
                product_price REAL NOT NULL,
                path_to_image TEXT NOT NULL DEFAULT ''
            )
        "#;

        let create_price_cache_sql = r#"
            CREATE TABLE IF NOT EXISTS price_cache (
                title TEXT PRIMARY KEY,
                price REAL NOT NULL
            )
        "#;

        let create_indexes_sql = r#"
            CREATE INDEX IF NOT EXISTS idx_products_position ON products (position)
        "#;

        sqlx::query(create_products_sql).execute(&self.pool).await?;
        sqlx::query(create_price_cache_sql).execute(&self.pool).await?;
        sqlx::query(create_indexes_sql).execute(&self.pool).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_database_connection() -> Result<()> {
        // 임시 디렉토리 생성 (하위 디렉토리까지 자동 생성 확인)
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("nested").join("test.db");
        let database_url = format!("sqlite:{}", db_path.to_string_lossy());

        let db = DatabaseConnection::new(&database_url).await?;

        assert!(!db.pool().is_closed());
        assert!(db_path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_database_migration() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test_migration.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let db = DatabaseConnection::new(&database_url).await?;
        db.migrate().await?;
        // 두 번 실행해도 안전해야 함
        db.migrate().await?;

        for table in ["products", "price_cache"] {
            let result = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table)
                .fetch_optional(db.pool())
                .await?;
            assert!(result.is_some(), "missing table {table}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn in_memory_database_needs_no_file() -> Result<()> {
        let db = DatabaseConnection::new("sqlite::memory:").await?;
        db.migrate().await?;
        assert!(!db.pool().is_closed());
        Ok(())
    }
}
