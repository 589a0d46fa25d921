use super::types::Database;
use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;

impl Database {
    /// Connect and apply pending migrations
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let db = Self::connect(config).await?;
        db.migrate().await?;
        Ok(db)
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .with_context(|| format!("Failed to connect to database at {}", config.url))?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(())
    }

    /// Close the pool; subsequent queries fail with `PoolClosed`
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Test helper method to access the underlying pool
    #[cfg(test)]
    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.pool
    }
}
