use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{Result, ScanError};

/// Shared Postgres handle. Construction verifies connectivity so a
/// misconfigured deployment fails at startup, not at first request.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| ScanError::Internal(format!("failed to connect to Postgres: {e}")))?;

        Self::new(pool).await
    }

    pub async fn new(pool: PgPool) -> Result<Self> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| ScanError::Internal(format!("Postgres health check failed: {e}")))?;
        info!("connected to Postgres");

        Ok(Self { pool })
    }

    /// Apply pending migrations from this crate's `migrations/` directory.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ScanError::Internal(format!("migration failed: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
