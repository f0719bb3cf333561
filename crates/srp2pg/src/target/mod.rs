//! PostgreSQL target: pooled connection that executes generated statements.

use crate::config::TargetConfig;
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::{debug, info};

/// Target database operations the orchestrator needs.
#[async_trait]
pub trait TargetPool: Send + Sync {
    /// Execute one generated statement.
    async fn execute(&self, sql: &str) -> Result<()>;
}

/// Pooled PostgreSQL target.
///
/// Only constructed for non-dry runs; dry runs never open a target
/// connection.
pub struct PgTarget {
    pool: Pool,
}

impl PgTarget {
    /// Connect and verify the target is reachable.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(2)
            .build()
            .map_err(|e| TransferError::Pool(format!("Failed to create target pool: {}", e)))?;

        let client = pool
            .get()
            .await
            .map_err(|e| TransferError::Pool(format!("Failed to get target connection: {}", e)))?;

        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl TargetPool for PgTarget {
    /// Statements are fully rendered literals, so `simple_query` is enough;
    /// autocommit applies per statement.
    async fn execute(&self, sql: &str) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| TransferError::Pool(format!("Failed to get target connection: {}", e)))?;

        debug!("executing: {}", sql);
        client.simple_query(sql).await?;
        Ok(())
    }
}
