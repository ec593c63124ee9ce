//! PostgreSQL client implementation
//!
//! This module provides the pooled client used by the PostgreSQL export sink.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{OdmError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::NoTls;

const INITIAL_SCHEMA: &str = include_str!("../../../migrations/001_initial_schema.sql");

/// PostgreSQL client for the i2b2 tables
///
/// Provides methods for connecting to PostgreSQL, creating the i2b2 tables
/// and running statements using connection pooling.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// No connection is opened until the pool is first used.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed or the pool
    /// cannot be built.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .parse()
            .map_err(|e| {
                OdmError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| OdmError::Database(format!("Failed to create connection pool: {e}")))?;

        tracing::debug!(
            target = %connection_string_safe(config.connection_string.expose_secret().as_ref()),
            max_connections = config.max_connections,
            "PostgreSQL pool created"
        );

        Ok(Self { pool, config })
    }

    pub fn config(&self) -> &PostgreSQLConfig {
        &self.config
    }

    /// Test the connection to PostgreSQL
    ///
    /// Attempts to get a connection from the pool and execute a simple query.
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| OdmError::Database(format!("Connection test failed: {e}")))?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Create the metadata and fact tables if they don't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub async fn ensure_schema_exists(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .batch_execute(&self.schema_sql())
            .await
            .map_err(|e| OdmError::Database(format!("Failed to execute migration: {e}")))?;

        tracing::info!(
            metadata_table = %self.config.metadata_table,
            fact_table = %self.config.fact_table,
            "PostgreSQL schema initialized successfully"
        );
        Ok(())
    }

    fn schema_sql(&self) -> String {
        INITIAL_SCHEMA
            .replace("{metadata_table}", &self.config.metadata_table)
            .replace("{fact_table}", &self.config.fact_table)
            .replace("{metadata_index}", &index_stem(&self.config.metadata_table))
            .replace("{fact_index}", &index_stem(&self.config.fact_table))
    }

    /// Get a connection from the pool with the statement timeout applied
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| OdmError::Database(format!("Failed to get connection from pool: {e}")))?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client
            .batch_execute(&timeout_query)
            .await
            .map_err(|e| OdmError::Database(format!("Failed to set statement timeout: {e}")))?;

        Ok(client)
    }

    /// Execute a statement and return the number of affected rows
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn execute(
        &self,
        statement: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<u64> {
        let client = self.get_connection().await?;

        client
            .execute(statement, params)
            .await
            .map_err(|e| OdmError::Database(format!("Statement execution failed: {e}")))
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

/// Schema-qualified table name folded into one identifier
fn index_stem(table: &str) -> String {
    table.replace('.', "_")
}

/// Connection string with the credentials removed
pub fn connection_string_safe(connection_string: &str) -> String {
    connection_string
        .rsplit_once('@')
        .map(|(_, host)| format!("postgresql://***@{host}"))
        .unwrap_or_else(|| "postgresql://***".to_string())
}
