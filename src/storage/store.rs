//! # Store
//!
//! Owns the connection pools. A `Store` is constructed once at startup and
//! passed down explicitly; cloning it is cheap and shares the pools.
//!
//! SQLite admits one writer at a time. Every mutating transaction therefore
//! goes through the writer pool, which holds exactly one connection: two
//! read-then-write transactions can never interleave, so an existence check
//! always observes the latest committed state. Plain reads use the reader
//! pool and run concurrently under WAL.

use std::str::FromStr;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use super::config::DatabaseConfig;
use super::errors::{StoreError, StoreResult};
use super::schema;

/// Pooled handle to the backing database
#[derive(Debug, Clone)]
pub struct Store {
    reader: SqlitePool,
    writer: SqlitePool,
}

impl Store {
    /// Connect using the given configuration
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::Internal(format!("invalid database url: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout());

        if config.is_in_memory() {
            // Every connection must see the same database, and the database
            // disappears with its last connection.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(config.acquire_timeout())
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?;
            tracing::info!(url = %config.url, "connected to in-memory database");
            return Ok(Self::from_pools(pool.clone(), pool));
        }

        let options = options.journal_mode(SqliteJournalMode::Wal);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect_with(options.clone())
            .await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect_with(options)
            .await?;

        tracing::info!(
            url = %config.url,
            max_readers = config.max_connections,
            "connected to database"
        );

        Ok(Self::from_pools(reader, writer))
    }

    /// Private in-memory database with the schema already in place
    pub async fn in_memory() -> StoreResult<Self> {
        let store = Self::connect(&DatabaseConfig::in_memory()).await?;
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pools(reader: SqlitePool, writer: SqlitePool) -> Self {
        Self { reader, writer }
    }

    /// Create missing tables
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let mut conn = self.writer().await?;
        schema::ensure_schema(&mut *conn).await
    }

    /// Acquire a connection for standalone reads
    pub async fn reader(&self) -> StoreResult<PoolConnection<Sqlite>> {
        Ok(self.reader.acquire().await?)
    }

    /// Acquire the writer connection for a standalone (autocommit) write
    pub async fn writer(&self) -> StoreResult<PoolConnection<Sqlite>> {
        Ok(self.writer.acquire().await?)
    }

    /// Begin a transaction on the writer connection
    ///
    /// Dropping the returned transaction without committing rolls it back and
    /// returns the connection to the pool.
    pub async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.writer.begin().await?)
    }

    /// Round-trip a trivial query through the reader pool
    pub async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.reader().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }

    /// Close both pools, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}
