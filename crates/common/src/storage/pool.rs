//! r2d2-backed SQLite connection pool

use std::path::Path;
use std::time::Instant;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::connection::SqliteConnection;
use super::error::{StorageError, StorageResult};
use super::pragmas::apply_connection_pragmas;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHealth {
    pub connections: u32,
    pub idle_connections: u32,
    pub max_size: u32,
}

/// Pool of SQLite connections with pragmas applied on creation.
#[derive(Debug, Clone)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
}

impl SqlitePool {
    /// Open (or create) the database at `path` and build the pool.
    ///
    /// A test connection is checked out before returning so a bad path
    /// fails here rather than on first use.
    #[instrument(skip(config), fields(db_path = ?path, pool_size = config.max_size))]
    pub fn open(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        if config.max_size == 0 {
            return Err(StorageError::InvalidConfig("pool size must be at least 1".to_string()));
        }

        info!("Creating SQLite connection pool");

        let init_config = config.clone();
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            apply_connection_pragmas(conn, &init_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!("Failed to create connection pool: {}", e);
                StorageError::Connection(format!("Failed to create pool: {}", e))
            })?;

        drop(pool.get().map_err(|e| {
            StorageError::Connection(format!("Failed to get test connection: {}", e))
        })?);

        info!("SQLite pool created with {} connections", config.max_size);
        Ok(Self { pool, config })
    }

    /// Check out a connection.
    pub fn get(&self) -> StorageResult<SqliteConnection> {
        let start = Instant::now();
        match self.pool.get() {
            Ok(conn) => {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Connection acquired");
                Ok(SqliteConnection::new(conn))
            }
            Err(e) => {
                if e.to_string().to_lowercase().contains("timed out") {
                    warn!("Connection timeout after {:?}", self.config.connection_timeout);
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    warn!("Connection error: {}", e);
                    Err(StorageError::Connection(format!("Failed to get connection: {}", e)))
                }
            }
        }
    }

    pub fn health(&self) -> PoolHealth {
        let state = self.pool.state();
        PoolHealth {
            connections: state.connections,
            idle_connections: state.idle_connections,
            max_size: self.config.max_size,
        }
    }

    pub fn config(&self) -> &SqlitePoolConfig {
        &self.config
    }
}
