//! SQLite storage primitives
//!
//! r2d2-pooled rusqlite connections with per-connection pragmas applied on
//! checkout. Schema management belongs to the application layer.

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod pragmas;

pub use config::SqlitePoolConfig;
pub use connection::SqliteConnection;
pub use error::{StorageError, StorageResult};
pub use pool::{PoolHealth, SqlitePool};
pub use pragmas::apply_connection_pragmas;
