//! Modular common utilities shared across Hearth crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: privacy helpers (salted redaction)
//! - `runtime`: credential encryption
//! - `platform`: SQLite connection pooling
//! - `observability`: tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod privacy;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod crypto;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod storage;

// Re-export commonly used types for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use crypto::{CodecError, SecretCodec};
#[cfg(feature = "foundation")]
pub use privacy::redact_email;
#[cfg(feature = "platform")]
pub use storage::{SqlitePool, SqlitePoolConfig, StorageError, StorageResult};
