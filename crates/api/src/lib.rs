//! # Hearth API
//!
//! Application layer - commands and the service entry point.
//!
//! This crate contains:
//! - Commands (validated, logged operations over the core services)
//! - Application context (dependency injection)
//! - Tracing setup and health reporting
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Owns the background job scheduler lifecycle

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
