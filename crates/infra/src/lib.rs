//! # Hearth Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories and migrations
//! - The shared HTTP client
//! - Provider integrations (Google, iCloud CalDAV, Spoonacular, Calendarific)
//! - Configuration loading and the cron scheduler
//!
//! ## Architecture
//! - Implements traits defined in `hearth-core`
//! - Depends on `hearth-common`, `hearth-domain` and `hearth-core`
//! - Contains all "impure" code (I/O, network, clocks)

pub mod config;
pub mod crypto;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use crypto::AesSecretCipher;
pub use database::*;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::*;
pub use scheduling::{build_job_scheduler, CronScheduler, JobServices, SchedulerError};
