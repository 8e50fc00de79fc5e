//! Outbound HTTP plumbing shared by the integrations.

mod client;

pub use client::{ensure_success, status_error, HttpClient, HttpClientBuilder};
