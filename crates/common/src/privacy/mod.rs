//! Privacy helpers for keeping personal data out of logs.

pub mod redaction;

pub use redaction::{redact_email, redact_with_salt};
