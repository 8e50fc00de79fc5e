//! Reminder notification dispatch

pub mod ports;
pub mod service;

pub use service::{DispatchSummary, ReminderDispatcher};
