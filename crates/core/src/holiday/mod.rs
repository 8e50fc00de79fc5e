//! National holiday synchronization

pub mod ports;
pub mod service;

pub use service::{holiday_day_start, HolidaySyncService};
