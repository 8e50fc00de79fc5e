//! Commands - the operations exposed to callers of the backend
//!
//! Each command takes the [`AppContext`](crate::AppContext) plus primitive
//! identifiers or payloads, validates them, and logs its outcome.

mod calendar;
mod health;
mod holidays;
mod meal_plans;
mod reminders;

pub use calendar::*;
pub use health::*;
pub use holidays::*;
pub use meal_plans::*;
pub use reminders::*;

use hearth_domain::{HearthError, Result};

/// Trimmed `value`, or a validation error naming `field`.
pub(crate) fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HearthError::Validation(format!("{field} is required")));
    }
    Ok(trimmed)
}
