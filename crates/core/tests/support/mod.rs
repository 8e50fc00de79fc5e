//! Shared test helpers for `hearth-core` integration tests.
//!
//! In-memory implementations of the core ports so service tests can focus on
//! behaviour instead of storage details.

#![allow(dead_code)]

pub mod calendar;
pub mod meals;
pub mod reminders;
pub mod users;
