//! Meal plan resolution: override, cached template, or a generated plan

pub mod generator;
pub mod ports;
pub mod service;

pub use generator::{date_key, target_calories};
pub use service::MealPlanService;
