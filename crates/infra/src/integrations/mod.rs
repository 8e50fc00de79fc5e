//! External service integrations

pub mod calendar;
pub mod calendarific;
pub mod spoonacular;

pub use calendarific::CalendarificClient;
pub use spoonacular::SpoonacularClient;
