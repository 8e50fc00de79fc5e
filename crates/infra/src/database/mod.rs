//! SQLite implementations of the core persistence ports

pub mod calendar_account_repository;
pub mod calendar_event_repository;
pub mod holiday_repository;
pub mod manager;
pub mod meal_plan_repository;
pub mod reminder_repository;
pub(crate) mod support;
pub mod user_repository;

pub use calendar_account_repository::SqliteCalendarAccountRepository;
pub use calendar_event_repository::SqliteCalendarEventRepository;
pub use holiday_repository::SqliteHolidayRepository;
pub use manager::DbManager;
pub use meal_plan_repository::SqliteMealPlanRepository;
pub use reminder_repository::{OutboxEntry, SqliteNotificationOutbox, SqliteReminderRepository};
pub use user_repository::SqliteUserRepository;
