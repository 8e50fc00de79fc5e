//! # Hearth Core
//!
//! Business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for storage, providers and outbound queues
//! - Calendar sync orchestration and account linking
//! - Meal plan resolution, holiday sync and reminder dispatch
//!
//! ## Architecture Principles
//! - Only depends on `hearth-common` and `hearth-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod calendar;
pub mod holiday;
pub mod meal_plan;
pub mod reminders;
pub mod sweep;
pub mod user;

// Re-export specific items to avoid ambiguity
pub use calendar::ports::{
    CalDavPrincipalResolver, CalendarAccountRepository, CalendarEventRepository,
    CalendarProviderAdapter, GoogleOAuthPort, GoogleProfile, GoogleTokens, ProviderFetch,
    SecretCipher,
};
pub use calendar::{CalendarSyncService, SyncOutcome};
pub use holiday::ports::{FetchedHoliday, HolidayRepository, HolidaySource};
pub use holiday::HolidaySyncService;
pub use meal_plan::ports::{GeneratedDay, MealPlanRepository, OverrideUpsert, RecipeSource};
pub use meal_plan::MealPlanService;
pub use reminders::ports::{DeviceRepository, NotificationQueue, ReminderRepository};
pub use reminders::{DispatchSummary, ReminderDispatcher};
pub use sweep::SweepSummary;
pub use user::ports::UserDirectory;
