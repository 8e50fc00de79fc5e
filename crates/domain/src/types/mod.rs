//! Domain types and models

pub mod calendar;
pub mod holiday;
pub mod meal_plan;
pub mod reminder;
pub mod user;

pub use calendar::{
    CalendarAccount, CalendarAccountUpsert, CalendarEvent, CalendarProvider, CredentialUpdate,
    EventSource, NormalizedEvent, RefreshedCredentials,
};
pub use holiday::{Holiday, HolidaySummary, HolidayUpsert};
pub use meal_plan::{
    CourseMap, CoursePayload, MacroBreakdown, MealItem, MealOverrideInput, MealPlanPayload,
    MealPlanSource, MealPlanTemplate, MealPlanType, NewMealPlanTemplate, UserMealOverride,
};
pub use reminder::{DueReminder, NotificationJob, NotificationStatus};
pub use user::UserPreferences;
