//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! application.

// Calendar sync window (days relative to UTC start of today)
pub const CALENDAR_SYNC_LOOKBACK_DAYS: i64 = 7;
pub const CALENDAR_SYNC_LOOKAHEAD_DAYS: i64 = 60;
pub const GOOGLE_EVENTS_PAGE_SIZE: u32 = 2500;
/// Refresh Google credentials this many seconds before they expire.
pub const GOOGLE_TOKEN_REFRESH_LEEWAY_SECS: i64 = 60;

pub const GOOGLE_OAUTH_SCOPES: [&str; 4] =
    ["https://www.googleapis.com/auth/calendar.readonly", "openid", "email", "profile"];

pub const ICLOUD_CALDAV_ENDPOINT: &str = "https://caldav.icloud.com";
pub const APPLE_ACCOUNT_LABEL: &str = "Apple Calendar";

// Meal planning
pub const DEFAULT_DAILY_CALORIES: u32 = 2000;
pub const HOLIDAY_CALORIE_BONUS: u32 = 300;
/// Share of the day's calories given to the placeholder dessert.
pub const HOLIDAY_DESSERT_CALORIE_SHARE: f64 = 0.1;
pub const MEAL_PLAN_MIN_DAYS: u32 = 1;
pub const MEAL_PLAN_MAX_DAYS: u32 = 30;
pub const MEAL_PREFETCH_DAYS: u32 = 7;
pub const CUSTOM_COURSE: &str = "custom";

// Holidays
pub const DEFAULT_COUNTRY_CODE: &str = "US";
pub const HOLIDAY_EVENT_DESCRIPTION: &str = "Holiday from Calendarific";

// Reminders / notifications
pub const REMINDER_SCAN_WINDOW_SECS: i64 = 60;
pub const REMINDER_FALLBACK_BODY: &str = "Reminder";
pub const NOTIFICATION_MAX_ATTEMPTS: i64 = 3;
