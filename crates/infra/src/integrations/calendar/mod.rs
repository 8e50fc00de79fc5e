//! Calendar provider integrations
//!
//! - Google: OAuth code exchange, token refresh and Calendar v3 event paging
//! - Apple: iCloud CalDAV discovery and calendar-object fetches

pub mod apple;
pub mod caldav;
pub mod google;

pub use apple::AppleCalendarAdapter;
pub use caldav::{CalDavClient, CalendarObject, DavCalendar, DavCredentials};
pub use google::{GoogleCalendarClient, GoogleEndpoints};
