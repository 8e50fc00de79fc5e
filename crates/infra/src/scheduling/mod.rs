//! Cron-based background jobs
//!
//! - Calendar sweep (hourly)
//! - Holiday sync (nightly, current and next year)
//! - Meal plan prefetch (daily)
//! - Reminder scan (every minute)
//!
//! The scheduler has explicit start/stop, tracked join handles, a
//! cancellation token and timeouts around every asynchronous step.

pub mod cron_scheduler;
pub mod error;
pub mod jobs;

pub use cron_scheduler::{CronScheduler, CronSchedulerConfig, ScheduledTask};
pub use error::{SchedulerError, SchedulerResult};
pub use jobs::{
    build_job_scheduler, CalendarSweepTask, HolidaySyncTask, JobServices, MealPrefetchTask,
    ReminderScanTask,
};
