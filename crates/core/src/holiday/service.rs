//! Holiday sync service

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use hearth_domain::{Holiday, HolidayUpsert, Result};
use tracing::{info, instrument, warn};

use super::ports::{FetchedHoliday, HolidayRepository, HolidaySource};
use crate::calendar::ports::CalendarEventRepository;
use crate::sweep::SweepSummary;
use crate::user::ports::UserDirectory;
use crate::user::resolve_country;

/// Fetches a country's holidays for a year and mirrors them as calendar
/// events for one user.
pub struct HolidaySyncService {
    holidays: Arc<dyn HolidayRepository>,
    events: Arc<dyn CalendarEventRepository>,
    users: Arc<dyn UserDirectory>,
    source: Arc<dyn HolidaySource>,
}

impl HolidaySyncService {
    pub fn new(
        holidays: Arc<dyn HolidayRepository>,
        events: Arc<dyn CalendarEventRepository>,
        users: Arc<dyn UserDirectory>,
        source: Arc<dyn HolidaySource>,
    ) -> Self {
        Self { holidays, events, users, source }
    }

    /// Upsert `year`'s holidays for the user's country, then replace the
    /// user's holiday events for that year in one transaction.
    #[instrument(skip(self))]
    pub async fn sync_holidays_for_user(&self, user_id: &str, year: i32) -> Result<Vec<Holiday>> {
        let country = resolve_country(self.users.as_ref(), user_id).await?;
        let fetched = self.source.fetch_holidays(&country, year).await?;

        let mut stored = Vec::with_capacity(fetched.len());
        for holiday in fetched {
            let Some(upsert) = normalize(&country, year, holiday) else {
                continue;
            };
            stored.push(self.holidays.upsert(upsert).await?);
        }

        let (from, to) = year_bounds(year);
        let inserted =
            self.events.replace_holiday_events(user_id, from, to, stored.clone()).await?;

        info!(%country, year, holidays = stored.len(), events = inserted, "Holidays synced");
        Ok(stored)
    }

    /// Daily sweep: every user, each year in `years`. Failures are logged.
    pub async fn sync_all_users(&self, years: &[i32]) -> Result<SweepSummary> {
        let user_ids = self.users.list_user_ids().await?;
        let mut summary = SweepSummary::default();

        for user_id in &user_ids {
            for &year in years {
                match self.sync_holidays_for_user(user_id, year).await {
                    Ok(_) => summary.record(true),
                    Err(err) => {
                        warn!(user_id = %user_id, year, error = %err, "Holiday sync failed");
                        summary.record(false);
                    }
                }
            }
        }

        Ok(summary)
    }
}

/// Start of the UTC calendar day of `date_iso`, or January 1st of `year`
/// when no date was supplied. Date-times are converted to UTC first.
pub fn holiday_day_start(date_iso: Option<&str>, year: i32) -> Option<DateTime<Utc>> {
    let date = match date_iso.map(str::trim).filter(|s| !s.is_empty()) {
        None => NaiveDate::from_ymd_opt(year, 1, 1)?,
        Some(iso) => match DateTime::parse_from_rfc3339(iso) {
            Ok(dt) => dt.with_timezone(&Utc).date_naive(),
            Err(_) => parse_naive_day(iso)?,
        },
    };
    date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt))
}

fn parse_naive_day(iso: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d").ok().or_else(|| {
        chrono::NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S").ok().map(|dt| dt.date())
    })
}

fn normalize(country: &str, year: i32, holiday: FetchedHoliday) -> Option<HolidayUpsert> {
    if holiday.name.trim().is_empty() {
        warn!(year, "Skipping holiday without a name");
        return None;
    }
    let Some(date) = holiday_day_start(holiday.date_iso.as_deref(), year) else {
        warn!(name = %holiday.name, date = ?holiday.date_iso, "Skipping holiday with bad date");
        return None;
    };
    Some(HolidayUpsert {
        country_code: country.to_string(),
        date,
        name: holiday.name,
        holiday_type: holiday.primary_type,
        raw_payload: holiday.raw,
    })
}

fn year_bounds(year: i32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = holiday_day_start(None, year).unwrap_or_else(Utc::now);
    let end = holiday_day_start(None, year + 1).unwrap_or(start + Duration::days(366));
    (start, end)
}
