//! Meal plan resolver

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use hearth_domain::constants::{MEAL_PLAN_MAX_DAYS, MEAL_PLAN_MIN_DAYS};
use hearth_domain::{
    HearthError, Holiday, MealOverrideInput, MealPlanPayload, MealPlanSource, MealPlanType,
    Result, UserMealOverride, UserPreferences,
};
use tracing::{debug, info, instrument, warn};

use super::generator::{date_key, generate_template};
use super::ports::{MealPlanRepository, OverrideUpsert, RecipeSource};
use crate::holiday::ports::HolidayRepository;
use crate::sweep::SweepSummary;
use crate::user::ports::UserDirectory;
use crate::user::resolve_country;

/// Resolves a user's plan for a day: override, then cached template, then a
/// freshly generated template.
pub struct MealPlanService {
    plans: Arc<dyn MealPlanRepository>,
    holidays: Arc<dyn HolidayRepository>,
    users: Arc<dyn UserDirectory>,
    recipes: Arc<dyn RecipeSource>,
}

impl MealPlanService {
    pub fn new(
        plans: Arc<dyn MealPlanRepository>,
        holidays: Arc<dyn HolidayRepository>,
        users: Arc<dyn UserDirectory>,
        recipes: Arc<dyn RecipeSource>,
    ) -> Self {
        Self { plans, holidays, users, recipes }
    }

    #[instrument(skip(self, holiday), fields(holiday_id = holiday.map(|h| h.id.as_str())))]
    pub async fn get_plan(
        &self,
        user_id: &str,
        date: NaiveDate,
        holiday: Option<&Holiday>,
    ) -> Result<MealPlanPayload> {
        let key = date_key(date);
        let holiday_summary = holiday.map(Holiday::summary);
        let is_holiday = holiday.is_some();

        if let Some(found) = self
            .plans
            .find_latest_override(user_id, &key, holiday.map(|h| h.id.as_str()))
            .await?
        {
            debug!(date_key = %key, "Using user override");
            return Ok(MealPlanPayload {
                date_key: key,
                is_holiday,
                holiday: holiday_summary,
                calories: found.calories,
                macros: found.macros,
                courses: found.courses,
                source: MealPlanSource::Override,
            });
        }

        let plan_type = if is_holiday { MealPlanType::Holiday } else { MealPlanType::Standard };
        let template = match self.plans.find_template(&key, plan_type).await? {
            Some(template) => template,
            None => {
                debug!(date_key = %key, %plan_type, "No cached template, generating");
                let generated = generate_template(self.recipes.as_ref(), &key, plan_type).await?;
                self.plans.insert_template(generated).await?
            }
        };

        Ok(MealPlanPayload {
            date_key: key,
            is_holiday,
            holiday: holiday_summary,
            calories: template.calories,
            macros: template.macros,
            courses: template.courses,
            source: MealPlanSource::Template,
        })
    }

    /// Plan for one day as requested by a caller.
    ///
    /// An explicit `holiday_id` is looked up directly (unknown ids mean no
    /// holiday); otherwise the user's country calendar decides.
    pub async fn daily_plan(
        &self,
        user_id: &str,
        date: NaiveDate,
        holiday_id: Option<&str>,
    ) -> Result<MealPlanPayload> {
        let holiday = match holiday_id.filter(|id| !id.is_empty()) {
            Some(id) => self.holidays.find_by_id(id).await?,
            None => self.find_holiday_for_date(user_id, date).await?,
        };
        self.get_plan(user_id, date, holiday.as_ref()).await
    }

    #[instrument(skip(self, input))]
    pub async fn save_override(
        &self,
        user_id: &str,
        date_key: &str,
        input: MealOverrideInput,
    ) -> Result<UserMealOverride> {
        if NaiveDate::parse_from_str(date_key, "%Y-%m-%d").is_err() {
            return Err(HearthError::Validation(format!(
                "dateKey must be YYYY-MM-DD, got {date_key:?}"
            )));
        }

        let data = OverrideUpsert {
            holiday_id: input.holiday_id.filter(|id| !id.is_empty()),
            courses: input.courses.normalize(),
            calories: input.calories,
            macros: input.macros,
            notes: input.notes,
        };
        self.plans.upsert_override(user_id, date_key, data).await
    }

    /// Plans for `days` consecutive days from today (UTC), clamped to 1..=30.
    pub async fn list_upcoming(&self, user_id: &str, days: u32) -> Result<Vec<MealPlanPayload>> {
        self.list_upcoming_from(user_id, Utc::now().date_naive(), days).await
    }

    pub async fn list_upcoming_from(
        &self,
        user_id: &str,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<MealPlanPayload>> {
        let days = days.clamp(MEAL_PLAN_MIN_DAYS, MEAL_PLAN_MAX_DAYS);
        let mut plans = Vec::with_capacity(days as usize);

        for offset in 0..days {
            let date = start + Duration::days(i64::from(offset));
            let holiday = self.find_holiday_for_date(user_id, date).await?;
            plans.push(self.get_plan(user_id, date, holiday.as_ref()).await?);
        }

        Ok(plans)
    }

    /// First holiday of the user's country on `date` (UTC day).
    pub async fn find_holiday_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Holiday>> {
        let country = resolve_country(self.users.as_ref(), user_id).await?;
        let from = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .ok_or_else(|| HearthError::Internal(format!("invalid day {date}")))?;
        self.holidays.find_in_range(&country, from, from + Duration::days(1)).await
    }

    pub async fn ensure_preferences(&self, user_id: &str) -> Result<UserPreferences> {
        self.users.ensure_preferences(user_id).await
    }

    /// Warm the template cache for one user's next `days` days.
    pub async fn prefetch_for_user(&self, user_id: &str, days: u32) -> Result<usize> {
        self.ensure_preferences(user_id).await?;
        let start = Utc::now().date_naive();
        let mut warmed = 0;
        for offset in 0..days {
            let date = start + Duration::days(i64::from(offset));
            let holiday = self.find_holiday_for_date(user_id, date).await?;
            self.get_plan(user_id, date, holiday.as_ref()).await?;
            warmed += 1;
        }
        Ok(warmed)
    }

    /// Prefetch for every user; one user's failure does not stop the rest.
    pub async fn prefetch_all_users(&self, days: u32) -> Result<SweepSummary> {
        let user_ids = self.users.list_user_ids().await?;
        let mut summary = SweepSummary::default();

        for user_id in &user_ids {
            match self.prefetch_for_user(user_id, days).await {
                Ok(_) => summary.record(true),
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "Meal plan prefetch failed for user");
                    summary.record(false);
                }
            }
        }

        info!(users = summary.targets, failures = summary.failures, "Meal plan prefetch finished");
        Ok(summary)
    }
}
