//! Meal plan commands

use chrono::{NaiveDate, Utc};
use hearth_domain::constants::MEAL_PREFETCH_DAYS;
use hearth_domain::{HearthError, MealOverrideInput, MealPlanPayload, Result, UserMealOverride};

use super::required;
use crate::utils::command_helpers::execute_command;
use crate::AppContext;

const DEFAULT_UPCOMING_DAYS: u32 = 7;

/// `YYYY-MM-DD`, or today (UTC) when absent.
fn parse_day(date: Option<&str>) -> Result<NaiveDate> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| HearthError::Validation(format!("date must be YYYY-MM-DD, got {raw:?}"))),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Plan for one day. An explicit `holiday_id` takes precedence over the
/// user's country calendar.
pub async fn get_daily_meal_plan(
    ctx: &AppContext,
    user_id: &str,
    date: Option<&str>,
    holiday_id: Option<&str>,
) -> Result<MealPlanPayload> {
    execute_command("meal_plans::get_daily_meal_plan", || async {
        let user_id = required("userId", user_id)?;
        let day = parse_day(date)?;
        ctx.meal_plans.daily_plan(user_id, day, holiday_id).await
    })
    .await
}

/// Plans starting today; `days` defaults to a week and is clamped to 1..=30.
pub async fn list_upcoming_meal_plans(
    ctx: &AppContext,
    user_id: &str,
    days: Option<u32>,
) -> Result<Vec<MealPlanPayload>> {
    execute_command("meal_plans::list_upcoming_meal_plans", || async {
        let user_id = required("userId", user_id)?;
        ctx.meal_plans.list_upcoming(user_id, days.unwrap_or(DEFAULT_UPCOMING_DAYS)).await
    })
    .await
}

pub async fn save_meal_override(
    ctx: &AppContext,
    user_id: &str,
    date_key: &str,
    input: MealOverrideInput,
) -> Result<UserMealOverride> {
    execute_command("meal_plans::save_meal_override", || async {
        let user_id = required("userId", user_id)?;
        ctx.meal_plans.save_override(user_id, date_key.trim(), input).await
    })
    .await
}

/// Warm the template cache for the coming week; returns days generated.
pub async fn prefetch_meal_plans(ctx: &AppContext, user_id: &str) -> Result<usize> {
    execute_command("meal_plans::prefetch_meal_plans", || async {
        ctx.meal_plans.prefetch_for_user(required("userId", user_id)?, MEAL_PREFETCH_DAYS).await
    })
    .await
}
