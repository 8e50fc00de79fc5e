//! Template generation from the recipe API

use std::collections::BTreeMap;

use chrono::NaiveDate;
use hearth_domain::constants::{
    DEFAULT_DAILY_CALORIES, HOLIDAY_CALORIE_BONUS, HOLIDAY_DESSERT_CALORIE_SHARE,
};
use hearth_domain::{CourseMap, MacroBreakdown, MealItem, MealPlanType, NewMealPlanTemplate, Result};
use tracing::debug;

use super::ports::RecipeSource;

const MAIN_COURSES: [&str; 3] = ["breakfast", "lunch", "dinner"];
const MACRO_NUTRIENTS: [&str; 3] = ["protein", "fat", "carbohydrates"];
const HOLIDAY_DESSERT_TAGS: [&str; 2] = ["dessert", "holiday"];

/// Canonical `YYYY-MM-DD` key
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn target_calories(plan_type: MealPlanType) -> u32 {
    match plan_type {
        MealPlanType::Standard => DEFAULT_DAILY_CALORIES,
        MealPlanType::Holiday => DEFAULT_DAILY_CALORIES + HOLIDAY_CALORIE_BONUS,
    }
}

/// Build a fresh template: one generated meal per main course, an empty
/// snack list, and a dessert on holidays that have a dinner.
pub async fn generate_template(
    recipes: &dyn RecipeSource,
    date_key: &str,
    plan_type: MealPlanType,
) -> Result<NewMealPlanTemplate> {
    let target = target_calories(plan_type);
    let day = recipes.generate_day(target).await?;

    let mut meals = Vec::with_capacity(day.meal_ids.len());
    for id in &day.meal_ids {
        meals.push(recipes.recipe_information(*id).await?);
    }
    debug!(date_key, %plan_type, meals = meals.len(), "Generated meal plan day");

    let mut courses = CourseMap::new();
    let mut meals = meals.into_iter();
    for course in MAIN_COURSES {
        courses.insert(course.to_string(), meals.next().into_iter().collect());
    }
    courses.insert("snacks".to_string(), Vec::new());

    let has_dinner = courses.get("dinner").is_some_and(|d| !d.is_empty());
    if plan_type == MealPlanType::Holiday && has_dinner {
        let dessert = match recipes.random_recipe(&HOLIDAY_DESSERT_TAGS).await? {
            Some(recipe) => recipe,
            None => fallback_dessert(target),
        };
        courses.insert("dessert".to_string(), vec![dessert]);
    }

    let calories = day.nutrients.get("calories").copied().unwrap_or(f64::from(target));
    let macros: MacroBreakdown = MACRO_NUTRIENTS
        .iter()
        .map(|name| ((*name).to_string(), day.nutrients.get(*name).copied().unwrap_or(0.0)))
        .collect();

    Ok(NewMealPlanTemplate { date_key: date_key.to_string(), plan_type, calories, macros, courses })
}

fn fallback_dessert(target: u32) -> MealItem {
    let mut nutrients = BTreeMap::new();
    nutrients.insert(
        "calories".to_string(),
        (f64::from(target) * HOLIDAY_DESSERT_CALORIE_SHARE).round(),
    );
    MealItem {
        id: 0,
        title: "Seasonal Fruit Plate".to_string(),
        ready_in_minutes: None,
        servings: None,
        image: None,
        source_url: None,
        summary: Some("Light dessert of seasonal fruits with yogurt dip.".to_string()),
        nutrients: Some(nutrients),
    }
}
