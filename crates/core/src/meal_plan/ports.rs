//! Port interfaces for meal planning

use std::collections::BTreeMap;

use async_trait::async_trait;
use hearth_domain::{
    CourseMap, MacroBreakdown, MealItem, MealPlanTemplate, MealPlanType, NewMealPlanTemplate,
    Result, UserMealOverride,
};

/// Values written when saving an override.
///
/// `None` optional fields leave stored values untouched on update.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideUpsert {
    pub holiday_id: Option<String>,
    pub courses: CourseMap,
    pub calories: Option<f64>,
    pub macros: Option<MacroBreakdown>,
    pub notes: Option<String>,
}

/// Persistence for templates and overrides
#[async_trait]
pub trait MealPlanRepository: Send + Sync {
    /// Most recently created override for the key
    async fn find_latest_override(
        &self,
        user_id: &str,
        date_key: &str,
        holiday_id: Option<&str>,
    ) -> Result<Option<UserMealOverride>>;

    async fn upsert_override(
        &self,
        user_id: &str,
        date_key: &str,
        data: OverrideUpsert,
    ) -> Result<UserMealOverride>;

    async fn find_template(
        &self,
        date_key: &str,
        plan_type: MealPlanType,
    ) -> Result<Option<MealPlanTemplate>>;

    /// Insert unless a template for the key already exists, then return the
    /// stored one. Concurrent first inserts converge on a single row.
    async fn insert_template(&self, template: NewMealPlanTemplate) -> Result<MealPlanTemplate>;
}

/// Output of the day planner endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedDay {
    pub meal_ids: Vec<i64>,
    pub nutrients: BTreeMap<String, f64>,
}

/// Recipe and meal planner API
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn generate_day(&self, target_calories: u32) -> Result<GeneratedDay>;

    /// Full recipe details including a `name -> amount` nutrient map
    async fn recipe_information(&self, recipe_id: i64) -> Result<MealItem>;

    /// One random recipe matching all `tags`, if any
    async fn random_recipe(&self, tags: &[&str]) -> Result<Option<MealItem>>;
}
