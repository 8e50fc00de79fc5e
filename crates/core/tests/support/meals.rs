use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{
    FetchedHoliday, GeneratedDay, HolidayRepository, HolidaySource, MealPlanRepository,
    OverrideUpsert, RecipeSource,
};
use hearth_domain::{
    HearthError, Holiday, HolidayUpsert, MealItem, MealPlanTemplate, MealPlanType,
    NewMealPlanTemplate, Result as DomainResult, UserMealOverride,
};

/// In-memory templates and overrides.
#[derive(Default, Clone)]
pub struct MockMealPlanRepository {
    templates: Arc<Mutex<Vec<MealPlanTemplate>>>,
    overrides: Arc<Mutex<Vec<UserMealOverride>>>,
}

impl MockMealPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn templates(&self) -> Vec<MealPlanTemplate> {
        self.templates.lock().unwrap().clone()
    }

    pub fn overrides(&self) -> Vec<UserMealOverride> {
        self.overrides.lock().unwrap().clone()
    }
}

#[async_trait]
impl MealPlanRepository for MockMealPlanRepository {
    async fn find_latest_override(
        &self,
        user_id: &str,
        date_key: &str,
        holiday_id: Option<&str>,
    ) -> DomainResult<Option<UserMealOverride>> {
        Ok(self
            .overrides
            .lock()
            .unwrap()
            .iter()
            .filter(|o| {
                o.user_id == user_id
                    && o.date_key == date_key
                    && o.holiday_id.as_deref() == holiday_id
            })
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn upsert_override(
        &self,
        user_id: &str,
        date_key: &str,
        data: OverrideUpsert,
    ) -> DomainResult<UserMealOverride> {
        let mut overrides = self.overrides.lock().unwrap();
        let now = Utc::now();

        if let Some(existing) = overrides.iter_mut().find(|o| {
            o.user_id == user_id && o.date_key == date_key && o.holiday_id == data.holiday_id
        }) {
            existing.courses = data.courses;
            if data.calories.is_some() {
                existing.calories = data.calories;
            }
            if data.macros.is_some() {
                existing.macros = data.macros;
            }
            if data.notes.is_some() {
                existing.notes = data.notes;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let stored = UserMealOverride {
            id: format!("ovr-{}", overrides.len() + 1),
            user_id: user_id.to_string(),
            date_key: date_key.to_string(),
            holiday_id: data.holiday_id,
            courses: data.courses,
            calories: data.calories,
            macros: data.macros,
            notes: data.notes,
            created_at: now,
            updated_at: now,
        };
        overrides.push(stored.clone());
        Ok(stored)
    }

    async fn find_template(
        &self,
        date_key: &str,
        plan_type: MealPlanType,
    ) -> DomainResult<Option<MealPlanTemplate>> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.date_key == date_key && t.plan_type == plan_type)
            .cloned())
    }

    async fn insert_template(
        &self,
        template: NewMealPlanTemplate,
    ) -> DomainResult<MealPlanTemplate> {
        let mut templates = self.templates.lock().unwrap();
        if let Some(existing) = templates
            .iter()
            .find(|t| t.date_key == template.date_key && t.plan_type == template.plan_type)
        {
            return Ok(existing.clone());
        }
        let stored = MealPlanTemplate {
            id: format!("tpl-{}", templates.len() + 1),
            date_key: template.date_key,
            plan_type: template.plan_type,
            calories: Some(template.calories),
            macros: Some(template.macros),
            courses: template.courses,
            created_at: Utc::now(),
        };
        templates.push(stored.clone());
        Ok(stored)
    }
}

/// Recipe API double that hands out sequential recipe ids.
#[derive(Default)]
pub struct MockRecipeSource {
    pub generate_calls: Mutex<Vec<u32>>,
    pub dessert: Option<MealItem>,
    pub fail: bool,
}

impl MockRecipeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn generate_calls(&self) -> Vec<u32> {
        self.generate_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecipeSource for MockRecipeSource {
    async fn generate_day(&self, target_calories: u32) -> DomainResult<GeneratedDay> {
        if self.fail {
            return Err(HearthError::ConfigurationMissing("SPOONACULAR_API_KEY".into()));
        }
        self.generate_calls.lock().unwrap().push(target_calories);
        let mut nutrients = BTreeMap::new();
        nutrients.insert("calories".to_string(), f64::from(target_calories) - 5.0);
        nutrients.insert("protein".to_string(), 90.0);
        nutrients.insert("fat".to_string(), 70.0);
        Ok(GeneratedDay { meal_ids: vec![11, 22, 33], nutrients })
    }

    async fn recipe_information(&self, recipe_id: i64) -> DomainResult<MealItem> {
        Ok(recipe(recipe_id, &format!("Recipe {recipe_id}")))
    }

    async fn random_recipe(&self, _tags: &[&str]) -> DomainResult<Option<MealItem>> {
        Ok(self.dessert.clone())
    }
}

pub fn recipe(id: i64, title: &str) -> MealItem {
    MealItem {
        id,
        title: title.to_string(),
        ready_in_minutes: Some(20),
        servings: Some(2),
        image: None,
        source_url: None,
        summary: None,
        nutrients: None,
    }
}

/// In-memory holiday table keyed by `(country_code, date, name)`.
#[derive(Default, Clone)]
pub struct MockHolidayRepository {
    holidays: Arc<Mutex<Vec<Holiday>>>,
}

impl MockHolidayRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holiday(self, holiday: Holiday) -> Self {
        self.holidays.lock().unwrap().push(holiday);
        self
    }

    pub fn all(&self) -> Vec<Holiday> {
        self.holidays.lock().unwrap().clone()
    }
}

#[async_trait]
impl HolidayRepository for MockHolidayRepository {
    async fn upsert(&self, data: HolidayUpsert) -> DomainResult<Holiday> {
        let mut holidays = self.holidays.lock().unwrap();
        if let Some(existing) = holidays.iter_mut().find(|h| {
            h.country_code == data.country_code && h.date == data.date && h.name == data.name
        }) {
            existing.holiday_type = data.holiday_type;
            existing.raw_payload = Some(data.raw_payload);
            return Ok(existing.clone());
        }
        let stored = Holiday {
            id: format!("hol-{}", holidays.len() + 1),
            country_code: data.country_code,
            date: data.date,
            name: data.name,
            holiday_type: data.holiday_type,
            raw_payload: Some(data.raw_payload),
        };
        holidays.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, holiday_id: &str) -> DomainResult<Option<Holiday>> {
        Ok(self.holidays.lock().unwrap().iter().find(|h| h.id == holiday_id).cloned())
    }

    async fn find_in_range(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Option<Holiday>> {
        Ok(self
            .holidays
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.country_code == country_code && h.date >= from && h.date < to)
            .cloned())
    }
}

/// Holiday API double keyed by `(country, year)`; records each request.
#[derive(Default)]
pub struct MockHolidaySource {
    responses: Mutex<BTreeMap<(String, i32), Vec<FetchedHoliday>>>,
    pub requests: Mutex<Vec<(String, i32)>>,
}

impl MockHolidaySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays(self, country: &str, year: i32, holidays: Vec<FetchedHoliday>) -> Self {
        self.responses.lock().unwrap().insert((country.to_string(), year), holidays);
        self
    }

    pub fn requests(&self) -> Vec<(String, i32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HolidaySource for MockHolidaySource {
    async fn fetch_holidays(
        &self,
        country_code: &str,
        year: i32,
    ) -> DomainResult<Vec<FetchedHoliday>> {
        self.requests.lock().unwrap().push((country_code.to_string(), year));
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&(country_code.to_string(), year))
            .cloned()
            .unwrap_or_default())
    }
}

pub fn fetched(name: &str, date_iso: Option<&str>) -> FetchedHoliday {
    FetchedHoliday {
        name: name.to_string(),
        date_iso: date_iso.map(str::to_string),
        primary_type: Some("National holiday".to_string()),
        raw: serde_json::json!({ "name": name }),
    }
}
