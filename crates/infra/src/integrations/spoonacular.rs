//! Spoonacular meal planner and recipe client

use std::collections::BTreeMap;

use async_trait::async_trait;
use hearth_core::meal_plan::ports::{GeneratedDay, RecipeSource};
use hearth_domain::{HearthError, MealItem, Result, SpoonacularConfig};
use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;

use crate::http::HttpClient;

const SPOONACULAR_BASE: &str = "https://api.spoonacular.com";

pub struct SpoonacularClient {
    http: HttpClient,
    api_key: Option<String>,
    base_url: String,
}

impl SpoonacularClient {
    pub fn new(http: HttpClient, config: &SpoonacularConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            base_url: SPOONACULAR_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| HearthError::ConfigurationMissing("SPOONACULAR_API_KEY".into()))
    }
}

#[async_trait]
impl RecipeSource for SpoonacularClient {
    #[instrument(skip(self))]
    async fn generate_day(&self, target_calories: u32) -> Result<GeneratedDay> {
        let api_key = self.api_key()?;
        let request = self
            .http
            .request(Method::GET, format!("{}/mealplanner/generate", self.base_url))
            .query(&[
                ("apiKey", api_key.to_string()),
                ("timeFrame", "day".to_string()),
                ("targetCalories", target_calories.to_string()),
            ]);

        let day: GeneratedDayResponse = self.http.json(request, "Spoonacular meal plan").await?;
        Ok(GeneratedDay {
            meal_ids: day.meals.unwrap_or_default().into_iter().map(|m| m.id).collect(),
            nutrients: day.nutrients.unwrap_or_default(),
        })
    }

    async fn recipe_information(&self, recipe_id: i64) -> Result<MealItem> {
        let api_key = self.api_key()?;
        let request = self
            .http
            .request(Method::GET, format!("{}/recipes/{recipe_id}/information", self.base_url))
            .query(&[("apiKey", api_key), ("includeNutrition", "true")]);

        let recipe: RecipeResponse = self.http.json(request, "Spoonacular recipe").await?;
        let nutrients = recipe.nutrient_map().unwrap_or_default();
        Ok(recipe.into_meal(recipe_id, Some(nutrients)))
    }

    async fn random_recipe(&self, tags: &[&str]) -> Result<Option<MealItem>> {
        let api_key = self.api_key()?;
        let tags = tags.join(",");
        let request = self
            .http
            .request(Method::GET, format!("{}/recipes/random", self.base_url))
            .query(&[("apiKey", api_key), ("number", "1"), ("tags", tags.as_str())]);

        let random: RandomResponse = self.http.json(request, "Spoonacular random recipe").await?;
        Ok(random.recipes.unwrap_or_default().into_iter().next().map(|recipe| {
            let nutrients = recipe.nutrient_map();
            let id = recipe.id.unwrap_or_default();
            recipe.into_meal(id, nutrients)
        }))
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedDayResponse {
    meals: Option<Vec<GeneratedMeal>>,
    nutrients: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct GeneratedMeal {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RandomResponse {
    recipes: Option<Vec<RecipeResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeResponse {
    id: Option<i64>,
    title: Option<String>,
    ready_in_minutes: Option<u32>,
    servings: Option<u32>,
    image: Option<String>,
    source_url: Option<String>,
    summary: Option<String>,
    nutrition: Option<Nutrition>,
}

#[derive(Debug, Deserialize)]
struct Nutrition {
    #[serde(default)]
    nutrients: Vec<Nutrient>,
}

#[derive(Debug, Deserialize)]
struct Nutrient {
    name: String,
    amount: f64,
}

impl RecipeResponse {
    /// `name -> amount`, `None` when the response carried no nutrition block.
    fn nutrient_map(&self) -> Option<BTreeMap<String, f64>> {
        self.nutrition
            .as_ref()
            .map(|n| n.nutrients.iter().map(|x| (x.name.clone(), x.amount)).collect())
    }

    fn into_meal(self, id: i64, nutrients: Option<BTreeMap<String, f64>>) -> MealItem {
        MealItem {
            id,
            title: self.title.unwrap_or_default(),
            ready_in_minutes: self.ready_in_minutes,
            servings: self.servings,
            image: self.image,
            source_url: self.source_url,
            summary: self.summary,
            nutrients,
        }
    }
}
