//! Meal plan templates, overrides and the resolved payload
//!
//! Course maps are stored as JSON text; the explicit [`MealItem`] record is
//! what the store boundary validates against.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use super::holiday::HolidaySummary;
use crate::constants::CUSTOM_COURSE;
use crate::impl_domain_status_conversions;

/// One dish in a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct MealItem {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_in_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrients: Option<BTreeMap<String, f64>>,
}

/// `{ courseName: MealItem[] }`
pub type CourseMap = BTreeMap<String, Vec<MealItem>>;

/// Nutrient name to amount (grams for macros).
pub type MacroBreakdown = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum MealPlanType {
    Standard,
    Holiday,
}

impl_domain_status_conversions!(MealPlanType {
    Standard => "standard",
    Holiday => "holiday",
});

/// Where a resolved plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum MealPlanSource {
    Template,
    Override,
}

/// Shared plan for a `(date_key, plan_type)` pair. Never regenerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanTemplate {
    pub id: String,
    pub date_key: String,
    pub plan_type: MealPlanType,
    pub calories: Option<f64>,
    pub macros: Option<MacroBreakdown>,
    pub courses: CourseMap,
    pub created_at: DateTime<Utc>,
}

/// Template contents produced by plan generation, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMealPlanTemplate {
    pub date_key: String,
    pub plan_type: MealPlanType,
    pub calories: f64,
    pub macros: MacroBreakdown,
    pub courses: CourseMap,
}

/// User-specific replacement for `(user_id, date_key, holiday_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct UserMealOverride {
    pub id: String,
    pub user_id: String,
    pub date_key: String,
    pub holiday_id: Option<String>,
    pub courses: CourseMap,
    pub calories: Option<f64>,
    pub macros: Option<MacroBreakdown>,
    pub notes: Option<String>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

/// Courses as submitted by a caller: either a flat list or a course map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoursePayload {
    Flat(Vec<MealItem>),
    Map(CourseMap),
}

impl CoursePayload {
    /// A flat list becomes the single `custom` course.
    pub fn normalize(self) -> CourseMap {
        match self {
            Self::Flat(items) => {
                let mut map = CourseMap::new();
                map.insert(CUSTOM_COURSE.to_string(), items);
                map
            }
            Self::Map(map) => map,
        }
    }
}

/// Input for saving an override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealOverrideInput {
    #[serde(default)]
    pub holiday_id: Option<String>,
    pub courses: CoursePayload,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub macros: Option<MacroBreakdown>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The plan returned to callers for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct MealPlanPayload {
    pub date_key: String,
    pub is_holiday: bool,
    pub holiday: Option<HolidaySummary>,
    pub calories: Option<f64>,
    pub macros: Option<MacroBreakdown>,
    pub courses: CourseMap,
    pub source: MealPlanSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, title: &str) -> MealItem {
        MealItem {
            id,
            title: title.into(),
            ready_in_minutes: None,
            servings: None,
            image: None,
            source_url: None,
            summary: None,
            nutrients: None,
        }
    }

    #[test]
    fn flat_course_list_becomes_custom_course() {
        let payload: CoursePayload =
            serde_json::from_str(r#"[{"id": 1, "title": "Porridge"}]"#).unwrap();
        let map = payload.normalize();
        assert_eq!(map.len(), 1);
        assert_eq!(map["custom"], vec![item(1, "Porridge")]);
    }

    #[test]
    fn course_map_is_kept_as_is() {
        let payload: CoursePayload = serde_json::from_str(
            r#"{"lunch": [{"id": 2, "title": "Soup", "readyInMinutes": 20}], "dinner": []}"#,
        )
        .unwrap();
        let map = payload.normalize();
        assert_eq!(map["lunch"][0].ready_in_minutes, Some(20));
        assert!(map["dinner"].is_empty());
    }

    #[test]
    fn meal_item_serializes_camel_case_without_nulls() {
        let mut dish = item(7, "Pie");
        dish.source_url = Some("https://example.com/pie".into());
        let json = serde_json::to_value(&dish).unwrap();
        assert_eq!(json["sourceUrl"], "https://example.com/pie");
        assert!(json.get("servings").is_none());
    }
}
