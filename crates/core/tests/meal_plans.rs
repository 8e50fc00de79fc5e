//! Meal plan resolution, overrides and prefetch.

mod support;

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use hearth_core::MealPlanService;
use hearth_domain::{
    CoursePayload, HearthError, Holiday, MealOverrideInput, MealPlanSource, MealPlanType,
};
use support::meals::{recipe, MockHolidayRepository, MockMealPlanRepository, MockRecipeSource};
use support::users::MockUserDirectory;

struct Fixture {
    plans: MockMealPlanRepository,
    users: MockUserDirectory,
    recipes: Arc<MockRecipeSource>,
    service: MealPlanService,
}

fn fixture(recipes: MockRecipeSource, holidays: MockHolidayRepository) -> Fixture {
    let plans = MockMealPlanRepository::new();
    let users = MockUserDirectory::new().with_locale("u1", "en-GB");
    let recipes = Arc::new(recipes);
    let service = MealPlanService::new(
        Arc::new(plans.clone()),
        Arc::new(holidays),
        Arc::new(users.clone()),
        recipes.clone(),
    );
    Fixture { plans, users, recipes, service }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, d).unwrap()
}

fn christmas(country: &str) -> Holiday {
    Holiday {
        id: "hol-xmas".into(),
        country_code: country.into(),
        date: Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap(),
        name: "Christmas Day".into(),
        holiday_type: Some("National holiday".into()),
        raw_payload: None,
    }
}

#[tokio::test]
async fn template_is_generated_once_and_reused() {
    let f = fixture(MockRecipeSource::new(), MockHolidayRepository::new());

    let first = f.service.get_plan("u1", day(3), None).await.unwrap();
    let second = f.service.get_plan("u2", day(3), None).await.unwrap();

    assert_eq!(f.recipes.generate_calls(), vec![2000]);
    assert_eq!(f.plans.templates().len(), 1);
    assert_eq!(first.source, MealPlanSource::Template);
    assert_eq!(first.courses, second.courses);
    assert_eq!(first.date_key, "2024-12-03");
    assert!(!first.is_holiday);
    assert_eq!(first.courses["breakfast"][0].id, 11);
    assert_eq!(first.courses["dinner"][0].id, 33);
    assert!(first.courses["snacks"].is_empty());
    assert_eq!(first.calories, Some(1995.0));
    let macros = first.macros.unwrap();
    assert_eq!(macros["protein"], 90.0);
    assert_eq!(macros["carbohydrates"], 0.0);
}

#[tokio::test]
async fn holiday_plan_gets_dessert_and_bonus_calories() {
    let recipes = MockRecipeSource { dessert: Some(recipe(99, "Yule Log")), ..Default::default() };
    let f = fixture(recipes, MockHolidayRepository::new());
    let holiday = christmas("GB");

    let plan = f.service.get_plan("u1", day(25), Some(&holiday)).await.unwrap();

    assert_eq!(f.recipes.generate_calls(), vec![2300]);
    assert!(plan.is_holiday);
    assert_eq!(plan.holiday.as_ref().map(|h| h.name.as_str()), Some("Christmas Day"));
    assert_eq!(plan.courses["dessert"][0].title, "Yule Log");
    assert_eq!(f.plans.templates()[0].plan_type, MealPlanType::Holiday);
}

#[tokio::test]
async fn holiday_without_random_recipe_uses_fruit_plate() {
    let f = fixture(MockRecipeSource::new(), MockHolidayRepository::new());
    let plan = f.service.get_plan("u1", day(25), Some(&christmas("GB"))).await.unwrap();

    let dessert = &plan.courses["dessert"][0];
    assert_eq!(dessert.id, 0);
    assert_eq!(dessert.title, "Seasonal Fruit Plate");
    assert_eq!(dessert.nutrients.as_ref().unwrap()["calories"], 230.0);
}

#[tokio::test]
async fn override_wins_over_existing_template() {
    let f = fixture(MockRecipeSource::new(), MockHolidayRepository::new());
    f.service.get_plan("u1", day(5), None).await.unwrap();

    f.service
        .save_override(
            "u1",
            "2024-12-05",
            MealOverrideInput {
                holiday_id: None,
                courses: CoursePayload::Flat(vec![recipe(7, "Leftovers")]),
                calories: Some(1500.0),
                macros: None,
                notes: Some("clear the fridge".into()),
            },
        )
        .await
        .unwrap();

    let plan = f.service.get_plan("u1", day(5), None).await.unwrap();
    assert_eq!(plan.source, MealPlanSource::Override);
    assert_eq!(plan.courses["custom"][0].title, "Leftovers");
    assert_eq!(plan.calories, Some(1500.0));

    let other_user = f.service.get_plan("u2", day(5), None).await.unwrap();
    assert_eq!(other_user.source, MealPlanSource::Template);
}

#[tokio::test]
async fn saving_override_twice_updates_in_place() {
    let f = fixture(MockRecipeSource::new(), MockHolidayRepository::new());
    let input = |title: &str, notes: Option<&str>| MealOverrideInput {
        holiday_id: None,
        courses: CoursePayload::Flat(vec![recipe(1, title)]),
        calories: None,
        macros: None,
        notes: notes.map(str::to_string),
    };

    f.service.save_override("u1", "2024-12-06", input("Soup", Some("light"))).await.unwrap();
    let updated =
        f.service.save_override("u1", "2024-12-06", input("Stew", None)).await.unwrap();

    assert_eq!(f.plans.overrides().len(), 1);
    assert_eq!(updated.courses["custom"][0].title, "Stew");
    assert_eq!(updated.notes.as_deref(), Some("light"));
}

#[tokio::test]
async fn override_with_bad_date_key_is_rejected() {
    let f = fixture(MockRecipeSource::new(), MockHolidayRepository::new());
    let err = f
        .service
        .save_override(
            "u1",
            "12/06/2024",
            MealOverrideInput {
                holiday_id: None,
                courses: CoursePayload::Flat(Vec::new()),
                calories: None,
                macros: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HearthError::Validation(_)));
}

#[tokio::test]
async fn upcoming_days_are_clamped() {
    let f = fixture(MockRecipeSource::new(), MockHolidayRepository::new());

    let many = f.service.list_upcoming_from("u1", day(1), 40).await.unwrap();
    assert_eq!(many.len(), 30);
    assert_eq!(many[0].date_key, "2024-12-01");
    assert_eq!(many[29].date_key, "2024-12-30");

    let none = f.service.list_upcoming_from("u1", day(1), 0).await.unwrap();
    assert_eq!(none.len(), 1);
}

#[tokio::test]
async fn holiday_lookup_uses_locale_region() {
    let holidays = MockHolidayRepository::new().with_holiday(christmas("GB"));
    let f = fixture(MockRecipeSource::new(), holidays);

    let found = f.service.find_holiday_for_date("u1", day(25)).await.unwrap();
    assert_eq!(found.map(|h| h.id), Some("hol-xmas".to_string()));

    // u2 has no preferences and resolves to US
    assert!(f.service.find_holiday_for_date("u2", day(25)).await.unwrap().is_none());
    assert!(f.service.find_holiday_for_date("u1", day(24)).await.unwrap().is_none());
}

#[tokio::test]
async fn daily_plan_prefers_explicit_holiday_id() {
    let holidays = MockHolidayRepository::new().with_holiday(christmas("US"));
    let f = fixture(MockRecipeSource::new(), holidays);

    let explicit = f.service.daily_plan("u1", day(2), Some("hol-xmas")).await.unwrap();
    assert!(explicit.is_holiday);

    let unknown = f.service.daily_plan("u1", day(2), Some("hol-missing")).await.unwrap();
    assert!(!unknown.is_holiday);
}

#[tokio::test]
async fn upcoming_resolves_holidays_per_day() {
    let start = Utc::now().date_naive();
    let holiday = Holiday {
        date: Utc.from_utc_datetime(&(start + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap()),
        ..christmas("GB")
    };
    let f = fixture(MockRecipeSource::new(), MockHolidayRepository::new().with_holiday(holiday));

    let plans = f.service.list_upcoming("u1", 3).await.unwrap();
    let flags: Vec<bool> = plans.iter().map(|p| p.is_holiday).collect();
    assert_eq!(flags, vec![false, true, false]);
}

#[tokio::test]
async fn generation_errors_propagate() {
    let f = fixture(MockRecipeSource::failing(), MockHolidayRepository::new());
    let err = f.service.get_plan("u1", day(8), None).await.unwrap_err();
    assert!(matches!(err, HearthError::ConfigurationMissing(_)));
    assert!(f.plans.templates().is_empty());
}

#[tokio::test]
async fn prefetch_warms_every_user_and_creates_preferences() {
    let f = fixture(MockRecipeSource::new(), MockHolidayRepository::new());
    let users = f.users.clone().with_user("u2");

    let summary = f.service.prefetch_all_users(7).await.unwrap();
    assert_eq!(summary.targets, 2);
    assert_eq!(summary.failures, 0);
    assert!(users.has_preferences("u2"));
    assert_eq!(f.plans.templates().len(), 7);
}
