use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::decision::Decision;
use crate::nutrition::tags::{GuidelineRatios, NutrientSnapshot, NutritionTag};

/// Meal creation payload. The nutrient snapshot and the analyzer verdicts
/// come pre-computed from the external vision model; this service never
/// invokes it.
#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub eaten_at: OffsetDateTime,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub nutrition: Option<NutrientSnapshot>,
    #[serde(default)]
    pub is_balanced: Option<bool>,
    /// LOW / MEDIUM / HIGH, as delivered by the analyzer.
    #[serde(default)]
    pub risk_level: Option<String>,
}

/// Synchronous part of the upload response: the stored record, the per-meal
/// verdict, and the handles to poll the derived analyses with.
#[derive(Debug, Serialize)]
pub struct CreatedMealResponse {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub tags: Vec<NutritionTag>,
    pub decision: Decision,
    /// Task-type code -> task handle.
    pub tasks: HashMap<&'static str, Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MealListItem {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub eaten_at: OffsetDateTime,
    pub source_type: String,
    pub note: Option<String>,
    pub risk_level: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct MealDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub eaten_at: OffsetDateTime,
    pub source_type: String,
    pub note: Option<String>,
    pub is_balanced: Option<bool>,
    pub risk_level: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub nutrition: Option<NutrientSnapshot>,
    /// Meal-vs-daily-guideline ratios, when nutrition is known.
    pub guideline_ratios: Option<GuidelineRatios>,
    pub tags: Vec<NutritionTag>,
}

#[derive(Debug, Deserialize)]
pub struct DailyCaloriesQuery {
    pub user_id: Uuid,
    /// ISO date (YYYY-MM-DD); defaults to six days before `end_date`.
    #[serde(default)]
    pub start_date: Option<String>,
    /// ISO date (YYYY-MM-DD); defaults to today (UTC).
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DailyCalories {
    pub date: String,
    pub calories: f64,
}

/// Calorie totals for every day in the requested range, zero-filled for
/// days without meals so charts render a contiguous series.
#[derive(Debug, Serialize)]
pub struct DailyCaloriesResponse {
    pub user_id: Uuid,
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DailyCalories>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: Uuid,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
