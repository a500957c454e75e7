use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::nutrition::decision::decide;
use crate::nutrition::tags::{guideline_ratios, meal_tags};
use crate::state::AppState;
use crate::tasks::orchestrator::MealAnalysis;

use super::dto::{
    CreateMealRequest, CreatedMealResponse, DailyCalories, DailyCaloriesQuery,
    DailyCaloriesResponse, ListQuery, MealDetails, MealListItem,
};
use super::repo;

const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Longest daily-calories range a single request may ask for.
const MAX_SUMMARY_RANGE_DAYS: i64 = 366;

/// POST /meals -- record an externally analyzed meal.
///
/// Persists the record and its nutrient snapshot, computes the inline
/// tag/decision verdict, and launches the derived-analysis tasks. The
/// response returns before any of those tasks run.
#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    Json(body): Json<CreateMealRequest>,
) -> Result<(StatusCode, HeaderMap, Json<CreatedMealResponse>), ApiError> {
    let source_type = body.source_type.as_deref().unwrap_or("API");
    let meal = repo::insert_meal(
        &state.db,
        body.user_id,
        body.eaten_at,
        source_type,
        body.note.as_deref(),
        body.is_balanced,
        body.risk_level.as_deref(),
    )
    .await?;

    if let Some(nutrition) = &body.nutrition {
        repo::insert_nutrition(&state.db, meal.id, nutrition).await?;
    }

    let ai_balanced = body.is_balanced.unwrap_or(false);
    let high_risk = body.risk_level.as_deref() == Some("HIGH");
    let tags = meal_tags(body.nutrition.as_ref(), ai_balanced, high_risk);
    let decision = decide(ai_balanced, &tags);

    let analysis = MealAnalysis {
        nutrition: body.nutrition.clone(),
        ai_balanced,
        high_risk,
    };
    let tasks = state.orchestrator.launch(&analysis, body.user_id, meal.id);

    let mut sorted_tags: Vec<_> = tags.into_iter().collect();
    sorted_tags.sort();

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/meals/{}", meal.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(CreatedMealResponse {
            id: meal.id,
            created_at: meal.created_at,
            tags: sorted_tags,
            decision,
            tasks,
        }),
    ))
}

/// GET /meals?user_id&limit&offset
#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<MealListItem>>, ApiError> {
    let meals = repo::list_by_user(&state.db, q.user_id, q.limit, q.offset).await?;
    let items = meals
        .into_iter()
        .map(|m| MealListItem {
            id: m.id,
            eaten_at: m.eaten_at,
            source_type: m.source_type,
            note: m.note,
            risk_level: m.risk_level,
            created_at: m.created_at,
        })
        .collect();
    Ok(Json(items))
}

/// GET /meals/:id -- detail with nutrition, guideline ratios, and tags.
#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MealDetails>, ApiError> {
    let (meal, nutrition) = repo::get_with_nutrition(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("meal not found".into()))?;

    let snapshot = nutrition.as_ref().map(|n| n.snapshot());
    let tags = meal_tags(
        snapshot.as_ref(),
        meal.is_balanced.unwrap_or(false),
        meal.risk_level.as_deref() == Some("HIGH"),
    );
    let mut sorted_tags: Vec<_> = tags.into_iter().collect();
    sorted_tags.sort();

    Ok(Json(MealDetails {
        id: meal.id,
        user_id: meal.user_id,
        eaten_at: meal.eaten_at,
        source_type: meal.source_type,
        note: meal.note,
        is_balanced: meal.is_balanced,
        risk_level: meal.risk_level,
        created_at: meal.created_at,
        guideline_ratios: snapshot.as_ref().map(guideline_ratios),
        nutrition: snapshot,
        tags: sorted_tags,
    }))
}

fn parse_date(raw: &str) -> Result<Date, ApiError> {
    Date::parse(raw, DATE_FORMAT).map_err(|_| ApiError::BadRequest(format!("invalid date: {raw}")))
}

/// Zero-fill the aggregated rows into one entry per day of the range, in
/// ascending date order. Rows outside the range are ignored.
fn fill_daily_series(start: Date, end: Date, rows: &[repo::DayCaloriesRow]) -> Vec<(Date, f64)> {
    let mut series = Vec::new();
    let mut day = start;
    while day <= end {
        let calories = rows
            .iter()
            .find(|r| r.day == day)
            .map(|r| r.calories)
            .unwrap_or(0.0);
        series.push((day, calories));
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    series
}

/// GET /summary/daily-calories?user_id&start_date&end_date -- per-day
/// calorie totals over a date range, defaulting to the trailing week.
#[instrument(skip(state))]
pub async fn daily_calories(
    State(state): State<AppState>,
    Query(q): Query<DailyCaloriesQuery>,
) -> Result<Json<DailyCaloriesResponse>, ApiError> {
    let end = match &q.end_date {
        Some(raw) => parse_date(raw)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let start = match &q.start_date {
        Some(raw) => parse_date(raw)?,
        None => end - time::Duration::days(6),
    };

    if start > end {
        return Err(ApiError::BadRequest("start_date is after end_date".into()));
    }
    if end - start >= time::Duration::days(MAX_SUMMARY_RANGE_DAYS) {
        return Err(ApiError::BadRequest(format!(
            "date range exceeds {MAX_SUMMARY_RANGE_DAYS} days"
        )));
    }

    let rows = repo::daily_calories(&state.db, q.user_id, start, end).await?;

    let mut days = Vec::new();
    for (day, calories) in fill_daily_series(start, end, &rows) {
        days.push(DailyCalories {
            date: day
                .format(DATE_FORMAT)
                .map_err(|e| ApiError::Internal(e.into()))?,
            calories,
        });
    }

    Ok(Json(DailyCaloriesResponse {
        user_id: q.user_id,
        start_date: start
            .format(DATE_FORMAT)
            .map_err(|e| ApiError::Internal(e.into()))?,
        end_date: end
            .format(DATE_FORMAT)
            .map_err(|e| ApiError::Internal(e.into()))?,
        days,
    }))
}
