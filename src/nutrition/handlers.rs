use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

use super::stress;

#[derive(Debug, Deserialize)]
pub struct StressScoreQuery {
    pub user_id: Uuid,
    /// ISO date (YYYY-MM-DD); defaults to today (UTC).
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StressScoreResponse {
    pub user_id: Uuid,
    pub date: String,
    pub score: i32,
}

const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// GET /health/stress-score?user_id&date -- recompute and persist the
/// daily stress score for the given day.
#[instrument(skip(state))]
pub async fn get_stress_score(
    State(state): State<AppState>,
    Query(q): Query<StressScoreQuery>,
) -> Result<Json<StressScoreResponse>, ApiError> {
    let date = match &q.date {
        Some(raw) => Date::parse(raw, DATE_FORMAT)
            .map_err(|_| ApiError::BadRequest(format!("invalid date: {raw}")))?,
        None => OffsetDateTime::now_utc().date(),
    };

    let score = stress::calculate_daily_score(&state.db, q.user_id, date).await?;

    Ok(Json(StressScoreResponse {
        user_id: q.user_id,
        date: date
            .format(DATE_FORMAT)
            .map_err(|e| ApiError::Internal(e.into()))?,
        score,
    }))
}
