use axum::extract::{Path, State};
use axum::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::nutrition::targets;
use crate::state::AppState;

use super::dto::{ProfileRequest, ProfileResponse};
use super::repo;

/// PUT /users/:id/profile -- store the profile and the daily nutrition
/// targets derived from it.
#[instrument(skip(state, body))]
pub async fn put_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let derived = targets::calculate(
        body.gender.as_deref(),
        body.birth_year,
        body.height_cm,
        body.weight_kg,
        body.activity_level.as_deref(),
        body.health_goal.as_deref(),
    );

    let profile = repo::upsert(
        &state.db,
        id,
        body.gender.as_deref(),
        body.birth_year,
        body.height_cm,
        body.weight_kg,
        body.activity_level.as_deref(),
        body.health_goal.as_deref(),
        &derived,
    )
    .await?;

    Ok(Json(ProfileResponse::from_row(profile, Some(derived))))
}

/// GET /users/:id/profile
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let derived = targets::calculate(
        profile.gender.as_deref(),
        profile.birth_year,
        profile.height_cm,
        profile.weight_kg,
        profile.activity_level.as_deref(),
        profile.health_goal.as_deref(),
    );

    Ok(Json(ProfileResponse::from_row(profile, Some(derived))))
}
