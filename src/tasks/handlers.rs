use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

use super::store::TaskRecord;

/// GET /tasks/:id -- poll one task by its handle. Clients poll this until
/// the task turns COMPLETED (result set) or FAILED (error_message set).
#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskRecord>, ApiError> {
    state
        .tasks
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("task not found or expired".into()))
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    /// Comma-separated task ids.
    pub ids: String,
}

/// GET /tasks/batch?ids=a,b,c -- poll several tasks at once. Unknown or
/// malformed ids are skipped silently; callers diff against what they asked
/// for.
#[instrument(skip(state))]
pub async fn get_tasks_batch(
    State(state): State<AppState>,
    Query(q): Query<BatchQuery>,
) -> Json<Vec<TaskRecord>> {
    let tasks: Vec<TaskRecord> = q
        .ids
        .split(',')
        .filter_map(|raw| raw.trim().parse::<Uuid>().ok())
        .filter_map(|id| state.tasks.get(id))
        .collect();

    tracing::debug!(requested = q.ids.split(',').count(), returned = tasks.len(), "batch poll");
    Json(tasks)
}
