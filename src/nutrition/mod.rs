pub mod decision;
mod handlers;
pub mod stress;
pub mod tags;
pub mod targets;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health/stress-score", get(handlers::get_stress_score))
}
