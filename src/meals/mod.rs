mod dto;
mod handlers;
pub mod repo;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meals", post(handlers::create_meal).get(handlers::list_meals))
        .route("/meals/:id", get(handlers::get_meal))
        .route("/summary/daily-calories", get(handlers::daily_calories))
}
