mod dto;
mod handlers;
mod repo;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users/:id/profile",
        get(handlers::get_profile).put(handlers::put_profile),
    )
}
