mod handlers;
pub mod orchestrator;
pub mod store;
pub mod sweeper;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks/batch", get(handlers::get_tasks_batch))
        .route("/tasks/:id", get(handlers::get_task))
}
