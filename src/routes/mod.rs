mod health;
mod practice;
mod risk;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .route("/api/practice/answer", post(practice::submit_answer))
        .route("/api/risk/compute", post(risk::compute))
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}
