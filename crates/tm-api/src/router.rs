use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};

use crate::{achievement, analytics, comment, profile, progress, state::ApiState, view};

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .merge(progress::routes())
        .merge(profile::routes())
        .merge(achievement::routes())
        .merge(comment::routes())
        .merge(view::routes())
        .merge(analytics::routes())
        .fallback(handler_404)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        "The requested resource was not found",
    )
}
