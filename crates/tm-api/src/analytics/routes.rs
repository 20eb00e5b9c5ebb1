use axum::{Json, Router, extract::State, routing::get};
use tm_db::models::PlatformTotals;
use tm_db::repositories::content as content_repo;

use crate::{ApiState, auth::AdminUser, error::ApiError};

pub fn routes() -> Router<ApiState> {
    Router::new().route("/admin/analytics/overview", get(overview))
}

async fn overview(
    _admin: AdminUser,
    State(state): State<ApiState>,
) -> Result<Json<PlatformTotals>, ApiError> {
    let totals = content_repo::platform_totals(&state.pool).await?;
    Ok(Json(totals))
}
