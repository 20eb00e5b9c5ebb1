use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use tm_db::models::Profile;
use tm_db::repositories::profile as profile_repo;

use crate::{ApiState, auth::AuthUser, error::ApiError, profile::service};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/profile/stats", get(get_stats))
        .route("/profile/stats/recompute", post(recompute_stats))
}

/// Stats are created lazily: a user who has never been recomputed gets a
/// fresh recompute instead of a 404.
async fn get_stats(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Profile>, ApiError> {
    match profile_repo::get(&state.pool, auth_user.user_id).await? {
        Some(profile) => Ok(Json(profile)),
        None => {
            let profile = service::recompute_stats(&state.pool, auth_user.user_id).await?;
            Ok(Json(profile))
        }
    }
}

async fn recompute_stats(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Profile>, ApiError> {
    let profile = service::recompute_stats(&state.pool, auth_user.user_id).await?;
    Ok(Json(profile))
}
