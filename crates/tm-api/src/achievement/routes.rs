use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tm_db::models::{Achievement, LeaderboardEntry, UserAchievement};
use tm_db::repositories::achievement as achievement_repo;
use tm_db::repositories::profile as profile_repo;
use tm_gamify::{Metric, TrackerStatus};
use uuid::Uuid;

use crate::{
    ApiState,
    auth::{AdminUser, AuthUser},
    error::ApiError,
    metrics::record_achievement_event,
    pagination::{PageInfo, PageQuery},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/achievements", get(list_catalog))
        .route("/achievements/user", get(list_user_trackers))
        .route("/achievements/leaderboard", get(leaderboard))
        .route("/achievements/{id}/claim", post(claim))
        .route("/admin/achievements", post(admin_create))
        .route("/admin/achievements/{id}", put(admin_update).delete(admin_delete))
}

#[derive(Deserialize)]
struct CatalogQuery {
    category: Option<String>,
    #[serde(rename = "type")]
    achievement_type: Option<String>,
    badge_level: Option<String>,
    #[serde(default)]
    include_hidden: bool,
    page: Option<i64>,
    limit: Option<i64>,
}

/// Catalog entry merged with the caller's tracker state, if any.
#[derive(Serialize)]
struct CatalogEntry {
    achievement: Achievement,
    tracker: Option<UserAchievement>,
}

async fn list_catalog(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = PageQuery::new(query.page, query.limit);
    let achievements = achievement_repo::list_active(
        &state.pool,
        query.category.as_deref(),
        query.achievement_type.as_deref(),
        query.badge_level.as_deref(),
        query.include_hidden,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = achievement_repo::count_active(
        &state.pool,
        query.category.as_deref(),
        query.achievement_type.as_deref(),
        query.badge_level.as_deref(),
        query.include_hidden,
    )
    .await?;

    let trackers = achievement_repo::list_trackers(&state.pool, auth_user.user_id, None).await?;
    let mut by_achievement: HashMap<Uuid, UserAchievement> = trackers
        .into_iter()
        .map(|t| (t.achievement_id, t))
        .collect();

    let entries: Vec<CatalogEntry> = achievements
        .into_iter()
        .map(|achievement| {
            let tracker = by_achievement.remove(&achievement.id);
            CatalogEntry { achievement, tracker }
        })
        .collect();

    Ok(Json(json!({
        "achievements": entries,
        "pagination": PageInfo::new(&page, total),
    })))
}

#[derive(Deserialize)]
struct TrackerQuery {
    status: Option<String>,
}

async fn list_user_trackers(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<TrackerQuery>,
) -> Result<Json<Value>, ApiError> {
    if let Some(status) = query.status.as_deref() {
        status
            .parse::<TrackerStatus>()
            .map_err(|_| ApiError::Validation(format!("Unknown tracker status: '{status}'")))?;
    }

    let trackers =
        achievement_repo::list_trackers(&state.pool, auth_user.user_id, query.status.as_deref())
            .await?;

    let count_with = |s: TrackerStatus| {
        trackers
            .iter()
            .filter(|t| t.status() == Some(s))
            .count()
    };
    let summary = json!({
        "total": trackers.len(),
        "in_progress": count_with(TrackerStatus::InProgress),
        "unlocked": count_with(TrackerStatus::Unlocked),
        "claimed": count_with(TrackerStatus::Claimed),
    });

    Ok(Json(json!({ "achievements": trackers, "summary": summary })))
}

#[derive(Serialize)]
struct ClaimResponse {
    tracker: UserAchievement,
    points_awarded: i64,
    xp_awarded: i64,
}

/// Claim an unlocked achievement. The status transition is a single guarded
/// update; the reward credit and the catalog counter bump are best-effort
/// side effects that never fail an already-committed claim.
async fn claim(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(achievement_id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let achievement = achievement_repo::get(&state.pool, achievement_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Achievement not found".to_string()))?;

    let claimed =
        achievement_repo::claim_tracker(&state.pool, auth_user.user_id, achievement_id).await?;

    let Some(tracker) = claimed else {
        // Zero rows updated: distinguish a missing tracker from a bad state.
        return match achievement_repo::get_tracker(&state.pool, auth_user.user_id, achievement_id)
            .await?
        {
            None => Err(ApiError::NotFound(
                "No progress towards this achievement".to_string(),
            )),
            Some(t) => Err(ApiError::InvalidState(format!(
                "Achievement cannot be claimed from status '{}'",
                t.status
            ))),
        };
    };

    record_achievement_event("claim");

    if let Err(err) = profile_repo::credit_rewards(
        &state.pool,
        auth_user.user_id,
        achievement.points,
        achievement.xp_reward,
    )
    .await
    {
        tracing::warn!(user_id = %auth_user.user_id, "Failed to credit claim rewards: {err}");
    }
    if let Err(err) = achievement_repo::increment_total_earned(&state.pool, achievement_id).await {
        tracing::warn!(achievement_id = %achievement_id, "Failed to bump total_earned: {err}");
    }

    Ok(Json(ClaimResponse {
        tracker,
        points_awarded: achievement.points,
        xp_awarded: achievement.xp_reward,
    }))
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    timeframe: Option<String>,
    limit: Option<i64>,
}

async fn leaderboard(
    State(state): State<ApiState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let since = match query.timeframe.as_deref().unwrap_or("all") {
        "all" => None,
        "weekly" => Some(Utc::now() - Duration::days(7)),
        "monthly" => Some(Utc::now() - Duration::days(30)),
        other => {
            return Err(ApiError::Validation(format!(
                "Unknown timeframe: '{other}' (expected all, weekly or monthly)"
            )));
        }
    };
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let entries = achievement_repo::leaderboard(&state.pool, since, limit).await?;
    Ok(Json(entries))
}

#[derive(Deserialize)]
struct CreateAchievement {
    name: String,
    description: String,
    #[serde(rename = "type")]
    achievement_type: String,
    category: String,
    metric: String,
    threshold: i64,
    unit: Option<String>,
    points: i64,
    xp_reward: Option<i64>,
    badge_level: Option<String>,
    #[serde(default)]
    is_hidden: bool,
    #[serde(default)]
    is_secret: bool,
    #[serde(default)]
    prerequisites: Vec<Uuid>,
}

async fn admin_create(
    _admin: AdminUser,
    State(state): State<ApiState>,
    Json(payload): Json<CreateAchievement>,
) -> Result<(StatusCode, Json<Achievement>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name cannot be empty".to_string()));
    }
    payload
        .metric
        .parse::<Metric>()
        .map_err(|_| ApiError::Validation(format!("Unknown metric: '{}'", payload.metric)))?;
    if payload.threshold <= 0 {
        return Err(ApiError::Validation(
            "Threshold must be positive".to_string(),
        ));
    }

    let new = achievement_repo::NewAchievement {
        name: payload.name,
        description: payload.description,
        achievement_type: payload.achievement_type,
        category: payload.category,
        metric: payload.metric,
        threshold: payload.threshold,
        unit: payload.unit.unwrap_or_else(|| "count".to_string()),
        points: payload.points,
        xp_reward: payload.xp_reward.unwrap_or(0),
        badge_level: payload.badge_level.unwrap_or_else(|| "bronze".to_string()),
        is_hidden: payload.is_hidden,
        is_secret: payload.is_secret,
        prerequisites: payload.prerequisites,
    };

    let achievement = achievement_repo::create(&state.pool, &new).await?;
    Ok((StatusCode::CREATED, Json(achievement)))
}

#[derive(Deserialize)]
struct UpdateAchievement {
    description: Option<String>,
    threshold: Option<i64>,
    points: Option<i64>,
    xp_reward: Option<i64>,
    badge_level: Option<String>,
    is_hidden: Option<bool>,
    is_secret: Option<bool>,
    is_active: Option<bool>,
}

async fn admin_update(
    _admin: AdminUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAchievement>,
) -> Result<Json<Achievement>, ApiError> {
    if let Some(threshold) = payload.threshold {
        if threshold <= 0 {
            return Err(ApiError::Validation(
                "Threshold must be positive".to_string(),
            ));
        }
    }

    let patch = achievement_repo::AchievementPatch {
        description: payload.description,
        threshold: payload.threshold,
        points: payload.points,
        xp_reward: payload.xp_reward,
        badge_level: payload.badge_level,
        is_hidden: payload.is_hidden,
        is_secret: payload.is_secret,
        is_active: payload.is_active,
    };

    achievement_repo::update(&state.pool, id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Achievement not found".to_string()))
}

/// Soft delete: the achievement is deactivated, never removed, so existing
/// trackers keep their join target.
async fn admin_delete(
    _admin: AdminUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deactivated = achievement_repo::deactivate(&state.pool, id).await?;
    if !deactivated {
        return Err(ApiError::NotFound("Achievement not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
