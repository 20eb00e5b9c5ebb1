use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tm_db::models::{Comment, CommentStats};
use tm_db::repositories::{comment as comment_repo, content as content_repo};
use tm_gamify::{ActionMetadata, MAX_COMMENTS_PER_HOUR, Metric, contains_spam};
use uuid::Uuid;

use crate::{
    ApiState,
    achievement::service as achievement_service,
    auth::{AdminUser, AuthUser},
    error::ApiError,
    metrics::record_moderation_event,
    pagination::{PageInfo, PageQuery},
    validation::{MAX_COMMENT_LENGTH, MAX_NAME_LENGTH, validate_body, validate_email},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route(
            "/contents/{content_id}/comments",
            get(list_approved).post(submit),
        )
        .route("/admin/comments", get(admin_list))
        .route("/admin/comments/stats", get(admin_stats))
        .route("/admin/comments/bulk-moderate", post(admin_bulk_moderate))
        .route("/admin/comments/{id}/moderate", put(admin_moderate))
        .route("/admin/comments/{id}", delete(admin_delete))
}

#[derive(Deserialize)]
struct NewComment {
    author_name: String,
    author_email: String,
    body: String,
}

/// Public comment submission. Spam heuristics run before the insert: a
/// denylist phrase is a 400, more than the hourly allowance from one email
/// is a 429. Surviving comments land in the moderation queue as pending.
async fn submit(
    auth_user: Option<AuthUser>,
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
    Json(payload): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    validate_body(&payload.author_name, MAX_NAME_LENGTH, "Author name")?;
    validate_email(&payload.author_email)?;
    validate_body(&payload.body, MAX_COMMENT_LENGTH, "Comment")?;

    if contains_spam(&payload.body) {
        return Err(ApiError::Validation(
            "Comment contains disallowed content".to_string(),
        ));
    }

    if !content_repo::exists_published(&state.pool, content_id).await? {
        return Err(ApiError::NotFound("Content not found".to_string()));
    }

    let hour_ago = Utc::now() - Duration::hours(1);
    let recent =
        comment_repo::count_recent_by_email(&state.pool, &payload.author_email, hour_ago).await?;
    if recent >= MAX_COMMENTS_PER_HOUR {
        return Err(ApiError::RateLimited(
            "Too many comments submitted, please try again later".to_string(),
        ));
    }

    let comment = comment_repo::insert(
        &state.pool,
        content_id,
        payload.author_name.trim(),
        &payload.author_email,
        payload.body.trim(),
    )
    .await?;

    if let Some(user) = auth_user {
        let metadata = ActionMetadata::default();
        achievement_service::evaluate_quietly(
            &state.pool,
            user.user_id,
            Metric::CommentsPosted,
            &metadata,
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_approved(
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = comment_repo::list_approved(&state.pool, content_id).await?;
    Ok(Json(comments))
}

#[derive(Deserialize)]
struct AdminListQuery {
    status: Option<String>,
    search: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

fn validate_comment_status(status: &str) -> Result<(), ApiError> {
    match status {
        "pending" | "approved" | "rejected" => Ok(()),
        other => Err(ApiError::Validation(format!(
            "Unknown comment status: '{other}'"
        ))),
    }
}

async fn admin_list(
    _admin: AdminUser,
    State(state): State<ApiState>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Value>, ApiError> {
    if let Some(status) = query.status.as_deref() {
        validate_comment_status(status)?;
    }

    let page = PageQuery::new(query.page, query.limit);
    let comments = comment_repo::list_admin(
        &state.pool,
        query.status.as_deref(),
        query.search.as_deref(),
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = comment_repo::count_admin(
        &state.pool,
        query.status.as_deref(),
        query.search.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "comments": comments,
        "pagination": PageInfo::new(&page, total),
    })))
}

async fn admin_stats(
    _admin: AdminUser,
    State(state): State<ApiState>,
) -> Result<Json<CommentStats>, ApiError> {
    let stats = comment_repo::stats(&state.pool).await?;
    Ok(Json(stats))
}

#[derive(Deserialize)]
struct ModerateRequest {
    status: String,
    notes: Option<String>,
}

fn validate_decision(status: &str) -> Result<(), ApiError> {
    match status {
        "approved" | "rejected" => Ok(()),
        other => Err(ApiError::Validation(format!(
            "Moderation status must be approved or rejected, got '{other}'"
        ))),
    }
}

/// Single-comment moderation. The status change and its history entry
/// commit in one transaction so the log never diverges from the queue.
async fn admin_moderate(
    admin: AdminUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateRequest>,
) -> Result<Json<Value>, ApiError> {
    validate_decision(&payload.status)?;

    let mut tx = state.pool.begin().await?;

    let comment = comment_repo::moderate(
        &mut *tx,
        id,
        &payload.status,
        admin.0.user_id,
        payload.notes.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    comment_repo::append_log(
        &mut *tx,
        id,
        &payload.status,
        admin.0.user_id,
        payload.notes.as_deref(),
    )
    .await?;

    tx.commit().await?;
    record_moderation_event(&payload.status);

    let history = comment_repo::moderation_history(&state.pool, id).await?;
    Ok(Json(json!({ "comment": comment, "history": history })))
}

#[derive(Deserialize)]
struct BulkModerateRequest {
    comment_ids: Vec<Uuid>,
    status: String,
}

async fn admin_bulk_moderate(
    admin: AdminUser,
    State(state): State<ApiState>,
    Json(payload): Json<BulkModerateRequest>,
) -> Result<Json<Value>, ApiError> {
    validate_decision(&payload.status)?;
    if payload.comment_ids.is_empty() {
        return Err(ApiError::Validation(
            "No comment ids supplied".to_string(),
        ));
    }

    let mut tx = state.pool.begin().await?;

    // Log first so the entries cover exactly the rows the update touches.
    comment_repo::bulk_append_log(
        &mut *tx,
        &payload.comment_ids,
        &payload.status,
        admin.0.user_id,
    )
    .await?;
    let updated = comment_repo::bulk_moderate(
        &mut *tx,
        &payload.comment_ids,
        &payload.status,
        admin.0.user_id,
    )
    .await?;

    tx.commit().await?;
    record_moderation_event(&payload.status);

    Ok(Json(json!({ "moderated": updated })))
}

async fn admin_delete(
    _admin: AdminUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = comment_repo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
