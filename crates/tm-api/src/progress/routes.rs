use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::PgPool;
use tm_db::models::{Achievement, ProgressBookmark, ProgressNote, ProgressRecord};
use tm_db::repositories::{content as content_repo, progress as progress_repo};
use tm_gamify::{ActionMetadata, Metric};
use uuid::Uuid;

use crate::{
    ApiState,
    achievement::service as achievement_service,
    auth::AuthUser,
    error::ApiError,
    pagination::{PageInfo, PageQuery},
    profile::service as profile_service,
    validation::{MAX_NOTE_LENGTH, validate_body, validate_percentage},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/progress", get(list_progress))
        .route("/progress/{content_id}/start", post(start))
        .route("/progress/{content_id}", get(get_progress).put(update))
        .route("/progress/{content_id}/complete", post(complete))
        .route("/progress/{content_id}/notes", get(list_notes).post(add_note))
        .route(
            "/progress/{content_id}/notes/{note_id}",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route("/notes", get(list_notes_across))
        .route("/progress/{content_id}/bookmarks", post(add_bookmark))
        .route(
            "/progress/{content_id}/bookmarks/{bookmark_id}",
            delete(delete_bookmark),
        )
}

/// Load the caller's record for a tutorial, or 404.
async fn require_record(
    pool: &PgPool,
    user_id: Uuid,
    content_id: Uuid,
) -> Result<ProgressRecord, ApiError> {
    progress_repo::get(pool, user_id, content_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Progress record not found".to_string()))
}

#[derive(Serialize)]
struct StartResponse {
    #[serde(flatten)]
    record: ProgressRecord,
    already_started: bool,
}

/// Idempotent start: the upsert absorbs concurrent first-start requests, so
/// a double tap from the client never creates two records.
async fn start(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    if !content_repo::exists_published(&state.pool, content_id).await? {
        return Err(ApiError::NotFound("Tutorial not found".to_string()));
    }

    let (record, inserted) =
        progress_repo::start_or_resume(&state.pool, auth_user.user_id, content_id).await?;

    profile_service::recompute_after_write(&state.pool, auth_user.user_id).await;

    let status = if inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(StartResponse {
            record,
            already_started: !inserted,
        }),
    ))
}

async fn list_progress(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Vec<ProgressRecord>>, ApiError> {
    let records = progress_repo::list_for_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(records))
}

async fn get_progress(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let record = require_record(&state.pool, auth_user.user_id, content_id).await?;
    let notes = progress_repo::list_notes(&state.pool, record.id).await?;
    let bookmarks = progress_repo::list_bookmarks(&state.pool, record.id).await?;

    Ok(Json(json!({
        "record": record,
        "notes": notes,
        "bookmarks": bookmarks,
    })))
}

#[derive(Deserialize)]
struct UpdateProgress {
    percentage: Option<f64>,
    last_position_secs: Option<i32>,
}

async fn update(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
    Json(payload): Json<UpdateProgress>,
) -> Result<Json<ProgressRecord>, ApiError> {
    if let Some(percentage) = payload.percentage {
        validate_percentage(percentage)?;
    }
    if let Some(position) = payload.last_position_secs {
        if position < 0 {
            return Err(ApiError::Validation(
                "Playback position cannot be negative".to_string(),
            ));
        }
    }

    let record = progress_repo::update(
        &state.pool,
        auth_user.user_id,
        content_id,
        payload.percentage,
        payload.last_position_secs,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Progress record not found".to_string()))?;

    profile_service::recompute_after_write(&state.pool, auth_user.user_id).await;

    Ok(Json(record))
}

#[derive(Serialize)]
struct CompleteResponse {
    #[serde(flatten)]
    record: ProgressRecord,
    newly_unlocked: Vec<Achievement>,
}

/// Force-complete a tutorial, then run achievement evaluation for the
/// completion and watch-time metrics. Re-completing keeps the original
/// completion timestamp and unlocks nothing new.
async fn complete(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let record = progress_repo::complete(&state.pool, auth_user.user_id, content_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Progress record not found".to_string()))?;

    let metadata = ActionMetadata {
        tutorial_id: Some(content_id),
        minutes: Some(i64::from(record.last_position_secs) / 60),
        ..Default::default()
    };

    let mut newly_unlocked = achievement_service::evaluate(
        &state.pool,
        auth_user.user_id,
        Metric::TutorialsCompleted,
        &metadata,
    )
    .await?;
    newly_unlocked.extend(
        achievement_service::evaluate(
            &state.pool,
            auth_user.user_id,
            Metric::TotalLearningTime,
            &metadata,
        )
        .await?,
    );

    profile_service::recompute_after_write(&state.pool, auth_user.user_id).await;

    Ok(Json(CompleteResponse {
        record,
        newly_unlocked,
    }))
}

#[derive(Deserialize)]
struct NewNote {
    body: String,
    #[serde(default)]
    video_timestamp_secs: i32,
}

async fn add_note(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
    Json(payload): Json<NewNote>,
) -> Result<(StatusCode, Json<ProgressNote>), ApiError> {
    validate_body(&payload.body, MAX_NOTE_LENGTH, "Note")?;

    let record = require_record(&state.pool, auth_user.user_id, content_id).await?;
    let note = progress_repo::add_note(
        &state.pool,
        record.id,
        payload.body.trim(),
        payload.video_timestamp_secs,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

async fn list_notes(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
) -> Result<Json<Vec<ProgressNote>>, ApiError> {
    let record = require_record(&state.pool, auth_user.user_id, content_id).await?;
    let notes = progress_repo::list_notes(&state.pool, record.id).await?;
    Ok(Json(notes))
}

async fn get_note(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path((content_id, note_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProgressNote>, ApiError> {
    let record = require_record(&state.pool, auth_user.user_id, content_id).await?;
    progress_repo::get_note(&state.pool, record.id, note_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))
}

#[derive(Deserialize)]
struct NotePatch {
    body: Option<String>,
    video_timestamp_secs: Option<i32>,
}

async fn update_note(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path((content_id, note_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<NotePatch>,
) -> Result<Json<ProgressNote>, ApiError> {
    if let Some(body) = payload.body.as_deref() {
        validate_body(body, MAX_NOTE_LENGTH, "Note")?;
    }

    let record = require_record(&state.pool, auth_user.user_id, content_id).await?;
    progress_repo::update_note(
        &state.pool,
        record.id,
        note_id,
        payload.body.as_deref().map(str::trim),
        payload.video_timestamp_secs,
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))
}

async fn delete_note(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path((content_id, note_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let record = require_record(&state.pool, auth_user.user_id, content_id).await?;
    let deleted = progress_repo::delete_note(&state.pool, record.id, note_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Note not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct NotesQuery {
    q: Option<String>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// Cross-tutorial note search, newest first.
async fn list_notes_across(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<NotesQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = PageQuery::new(query.page, query.limit);
    let notes = progress_repo::list_notes_across(
        &state.pool,
        auth_user.user_id,
        query.q.as_deref(),
        query.from,
        query.to,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = progress_repo::count_notes_across(
        &state.pool,
        auth_user.user_id,
        query.q.as_deref(),
        query.from,
        query.to,
    )
    .await?;

    Ok(Json(json!({
        "notes": notes,
        "pagination": PageInfo::new(&page, total),
    })))
}

#[derive(Deserialize)]
struct NewBookmark {
    timestamp_secs: i32,
    note: Option<String>,
}

async fn add_bookmark(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
    Json(payload): Json<NewBookmark>,
) -> Result<(StatusCode, Json<ProgressBookmark>), ApiError> {
    if payload.timestamp_secs < 0 {
        return Err(ApiError::Validation(
            "Bookmark timestamp cannot be negative".to_string(),
        ));
    }

    let record = require_record(&state.pool, auth_user.user_id, content_id).await?;
    let bookmark = progress_repo::add_bookmark(
        &state.pool,
        record.id,
        payload.timestamp_secs,
        payload.note.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn delete_bookmark(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path((content_id, bookmark_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let record = require_record(&state.pool, auth_user.user_id, content_id).await?;
    let deleted = progress_repo::delete_bookmark(&state.pool, record.id, bookmark_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Bookmark not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
