use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{NoteWithContent, ProgressBookmark, ProgressNote, ProgressRecord, ProgressTotals};

const RECORD_COLUMNS: &str = "id, user_id, content_id, progress, last_position_secs, last_viewed_at, completed_at, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct StartRow {
    id: Uuid,
    user_id: Uuid,
    content_id: Uuid,
    progress: f64,
    last_position_secs: i32,
    last_viewed_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    inserted: bool,
}

/// Atomically create a progress record for (user, content), or refresh the
/// last-viewed timestamp if one already exists. Returns the record and
/// whether it was freshly created, so concurrent first-start requests
/// collapse into a single row instead of racing an existence check.
pub async fn start_or_resume<'e, E>(
    executor: E,
    user_id: Uuid,
    content_id: Uuid,
) -> Result<(ProgressRecord, bool), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let row: StartRow = sqlx::query_as(
        // language=PostgreSQL
        // xmax = 0 holds only for rows created by this statement.
        r#"
            INSERT INTO user_progress (user_id, content_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, content_id)
            DO UPDATE SET last_viewed_at = NOW(), updated_at = NOW()
            RETURNING id, user_id, content_id, progress, last_position_secs,
                      last_viewed_at, completed_at, created_at, updated_at,
                      (xmax = 0) AS inserted
        "#,
    )
    .bind(user_id)
    .bind(content_id)
    .fetch_one(executor)
    .await?;

    let inserted = row.inserted;
    Ok((
        ProgressRecord {
            id: row.id,
            user_id: row.user_id,
            content_id: row.content_id,
            progress: row.progress,
            last_position_secs: row.last_position_secs,
            last_viewed_at: row.last_viewed_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
        inserted,
    ))
}

pub async fn get<'e, E>(
    executor: E,
    user_id: Uuid,
    content_id: Uuid,
) -> Result<Option<ProgressRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {RECORD_COLUMNS}
            FROM user_progress
            WHERE user_id = $1 AND content_id = $2
        "#,
    ))
    .bind(user_id)
    .bind(content_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<ProgressRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {RECORD_COLUMNS}
            FROM user_progress
            WHERE user_id = $1
            ORDER BY last_viewed_at DESC
        "#,
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Partial update: only the supplied fields change, the last-viewed timestamp
/// always refreshes, and reaching 100% stamps the completion time once.
/// Returns `None` when no record exists (the tutorial was never started).
pub async fn update<'e, E>(
    executor: E,
    user_id: Uuid,
    content_id: Uuid,
    percentage: Option<f64>,
    last_position_secs: Option<i32>,
) -> Result<Option<ProgressRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            UPDATE user_progress
            SET progress = COALESCE($3, progress),
                last_position_secs = COALESCE($4, last_position_secs),
                last_viewed_at = NOW(),
                completed_at = CASE
                    WHEN COALESCE($3, progress) >= 100 THEN COALESCE(completed_at, NOW())
                    ELSE completed_at
                END,
                updated_at = NOW()
            WHERE user_id = $1 AND content_id = $2
            RETURNING {RECORD_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(content_id)
    .bind(percentage)
    .bind(last_position_secs)
    .fetch_optional(executor)
    .await
}

/// Force the record to 100% and stamp the completion time. Idempotent: a
/// record that is already complete keeps its original completion timestamp.
pub async fn complete<'e, E>(
    executor: E,
    user_id: Uuid,
    content_id: Uuid,
) -> Result<Option<ProgressRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            UPDATE user_progress
            SET progress = 100,
                completed_at = COALESCE(completed_at, NOW()),
                last_viewed_at = NOW(),
                updated_at = NOW()
            WHERE user_id = $1 AND content_id = $2
            RETURNING {RECORD_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(content_id)
    .fetch_optional(executor)
    .await
}

/// Aggregate a user's records into the inputs of a stats recompute.
pub async fn totals<'e, E>(executor: E, user_id: Uuid) -> Result<ProgressTotals, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                COUNT(*) FILTER (WHERE progress >= 100) AS tutorials_completed,
                COUNT(*) FILTER (WHERE progress > 0 AND progress < 100) AS tutorials_in_progress,
                COALESCE(SUM(last_position_secs), 0)::bigint AS seconds_watched,
                MAX(last_viewed_at) AS last_active_at
            FROM user_progress
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Distinct UTC days on which the user touched any tutorial, for streak
/// computation.
pub async fn activity_days<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<NaiveDate>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT DISTINCT (last_viewed_at AT TIME ZONE 'UTC')::date AS activity_day
            FROM user_progress
            WHERE user_id = $1
            ORDER BY activity_day
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn add_note<'e, E>(
    executor: E,
    progress_id: Uuid,
    body: &str,
    video_timestamp_secs: i32,
) -> Result<ProgressNote, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO progress_notes (progress_id, body, video_timestamp_secs)
            VALUES ($1, $2, $3)
            RETURNING id, progress_id, body, video_timestamp_secs, created_at, updated_at
        "#,
    )
    .bind(progress_id)
    .bind(body)
    .bind(video_timestamp_secs)
    .fetch_one(executor)
    .await
}

pub async fn get_note<'e, E>(
    executor: E,
    progress_id: Uuid,
    note_id: Uuid,
) -> Result<Option<ProgressNote>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, progress_id, body, video_timestamp_secs, created_at, updated_at
            FROM progress_notes
            WHERE id = $1 AND progress_id = $2
        "#,
    )
    .bind(note_id)
    .bind(progress_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_notes<'e, E>(
    executor: E,
    progress_id: Uuid,
) -> Result<Vec<ProgressNote>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, progress_id, body, video_timestamp_secs, created_at, updated_at
            FROM progress_notes
            WHERE progress_id = $1
            ORDER BY created_at
        "#,
    )
    .bind(progress_id)
    .fetch_all(executor)
    .await
}

pub async fn update_note<'e, E>(
    executor: E,
    progress_id: Uuid,
    note_id: Uuid,
    body: Option<&str>,
    video_timestamp_secs: Option<i32>,
) -> Result<Option<ProgressNote>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE progress_notes
            SET body = COALESCE($3, body),
                video_timestamp_secs = COALESCE($4, video_timestamp_secs),
                updated_at = NOW()
            WHERE id = $1 AND progress_id = $2
            RETURNING id, progress_id, body, video_timestamp_secs, created_at, updated_at
        "#,
    )
    .bind(note_id)
    .bind(progress_id)
    .bind(body)
    .bind(video_timestamp_secs)
    .fetch_optional(executor)
    .await
}

/// Delete a note scoped to its progress record. Returns false when the note
/// id does not exist in that record's list.
pub async fn delete_note<'e, E>(
    executor: E,
    progress_id: Uuid,
    note_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM progress_notes
            WHERE id = $1 AND progress_id = $2
        "#,
    )
    .bind(note_id)
    .bind(progress_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Flatten notes across all of a user's progress records, newest first,
/// optionally filtered by a body substring and a created-at range.
pub async fn list_notes_across<'e, E>(
    executor: E,
    user_id: Uuid,
    query: Option<&str>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    limit: i64,
    offset: i64,
) -> Result<Vec<NoteWithContent>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT n.id, p.content_id, c.title AS content_title, n.body,
                   n.video_timestamp_secs, n.created_at, n.updated_at
            FROM progress_notes n
            JOIN user_progress p ON p.id = n.progress_id
            JOIN contents c ON c.id = p.content_id
            WHERE p.user_id = $1
              AND ($2::text IS NULL OR n.body ILIKE '%' || $2 || '%')
              AND ($3::timestamptz IS NULL OR n.created_at >= $3)
              AND ($4::timestamptz IS NULL OR n.created_at <= $4)
            ORDER BY n.created_at DESC
            LIMIT $5 OFFSET $6
        "#,
    )
    .bind(user_id)
    .bind(query)
    .bind(from)
    .bind(to)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_notes_across<'e, E>(
    executor: E,
    user_id: Uuid,
    query: Option<&str>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM progress_notes n
            JOIN user_progress p ON p.id = n.progress_id
            WHERE p.user_id = $1
              AND ($2::text IS NULL OR n.body ILIKE '%' || $2 || '%')
              AND ($3::timestamptz IS NULL OR n.created_at >= $3)
              AND ($4::timestamptz IS NULL OR n.created_at <= $4)
        "#,
    )
    .bind(user_id)
    .bind(query)
    .bind(from)
    .bind(to)
    .fetch_one(executor)
    .await
}

pub async fn add_bookmark<'e, E>(
    executor: E,
    progress_id: Uuid,
    timestamp_secs: i32,
    note: Option<&str>,
) -> Result<ProgressBookmark, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO progress_bookmarks (progress_id, timestamp_secs, note)
            VALUES ($1, $2, $3)
            RETURNING id, progress_id, timestamp_secs, note, created_at
        "#,
    )
    .bind(progress_id)
    .bind(timestamp_secs)
    .bind(note)
    .fetch_one(executor)
    .await
}

pub async fn list_bookmarks<'e, E>(
    executor: E,
    progress_id: Uuid,
) -> Result<Vec<ProgressBookmark>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, progress_id, timestamp_secs, note, created_at
            FROM progress_bookmarks
            WHERE progress_id = $1
            ORDER BY timestamp_secs
        "#,
    )
    .bind(progress_id)
    .fetch_all(executor)
    .await
}

pub async fn delete_bookmark<'e, E>(
    executor: E,
    progress_id: Uuid,
    bookmark_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM progress_bookmarks
            WHERE id = $1 AND progress_id = $2
        "#,
    )
    .bind(bookmark_id)
    .bind(progress_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
