use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Comment, CommentStats, CommentWithContent, ModerationLogEntry};

const COMMENT_COLUMNS: &str = "id, content_id, author_name, author_email, body, status, moderated_by, moderation_notes, created_at, updated_at";

/// New comments always start out pending moderation.
pub async fn insert<'e, E>(
    executor: E,
    content_id: Uuid,
    author_name: &str,
    author_email: &str,
    body: &str,
) -> Result<Comment, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            INSERT INTO comments (content_id, author_name, author_email, body)
            VALUES ($1, $2, lower($3), $4)
            RETURNING {COMMENT_COLUMNS}
        "#,
    ))
    .bind(content_id)
    .bind(author_name)
    .bind(author_email)
    .bind(body)
    .fetch_one(executor)
    .await
}

/// Comments submitted by one email address since `since`, for the
/// rate-limit spam check.
pub async fn count_recent_by_email<'e, E>(
    executor: E,
    email: &str,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM comments
            WHERE author_email = lower($1) AND created_at >= $2
        "#,
    )
    .bind(email)
    .bind(since)
    .fetch_one(executor)
    .await
}

/// Public listing: approved comments only.
pub async fn list_approved<'e, E>(
    executor: E,
    content_id: Uuid,
) -> Result<Vec<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE content_id = $1 AND status = 'approved'
            ORDER BY created_at DESC
        "#,
    ))
    .bind(content_id)
    .fetch_all(executor)
    .await
}

pub async fn get<'e, E>(executor: E, id: Uuid) -> Result<Option<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Moderation queue: comments joined with their parent content, filtered by
/// status and an optional search over author, body and content title.
pub async fn list_admin<'e, E>(
    executor: E,
    status: Option<&str>,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<CommentWithContent>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT cm.id, cm.content_id, c.title AS content_title, c.slug AS content_slug,
                   cm.author_name, cm.author_email, cm.body, cm.status, cm.created_at
            FROM comments cm
            JOIN contents c ON c.id = cm.content_id
            WHERE ($1::text IS NULL OR cm.status = $1)
              AND ($2::text IS NULL
                   OR cm.author_name ILIKE '%' || $2 || '%'
                   OR cm.author_email ILIKE '%' || $2 || '%'
                   OR cm.body ILIKE '%' || $2 || '%'
                   OR c.title ILIKE '%' || $2 || '%')
            ORDER BY cm.created_at DESC
            LIMIT $3 OFFSET $4
        "#,
    )
    .bind(status)
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_admin<'e, E>(
    executor: E,
    status: Option<&str>,
    search: Option<&str>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM comments cm
            JOIN contents c ON c.id = cm.content_id
            WHERE ($1::text IS NULL OR cm.status = $1)
              AND ($2::text IS NULL
                   OR cm.author_name ILIKE '%' || $2 || '%'
                   OR cm.author_email ILIKE '%' || $2 || '%'
                   OR cm.body ILIKE '%' || $2 || '%'
                   OR c.title ILIKE '%' || $2 || '%')
        "#,
    )
    .bind(status)
    .bind(search)
    .fetch_one(executor)
    .await
}

pub async fn stats<'e, E>(executor: E) -> Result<CommentStats, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                   COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                   COUNT(*) FILTER (WHERE status = 'rejected') AS rejected,
                   COUNT(*) FILTER (WHERE created_at >= NOW() - INTERVAL '7 days') AS recent
            FROM comments
        "#,
    )
    .fetch_one(executor)
    .await
}

/// Apply a moderation decision to one comment. The caller appends to the
/// moderation log in the same transaction.
pub async fn moderate<'e, E>(
    executor: E,
    id: Uuid,
    status: &str,
    moderator_id: Uuid,
    notes: Option<&str>,
) -> Result<Option<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            UPDATE comments
            SET status = $2,
                moderated_by = $3,
                moderation_notes = COALESCE($4, moderation_notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(status)
    .bind(moderator_id)
    .bind(notes)
    .fetch_optional(executor)
    .await
}

/// Append-only moderation history entry.
pub async fn append_log<'e, E>(
    executor: E,
    comment_id: Uuid,
    action: &str,
    moderator_id: Uuid,
    notes: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO comment_moderation_log (comment_id, action, moderator_id, notes)
            VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(comment_id)
    .bind(action)
    .bind(moderator_id)
    .bind(notes)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn moderation_history<'e, E>(
    executor: E,
    comment_id: Uuid,
) -> Result<Vec<ModerationLogEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, comment_id, action, moderator_id, notes, created_at
            FROM comment_moderation_log
            WHERE comment_id = $1
            ORDER BY created_at
        "#,
    )
    .bind(comment_id)
    .fetch_all(executor)
    .await
}

/// Apply one moderation decision to many comments at once. Returns the
/// number of comments actually updated.
pub async fn bulk_moderate<'e, E>(
    executor: E,
    ids: &[Uuid],
    status: &str,
    moderator_id: Uuid,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE comments
            SET status = $2,
                moderated_by = $3,
                updated_at = NOW()
            WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .bind(status)
    .bind(moderator_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Log entries for a bulk decision, one per affected comment.
pub async fn bulk_append_log<'e, E>(
    executor: E,
    ids: &[Uuid],
    action: &str,
    moderator_id: Uuid,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO comment_moderation_log (comment_id, action, moderator_id, notes)
            SELECT id, $2, $3, 'bulk moderation'
            FROM comments
            WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .bind(action)
    .bind(moderator_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM comments
            WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
