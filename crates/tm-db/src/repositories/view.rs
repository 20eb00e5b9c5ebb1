use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

/// Whether a view from this IP was already recorded for this content since
/// `since` (the deduplication window).
pub async fn has_recent_view<'e, E>(
    executor: E,
    content_id: Uuid,
    ip_address: &str,
    since: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(
                SELECT 1 FROM content_views
                WHERE content_id = $1 AND ip_address = $2 AND viewed_at >= $3
            )
        "#,
    )
    .bind(content_id)
    .bind(ip_address)
    .bind(since)
    .fetch_one(executor)
    .await
}

/// Atomic counter increment; never read-modify-write in the application.
/// Returns the new count, or `None` for unknown content.
pub async fn increment_view_count<'e, E>(
    executor: E,
    content_id: Uuid,
) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            UPDATE contents
            SET view_count = view_count + 1
            WHERE id = $1
            RETURNING view_count
        "#,
    )
    .bind(content_id)
    .fetch_optional(executor)
    .await
}

pub async fn current_view_count<'e, E>(
    executor: E,
    content_id: Uuid,
) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT view_count FROM contents WHERE id = $1
        "#,
    )
    .bind(content_id)
    .fetch_optional(executor)
    .await
}

/// View-event append used for deduplication. Written fire-and-forget by the
/// caller: its failure must never fail the counter increment.
pub async fn insert_view_event<'e, E>(
    executor: E,
    content_id: Uuid,
    ip_address: &str,
    user_agent: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO content_views (content_id, ip_address, user_agent)
            VALUES ($1, $2, $3)
        "#,
    )
    .bind(content_id)
    .bind(ip_address)
    .bind(user_agent)
    .execute(executor)
    .await?;
    Ok(())
}
