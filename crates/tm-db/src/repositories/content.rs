use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Content, PlatformTotals};

pub async fn get<'e, E>(executor: E, id: Uuid) -> Result<Option<Content>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, content_type, title, slug, duration_secs, view_count, is_published, created_at
            FROM contents
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Existence check used before creating progress records; only published
/// content can be started.
pub async fn exists_published<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(
                SELECT 1 FROM contents WHERE id = $1 AND is_published = true
            )
        "#,
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

/// Platform-wide counters for the admin analytics overview.
pub async fn platform_totals<'e, E>(executor: E) -> Result<PlatformTotals, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM contents) AS total_contents,
                (SELECT COUNT(*) FROM contents WHERE is_published = true) AS published_contents,
                (SELECT COUNT(*) FROM contents WHERE content_type = 'video') AS total_tutorials,
                (SELECT COUNT(*) FROM contents WHERE content_type = 'blog') AS total_blogs,
                (SELECT COALESCE(SUM(view_count), 0) FROM contents)::bigint AS total_views,
                (SELECT COUNT(*) FROM comments WHERE status = 'pending') AS pending_comments
        "#,
    )
    .fetch_one(executor)
    .await
}
