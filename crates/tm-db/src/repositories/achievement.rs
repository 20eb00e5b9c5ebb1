use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Achievement, LeaderboardEntry, UserAchievement};

const ACHIEVEMENT_COLUMNS: &str = "id, name, description, achievement_type, category, metric, threshold, unit, points, xp_reward, badge_level, is_hidden, is_secret, prerequisites, is_active, total_earned, last_earned_at, created_at, updated_at";

const TRACKER_COLUMNS: &str = "id, user_id, achievement_id, current_progress, required_progress, progress_percentage, status, unlocked_at, claimed_at, metadata, created_at, updated_at";

/// Admin payload for creating a catalog entry.
#[derive(Debug, Clone)]
pub struct NewAchievement {
    pub name: String,
    pub description: String,
    pub achievement_type: String,
    pub category: String,
    pub metric: String,
    pub threshold: i64,
    pub unit: String,
    pub points: i64,
    pub xp_reward: i64,
    pub badge_level: String,
    pub is_hidden: bool,
    pub is_secret: bool,
    pub prerequisites: Vec<Uuid>,
}

/// Admin payload for a partial catalog update; `None` leaves a field as-is.
#[derive(Debug, Clone, Default)]
pub struct AchievementPatch {
    pub description: Option<String>,
    pub threshold: Option<i64>,
    pub points: Option<i64>,
    pub xp_reward: Option<i64>,
    pub badge_level: Option<String>,
    pub is_hidden: Option<bool>,
    pub is_secret: Option<bool>,
    pub is_active: Option<bool>,
}

pub async fn create<'e, E>(executor: E, new: &NewAchievement) -> Result<Achievement, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            INSERT INTO achievements (name, description, achievement_type, category, metric,
                                      threshold, unit, points, xp_reward, badge_level,
                                      is_hidden, is_secret, prerequisites)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {ACHIEVEMENT_COLUMNS}
        "#,
    ))
    .bind(&new.name)
    .bind(&new.description)
    .bind(&new.achievement_type)
    .bind(&new.category)
    .bind(&new.metric)
    .bind(new.threshold)
    .bind(&new.unit)
    .bind(new.points)
    .bind(new.xp_reward)
    .bind(&new.badge_level)
    .bind(new.is_hidden)
    .bind(new.is_secret)
    .bind(&new.prerequisites)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E>(
    executor: E,
    id: Uuid,
    patch: &AchievementPatch,
) -> Result<Option<Achievement>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            UPDATE achievements
            SET description = COALESCE($2, description),
                threshold = COALESCE($3, threshold),
                points = COALESCE($4, points),
                xp_reward = COALESCE($5, xp_reward),
                badge_level = COALESCE($6, badge_level),
                is_hidden = COALESCE($7, is_hidden),
                is_secret = COALESCE($8, is_secret),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ACHIEVEMENT_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(patch.description.as_deref())
    .bind(patch.threshold)
    .bind(patch.points)
    .bind(patch.xp_reward)
    .bind(patch.badge_level.as_deref())
    .bind(patch.is_hidden)
    .bind(patch.is_secret)
    .bind(patch.is_active)
    .fetch_optional(executor)
    .await
}

/// Soft delete: deactivated achievements stop matching evaluations but keep
/// their history.
pub async fn deactivate<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE achievements
            SET is_active = false, updated_at = NOW()
            WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get<'e, E>(executor: E, id: Uuid) -> Result<Option<Achievement>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {ACHIEVEMENT_COLUMNS}
            FROM achievements
            WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Active catalog listing for users; hidden achievements are excluded unless
/// requested.
pub async fn list_active<'e, E>(
    executor: E,
    category: Option<&str>,
    achievement_type: Option<&str>,
    badge_level: Option<&str>,
    include_hidden: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Achievement>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {ACHIEVEMENT_COLUMNS}
            FROM achievements
            WHERE is_active = true
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR achievement_type = $2)
              AND ($3::text IS NULL OR badge_level = $3)
              AND ($4 OR is_hidden = false)
            ORDER BY points, name
            LIMIT $5 OFFSET $6
        "#,
    ))
    .bind(category)
    .bind(achievement_type)
    .bind(badge_level)
    .bind(include_hidden)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_active<'e, E>(
    executor: E,
    category: Option<&str>,
    achievement_type: Option<&str>,
    badge_level: Option<&str>,
    include_hidden: bool,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM achievements
            WHERE is_active = true
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR achievement_type = $2)
              AND ($3::text IS NULL OR badge_level = $3)
              AND ($4 OR is_hidden = false)
        "#,
    )
    .bind(category)
    .bind(achievement_type)
    .bind(badge_level)
    .bind(include_hidden)
    .fetch_one(executor)
    .await
}

/// Active achievements whose requirement references the given metric.
pub async fn list_active_by_metric<'e, E>(
    executor: E,
    metric: &str,
) -> Result<Vec<Achievement>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {ACHIEVEMENT_COLUMNS}
            FROM achievements
            WHERE is_active = true AND metric = $1
        "#,
    ))
    .bind(metric)
    .fetch_all(executor)
    .await
}

/// Find-or-create the (user, achievement) tracker. The unique constraint
/// absorbs concurrent first evaluations; the required progress is copied
/// from the achievement threshold only on creation.
pub async fn ensure_tracker<'e, E>(
    executor: E,
    user_id: Uuid,
    achievement_id: Uuid,
    required_progress: i64,
    metadata: &serde_json::Value,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO user_achievements (user_id, achievement_id, required_progress, metadata)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, achievement_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(achievement_id)
    .bind(required_progress)
    .bind(metadata)
    .execute(executor)
    .await?;
    Ok(())
}

/// Atomically add a progress increment to a tracker that can still
/// accumulate, deriving percentage, status and the unlock timestamp in the
/// same statement. Rows already unlocked or claimed are left untouched and
/// `None` is returned for them, so an unlock is reported exactly once.
pub async fn accumulate<'e, E>(
    executor: E,
    user_id: Uuid,
    achievement_id: Uuid,
    increment: i64,
) -> Result<Option<UserAchievement>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            UPDATE user_achievements
            SET current_progress = current_progress + $3,
                progress_percentage = LEAST(
                    100,
                    (current_progress + $3) * 100 / GREATEST(required_progress, 1)
                )::smallint,
                status = CASE
                    WHEN current_progress + $3 >= required_progress THEN 'unlocked'
                    ELSE 'in_progress'
                END,
                unlocked_at = CASE
                    WHEN current_progress + $3 >= required_progress THEN COALESCE(unlocked_at, NOW())
                    ELSE unlocked_at
                END,
                updated_at = NOW()
            WHERE user_id = $1 AND achievement_id = $2
              AND status IN ('locked', 'in_progress')
            RETURNING {TRACKER_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(achievement_id)
    .bind(increment)
    .fetch_optional(executor)
    .await
}

pub async fn get_tracker<'e, E>(
    executor: E,
    user_id: Uuid,
    achievement_id: Uuid,
) -> Result<Option<UserAchievement>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {TRACKER_COLUMNS}
            FROM user_achievements
            WHERE user_id = $1 AND achievement_id = $2
        "#,
    ))
    .bind(user_id)
    .bind(achievement_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_trackers<'e, E>(
    executor: E,
    user_id: Uuid,
    status: Option<&str>,
) -> Result<Vec<UserAchievement>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {TRACKER_COLUMNS}
            FROM user_achievements
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY unlocked_at DESC NULLS LAST, created_at
        "#,
    ))
    .bind(user_id)
    .bind(status)
    .fetch_all(executor)
    .await
}

/// Claim an unlocked tracker. The status guard makes the transition atomic:
/// concurrent claims see zero rows updated and fail the state check.
pub async fn claim_tracker<'e, E>(
    executor: E,
    user_id: Uuid,
    achievement_id: Uuid,
) -> Result<Option<UserAchievement>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            UPDATE user_achievements
            SET status = 'claimed',
                claimed_at = NOW(),
                updated_at = NOW()
            WHERE user_id = $1 AND achievement_id = $2 AND status = 'unlocked'
            RETURNING {TRACKER_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(achievement_id)
    .fetch_optional(executor)
    .await
}

/// Atomic counter bump on the catalog row when a user claims.
pub async fn increment_total_earned<'e, E>(
    executor: E,
    achievement_id: Uuid,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE achievements
            SET total_earned = total_earned + 1,
                last_earned_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
        "#,
    )
    .bind(achievement_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Aggregate unlocked and claimed trackers per user, optionally restricted
/// to unlocks after `since`.
pub async fn leaderboard<'e, E>(
    executor: E,
    since: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT ua.user_id, u.name,
                   COALESCE(SUM(a.points), 0)::bigint AS total_points,
                   COUNT(*)::bigint AS total_achievements,
                   MAX(ua.unlocked_at) AS last_unlocked_at
            FROM user_achievements ua
            JOIN achievements a ON a.id = ua.achievement_id
            JOIN users u ON u.id = ua.user_id
            WHERE ua.status IN ('unlocked', 'claimed')
              AND ($1::timestamptz IS NULL OR ua.unlocked_at >= $1)
            GROUP BY ua.user_id, u.name
            ORDER BY total_points DESC, total_achievements DESC
            LIMIT $2
        "#,
    )
    .bind(since)
    .bind(limit)
    .fetch_all(executor)
    .await
}
