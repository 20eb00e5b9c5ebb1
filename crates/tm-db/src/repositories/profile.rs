use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Profile;

const PROFILE_COLUMNS: &str = "user_id, total_learning_time_mins, tutorials_completed, tutorials_in_progress, current_streak, longest_streak, last_active_at, points, xp, level, updated_at";

pub async fn get<'e, E>(executor: E, user_id: Uuid) -> Result<Option<Profile>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {PROFILE_COLUMNS}
            FROM profiles
            WHERE user_id = $1
        "#,
    ))
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Inputs of a full stats recompute; every field overwrites the stored value.
#[derive(Debug, Clone, Copy)]
pub struct StatsUpdate {
    pub total_learning_time_mins: i64,
    pub tutorials_completed: i64,
    pub tutorials_in_progress: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_at: Option<DateTime<Utc>>,
    pub points: i64,
    pub level: i64,
}

/// Persist recomputed stats, creating the profile row on first touch.
/// `xp` is additive-only (credited by achievement claims) and is preserved.
pub async fn upsert_stats<'e, E>(
    executor: E,
    user_id: Uuid,
    stats: StatsUpdate,
) -> Result<Profile, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            INSERT INTO profiles (user_id, total_learning_time_mins, tutorials_completed,
                                  tutorials_in_progress, current_streak, longest_streak,
                                  last_active_at, points, level, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                total_learning_time_mins = $2,
                tutorials_completed = $3,
                tutorials_in_progress = $4,
                current_streak = $5,
                longest_streak = $6,
                last_active_at = $7,
                points = $8,
                level = $9,
                updated_at = NOW()
            RETURNING {PROFILE_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(stats.total_learning_time_mins)
    .bind(stats.tutorials_completed)
    .bind(stats.tutorials_in_progress)
    .bind(stats.current_streak)
    .bind(stats.longest_streak)
    .bind(stats.last_active_at)
    .bind(stats.points)
    .bind(stats.level)
    .fetch_one(executor)
    .await
}

/// Additively credit claimed achievement rewards, creating the profile row
/// if the user has never had stats recomputed.
pub async fn credit_rewards<'e, E>(
    executor: E,
    user_id: Uuid,
    points: i64,
    xp: i64,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO profiles (user_id, points, xp, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                points = profiles.points + $2,
                xp = profiles.xp + $3,
                updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(points)
    .bind(xp)
    .execute(executor)
    .await?;
    Ok(())
}

/// Sum of catalog points over the user's claimed achievements. Folded into
/// the derived points on recompute so claim credits survive a recompute.
pub async fn claimed_points<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COALESCE(SUM(a.points), 0)::bigint
            FROM user_achievements ua
            JOIN achievements a ON a.id = ua.achievement_id
            WHERE ua.user_id = $1 AND ua.status = 'claimed'
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}
