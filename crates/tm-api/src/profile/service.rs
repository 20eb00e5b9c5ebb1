//! Full stats recompute over a user's progress records.
//!
//! The `profiles` row is a cache of this computation, never a source of
//! truth; recomputing is idempotent. Claimed achievement rewards are folded
//! back in so a recompute never erases a claim credit; `xp` is additive-only
//! and preserved by the upsert.

use chrono::Utc;
use sqlx::PgPool;
use tm_db::models::Profile;
use tm_db::repositories::{profile as profile_repo, progress as progress_repo};
use tm_gamify::{compute_streaks, level_for_points, points_for_completions};
use uuid::Uuid;

use crate::error::ApiError;

pub async fn recompute_stats(pool: &PgPool, user_id: Uuid) -> Result<Profile, ApiError> {
    let totals = progress_repo::totals(pool, user_id).await?;
    let activity_days = progress_repo::activity_days(pool, user_id).await?;
    let claimed = profile_repo::claimed_points(pool, user_id).await?;

    let streaks = compute_streaks(&activity_days, Utc::now().date_naive());
    let points = points_for_completions(totals.tutorials_completed) + claimed;

    let stats = profile_repo::StatsUpdate {
        total_learning_time_mins: totals.seconds_watched / 60,
        tutorials_completed: totals.tutorials_completed,
        tutorials_in_progress: totals.tutorials_in_progress,
        current_streak: streaks.current,
        longest_streak: streaks.longest,
        last_active_at: totals.last_active_at,
        points,
        level: level_for_points(points),
    };

    let profile = profile_repo::upsert_stats(pool, user_id, stats).await?;
    Ok(profile)
}

/// Post-write refresh after a successful progress mutation. Failures are
/// logged and never fail the request that triggered them.
pub async fn recompute_after_write(pool: &PgPool, user_id: Uuid) {
    if let Err(err) = recompute_stats(pool, user_id).await {
        tracing::warn!(user_id = %user_id, "Post-write stats recompute failed: {err}");
    }
}
