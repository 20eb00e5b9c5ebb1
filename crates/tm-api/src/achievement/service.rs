//! Achievement evaluation: the single entry point that turns user actions
//! into tracker progress.
//!
//! Evaluation never mutates the catalog. Each matching achievement gets a
//! find-or-create of its tracker, then one atomic guarded update that adds
//! the increment and derives percentage, status and the unlock timestamp in
//! SQL. The guard restricts the update to trackers that can still
//! accumulate, so an unlock is reported exactly once across concurrent
//! evaluations.

use sqlx::PgPool;
use tm_db::models::Achievement;
use tm_db::repositories::achievement as achievement_repo;
use tm_gamify::{ActionMetadata, Metric, TrackerStatus};
use uuid::Uuid;

use crate::{error::ApiError, metrics::record_achievement_event};

/// Apply one user action to every active achievement tracking `metric`.
/// Returns the achievements newly unlocked by this call.
pub async fn evaluate(
    pool: &PgPool,
    user_id: Uuid,
    metric: Metric,
    metadata: &ActionMetadata,
) -> Result<Vec<Achievement>, ApiError> {
    let increment = metric.increment(metadata);
    if increment <= 0 {
        return Ok(Vec::new());
    }

    let candidates = achievement_repo::list_active_by_metric(pool, metric.as_str()).await?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let meta_json = serde_json::to_value(metadata).unwrap_or(serde_json::Value::Null);
    let mut newly_unlocked = Vec::new();

    for achievement in candidates {
        achievement_repo::ensure_tracker(
            pool,
            user_id,
            achievement.id,
            achievement.threshold,
            &meta_json,
        )
        .await?;

        let updated =
            achievement_repo::accumulate(pool, user_id, achievement.id, increment).await?;

        if let Some(tracker) = updated {
            if tracker.status() == Some(TrackerStatus::Unlocked) {
                tracing::info!(
                    user_id = %user_id,
                    achievement = %achievement.name,
                    "Achievement unlocked"
                );
                record_achievement_event("unlock");
                newly_unlocked.push(achievement);
            }
        }
    }

    Ok(newly_unlocked)
}

/// Best-effort evaluation for actions where unlock results are not part of
/// the response. Failures are logged and swallowed.
pub async fn evaluate_quietly(
    pool: &PgPool,
    user_id: Uuid,
    metric: Metric,
    metadata: &ActionMetadata,
) {
    if let Err(err) = evaluate(pool, user_id, metric, metadata).await {
        tracing::warn!(user_id = %user_id, metric = %metric, "Achievement evaluation failed: {err}");
    }
}
