use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tm_gamify::{Metric, TrackerStatus};
use uuid::Uuid;

/// Minimal user surface; identity lives upstream, this row only anchors
/// foreign keys and display names.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Content catalog surface - owned by the content service, referenced here
/// for existence checks and the view counter.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Content {
    pub id: Uuid,
    pub content_type: String,
    pub title: String,
    pub slug: String,
    pub duration_secs: i32,
    pub view_count: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Per (user, content) progress record - unique on the pair.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProgressRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_id: Uuid,
    /// Completion percentage in `[0, 100]`; last write wins.
    pub progress: f64,
    /// Last playback position, in seconds.
    pub last_position_secs: i32,
    pub last_viewed_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Timestamped note attached to one progress record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProgressNote {
    pub id: Uuid,
    pub progress_id: Uuid,
    pub body: String,
    /// Position in the video the note refers to, in seconds.
    pub video_timestamp_secs: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Note joined with its tutorial, for cross-tutorial note listings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteWithContent {
    pub id: Uuid,
    pub content_id: Uuid,
    pub content_title: String,
    pub body: String,
    pub video_timestamp_secs: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProgressBookmark {
    pub id: Uuid,
    pub progress_id: Uuid,
    pub timestamp_secs: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Derived learning statistics, one row per user.
///
/// Every field is a pure function of the user's progress records at the time
/// of the last recompute; the row is a cache, never a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub total_learning_time_mins: i64,
    pub tutorials_completed: i64,
    pub tutorials_in_progress: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_at: Option<DateTime<Utc>>,
    pub points: i64,
    pub xp: i64,
    pub level: i64,
    pub updated_at: DateTime<Utc>,
}

/// Catalog achievement definition. Admin-managed; soft-deleted via
/// `is_active` and never mutated by evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Achievement {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub achievement_type: String,
    pub category: String,
    /// Stored as its canonical string; parse with [`Achievement::metric`].
    pub metric: String,
    pub threshold: i64,
    pub unit: String,
    pub points: i64,
    pub xp_reward: i64,
    pub badge_level: String,
    pub is_hidden: bool,
    pub is_secret: bool,
    pub prerequisites: Vec<Uuid>,
    pub is_active: bool,
    pub total_earned: i64,
    pub last_earned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Achievement {
    /// Typed view of the stored metric name.
    pub fn metric(&self) -> Option<Metric> {
        self.metric.parse().ok()
    }
}

/// Per (user, achievement) tracker - unique on the pair.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAchievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub current_progress: i64,
    /// Copied from the achievement threshold when the tracker is created.
    pub required_progress: i64,
    pub progress_percentage: i16,
    /// Stored as its canonical string; parse with [`UserAchievement::status`].
    pub status: String,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAchievement {
    /// Typed view of the stored status.
    pub fn status(&self) -> Option<TrackerStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub content_id: Uuid,
    pub author_name: String,
    pub author_email: String,
    pub body: String,
    pub status: String,
    pub moderated_by: Option<Uuid>,
    pub moderation_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Comment joined with its parent content, for the admin queue.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithContent {
    pub id: Uuid,
    pub content_id: Uuid,
    pub content_title: String,
    pub content_slug: String,
    pub author_name: String,
    pub author_email: String,
    pub body: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModerationLogEntry {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub action: String,
    pub moderator_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Moderation queue totals plus the trailing seven day submission count.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub recent: i64,
}

/// One leaderboard row: a user with their summed unlocked rewards.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub name: String,
    pub total_points: i64,
    pub total_achievements: i64,
    pub last_unlocked_at: Option<DateTime<Utc>>,
}

/// Aggregate over a user's progress records, input to the stats recompute.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProgressTotals {
    pub tutorials_completed: i64,
    pub tutorials_in_progress: i64,
    pub seconds_watched: i64,
    pub last_active_at: Option<DateTime<Utc>>,
}

/// Platform-wide counters for the admin analytics overview.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlatformTotals {
    pub total_users: i64,
    pub total_contents: i64,
    pub published_contents: i64,
    pub total_tutorials: i64,
    pub total_blogs: i64,
    pub total_views: i64,
    pub pending_comments: i64,
}
