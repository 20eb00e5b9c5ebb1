//! Achievement metrics and the per-action progress increment they award.
//!
//! The catalog stores one metric per achievement. When a user action is
//! reported, the evaluation service matches it against the catalog by metric
//! and asks each metric how much progress the action is worth. Keeping this a
//! typed enum (instead of a runtime string switch) means an unknown metric is
//! a parse error at the boundary, not a silent no-op deep in evaluation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Measurable user metric an achievement requirement can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TutorialsCompleted,
    TotalLearningTime,
    StreakDays,
    PointsEarned,
    CategoriesExplored,
    CommentsPosted,
    TutorialsBookmarked,
    PerfectScores,
    CertificatesEarned,
}

/// Free-form context carried by the action that triggered an evaluation.
///
/// Stored verbatim on the tracker row as JSON so the unlock can later be
/// traced back to the triggering action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutorial_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    /// Learning time carried by the action, in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<i64>,
    /// Streak length carried by the action, in days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
}

impl Metric {
    /// Progress this metric gains from a single action.
    ///
    /// Counting metrics are worth one unit per action; quantity metrics read
    /// the amount from the action metadata and award nothing when the caller
    /// did not supply it.
    pub fn increment(self, metadata: &ActionMetadata) -> i64 {
        match self {
            Self::TotalLearningTime => metadata.minutes.unwrap_or(0),
            Self::StreakDays => metadata.days.unwrap_or(0),
            Self::PointsEarned => metadata.score.unwrap_or(0),
            Self::TutorialsCompleted
            | Self::CategoriesExplored
            | Self::CommentsPosted
            | Self::TutorialsBookmarked
            | Self::PerfectScores
            | Self::CertificatesEarned => 1,
        }
    }

    /// Canonical wire/database spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TutorialsCompleted => "tutorials_completed",
            Self::TotalLearningTime => "total_learning_time",
            Self::StreakDays => "streak_days",
            Self::PointsEarned => "points_earned",
            Self::CategoriesExplored => "categories_explored",
            Self::CommentsPosted => "comments_posted",
            Self::TutorialsBookmarked => "tutorials_bookmarked",
            Self::PerfectScores => "perfect_scores",
            Self::CertificatesEarned => "certificates_earned",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tutorials_completed" => Ok(Self::TutorialsCompleted),
            "total_learning_time" => Ok(Self::TotalLearningTime),
            "streak_days" => Ok(Self::StreakDays),
            "points_earned" => Ok(Self::PointsEarned),
            "categories_explored" => Ok(Self::CategoriesExplored),
            "comments_posted" => Ok(Self::CommentsPosted),
            "tutorials_bookmarked" => Ok(Self::TutorialsBookmarked),
            "perfect_scores" => Ok(Self::PerfectScores),
            "certificates_earned" => Ok(Self::CertificatesEarned),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

/// Error returned when parsing a metric name that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetric(pub String);

impl fmt::Display for UnknownMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown achievement metric: '{}'", self.0)
    }
}

impl std::error::Error for UnknownMetric {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_metrics_award_one_unit() {
        let metadata = ActionMetadata::default();
        assert_eq!(Metric::TutorialsCompleted.increment(&metadata), 1);
        assert_eq!(Metric::CommentsPosted.increment(&metadata), 1);
        assert_eq!(Metric::TutorialsBookmarked.increment(&metadata), 1);
    }

    #[test]
    fn quantity_metrics_read_metadata() {
        let metadata = ActionMetadata {
            minutes: Some(42),
            days: Some(3),
            score: Some(250),
            ..Default::default()
        };
        assert_eq!(Metric::TotalLearningTime.increment(&metadata), 42);
        assert_eq!(Metric::StreakDays.increment(&metadata), 3);
        assert_eq!(Metric::PointsEarned.increment(&metadata), 250);
    }

    #[test]
    fn quantity_metrics_award_nothing_without_metadata() {
        let metadata = ActionMetadata::default();
        assert_eq!(Metric::TotalLearningTime.increment(&metadata), 0);
        assert_eq!(Metric::StreakDays.increment(&metadata), 0);
    }

    #[test]
    fn round_trips_through_strings() {
        let all = [
            Metric::TutorialsCompleted,
            Metric::TotalLearningTime,
            Metric::StreakDays,
            Metric::PointsEarned,
            Metric::CategoriesExplored,
            Metric::CommentsPosted,
            Metric::TutorialsBookmarked,
            Metric::PerfectScores,
            Metric::CertificatesEarned,
        ];
        for metric in all {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!("not_a_metric".parse::<Metric>().is_err());
    }
}
