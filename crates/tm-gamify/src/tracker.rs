//! Per-user achievement tracker state machine.
//!
//! A tracker moves `locked`/`in_progress` → `unlocked` automatically once its
//! accumulated progress reaches the requirement threshold, and `unlocked` →
//! `claimed` only through an explicit claim. No transition ever removes
//! progress or reverts an unlock.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a user's progress toward one achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerStatus {
    Locked,
    InProgress,
    Unlocked,
    Claimed,
}

impl TrackerStatus {
    /// Whether evaluation may still add progress to a tracker in this state.
    pub const fn can_accumulate(self) -> bool {
        matches!(self, Self::Locked | Self::InProgress)
    }

    /// Whether the achievement counts as earned (unlocked or already claimed).
    pub const fn is_unlocked(self) -> bool {
        matches!(self, Self::Unlocked | Self::Claimed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::InProgress => "in_progress",
            Self::Unlocked => "unlocked",
            Self::Claimed => "claimed",
        }
    }
}

impl fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked" => Ok(Self::Locked),
            "in_progress" => Ok(Self::InProgress),
            "unlocked" => Ok(Self::Unlocked),
            "claimed" => Ok(Self::Claimed),
            other => Err(format!("unknown tracker status: '{other}'")),
        }
    }
}

/// Outcome of applying a progress increment to a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerUpdate {
    pub current_progress: i64,
    pub progress_percentage: i16,
    pub status: TrackerStatus,
    /// True only on the call that crossed the threshold.
    pub newly_unlocked: bool,
}

/// Percentage of the requirement met, floored and clamped to `[0, 100]`.
pub fn progress_percentage(current: i64, required: i64) -> i16 {
    if required <= 0 {
        return 100;
    }
    (current.saturating_mul(100) / required).clamp(0, 100) as i16
}

/// Apply a progress increment to a tracker, advancing its status per the
/// state machine. Trackers that are already unlocked or claimed are returned
/// unchanged; the unlock flag is set only when this call crosses the
/// threshold.
pub fn apply_progress(
    status: TrackerStatus,
    current: i64,
    required: i64,
    increment: i64,
) -> TrackerUpdate {
    if !status.can_accumulate() {
        return TrackerUpdate {
            current_progress: current,
            progress_percentage: progress_percentage(current, required),
            status,
            newly_unlocked: false,
        };
    }

    let new_current = current.saturating_add(increment.max(0));
    let unlocked = new_current >= required;
    TrackerUpdate {
        current_progress: new_current,
        progress_percentage: progress_percentage(new_current, required),
        status: if unlocked {
            TrackerStatus::Unlocked
        } else {
            TrackerStatus::InProgress
        },
        newly_unlocked: unlocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_floored_and_clamped() {
        assert_eq!(progress_percentage(0, 3), 0);
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 3), 66);
        assert_eq!(progress_percentage(3, 3), 100);
        assert_eq!(progress_percentage(10, 3), 100);
        // A non-positive requirement is treated as already met.
        assert_eq!(progress_percentage(0, 0), 100);
    }

    #[test]
    fn progress_below_threshold_stays_in_progress() {
        let update = apply_progress(TrackerStatus::Locked, 0, 3, 1);
        assert_eq!(update.status, TrackerStatus::InProgress);
        assert_eq!(update.current_progress, 1);
        assert_eq!(update.progress_percentage, 33);
        assert!(!update.newly_unlocked);

        let update = apply_progress(TrackerStatus::InProgress, 1, 3, 1);
        assert_eq!(update.status, TrackerStatus::InProgress);
        assert_eq!(update.progress_percentage, 66);
        assert!(!update.newly_unlocked);
    }

    #[test]
    fn unlocks_exactly_at_threshold() {
        let update = apply_progress(TrackerStatus::InProgress, 2, 3, 1);
        assert_eq!(update.status, TrackerStatus::Unlocked);
        assert_eq!(update.current_progress, 3);
        assert_eq!(update.progress_percentage, 100);
        assert!(update.newly_unlocked);
    }

    #[test]
    fn unlocked_trackers_do_not_accumulate_or_re_unlock() {
        let update = apply_progress(TrackerStatus::Unlocked, 3, 3, 1);
        assert_eq!(update.status, TrackerStatus::Unlocked);
        assert_eq!(update.current_progress, 3);
        assert!(!update.newly_unlocked);

        let update = apply_progress(TrackerStatus::Claimed, 3, 3, 5);
        assert_eq!(update.status, TrackerStatus::Claimed);
        assert_eq!(update.current_progress, 3);
        assert!(!update.newly_unlocked);
    }

    #[test]
    fn negative_increments_are_ignored() {
        let update = apply_progress(TrackerStatus::InProgress, 2, 3, -5);
        assert_eq!(update.current_progress, 2);
        assert_eq!(update.status, TrackerStatus::InProgress);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            TrackerStatus::Locked,
            TrackerStatus::InProgress,
            TrackerStatus::Unlocked,
            TrackerStatus::Claimed,
        ] {
            assert_eq!(status.as_str().parse::<TrackerStatus>().unwrap(), status);
        }
        assert!("granted".parse::<TrackerStatus>().is_err());
    }
}
