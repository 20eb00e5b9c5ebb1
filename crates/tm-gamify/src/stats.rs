//! Profile statistics arithmetic: points, levels and learning streaks.

use chrono::NaiveDate;

/// Points awarded per completed tutorial.
pub const POINTS_PER_COMPLETION: i64 = 100;

/// Points required per level.
pub const LEVEL_SIZE: i64 = 500;

/// Points derived from the number of completed tutorials.
pub const fn points_for_completions(completed: i64) -> i64 {
    completed * POINTS_PER_COMPLETION
}

/// Level derived from total points: one level per [`LEVEL_SIZE`] points,
/// starting at level 1.
pub const fn level_for_points(points: i64) -> i64 {
    points / LEVEL_SIZE + 1
}

/// Current and longest consecutive-day learning streaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streaks {
    pub current: i32,
    pub longest: i32,
}

/// Compute streaks from the user's distinct activity days.
///
/// `activity_days` may be in any order and contain no duplicates. The current
/// streak counts consecutive days ending today or yesterday (a streak is not
/// broken until a full day has been missed); the longest streak is the
/// longest consecutive run anywhere in the history.
pub fn compute_streaks(activity_days: &[NaiveDate], today: NaiveDate) -> Streaks {
    if activity_days.is_empty() {
        return Streaks::default();
    }

    let mut days = activity_days.to_vec();
    days.sort_unstable();
    days.dedup();

    let mut longest = 1i32;
    let mut run = 1i32;
    for pair in days.windows(2) {
        if (pair[1] - pair[0]).num_days() == 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    // The trailing run only counts as current if it reaches today or
    // yesterday.
    let last = *days.last().expect("non-empty");
    let current = if (today - last).num_days() <= 1 { run } else { 0 };

    Streaks { current, longest }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn points_and_level() {
        assert_eq!(points_for_completions(0), 0);
        assert_eq!(points_for_completions(3), 300);
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(499), 1);
        assert_eq!(level_for_points(500), 2);
        assert_eq!(level_for_points(1499), 3);
    }

    #[test]
    fn no_activity_means_no_streak() {
        assert_eq!(
            compute_streaks(&[], date(2025, 6, 10)),
            Streaks::default()
        );
    }

    #[test]
    fn consecutive_days_ending_today() {
        let today = date(2025, 6, 10);
        let days = [date(2025, 6, 8), date(2025, 6, 9), today];
        assert_eq!(
            compute_streaks(&days, today),
            Streaks { current: 3, longest: 3 }
        );
    }

    #[test]
    fn streak_survives_until_a_full_day_is_missed() {
        let today = date(2025, 6, 10);
        // Active yesterday but not yet today: streak still alive.
        let days = [date(2025, 6, 8), date(2025, 6, 9)];
        assert_eq!(
            compute_streaks(&days, today),
            Streaks { current: 2, longest: 2 }
        );
        // Last activity two days ago: current streak is gone.
        let days = [date(2025, 6, 7), date(2025, 6, 8)];
        assert_eq!(
            compute_streaks(&days, today),
            Streaks { current: 0, longest: 2 }
        );
    }

    #[test]
    fn longest_run_may_predate_current() {
        let today = date(2025, 6, 10);
        let days = [
            date(2025, 6, 1),
            date(2025, 6, 2),
            date(2025, 6, 3),
            date(2025, 6, 4),
            // Gap.
            date(2025, 6, 9),
            today,
        ];
        assert_eq!(
            compute_streaks(&days, today),
            Streaks { current: 2, longest: 4 }
        );
    }

    #[test]
    fn unsorted_and_duplicated_input_is_tolerated() {
        let today = date(2025, 6, 10);
        let days = [today, date(2025, 6, 9), today, date(2025, 6, 9)];
        assert_eq!(
            compute_streaks(&days, today),
            Streaks { current: 2, longest: 2 }
        );
    }

    #[test]
    fn single_day_of_activity() {
        let today = date(2025, 6, 10);
        assert_eq!(
            compute_streaks(&[today], today),
            Streaks { current: 1, longest: 1 }
        );
    }
}
