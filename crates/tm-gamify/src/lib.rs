//! Gamification library for TraineeMind
//!
//! This crate provides the pure domain logic behind learning progress and
//! achievements: metric increments, the per-user tracker state machine,
//! points/level arithmetic and streak computation. It performs no I/O so the
//! rules can be tested exhaustively in isolation.

pub mod metric;
pub mod spam;
pub mod stats;
pub mod tracker;

pub use metric::{ActionMetadata, Metric};
pub use spam::{MAX_COMMENTS_PER_HOUR, contains_spam};
pub use stats::{Streaks, compute_streaks, level_for_points, points_for_completions};
pub use tracker::{TrackerStatus, TrackerUpdate, apply_progress, progress_percentage};
