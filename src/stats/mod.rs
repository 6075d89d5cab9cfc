//! Schedule resolution and statistics over completion records.
//!
//! Everything here is pure: callers fetch habits and records from the
//! stores and pass borrowed snapshots in.

pub mod aggregate;
pub mod frequency;

pub use aggregate::{compute_stats, day_progress, weekly_grid, MAX_LOOKBACK_DAYS, WEEK_DAYS};
pub use frequency::scheduled_habits;
