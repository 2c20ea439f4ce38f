//! Progress Tracking
//!
//! Goal mastery progression, dashboard aggregates and the storage-backed
//! tracker that serves them.

#![warn(missing_docs)]

pub mod engine;
pub mod aggregate;
pub mod tracker;

pub use engine::{evaluate_daily_outcome, DailyEvaluation, MasteryPolicy};
pub use aggregate::{
    goals_near_mastery, recent_progress, success_rate, success_rate_percent, window_start,
    DailyTally, DashboardStats, EmployeeGoalStats,
};
pub use tracker::{BasicProgressTracker, ProgressTracker};
