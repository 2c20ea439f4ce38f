//! ShiftTrack core data models.
//!
//! This crate defines the records shared by the storage backends, the
//! progression engine and the shift services.

#![warn(missing_docs)]

// Core identities
mod id;
mod clock;

// People
mod employee;
mod user;

// Goals
mod goal;
mod template;

// Shifts and outcomes
mod shift;
mod step_progress;

// Re-exports
pub use id::*;
pub use clock::{Clock, SystemClock, FixedClock};

pub use employee::{Employee, EmployeeFilter, SupportProfile, EmergencyContact};
pub use user::{User, Role, Capability};

pub use goal::{
    DevelopmentGoal, GoalStep, StepBlueprint, GoalStatus, GoalFilter, InvalidTransition,
};
pub use template::{GoalTemplate, TemplateStatus, DEFAULT_MASTERY_CRITERIA, MAX_TARGET_DAYS};

pub use shift::{ShiftRoster, ShiftSummary, SummaryFilter};
pub use step_progress::{StepProgress, Outcome, ProgressKey, ProgressFilter};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
