//! Shift Operations (Layer 2)
//!
//! Shift lifecycle, outcome recording, goal assignment and record keeping.

#![warn(missing_docs)]

pub mod access;
pub mod context;
pub mod directory;
pub mod error;
pub mod goals;
pub mod shift;

pub use access::AccessGuard;
pub use context::{WorkConfig, WorkContext};
pub use directory::{BasicDirectory, Directory, EmployeeSpec, EmployeeUpdate, TemplateSpec};
pub use error::{Result, WorkError};
pub use goals::{BasicGoalManager, GoalManager, GoalSpec, GoalUpdate};
pub use shift::{BasicShiftManager, RecordedOutcome, ShiftManager, ShiftSpec, StepOutcomeInput};
