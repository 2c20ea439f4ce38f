//! Work layer errors.

use shifttrack_core::{Capability, EmployeeId, GoalStatus, Role};
use shifttrack_storage::StorageError;

/// Result type for work operations.
pub type Result<T> = std::result::Result<T, WorkError>;

/// Errors returned by the shift, goal and directory services.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    /// Employee already has the maximum number of active goals
    #[error("employee {employee} already has {limit} active goals")]
    ActiveGoalLimit {
        /// Employee
        employee: EmployeeId,
        /// Configured limit
        limit: usize,
    },

    /// Goal or template has no required step, so it could never be mastered
    #[error("at least one step must be required")]
    NoRequiredSteps,

    /// A shift is already open
    #[error("a shift is already active")]
    ShiftAlreadyActive,

    /// No shift is open
    #[error("no active shift")]
    NoActiveShift,

    /// Shift start without employees
    #[error("select at least one employee to start a shift")]
    EmptyRoster,

    /// Inactive employee used where an active one is required
    #[error("employee {0} is inactive")]
    EmployeeInactive(EmployeeId),

    /// Employee isn't on the active shift
    #[error("employee {0} is not on the active shift")]
    NotOnShift(EmployeeId),

    /// Goal belongs to someone else
    #[error("goal does not belong to employee {0}")]
    GoalNotOwned(EmployeeId),

    /// Step id isn't part of the goal
    #[error("step is not part of this goal")]
    StepNotInGoal,

    /// Goal is archived and can't take new outcomes
    #[error("goal is archived")]
    GoalArchived,

    /// Status change the lifecycle doesn't allow
    #[error("cannot move goal from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: GoalStatus,
        /// Requested status
        to: GoalStatus,
    },

    /// Verbal prompt recorded without notes
    #[error("a verbal prompt needs notes")]
    NotesRequired,

    /// Archived template used for assignment
    #[error("template is archived")]
    TemplateArchived,

    /// Role lacks the capability
    #[error("role {role} may not {capability}")]
    PermissionDenied {
        /// Acting role
        role: Role,
        /// Required capability
        capability: Capability,
    },

    /// Missing entity
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind
        kind: &'static str,
        /// Requested id
        id: String,
    },

    /// Rejected input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl WorkError {
    /// Build a `NotFound` error.
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        WorkError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<shifttrack_core::InvalidTransition> for WorkError {
    fn from(e: shifttrack_core::InvalidTransition) -> Self {
        WorkError::InvalidTransition { from: e.from, to: e.to }
    }
}
