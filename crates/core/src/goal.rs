//! Development goal model - an individualized skill with ordered steps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::id::{EmployeeId, GoalId, StepId};
use crate::Time;

/// A development goal assigned to one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentGoal {
    /// Unique identifier
    pub id: GoalId,

    /// Owning employee
    pub employee_id: EmployeeId,

    /// Goal title
    pub title: String,

    /// Goal statement
    pub description: String,

    /// First day the goal is worked on
    pub start_date: NaiveDate,

    /// Target date for mastery
    pub target_end_date: NaiveDate,

    /// Lifecycle status
    pub status: GoalStatus,

    /// Consecutive fully-correct days
    pub consecutive_all_correct: u32,

    /// One-way flag, stays true after a later streak reset
    pub mastery_achieved: bool,

    /// Day mastery was first reached
    pub mastery_date: Option<NaiveDate>,

    /// Ordered steps (owned, immutable once created)
    pub steps: Vec<GoalStep>,

    /// Last day the progression engine evaluated this goal
    #[serde(default)]
    pub last_evaluated: Option<NaiveDate>,

    /// Streak carried into `last_evaluated`, used to re-derive that day
    #[serde(default)]
    pub streak_before_last_evaluated: u32,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

impl DevelopmentGoal {
    /// Create a new active goal. Steps are numbered in the order given.
    pub fn new(
        employee_id: EmployeeId,
        title: impl Into<String>,
        description: impl Into<String>,
        start_date: NaiveDate,
        target_end_date: NaiveDate,
        steps: &[StepBlueprint],
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: GoalId::new(),
            employee_id,
            title: title.into(),
            description: description.into(),
            start_date,
            target_end_date,
            status: GoalStatus::Active,
            consecutive_all_correct: 0,
            mastery_achieved: false,
            mastery_date: None,
            steps: steps
                .iter()
                .enumerate()
                .map(|(i, bp)| GoalStep {
                    id: StepId::new(),
                    order: i as u32 + 1,
                    description: bp.description.clone(),
                    is_required: bp.is_required,
                })
                .collect(),
            last_evaluated: None,
            streak_before_last_evaluated: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Steps that must be correct for a day to count.
    pub fn required_steps(&self) -> impl Iterator<Item = &GoalStep> {
        self.steps.iter().filter(|s| s.is_required)
    }

    /// Look up a step by id.
    pub fn step(&self, id: StepId) -> Option<&GoalStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Move to another status if the lifecycle allows it.
    pub fn transition(&mut self, to: GoalStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(to) {
            return Err(InvalidTransition { from: self.status, to });
        }
        self.status = to;
        self.updated_at = chrono::Utc::now();
        Ok(())
    }
}

/// A step within a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStep {
    /// Unique identifier
    pub id: StepId,

    /// 1-based position
    pub order: u32,

    /// What the employee does
    pub description: String,

    /// Optional steps never affect the streak
    pub is_required: bool,
}

/// Description of a step before it belongs to a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepBlueprint {
    /// What the employee does
    pub description: String,

    /// Whether the step counts toward the daily tally
    pub is_required: bool,
}

impl StepBlueprint {
    /// A required step.
    pub fn required(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            is_required: true,
        }
    }

    /// An optional step.
    pub fn optional(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            is_required: false,
        }
    }
}

/// Goal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Being worked on
    Active,
    /// Mastered, kept up
    Maintenance,
    /// Retired by a manager (terminal)
    Archived,
}

impl GoalStatus {
    /// Allowed transitions: Active -> Maintenance, Active|Maintenance -> Archived.
    pub fn can_transition_to(&self, to: GoalStatus) -> bool {
        matches!(
            (self, to),
            (GoalStatus::Active, GoalStatus::Maintenance)
                | (GoalStatus::Active, GoalStatus::Archived)
                | (GoalStatus::Maintenance, GoalStatus::Archived)
        )
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Maintenance => "maintenance",
            GoalStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(GoalStatus::Active),
            "maintenance" => Ok(GoalStatus::Maintenance),
            "archived" => Ok(GoalStatus::Archived),
            other => Err(format!("unknown goal status: {}", other)),
        }
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move goal from {from} to {to}")]
pub struct InvalidTransition {
    /// Current status
    pub from: GoalStatus,
    /// Requested status
    pub to: GoalStatus,
}

/// Filter for goal queries.
#[derive(Debug, Clone, Default)]
pub struct GoalFilter {
    /// Only goals of this employee
    pub employee_id: Option<EmployeeId>,

    /// Only goals in one of these statuses
    pub status: Option<Vec<GoalStatus>>,
}

impl GoalFilter {
    /// Goals belonging to one employee.
    pub fn for_employee(employee_id: EmployeeId) -> Self {
        Self {
            employee_id: Some(employee_id),
            status: None,
        }
    }

    /// Restrict to the given status.
    pub fn with_status(mut self, status: GoalStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    /// Check whether a goal passes this filter.
    pub fn matches(&self, goal: &DevelopmentGoal) -> bool {
        if let Some(employee_id) = self.employee_id {
            if goal.employee_id != employee_id {
                return false;
            }
        }
        if let Some(statuses) = &self.status {
            if !statuses.contains(&goal.status) {
                return false;
            }
        }
        true
    }
}
