//! Step progress - the outcome of one goal step on one shift day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::id::{EmployeeId, GoalId, ProgressId, ShiftId, StepId};
use crate::Time;

/// How the employee performed a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Done independently
    Correct,
    /// Needed a verbal prompt; notes should say why
    VerbalPrompt,
    /// Step didn't come up
    #[serde(rename = "na")]
    NotApplicable,
}

impl Outcome {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::VerbalPrompt => "verbal_prompt",
            Outcome::NotApplicable => "na",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "correct" => Ok(Outcome::Correct),
            "verbal_prompt" | "prompt" => Ok(Outcome::VerbalPrompt),
            "na" | "n/a" | "not_applicable" => Ok(Outcome::NotApplicable),
            other => Err(format!("unknown outcome: {}", other)),
        }
    }
}

/// Natural key of a step progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey {
    /// Goal
    pub goal_id: GoalId,
    /// Step within the goal
    pub step_id: StepId,
    /// Employee performing the step
    pub employee_id: EmployeeId,
    /// Shift the outcome was recorded on
    pub shift_id: ShiftId,
    /// Calendar day
    pub date: NaiveDate,
}

/// A recorded outcome for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    /// Unique identifier
    pub id: ProgressId,

    /// Goal
    pub goal_id: GoalId,

    /// Step within the goal
    pub step_id: StepId,

    /// Employee performing the step
    pub employee_id: EmployeeId,

    /// Shift the outcome was recorded on
    pub shift_id: ShiftId,

    /// Calendar day
    pub date: NaiveDate,

    /// Outcome
    pub outcome: Outcome,

    /// Manager notes
    pub notes: Option<String>,

    /// When last written
    pub recorded_at: Time,
}

impl StepProgress {
    /// Create a record for a natural key.
    pub fn new(key: ProgressKey, outcome: Outcome, notes: Option<String>, recorded_at: Time) -> Self {
        Self {
            id: ProgressId::new(),
            goal_id: key.goal_id,
            step_id: key.step_id,
            employee_id: key.employee_id,
            shift_id: key.shift_id,
            date: key.date,
            outcome,
            notes,
            recorded_at,
        }
    }

    /// The natural key of this record.
    pub fn key(&self) -> ProgressKey {
        ProgressKey {
            goal_id: self.goal_id,
            step_id: self.step_id,
            employee_id: self.employee_id,
            shift_id: self.shift_id,
            date: self.date,
        }
    }

    /// Whether notes carry any text.
    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().map_or(false, |n| !n.trim().is_empty())
    }
}

/// Filter for step progress queries.
#[derive(Debug, Clone, Default)]
pub struct ProgressFilter {
    /// Only this goal
    pub goal_id: Option<GoalId>,

    /// Only this employee
    pub employee_id: Option<EmployeeId>,

    /// Only this shift
    pub shift_id: Option<ShiftId>,

    /// Only this day
    pub date: Option<NaiveDate>,

    /// Only records on or after this day
    pub since: Option<NaiveDate>,
}

impl ProgressFilter {
    /// Records for one goal/employee on one day.
    pub fn for_day(goal_id: GoalId, employee_id: EmployeeId, date: NaiveDate) -> Self {
        Self {
            goal_id: Some(goal_id),
            employee_id: Some(employee_id),
            date: Some(date),
            ..Default::default()
        }
    }

    /// Records dated on or after a day.
    pub fn since(date: NaiveDate) -> Self {
        Self {
            since: Some(date),
            ..Default::default()
        }
    }

    /// Check whether a record passes this filter.
    pub fn matches(&self, record: &StepProgress) -> bool {
        self.goal_id.map_or(true, |id| record.goal_id == id)
            && self.employee_id.map_or(true, |id| record.employee_id == id)
            && self.shift_id.map_or(true, |id| record.shift_id == id)
            && self.date.map_or(true, |d| record.date == d)
            && self.since.map_or(true, |d| record.date >= d)
    }
}
