//! Goal templates - reusable blueprints copied into new goals.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use crate::goal::{DevelopmentGoal, StepBlueprint};
use crate::id::{EmployeeId, TemplateId};
use crate::Time;

/// Default mastery criteria text shown on new templates.
pub const DEFAULT_MASTERY_CRITERIA: &str = "3 consecutive shifts with all required steps Correct";

/// Upper bound on a template's days to target.
pub const MAX_TARGET_DAYS: u32 = 3650;

/// A reusable goal blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalTemplate {
    /// Unique identifier
    pub id: TemplateId,

    /// Template name, becomes the goal title
    pub name: String,

    /// Goal statement, becomes the goal description
    pub goal_statement: String,

    /// Human-readable mastery criteria
    pub default_mastery_criteria: String,

    /// Days from assignment to the target end date
    pub default_target_days: u32,

    /// Archived templates can't be assigned
    pub status: TemplateStatus,

    /// Ordered step blueprints
    pub steps: Vec<StepBlueprint>,

    /// When created
    pub created_at: Time,
}

impl GoalTemplate {
    /// Create a new active template.
    pub fn new(
        name: impl Into<String>,
        goal_statement: impl Into<String>,
        default_target_days: u32,
        steps: Vec<StepBlueprint>,
    ) -> Self {
        Self {
            id: TemplateId::new(),
            name: name.into(),
            goal_statement: goal_statement.into(),
            default_mastery_criteria: DEFAULT_MASTERY_CRITERIA.to_string(),
            default_target_days,
            status: TemplateStatus::Active,
            steps,
            created_at: chrono::Utc::now(),
        }
    }

    /// Copy this template into a new goal for an employee.
    ///
    /// The goal gets fresh step ids and keeps no reference back to the
    /// template, so later template edits never touch it. A target past the
    /// end of the calendar is clamped to the last representable date.
    pub fn instantiate(&self, employee_id: EmployeeId, start_date: NaiveDate) -> DevelopmentGoal {
        let target = start_date
            .checked_add_signed(Duration::days(i64::from(self.default_target_days)))
            .unwrap_or(NaiveDate::MAX);
        DevelopmentGoal::new(
            employee_id,
            self.name.clone(),
            self.goal_statement.clone(),
            start_date,
            target,
            &self.steps,
        )
    }
}

/// Template status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    /// Available for assignment
    Active,
    /// Hidden from assignment
    Archived,
}

impl std::fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateStatus::Active => f.write_str("active"),
            TemplateStatus::Archived => f.write_str("archived"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::GoalStatus;

    #[test]
    fn test_instantiate_copies_steps() {
        let template = GoalTemplate::new(
            "Ice Cream Flavors Knowledge",
            "State all current flavors and their mix-ins",
            90,
            vec![
                StepBlueprint::required("Vanilla"),
                StepBlueprint::required("Cookies and Cream"),
            ],
        );
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let goal = template.instantiate(EmployeeId::new(), start);

        assert_eq!(goal.title, template.name);
        assert_eq!(goal.description, template.goal_statement);
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.target_end_date, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(goal.steps.len(), 2);
        assert_eq!(goal.steps[1].description, "Cookies and Cream");
    }

    #[test]
    fn test_instantiate_clamps_huge_target() {
        let template = GoalTemplate::new("Greeting", "", u32::MAX, vec![StepBlueprint::required("Smile")]);
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let goal = template.instantiate(EmployeeId::new(), start);
        assert_eq!(goal.target_end_date, NaiveDate::MAX);
        assert!(goal.target_end_date >= goal.start_date);
    }

    #[test]
    fn test_instances_are_independent() {
        let template = GoalTemplate::new("Greeting", "Greet customers", 30, vec![StepBlueprint::required("Smile")]);
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let a = template.instantiate(EmployeeId::new(), start);
        let b = template.instantiate(EmployeeId::new(), start);
        assert_ne!(a.id, b.id);
        assert_ne!(a.steps[0].id, b.steps[0].id);
    }
}
