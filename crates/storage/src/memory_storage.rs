//! In-memory storage, for tests and throwaway sessions.

use std::collections::HashMap;
use async_trait::async_trait;
use shifttrack_core::{
    DevelopmentGoal, Employee, EmployeeFilter, EmployeeId, GoalFilter, GoalId, GoalTemplate,
    ProgressFilter, ProgressId, ShiftId, ShiftRoster, ShiftSummary, StepProgress, SummaryFilter,
    SummaryId, TemplateId, User, UserId,
};
use super::{Storage, StorageError, Result};

/// HashMap-backed storage. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    employees: HashMap<EmployeeId, Employee>,
    users: HashMap<UserId, User>,
    goals: HashMap<GoalId, DevelopmentGoal>,
    templates: HashMap<TemplateId, GoalTemplate>,
    shifts: HashMap<ShiftId, ShiftRoster>,
    step_progress: HashMap<ProgressId, StepProgress>,
    summaries: HashMap<SummaryId, ShiftSummary>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_employee(&mut self, employee: &Employee) -> Result<()> {
        self.employees.insert(employee.id, employee.clone());
        Ok(())
    }

    async fn load_employee(&self, id: EmployeeId) -> Result<Option<Employee>> {
        Ok(self.employees.get(&id).cloned())
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>> {
        let mut all: Vec<Employee> = self
            .employees
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn save_user(&mut self, user: &User) -> Result<()> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn load_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut all: Vec<User> = self.users.values().cloned().collect();
        all.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(all)
    }

    async fn save_goal(&mut self, goal: &DevelopmentGoal) -> Result<()> {
        self.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<DevelopmentGoal>> {
        Ok(self.goals.get(&id).cloned())
    }

    async fn list_goals(&self, filter: &GoalFilter) -> Result<Vec<DevelopmentGoal>> {
        let mut all: Vec<DevelopmentGoal> = self
            .goals
            .values()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect();
        all.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(all)
    }

    async fn save_template(&mut self, template: &GoalTemplate) -> Result<()> {
        self.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn load_template(&self, id: TemplateId) -> Result<Option<GoalTemplate>> {
        Ok(self.templates.get(&id).cloned())
    }

    async fn list_templates(&self) -> Result<Vec<GoalTemplate>> {
        let mut all: Vec<GoalTemplate> = self.templates.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn save_shift(&mut self, shift: &ShiftRoster) -> Result<()> {
        if shift.is_active {
            if let Some(other) = self.shifts.values().find(|s| s.is_active && s.id != shift.id) {
                return Err(StorageError::Conflict(format!(
                    "shift {} is already active",
                    other.id
                )));
            }
        }
        self.shifts.insert(shift.id, shift.clone());
        Ok(())
    }

    async fn load_shift(&self, id: ShiftId) -> Result<Option<ShiftRoster>> {
        Ok(self.shifts.get(&id).cloned())
    }

    async fn load_active_shift(&self) -> Result<Option<ShiftRoster>> {
        Ok(self.shifts.values().find(|s| s.is_active).cloned())
    }

    async fn save_step_progress(&mut self, record: &StepProgress) -> Result<()> {
        self.step_progress.insert(record.id, record.clone());
        Ok(())
    }

    async fn list_step_progress(&self, filter: &ProgressFilter) -> Result<Vec<StepProgress>> {
        let mut all: Vec<StepProgress> = self
            .step_progress
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        all.sort_by(|a, b| (a.date, a.recorded_at).cmp(&(b.date, b.recorded_at)));
        Ok(all)
    }

    async fn save_shift_summary(&mut self, summary: &ShiftSummary) -> Result<()> {
        self.summaries.insert(summary.id, summary.clone());
        Ok(())
    }

    async fn list_shift_summaries(&self, filter: &SummaryFilter) -> Result<Vec<ShiftSummary>> {
        let mut all: Vec<ShiftSummary> = self
            .summaries
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        all.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(all)
    }

    async fn commit(&mut self, _message: &str) -> Result<()> {
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        Ok(())
    }
}
