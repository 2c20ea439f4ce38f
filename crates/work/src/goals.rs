//! Goal assignment and lifecycle.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use shifttrack_core::{
    DevelopmentGoal, Employee, EmployeeId, GoalFilter, GoalId, GoalStatus, StepBlueprint,
    TemplateId, TemplateStatus,
};
use shifttrack_storage::Storage;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::context::WorkContext;
use crate::error::{Result, WorkError};

/// Goal management service.
#[async_trait]
pub trait GoalManager: Send + Sync {
    /// Copy a template into a new active goal for an employee.
    async fn assign_from_template(
        &self,
        employee_id: EmployeeId,
        template_id: TemplateId,
    ) -> Result<DevelopmentGoal>;

    /// Create a custom goal.
    async fn create_goal(&self, spec: GoalSpec) -> Result<DevelopmentGoal>;

    /// Edit a goal's title, description or target date.
    ///
    /// Steps, streak and mastery are left as they are.
    async fn update_goal(&self, goal_id: GoalId, update: GoalUpdate) -> Result<DevelopmentGoal>;

    /// Retire a goal. Archived goals no longer count toward the active limit.
    async fn archive_goal(&self, goal_id: GoalId) -> Result<DevelopmentGoal>;

    /// Fetch one goal.
    async fn get_goal(&self, goal_id: GoalId) -> Result<DevelopmentGoal>;

    /// Goals matching a filter.
    async fn list_goals(&self, filter: GoalFilter) -> Result<Vec<DevelopmentGoal>>;
}

/// Specification for a custom goal.
#[derive(Debug, Clone)]
pub struct GoalSpec {
    /// Owner
    pub employee_id: EmployeeId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Target date; defaults to today plus the configured number of days
    pub target_end_date: Option<NaiveDate>,
    /// Steps in order
    pub steps: Vec<StepBlueprint>,
}

/// Partial goal update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New target date, not before the start date
    pub target_end_date: Option<NaiveDate>,
}

/// Basic goal manager implementation.
pub struct BasicGoalManager<S: Storage> {
    storage: Arc<Mutex<S>>,
    ctx: WorkContext,
}

impl<S: Storage> BasicGoalManager<S> {
    /// Create a new goal manager owning its storage.
    pub fn new(storage: S) -> Self {
        Self::from_shared(Arc::new(Mutex::new(storage)))
    }

    /// Create a goal manager over storage shared with other services.
    pub fn from_shared(storage: Arc<Mutex<S>>) -> Self {
        Self {
            storage,
            ctx: WorkContext::default(),
        }
    }

    /// Set context.
    pub fn with_context(mut self, ctx: WorkContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Load an active employee and check the active-goal limit.
    async fn check_assignable(&self, storage: &S, employee_id: EmployeeId) -> Result<Employee> {
        let employee = storage
            .load_employee(employee_id)
            .await?
            .ok_or_else(|| WorkError::not_found("employee", employee_id))?;
        if !employee.is_active {
            return Err(WorkError::EmployeeInactive(employee_id));
        }

        let filter = GoalFilter::for_employee(employee_id).with_status(GoalStatus::Active);
        let active = storage.list_goals(&filter).await?.len();
        let limit = self.ctx.config.max_active_goals;
        if active >= limit {
            debug!(employee = %employee_id, active, limit, "active goal limit reached");
            return Err(WorkError::ActiveGoalLimit {
                employee: employee_id,
                limit,
            });
        }
        Ok(employee)
    }
}

fn ensure_required_step(steps: &[StepBlueprint]) -> Result<()> {
    if steps.iter().any(|s| s.is_required) {
        Ok(())
    } else {
        Err(WorkError::NoRequiredSteps)
    }
}

#[async_trait]
impl<S: Storage + 'static> GoalManager for BasicGoalManager<S> {
    async fn assign_from_template(
        &self,
        employee_id: EmployeeId,
        template_id: TemplateId,
    ) -> Result<DevelopmentGoal> {
        let mut storage = self.storage.lock().await;

        let template = storage
            .load_template(template_id)
            .await?
            .ok_or_else(|| WorkError::not_found("template", template_id))?;
        if template.status == TemplateStatus::Archived {
            return Err(WorkError::TemplateArchived);
        }
        ensure_required_step(&template.steps)?;

        self.check_assignable(&storage, employee_id).await?;

        let goal = template.instantiate(employee_id, self.ctx.clock.today());
        storage.save_goal(&goal).await?;
        storage.commit(&format!("Assign goal: {}", goal.title)).await?;

        info!(goal = %goal.id, employee = %employee_id, template = %template.id, "goal assigned");
        Ok(goal)
    }

    async fn create_goal(&self, spec: GoalSpec) -> Result<DevelopmentGoal> {
        let title = spec.title.trim();
        if title.is_empty() {
            return Err(WorkError::InvalidInput("goal title is empty".to_string()));
        }
        ensure_required_step(&spec.steps)?;

        let mut storage = self.storage.lock().await;
        self.check_assignable(&storage, spec.employee_id).await?;

        let today = self.ctx.clock.today();
        let target = match spec.target_end_date {
            Some(date) => date,
            None => {
                let days = self.ctx.config.default_target_days;
                today
                    .checked_add_signed(Duration::days(i64::from(days)))
                    .ok_or_else(|| {
                        WorkError::InvalidInput(format!("{} days to target is out of range", days))
                    })?
            }
        };
        if target < today {
            return Err(WorkError::InvalidInput(format!(
                "target date {} is before start date {}",
                target, today
            )));
        }

        let goal = DevelopmentGoal::new(
            spec.employee_id,
            title,
            spec.description,
            today,
            target,
            &spec.steps,
        );
        storage.save_goal(&goal).await?;
        storage.commit(&format!("Create goal: {}", goal.title)).await?;

        info!(goal = %goal.id, employee = %goal.employee_id, steps = goal.steps.len(), "goal created");
        Ok(goal)
    }

    async fn update_goal(&self, goal_id: GoalId, update: GoalUpdate) -> Result<DevelopmentGoal> {
        let mut storage = self.storage.lock().await;
        let mut goal = storage
            .load_goal(goal_id)
            .await?
            .ok_or_else(|| WorkError::not_found("goal", goal_id))?;
        if goal.status == GoalStatus::Archived {
            return Err(WorkError::GoalArchived);
        }

        if let Some(title) = update.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(WorkError::InvalidInput("goal title is empty".to_string()));
            }
            goal.title = title.to_string();
        }
        if let Some(description) = update.description {
            goal.description = description;
        }
        if let Some(target) = update.target_end_date {
            if target < goal.start_date {
                return Err(WorkError::InvalidInput(format!(
                    "target date {} is before start date {}",
                    target, goal.start_date
                )));
            }
            goal.target_end_date = target;
        }
        goal.updated_at = self.ctx.clock.now();

        storage.save_goal(&goal).await?;
        storage.commit(&format!("Update goal: {}", goal.title)).await?;

        info!(goal = %goal.id, "goal updated");
        Ok(goal)
    }

    async fn archive_goal(&self, goal_id: GoalId) -> Result<DevelopmentGoal> {
        let mut storage = self.storage.lock().await;
        let mut goal = storage
            .load_goal(goal_id)
            .await?
            .ok_or_else(|| WorkError::not_found("goal", goal_id))?;

        goal.transition(GoalStatus::Archived)?;
        goal.updated_at = self.ctx.clock.now();
        storage.save_goal(&goal).await?;
        storage.commit(&format!("Archive goal: {}", goal.title)).await?;

        info!(goal = %goal.id, "goal archived");
        Ok(goal)
    }

    async fn get_goal(&self, goal_id: GoalId) -> Result<DevelopmentGoal> {
        self.storage
            .lock()
            .await
            .load_goal(goal_id)
            .await?
            .ok_or_else(|| WorkError::not_found("goal", goal_id))
    }

    async fn list_goals(&self, filter: GoalFilter) -> Result<Vec<DevelopmentGoal>> {
        Ok(self.storage.lock().await.list_goals(&filter).await?)
    }
}
