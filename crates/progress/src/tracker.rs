//! Progress tracking service.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDate;
use shifttrack_core::{
    DevelopmentGoal, EmployeeFilter, EmployeeId, GoalFilter, GoalId, ProgressFilter, StepProgress,
};
use shifttrack_storage::{Result, Storage, StorageError};
use tokio::sync::Mutex;

use crate::aggregate::{
    goals_near_mastery, recent_progress, window_start, DailyTally, DashboardStats,
    EmployeeGoalStats,
};
use crate::engine::MasteryPolicy;

/// Read-side progress queries over storage.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Dashboard numbers as of `today`.
    async fn dashboard(&self, today: NaiveDate) -> Result<DashboardStats>;

    /// Active goals near mastery.
    async fn near_mastery(&self) -> Result<Vec<DevelopmentGoal>>;

    /// Goal counts for one employee.
    async fn employee_stats(&self, employee_id: EmployeeId) -> Result<EmployeeGoalStats>;

    /// Required-step tally for a goal on one day.
    async fn daily_tally(&self, goal_id: GoalId, date: NaiveDate) -> Result<DailyTally>;

    /// Most recent outcomes for a goal, newest first.
    async fn goal_history(&self, goal_id: GoalId, limit: usize) -> Result<Vec<StepProgress>>;
}

/// Progress tracker reading from a shared storage handle.
pub struct BasicProgressTracker<S: Storage> {
    storage: Arc<Mutex<S>>,
    policy: MasteryPolicy,
    success_window_days: u32,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker owning its storage.
    pub fn new(storage: S) -> Self {
        Self::from_shared(Arc::new(Mutex::new(storage)))
    }

    /// Create a tracker over storage shared with other services.
    pub fn from_shared(storage: Arc<Mutex<S>>) -> Self {
        Self {
            storage,
            policy: MasteryPolicy::default(),
            success_window_days: 7,
        }
    }

    /// Set the mastery policy.
    pub fn with_policy(mut self, policy: MasteryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the trailing window used for the success rate.
    pub fn with_success_window(mut self, days: u32) -> Self {
        self.success_window_days = days;
        self
    }

    async fn require_goal(&self, goal_id: GoalId) -> Result<DevelopmentGoal> {
        self.storage
            .lock()
            .await
            .load_goal(goal_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("goal {}", goal_id)))
    }
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn dashboard(&self, today: NaiveDate) -> Result<DashboardStats> {
        let since = window_start(today, self.success_window_days);
        let storage = self.storage.lock().await;

        let employees = storage.list_employees(&EmployeeFilter::default()).await?;
        let goals = storage.list_goals(&GoalFilter::default()).await?;
        let records = storage.list_step_progress(&ProgressFilter::since(since)).await?;
        let shift_open = storage.load_active_shift().await?.is_some();

        Ok(DashboardStats::compute(
            &employees,
            &goals,
            &records,
            since,
            shift_open,
            &self.policy,
        ))
    }

    async fn near_mastery(&self) -> Result<Vec<DevelopmentGoal>> {
        let goals = self.storage.lock().await.list_goals(&GoalFilter::default()).await?;
        Ok(goals_near_mastery(&goals, &self.policy)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn employee_stats(&self, employee_id: EmployeeId) -> Result<EmployeeGoalStats> {
        let goals = self
            .storage
            .lock()
            .await
            .list_goals(&GoalFilter::for_employee(employee_id))
            .await?;
        Ok(EmployeeGoalStats::compute(employee_id, &goals))
    }

    async fn daily_tally(&self, goal_id: GoalId, date: NaiveDate) -> Result<DailyTally> {
        let goal = self.require_goal(goal_id).await?;
        let records = self
            .storage
            .lock()
            .await
            .list_step_progress(&ProgressFilter::for_day(goal.id, goal.employee_id, date))
            .await?;
        Ok(DailyTally::compute(&goal, &records, date))
    }

    async fn goal_history(&self, goal_id: GoalId, limit: usize) -> Result<Vec<StepProgress>> {
        let filter = ProgressFilter {
            goal_id: Some(goal_id),
            ..Default::default()
        };
        let records = self.storage.lock().await.list_step_progress(&filter).await?;
        Ok(recent_progress(&records, goal_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shifttrack_core::{
        Employee, GoalStatus, Outcome, ProgressKey, ShiftId, StepBlueprint,
    };
    use shifttrack_storage::MemoryStorage;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    async fn seeded() -> (BasicProgressTracker<MemoryStorage>, DevelopmentGoal) {
        let mut storage = MemoryStorage::new();
        let employee = Employee::new("Alex Thompson", "Super Scooper");
        storage.save_employee(&employee).await.unwrap();

        let mut goal = DevelopmentGoal::new(
            employee.id,
            "Phone Answering Protocol",
            "Answer the phone",
            day(1),
            day(30),
            &[StepBlueprint::required("Picks up"), StepBlueprint::required("Greets")],
        );
        goal.consecutive_all_correct = 2;
        storage.save_goal(&goal).await.unwrap();

        for (step, outcome) in [(0, Outcome::Correct), (1, Outcome::VerbalPrompt)] {
            let key = ProgressKey {
                goal_id: goal.id,
                step_id: goal.steps[step].id,
                employee_id: employee.id,
                shift_id: ShiftId::new(),
                date: day(10),
            };
            storage
                .save_step_progress(&StepProgress::new(key, outcome, None, chrono::Utc::now()))
                .await
                .unwrap();
        }

        (BasicProgressTracker::new(storage), goal)
    }

    #[tokio::test]
    async fn test_dashboard_from_storage() {
        let (tracker, goal) = seeded().await;
        let stats = tracker.dashboard(day(12)).await.unwrap();
        assert_eq!(stats.active_employees, 1);
        assert_eq!(stats.active_goals, 1);
        assert_eq!(stats.success_rate_percent, 50);
        assert_eq!(stats.near_mastery, vec![goal.id]);
        assert!(!stats.shift_open);
    }

    #[tokio::test]
    async fn test_success_window_excludes_old_records() {
        let (tracker, _) = seeded().await;
        let tracker = tracker.with_success_window(1);
        let stats = tracker.dashboard(day(20)).await.unwrap();
        assert_eq!(stats.success_rate_percent, 0);
    }

    #[tokio::test]
    async fn test_daily_tally_and_history() {
        let (tracker, goal) = seeded().await;
        let tally = tracker.daily_tally(goal.id, day(10)).await.unwrap();
        assert_eq!(tally.correct_required, 1);
        assert_eq!(tally.required_total, 2);

        let history = tracker.goal_history(goal.id, 10).await.unwrap();
        assert_eq!(history.len(), 2);

        let missing = tracker.daily_tally(GoalId::new(), day(10)).await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_employee_stats() {
        let (tracker, goal) = seeded().await;
        let stats = tracker.employee_stats(goal.employee_id).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.mastered, 0);

        let near = tracker.near_mastery().await.unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].status, GoalStatus::Active);
    }
}
