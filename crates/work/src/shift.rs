//! Shift management service.

use std::sync::Arc;
use async_trait::async_trait;
use shifttrack_core::{
    EmployeeId, GoalId, GoalStatus, Outcome, ProgressFilter, ProgressKey, ShiftRoster,
    ShiftSummary, StepId, StepProgress, SummaryFilter, SummaryId, UserId,
};
use shifttrack_progress::{evaluate_daily_outcome, DailyEvaluation};
use shifttrack_storage::{Storage, StorageError};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::context::WorkContext;
use crate::error::{Result, WorkError};

/// Shift lifecycle and outcome recording.
#[async_trait]
pub trait ShiftManager: Send + Sync {
    /// Open a shift with the selected employees.
    async fn start_shift(&self, spec: ShiftSpec) -> Result<ShiftRoster>;

    /// Close the active shift.
    async fn end_shift(&self) -> Result<ShiftRoster>;

    /// The active shift, if any.
    async fn active_shift(&self) -> Result<Option<ShiftRoster>>;

    /// Record one step outcome and re-evaluate the goal for today.
    async fn record_step_outcome(&self, input: StepOutcomeInput) -> Result<RecordedOutcome>;

    /// Create or replace today's summary for an employee on the active shift.
    async fn save_shift_summary(&self, employee_id: EmployeeId, summary: String) -> Result<ShiftSummary>;
}

/// Specification for starting a shift.
#[derive(Debug, Clone)]
pub struct ShiftSpec {
    /// Manager running the shift
    pub manager_id: UserId,
    /// Employees present
    pub employee_ids: Vec<EmployeeId>,
    /// Store location
    pub location: Option<String>,
}

/// One outcome as entered by a manager.
#[derive(Debug, Clone)]
pub struct StepOutcomeInput {
    /// Employee performing the step
    pub employee_id: EmployeeId,
    /// Goal the step belongs to
    pub goal_id: GoalId,
    /// Step performed
    pub step_id: StepId,
    /// Outcome
    pub outcome: Outcome,
    /// Notes, required for verbal prompts
    pub notes: Option<String>,
}

/// Result of recording an outcome.
#[derive(Debug, Clone)]
pub struct RecordedOutcome {
    /// Stored record
    pub record: StepProgress,
    /// Whether an earlier record with the same key was replaced
    pub replaced: bool,
    /// Engine result for the goal after this write
    pub evaluation: DailyEvaluation,
}

/// Basic shift manager implementation.
pub struct BasicShiftManager<S: Storage> {
    storage: Arc<Mutex<S>>,
    ctx: WorkContext,
}

impl<S: Storage> BasicShiftManager<S> {
    /// Create a new shift manager owning its storage.
    pub fn new(storage: S) -> Self {
        Self::from_shared(Arc::new(Mutex::new(storage)))
    }

    /// Create a shift manager over storage shared with other services.
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

    async fn require_active_shift(&self, storage: &S) -> Result<ShiftRoster> {
        storage.load_active_shift().await?.ok_or(WorkError::NoActiveShift)
    }
}

#[async_trait]
impl<S: Storage + 'static> ShiftManager for BasicShiftManager<S> {
    async fn start_shift(&self, spec: ShiftSpec) -> Result<ShiftRoster> {
        let mut employee_ids = Vec::with_capacity(spec.employee_ids.len());
        for id in spec.employee_ids {
            if !employee_ids.contains(&id) {
                employee_ids.push(id);
            }
        }
        if employee_ids.is_empty() {
            return Err(WorkError::EmptyRoster);
        }

        let mut storage = self.storage.lock().await;

        if let Some(active) = storage.load_active_shift().await? {
            warn!(active = %active.id, "shift start rejected, one is already open");
            return Err(WorkError::ShiftAlreadyActive);
        }

        let manager = storage
            .load_user(spec.manager_id)
            .await?
            .ok_or_else(|| WorkError::not_found("user", spec.manager_id))?;
        if !manager.is_active {
            return Err(WorkError::InvalidInput(format!("user {} is inactive", manager.id)));
        }

        for id in &employee_ids {
            let employee = storage
                .load_employee(*id)
                .await?
                .ok_or_else(|| WorkError::not_found("employee", id))?;
            if !employee.is_active {
                return Err(WorkError::EmployeeInactive(*id));
            }
        }

        let shift = ShiftRoster::start(manager.id, employee_ids, spec.location, self.ctx.clock.now());
        match storage.save_shift(&shift).await {
            Ok(()) => {}
            Err(StorageError::Conflict(_)) => return Err(WorkError::ShiftAlreadyActive),
            Err(e) => return Err(e.into()),
        }
        storage.commit("Start shift").await?;

        info!(shift = %shift.id, employees = shift.employee_ids.len(), "shift started");
        Ok(shift)
    }

    async fn end_shift(&self) -> Result<ShiftRoster> {
        let mut storage = self.storage.lock().await;
        let mut shift = self.require_active_shift(&storage).await?;

        shift.end(self.ctx.clock.now());
        storage.save_shift(&shift).await?;
        storage.commit("End shift").await?;

        info!(shift = %shift.id, "shift ended");
        Ok(shift)
    }

    async fn active_shift(&self) -> Result<Option<ShiftRoster>> {
        Ok(self.storage.lock().await.load_active_shift().await?)
    }

    async fn record_step_outcome(&self, input: StepOutcomeInput) -> Result<RecordedOutcome> {
        let notes = input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if input.outcome == Outcome::VerbalPrompt && notes.is_none() {
            return Err(WorkError::NotesRequired);
        }

        let mut storage = self.storage.lock().await;
        let shift = self.require_active_shift(&storage).await?;
        if !shift.includes(input.employee_id) {
            return Err(WorkError::NotOnShift(input.employee_id));
        }

        let goal = storage
            .load_goal(input.goal_id)
            .await?
            .ok_or_else(|| WorkError::not_found("goal", input.goal_id))?;
        if goal.employee_id != input.employee_id {
            return Err(WorkError::GoalNotOwned(input.employee_id));
        }
        if goal.status == GoalStatus::Archived {
            return Err(WorkError::GoalArchived);
        }
        if goal.step(input.step_id).is_none() {
            return Err(WorkError::StepNotInGoal);
        }

        let now = self.ctx.clock.now();
        let today = now.date_naive();
        let key = ProgressKey {
            goal_id: goal.id,
            step_id: input.step_id,
            employee_id: input.employee_id,
            shift_id: shift.id,
            date: today,
        };

        // Same natural key overwrites the earlier record.
        let day_filter = ProgressFilter {
            shift_id: Some(shift.id),
            ..ProgressFilter::for_day(goal.id, input.employee_id, today)
        };
        let existing = storage
            .list_step_progress(&day_filter)
            .await?
            .into_iter()
            .find(|r| r.key() == key);
        let replaced = existing.is_some();

        let mut record = StepProgress::new(key, input.outcome, notes, now);
        if let Some(existing) = existing {
            record.id = existing.id;
        }
        storage.save_step_progress(&record).await?;

        let todays = storage
            .list_step_progress(&ProgressFilter::for_day(goal.id, input.employee_id, today))
            .await?;
        let mut evaluation = evaluate_daily_outcome(&goal, &todays, today, &self.ctx.config.policy);
        if evaluation.goal != goal {
            evaluation.goal.updated_at = now;
            if let Err(e) = storage.save_goal(&evaluation.goal).await {
                warn!(goal = %goal.id, error = %e, "goal save failed, rolling back outcome");
                storage.rollback().await?;
                return Err(e.into());
            }
        }
        storage.commit("Record step outcome").await?;

        info!(
            goal = %goal.id,
            step = %input.step_id,
            outcome = %input.outcome,
            streak = evaluation.goal.consecutive_all_correct,
            "step outcome recorded"
        );

        Ok(RecordedOutcome {
            record,
            replaced,
            evaluation,
        })
    }

    async fn save_shift_summary(&self, employee_id: EmployeeId, summary: String) -> Result<ShiftSummary> {
        let mut storage = self.storage.lock().await;
        let shift = self.require_active_shift(&storage).await?;
        if !shift.includes(employee_id) {
            return Err(WorkError::NotOnShift(employee_id));
        }

        let now = self.ctx.clock.now();
        let today = now.date_naive();
        let filter = SummaryFilter {
            employee_id: Some(employee_id),
            shift_id: Some(shift.id),
            date: Some(today),
        };

        let record = match storage.list_shift_summaries(&filter).await?.into_iter().next() {
            Some(mut existing) => {
                existing.summary = summary;
                existing.updated_at = now;
                existing
            }
            None => ShiftSummary {
                id: SummaryId::new(),
                employee_id,
                shift_id: shift.id,
                date: today,
                summary,
                created_at: now,
                updated_at: now,
            },
        };

        storage.save_shift_summary(&record).await?;
        storage.commit("Save shift summary").await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shifttrack_core::{
        Clock, DevelopmentGoal, Employee, FixedClock, Role, StepBlueprint, User,
    };
    use shifttrack_storage::MemoryStorage;

    struct Fixture {
        manager: BasicShiftManager<MemoryStorage>,
        storage: Arc<Mutex<MemoryStorage>>,
        clock: Arc<FixedClock>,
        user: User,
        employee: Employee,
        goal: DevelopmentGoal,
    }

    async fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(
            chrono::Utc.with_ymd_and_hms(2025, 5, 1, 16, 0, 0).unwrap(),
        ));
        let mut storage = MemoryStorage::new();

        let user = User::new("manager@goldenscoop.com", "Mike Chen", Role::ShiftManager);
        storage.save_user(&user).await.unwrap();

        let employee = Employee::new("Sally Martinez", "Super Scooper");
        storage.save_employee(&employee).await.unwrap();

        let goal = DevelopmentGoal::new(
            employee.id,
            "Customer Greeting Skills",
            "Greet every customer",
            clock.today(),
            clock.today() + chrono::Duration::days(90),
            &[
                StepBlueprint::required("Makes eye contact"),
                StepBlueprint::required("Says welcome"),
            ],
        );
        storage.save_goal(&goal).await.unwrap();

        let storage = Arc::new(Mutex::new(storage));
        let manager = BasicShiftManager::from_shared(storage.clone())
            .with_context(WorkContext::new().with_clock(clock.clone()));

        Fixture {
            manager,
            storage,
            clock,
            user,
            employee,
            goal,
        }
    }

    fn spec(f: &Fixture) -> ShiftSpec {
        ShiftSpec {
            manager_id: f.user.id,
            employee_ids: vec![f.employee.id],
            location: Some("9540 Nall Avenue".to_string()),
        }
    }

    fn outcome(f: &Fixture, step: usize, outcome: Outcome, notes: Option<&str>) -> StepOutcomeInput {
        StepOutcomeInput {
            employee_id: f.employee.id,
            goal_id: f.goal.id,
            step_id: f.goal.steps[step].id,
            outcome,
            notes: notes.map(str::to_string),
        }
    }

    async fn full_day(f: &Fixture) -> RecordedOutcome {
        f.manager.record_step_outcome(outcome(f, 0, Outcome::Correct, None)).await.unwrap();
        f.manager.record_step_outcome(outcome(f, 1, Outcome::Correct, None)).await.unwrap()
    }

    #[tokio::test]
    async fn test_start_and_end_shift() {
        let f = fixture().await;
        let shift = f.manager.start_shift(spec(&f)).await.unwrap();
        assert!(shift.is_active);
        assert_eq!(f.manager.active_shift().await.unwrap().unwrap().id, shift.id);

        let ended = f.manager.end_shift().await.unwrap();
        assert!(!ended.is_active);
        assert!(ended.ended_at.is_some());
        assert!(f.manager.active_shift().await.unwrap().is_none());
        assert!(matches!(f.manager.end_shift().await, Err(WorkError::NoActiveShift)));
    }

    #[tokio::test]
    async fn test_only_one_active_shift() {
        let f = fixture().await;
        f.manager.start_shift(spec(&f)).await.unwrap();
        let err = f.manager.start_shift(spec(&f)).await.unwrap_err();
        assert!(matches!(err, WorkError::ShiftAlreadyActive));
    }

    #[tokio::test]
    async fn test_start_shift_preconditions() {
        let f = fixture().await;
        let empty = ShiftSpec {
            employee_ids: vec![],
            ..spec(&f)
        };
        assert!(matches!(f.manager.start_shift(empty).await, Err(WorkError::EmptyRoster)));

        let mut inactive = Employee::new("Aisha Patel", "Super Scooper");
        inactive.deactivate();
        f.storage.lock().await.save_employee(&inactive).await.unwrap();
        let with_inactive = ShiftSpec {
            employee_ids: vec![f.employee.id, inactive.id],
            ..spec(&f)
        };
        assert!(matches!(
            f.manager.start_shift(with_inactive).await,
            Err(WorkError::EmployeeInactive(id)) if id == inactive.id
        ));

        let unknown_manager = ShiftSpec {
            manager_id: UserId::new(),
            ..spec(&f)
        };
        assert!(matches!(
            f.manager.start_shift(unknown_manager).await,
            Err(WorkError::NotFound { kind: "user", .. })
        ));
    }

    #[tokio::test]
    async fn test_record_requires_active_shift() {
        let f = fixture().await;
        let err = f
            .manager
            .record_step_outcome(outcome(&f, 0, Outcome::Correct, None))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::NoActiveShift));
    }

    #[tokio::test]
    async fn test_verbal_prompt_needs_notes() {
        let f = fixture().await;
        f.manager.start_shift(spec(&f)).await.unwrap();
        let err = f
            .manager
            .record_step_outcome(outcome(&f, 0, Outcome::VerbalPrompt, Some("  ")))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::NotesRequired));

        let ok = f
            .manager
            .record_step_outcome(outcome(&f, 0, Outcome::VerbalPrompt, Some("needed reminder")))
            .await
            .unwrap();
        assert_eq!(ok.record.notes.as_deref(), Some("needed reminder"));
    }

    #[tokio::test]
    async fn test_full_day_increments_streak() {
        let f = fixture().await;
        f.manager.start_shift(spec(&f)).await.unwrap();

        let first = f
            .manager
            .record_step_outcome(outcome(&f, 0, Outcome::Correct, None))
            .await
            .unwrap();
        assert_eq!(first.evaluation.goal.consecutive_all_correct, 0);

        let second = f
            .manager
            .record_step_outcome(outcome(&f, 1, Outcome::Correct, None))
            .await
            .unwrap();
        assert!(second.evaluation.all_correct_today);
        assert_eq!(second.evaluation.goal.consecutive_all_correct, 1);

        let stored = f.storage.lock().await.load_goal(f.goal.id).await.unwrap().unwrap();
        assert_eq!(stored.consecutive_all_correct, 1);
        assert_eq!(stored.updated_at, f.clock.now());
    }

    #[tokio::test]
    async fn test_rerecord_overwrites_and_rederives() {
        let f = fixture().await;
        f.manager.start_shift(spec(&f)).await.unwrap();
        full_day(&f).await;

        let corrected = f
            .manager
            .record_step_outcome(outcome(&f, 1, Outcome::VerbalPrompt, Some("prompted")))
            .await
            .unwrap();
        assert!(corrected.replaced);
        assert_eq!(corrected.evaluation.goal.consecutive_all_correct, 0);

        let storage = f.storage.lock().await;
        let records = storage
            .list_step_progress(&ProgressFilter {
                goal_id: Some(f.goal.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_repeat_correct_does_not_double_count() {
        let f = fixture().await;
        f.manager.start_shift(spec(&f)).await.unwrap();
        full_day(&f).await;
        let again = full_day(&f).await;
        assert_eq!(again.evaluation.goal.consecutive_all_correct, 1);
    }

    #[tokio::test]
    async fn test_mastery_over_three_days() {
        let f = fixture().await;
        let mut last = None;
        for _ in 0..3 {
            f.manager.start_shift(spec(&f)).await.unwrap();
            last = Some(full_day(&f).await);
            f.manager.end_shift().await.unwrap();
            f.clock.advance_days(1);
        }
        let last = last.unwrap();
        assert!(last.evaluation.reached_mastery);
        assert_eq!(last.evaluation.goal.status, GoalStatus::Maintenance);
        assert_eq!(
            last.evaluation.goal.mastery_date,
            Some(chrono::NaiveDate::from_ymd_opt(2025, 5, 3).unwrap())
        );
    }

    #[tokio::test]
    async fn test_record_validation() {
        let f = fixture().await;
        f.manager.start_shift(spec(&f)).await.unwrap();

        let bad_step = StepOutcomeInput {
            step_id: StepId::new(),
            ..outcome(&f, 0, Outcome::Correct, None)
        };
        assert!(matches!(
            f.manager.record_step_outcome(bad_step).await,
            Err(WorkError::StepNotInGoal)
        ));

        let stranger = Employee::new("Marcus Johnson", "Super Scooper");
        let off_shift = StepOutcomeInput {
            employee_id: stranger.id,
            ..outcome(&f, 0, Outcome::Correct, None)
        };
        assert!(matches!(
            f.manager.record_step_outcome(off_shift).await,
            Err(WorkError::NotOnShift(_))
        ));

        let mut archived = f.goal.clone();
        archived.status = GoalStatus::Archived;
        f.storage.lock().await.save_goal(&archived).await.unwrap();
        assert!(matches!(
            f.manager.record_step_outcome(outcome(&f, 0, Outcome::Correct, None)).await,
            Err(WorkError::GoalArchived)
        ));
    }

    #[tokio::test]
    async fn test_summary_upsert() {
        let f = fixture().await;
        f.manager.start_shift(spec(&f)).await.unwrap();

        let first = f
            .manager
            .save_shift_summary(f.employee.id, "Great energy today".to_string())
            .await
            .unwrap();
        let second = f
            .manager
            .save_shift_summary(f.employee.id, "Great energy, needed one break".to_string())
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.summary, "Great energy, needed one break");

        let all = f
            .storage
            .lock()
            .await
            .list_shift_summaries(&SummaryFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    /// Memory storage whose goal writes fail, counting rollbacks.
    struct GoalWritesFail {
        inner: MemoryStorage,
        rollbacks: usize,
    }

    #[async_trait]
    impl Storage for GoalWritesFail {
        async fn save_employee(&mut self, employee: &Employee) -> shifttrack_storage::Result<()> {
            self.inner.save_employee(employee).await
        }
        async fn load_employee(&self, id: EmployeeId) -> shifttrack_storage::Result<Option<Employee>> {
            self.inner.load_employee(id).await
        }
        async fn list_employees(
            &self,
            filter: &shifttrack_core::EmployeeFilter,
        ) -> shifttrack_storage::Result<Vec<Employee>> {
            self.inner.list_employees(filter).await
        }
        async fn save_user(&mut self, user: &User) -> shifttrack_storage::Result<()> {
            self.inner.save_user(user).await
        }
        async fn load_user(&self, id: UserId) -> shifttrack_storage::Result<Option<User>> {
            self.inner.load_user(id).await
        }
        async fn list_users(&self) -> shifttrack_storage::Result<Vec<User>> {
            self.inner.list_users().await
        }
        async fn save_goal(&mut self, _goal: &DevelopmentGoal) -> shifttrack_storage::Result<()> {
            Err(StorageError::Other("disk full".to_string()))
        }
        async fn load_goal(&self, id: GoalId) -> shifttrack_storage::Result<Option<DevelopmentGoal>> {
            self.inner.load_goal(id).await
        }
        async fn list_goals(
            &self,
            filter: &shifttrack_core::GoalFilter,
        ) -> shifttrack_storage::Result<Vec<DevelopmentGoal>> {
            self.inner.list_goals(filter).await
        }
        async fn save_template(&mut self, template: &shifttrack_core::GoalTemplate) -> shifttrack_storage::Result<()> {
            self.inner.save_template(template).await
        }
        async fn load_template(
            &self,
            id: shifttrack_core::TemplateId,
        ) -> shifttrack_storage::Result<Option<shifttrack_core::GoalTemplate>> {
            self.inner.load_template(id).await
        }
        async fn list_templates(&self) -> shifttrack_storage::Result<Vec<shifttrack_core::GoalTemplate>> {
            self.inner.list_templates().await
        }
        async fn save_shift(&mut self, shift: &ShiftRoster) -> shifttrack_storage::Result<()> {
            self.inner.save_shift(shift).await
        }
        async fn load_shift(&self, id: shifttrack_core::ShiftId) -> shifttrack_storage::Result<Option<ShiftRoster>> {
            self.inner.load_shift(id).await
        }
        async fn load_active_shift(&self) -> shifttrack_storage::Result<Option<ShiftRoster>> {
            self.inner.load_active_shift().await
        }
        async fn save_step_progress(&mut self, record: &StepProgress) -> shifttrack_storage::Result<()> {
            self.inner.save_step_progress(record).await
        }
        async fn list_step_progress(&self, filter: &ProgressFilter) -> shifttrack_storage::Result<Vec<StepProgress>> {
            self.inner.list_step_progress(filter).await
        }
        async fn save_shift_summary(&mut self, summary: &ShiftSummary) -> shifttrack_storage::Result<()> {
            self.inner.save_shift_summary(summary).await
        }
        async fn list_shift_summaries(&self, filter: &SummaryFilter) -> shifttrack_storage::Result<Vec<ShiftSummary>> {
            self.inner.list_shift_summaries(filter).await
        }
        async fn commit(&mut self, message: &str) -> shifttrack_storage::Result<()> {
            self.inner.commit(message).await
        }
        async fn rollback(&mut self) -> shifttrack_storage::Result<()> {
            self.rollbacks += 1;
            self.inner.rollback().await
        }
    }

    #[tokio::test]
    async fn test_failed_goal_save_rolls_back() {
        let f = fixture().await;
        let inner = std::mem::replace(&mut *f.storage.lock().await, MemoryStorage::new());
        let storage = Arc::new(Mutex::new(GoalWritesFail { inner, rollbacks: 0 }));
        let manager = BasicShiftManager::from_shared(storage.clone())
            .with_context(WorkContext::new().with_clock(f.clock.clone()));

        manager.start_shift(spec(&f)).await.unwrap();
        let err = manager
            .record_step_outcome(outcome(&f, 0, Outcome::Correct, None))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkError::Storage(StorageError::Other(_))));
        assert_eq!(storage.lock().await.rollbacks, 1);
    }
}
