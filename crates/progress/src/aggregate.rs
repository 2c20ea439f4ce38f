//! Read-side aggregates for dashboards and employee views.

use std::collections::HashSet;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use shifttrack_core::{
    DevelopmentGoal, Employee, EmployeeId, GoalId, GoalStatus, Outcome, StepId, StepProgress,
};
use crate::engine::MasteryPolicy;

/// Active goals whose streak is at or past the near-mastery mark.
pub fn goals_near_mastery<'a>(
    goals: &'a [DevelopmentGoal],
    policy: &MasteryPolicy,
) -> Vec<&'a DevelopmentGoal> {
    goals
        .iter()
        .filter(|g| g.status == GoalStatus::Active)
        .filter(|g| g.consecutive_all_correct >= policy.near_mastery_streak)
        .collect()
}

/// First day of a trailing window of `days` days ending on `today`.
///
/// Windows reaching before the first representable date start there.
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Share of `Correct` records dated on or after `since`, across all goals.
///
/// Returns `None` when the window holds no records.
pub fn success_rate(records: &[StepProgress], since: NaiveDate) -> Option<f64> {
    let in_window: Vec<&StepProgress> = records.iter().filter(|r| r.date >= since).collect();
    if in_window.is_empty() {
        return None;
    }
    let correct = in_window.iter().filter(|r| r.outcome == Outcome::Correct).count();
    Some(correct as f64 / in_window.len() as f64)
}

/// Success rate as a whole percentage, 0 when the window is empty.
pub fn success_rate_percent(records: &[StepProgress], since: NaiveDate) -> u32 {
    success_rate(records, since)
        .map(|rate| (rate * 100.0).round() as u32)
        .unwrap_or(0)
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    /// Employees flagged active
    pub active_employees: usize,

    /// Goals in `Active` status
    pub active_goals: usize,

    /// Goals that ever reached mastery
    pub mastered_goals: usize,

    /// Correct share over the trailing window, in whole percent
    pub success_rate_percent: u32,

    /// Active goals one good day (or so) away from mastery
    pub near_mastery: Vec<GoalId>,

    /// Whether a shift is currently open
    pub shift_open: bool,
}

impl DashboardStats {
    /// Compute dashboard numbers from the full entity set.
    pub fn compute(
        employees: &[Employee],
        goals: &[DevelopmentGoal],
        records: &[StepProgress],
        since: NaiveDate,
        shift_open: bool,
        policy: &MasteryPolicy,
    ) -> Self {
        Self {
            active_employees: employees.iter().filter(|e| e.is_active).count(),
            active_goals: goals.iter().filter(|g| g.status == GoalStatus::Active).count(),
            mastered_goals: goals.iter().filter(|g| g.mastery_achieved).count(),
            success_rate_percent: success_rate_percent(records, since),
            near_mastery: goals_near_mastery(goals, policy).iter().map(|g| g.id).collect(),
            shift_open,
        }
    }
}

/// Goal counts for one employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmployeeGoalStats {
    /// Goals being worked on
    pub active: usize,
    /// Mastered goals kept up
    pub maintenance: usize,
    /// Retired goals
    pub archived: usize,
    /// Goals that ever reached mastery
    pub mastered: usize,
    /// All goals
    pub total: usize,
}

impl EmployeeGoalStats {
    /// Count goals belonging to `employee_id`.
    pub fn compute(employee_id: EmployeeId, goals: &[DevelopmentGoal]) -> Self {
        let mut stats = Self::default();
        for goal in goals.iter().filter(|g| g.employee_id == employee_id) {
            stats.total += 1;
            match goal.status {
                GoalStatus::Active => stats.active += 1,
                GoalStatus::Maintenance => stats.maintenance += 1,
                GoalStatus::Archived => stats.archived += 1,
            }
            if goal.mastery_achieved {
                stats.mastered += 1;
            }
        }
        stats
    }
}

/// Live "x of y required steps correct" view for a goal on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTally {
    /// Required steps recorded `Correct`
    pub correct_required: usize,
    /// Required steps on the goal
    pub required_total: usize,
    /// Steps with any outcome recorded
    pub recorded: usize,
}

impl DailyTally {
    /// Tally `records` for `goal` on `date`.
    pub fn compute(goal: &DevelopmentGoal, records: &[StepProgress], date: NaiveDate) -> Self {
        let required: HashSet<StepId> = goal.required_steps().map(|s| s.id).collect();
        let todays = records.iter().filter(|r| r.goal_id == goal.id && r.date == date);

        let mut recorded = HashSet::new();
        let mut correct = HashSet::new();
        for r in todays {
            recorded.insert(r.step_id);
            if r.outcome == Outcome::Correct && required.contains(&r.step_id) {
                correct.insert(r.step_id);
            }
        }

        Self {
            correct_required: correct.len(),
            required_total: required.len(),
            recorded: recorded.len(),
        }
    }

    /// Whether every required step is correct so far.
    pub fn all_correct(&self) -> bool {
        self.required_total > 0 && self.correct_required == self.required_total
    }
}

/// Most recent records for a goal, newest first.
pub fn recent_progress(records: &[StepProgress], goal_id: GoalId, limit: usize) -> Vec<StepProgress> {
    let mut matching: Vec<StepProgress> = records
        .iter()
        .filter(|r| r.goal_id == goal_id)
        .cloned()
        .collect();
    matching.sort_by(|a, b| (b.date, b.recorded_at).cmp(&(a.date, a.recorded_at)));
    matching.truncate(limit);
    matching
}

#[cfg(test)]
mod tests {
    use super::*;
    use shifttrack_core::{ProgressKey, ShiftId, StepBlueprint};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn goal_with_streak(employee_id: EmployeeId, streak: u32, status: GoalStatus) -> DevelopmentGoal {
        let mut goal = DevelopmentGoal::new(
            employee_id,
            "Goal",
            "",
            day(1),
            day(28),
            &[StepBlueprint::required("A"), StepBlueprint::required("B")],
        );
        goal.consecutive_all_correct = streak;
        goal.status = status;
        goal.mastery_achieved = status == GoalStatus::Maintenance;
        goal
    }

    fn record(goal: &DevelopmentGoal, step: usize, date: NaiveDate, outcome: Outcome) -> StepProgress {
        StepProgress::new(
            ProgressKey {
                goal_id: goal.id,
                step_id: goal.steps[step].id,
                employee_id: goal.employee_id,
                shift_id: ShiftId::new(),
                date,
            },
            outcome,
            None,
            chrono::Utc::now(),
        )
    }

    #[test]
    fn test_goals_near_mastery() {
        let e = EmployeeId::new();
        let goals = vec![
            goal_with_streak(e, 1, GoalStatus::Active),
            goal_with_streak(e, 2, GoalStatus::Active),
            goal_with_streak(e, 5, GoalStatus::Maintenance),
            goal_with_streak(e, 2, GoalStatus::Archived),
        ];
        let near = goals_near_mastery(&goals, &MasteryPolicy::default());
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id, goals[1].id);
    }

    #[test]
    fn test_success_rate_window() {
        let goal = goal_with_streak(EmployeeId::new(), 0, GoalStatus::Active);
        let records = vec![
            record(&goal, 0, day(1), Outcome::VerbalPrompt),
            record(&goal, 0, day(10), Outcome::Correct),
            record(&goal, 1, day(10), Outcome::Correct),
            record(&goal, 0, day(11), Outcome::Correct),
            record(&goal, 1, day(11), Outcome::NotApplicable),
        ];
        let since = window_start(day(14), 7);
        assert_eq!(since, day(7));
        assert_eq!(success_rate(&records, since), Some(0.75));
        assert_eq!(success_rate_percent(&records, since), 75);
        assert_eq!(success_rate(&records, day(1)), Some(0.6));
    }

    #[test]
    fn test_window_start_huge_window() {
        assert_eq!(window_start(day(1), u32::MAX), NaiveDate::MIN);
        assert_eq!(window_start(day(10), 0), day(10));
    }

    #[test]
    fn test_success_rate_empty_window() {
        assert_eq!(success_rate(&[], day(1)), None);
        assert_eq!(success_rate_percent(&[], day(1)), 0);
    }

    #[test]
    fn test_dashboard_stats() {
        let active = Employee::new("Sally", "Super Scooper");
        let mut gone = Employee::new("Aisha", "Super Scooper");
        gone.deactivate();
        let goals = vec![
            goal_with_streak(active.id, 2, GoalStatus::Active),
            goal_with_streak(active.id, 0, GoalStatus::Active),
            goal_with_streak(active.id, 5, GoalStatus::Maintenance),
        ];
        let records = vec![record(&goals[0], 0, day(10), Outcome::Correct)];

        let stats = DashboardStats::compute(
            &[active, gone],
            &goals,
            &records,
            day(3),
            true,
            &MasteryPolicy::default(),
        );
        assert_eq!(stats.active_employees, 1);
        assert_eq!(stats.active_goals, 2);
        assert_eq!(stats.mastered_goals, 1);
        assert_eq!(stats.success_rate_percent, 100);
        assert_eq!(stats.near_mastery, vec![goals[0].id]);
        assert!(stats.shift_open);
    }

    #[test]
    fn test_employee_goal_stats() {
        let e = EmployeeId::new();
        let goals = vec![
            goal_with_streak(e, 0, GoalStatus::Active),
            goal_with_streak(e, 3, GoalStatus::Maintenance),
            goal_with_streak(e, 0, GoalStatus::Archived),
            goal_with_streak(EmployeeId::new(), 0, GoalStatus::Active),
        ];
        let stats = EmployeeGoalStats::compute(e, &goals);
        assert_eq!(
            stats,
            EmployeeGoalStats {
                active: 1,
                maintenance: 1,
                archived: 1,
                mastered: 1,
                total: 3,
            }
        );
    }

    #[test]
    fn test_daily_tally() {
        let goal = goal_with_streak(EmployeeId::new(), 0, GoalStatus::Active);
        let records = vec![
            record(&goal, 0, day(5), Outcome::Correct),
            record(&goal, 1, day(5), Outcome::VerbalPrompt),
        ];
        let tally = DailyTally::compute(&goal, &records, day(5));
        assert_eq!(tally.correct_required, 1);
        assert_eq!(tally.required_total, 2);
        assert_eq!(tally.recorded, 2);
        assert!(!tally.all_correct());
    }

    #[test]
    fn test_recent_progress_newest_first() {
        let goal = goal_with_streak(EmployeeId::new(), 0, GoalStatus::Active);
        let records = vec![
            record(&goal, 0, day(1), Outcome::Correct),
            record(&goal, 0, day(3), Outcome::VerbalPrompt),
            record(&goal, 0, day(2), Outcome::Correct),
        ];
        let recent = recent_progress(&records, goal.id, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date, day(3));
        assert_eq!(recent[1].date, day(2));
    }
}
