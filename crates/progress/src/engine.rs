//! Progression engine - streak and mastery rules for development goals.
//!
//! A day counts when every required step of a goal was recorded `Correct`.
//! Counting days extend the streak, any other day resets it to zero, and the
//! first time the streak reaches the mastery threshold the goal moves to
//! maintenance. Each evaluation re-derives the day from the full set of that
//! day's records, so it can run after every single outcome write.

use std::collections::HashSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shifttrack_core::{DevelopmentGoal, GoalStatus, Outcome, StepId, StepProgress};
use tracing::{debug, info, warn};

/// Thresholds for mastery and "near mastery".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryPolicy {
    /// Consecutive fully-correct days needed for mastery
    pub mastery_streak: u32,

    /// Streak at which an active goal counts as near mastery
    pub near_mastery_streak: u32,
}

impl Default for MasteryPolicy {
    fn default() -> Self {
        Self {
            mastery_streak: 3,
            near_mastery_streak: 2,
        }
    }
}

/// Result of evaluating one goal for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEvaluation {
    /// The goal with streak, mastery and status updated
    pub goal: DevelopmentGoal,

    /// Number of required steps on the goal
    pub required_total: usize,

    /// Required steps recorded `Correct` today
    pub correct_required: usize,

    /// Whether today counts toward the streak
    pub all_correct_today: bool,

    /// Whether this evaluation flipped the goal to mastered
    pub reached_mastery: bool,
}

/// Evaluate a goal against the outcomes recorded for it on `today`.
///
/// Records for other goals or other days, and records for steps that are
/// unknown or optional, are ignored; a required step without a usable
/// `Correct` record counts as not correct. A goal with no required steps
/// never has a counting day. Archived goals are returned unchanged.
///
/// `updated_at` is left alone; callers stamp it from their own clock when
/// they persist a changed goal.
pub fn evaluate_daily_outcome(
    goal: &DevelopmentGoal,
    outcomes: &[StepProgress],
    today: NaiveDate,
    policy: &MasteryPolicy,
) -> DailyEvaluation {
    let required: HashSet<StepId> = goal.required_steps().map(|s| s.id).collect();

    let correct: HashSet<StepId> = outcomes
        .iter()
        .filter(|p| p.goal_id == goal.id && p.date == today)
        .filter(|p| p.outcome == Outcome::Correct)
        .map(|p| p.step_id)
        .filter(|id| required.contains(id))
        .collect();

    let unknown = outcomes
        .iter()
        .filter(|p| p.goal_id == goal.id && p.date == today && goal.step(p.step_id).is_none())
        .count();
    if unknown > 0 {
        warn!(goal = %goal.id, unknown, "ignoring outcomes for steps not on the goal");
    }

    let required_total = required.len();
    let correct_required = correct.len();
    let all_correct_today = required_total > 0 && correct_required == required_total;

    let mut updated = goal.clone();

    if goal.status == GoalStatus::Archived {
        return DailyEvaluation {
            goal: updated,
            required_total,
            correct_required,
            all_correct_today,
            reached_mastery: false,
        };
    }

    // Re-evaluating the same day starts from the streak carried into it.
    let baseline = if goal.last_evaluated == Some(today) {
        goal.streak_before_last_evaluated
    } else {
        updated.streak_before_last_evaluated = goal.consecutive_all_correct;
        updated.last_evaluated = Some(today);
        goal.consecutive_all_correct
    };

    let new_streak = if all_correct_today { baseline.saturating_add(1) } else { 0 };
    let mastery_now = new_streak >= policy.mastery_streak;
    let reached_mastery = mastery_now && !goal.mastery_achieved;

    updated.consecutive_all_correct = new_streak;
    updated.mastery_achieved = goal.mastery_achieved || mastery_now;

    if reached_mastery {
        updated.mastery_date = Some(today);
        if updated.status == GoalStatus::Active {
            updated.status = GoalStatus::Maintenance;
        }
        info!(goal = %goal.id, employee = %goal.employee_id, %today, "goal mastered");
    }

    debug!(
        goal = %goal.id,
        required_total,
        correct_required,
        streak = new_streak,
        "evaluated daily outcome"
    );

    DailyEvaluation {
        goal: updated,
        required_total,
        correct_required,
        all_correct_today,
        reached_mastery,
    }
}
