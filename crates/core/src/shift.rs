//! Shift roster and per-employee shift summaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::id::{EmployeeId, ShiftId, SummaryId, UserId};
use crate::Time;

/// A shift with its participating employees.
///
/// Only one roster may be active at a time across the whole system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRoster {
    /// Unique identifier
    pub id: ShiftId,

    /// Manager running the shift
    pub manager_id: UserId,

    /// Calendar day the shift started
    pub date: NaiveDate,

    /// Store location, if recorded
    pub location: Option<String>,

    /// Start timestamp
    pub started_at: Time,

    /// End timestamp, set on closure
    pub ended_at: Option<Time>,

    /// Employees on the shift
    pub employee_ids: Vec<EmployeeId>,

    /// Whether the shift is still open
    pub is_active: bool,
}

impl ShiftRoster {
    /// Open a new shift at the given time.
    pub fn start(
        manager_id: UserId,
        employee_ids: Vec<EmployeeId>,
        location: Option<String>,
        now: Time,
    ) -> Self {
        Self {
            id: ShiftId::new(),
            manager_id,
            date: now.date_naive(),
            location,
            started_at: now,
            ended_at: None,
            employee_ids,
            is_active: true,
        }
    }

    /// Close the shift.
    pub fn end(&mut self, now: Time) {
        self.ended_at = Some(now);
        self.is_active = false;
    }

    /// Whether an employee is on this shift.
    pub fn includes(&self, employee_id: EmployeeId) -> bool {
        self.employee_ids.contains(&employee_id)
    }
}

/// Free-text manager narrative for one employee on one shift day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSummary {
    /// Unique identifier
    pub id: SummaryId,

    /// Employee described
    pub employee_id: EmployeeId,

    /// Shift the summary belongs to
    pub shift_id: ShiftId,

    /// Calendar day
    pub date: NaiveDate,

    /// Narrative text
    pub summary: String,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

/// Filter for shift summary queries.
#[derive(Debug, Clone, Default)]
pub struct SummaryFilter {
    /// Only this employee
    pub employee_id: Option<EmployeeId>,

    /// Only this shift
    pub shift_id: Option<ShiftId>,

    /// Only this day
    pub date: Option<NaiveDate>,
}

impl SummaryFilter {
    /// Check whether a summary passes this filter.
    pub fn matches(&self, summary: &ShiftSummary) -> bool {
        self.employee_id.map_or(true, |id| summary.employee_id == id)
            && self.shift_id.map_or(true, |id| summary.shift_id == id)
            && self.date.map_or(true, |d| summary.date == d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_start_and_end_shift() {
        let now = chrono::Utc.with_ymd_and_hms(2025, 3, 4, 15, 0, 0).unwrap();
        let employee = EmployeeId::new();
        let mut shift = ShiftRoster::start(UserId::new(), vec![employee], None, now);

        assert!(shift.is_active);
        assert!(shift.includes(employee));
        assert!(!shift.includes(EmployeeId::new()));
        assert_eq!(shift.date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());

        let later = now + chrono::Duration::hours(6);
        shift.end(later);
        assert!(!shift.is_active);
        assert_eq!(shift.ended_at, Some(later));
    }
}
