//! Employee model - the people whose development is tracked.

use serde::{Deserialize, Serialize};
use crate::id::EmployeeId;
use crate::Time;

/// An employee working shifts and pursuing development goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier
    pub id: EmployeeId,

    /// Display name
    pub name: String,

    /// Job role (e.g. "Super Scooper")
    pub role: String,

    /// Optional profile picture
    pub profile_image_url: Option<String>,

    /// Inactive employees are kept but can't be put on a shift
    pub is_active: bool,

    /// Support information shown to managers during a shift
    pub support: SupportProfile,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

impl Employee {
    /// Create a new active employee with an empty support profile.
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: EmployeeId::new(),
            name: name.into(),
            role: role.into(),
            profile_image_url: None,
            is_active: true,
            support: SupportProfile::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Flag the employee inactive. Employees are never hard-deleted.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = chrono::Utc::now();
    }
}

/// Free-text support attributes for an employee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportProfile {
    /// Known allergies
    pub allergies: Vec<String>,

    /// People to call in an emergency
    pub emergency_contacts: Vec<EmergencyContact>,

    /// Interests and motivators
    pub interests_motivators: Vec<String>,

    /// Known challenges
    pub challenges: Vec<String>,

    /// Strategies that help the employee regulate
    pub regulation_strategies: Vec<String>,
}

/// An emergency contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Contact name
    pub name: String,

    /// Relationship to the employee
    pub relationship: String,

    /// Phone number
    pub phone: String,
}

/// Filter for employee queries.
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    /// Only employees with this active flag
    pub is_active: Option<bool>,

    /// Case-insensitive substring match on name
    pub name_contains: Option<String>,
}

impl EmployeeFilter {
    /// Filter matching active employees only.
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Default::default()
        }
    }

    /// Check whether an employee passes this filter.
    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(active) = self.is_active {
            if employee.is_active != active {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            if !employee.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}
