//! Manager accounts and role capabilities.

use serde::{Deserialize, Serialize};
use crate::id::UserId;
use crate::Time;

/// A manager account that runs shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Login email
    pub email: String,

    /// Display name
    pub name: String,

    /// Role determining available actions
    pub role: Role,

    /// Inactive accounts are kept for history
    pub is_active: bool,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

impl User {
    /// Create a new active user.
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: UserId::new(),
            email: email.into(),
            name: name.into(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access
    Admin,
    /// Runs shifts and records progress
    ShiftManager,
}

/// An action gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Start/end shifts, record outcomes and summaries
    RunShift,
    /// View the dashboard
    ViewDashboard,
    /// Add and edit employees
    ManageEmployees,
    /// Assign and archive development goals
    ManageGoals,
    /// Create and archive goal templates
    ManageTemplates,
    /// Create and deactivate manager accounts
    ManageUsers,
}

impl Role {
    /// Whether this role may perform the given action.
    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::ShiftManager => !matches!(
                capability,
                Capability::ManageTemplates | Capability::ManageUsers
            ),
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ShiftManager => "shift_manager",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "admin" => Ok(Role::Admin),
            "shift_manager" | "manager" => Ok(Role::ShiftManager),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::RunShift => "run_shift",
            Capability::ViewDashboard => "view_dashboard",
            Capability::ManageEmployees => "manage_employees",
            Capability::ManageGoals => "manage_goals",
            Capability::ManageTemplates => "manage_templates",
            Capability::ManageUsers => "manage_users",
        };
        f.write_str(s)
    }
}
