//! Unique identifiers for ShiftTrack entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new identifier.
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

entity_id!(
    /// Unique identifier for an Employee
    EmployeeId
);

entity_id!(
    /// Unique identifier for a manager account
    UserId
);

entity_id!(
    /// Unique identifier for a DevelopmentGoal
    GoalId
);

entity_id!(
    /// Unique identifier for a GoalStep
    StepId
);

entity_id!(
    /// Unique identifier for a GoalTemplate
    TemplateId
);

entity_id!(
    /// Unique identifier for a ShiftRoster
    ShiftId
);

entity_id!(
    /// Unique identifier for a ShiftSummary
    SummaryId
);

entity_id!(
    /// Unique identifier for a StepProgress record
    ProgressId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_parses_back() {
        let id = GoalId::new();
        let parsed: GoalId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!("not-a-ulid".parse::<EmployeeId>().is_err());
    }
}
