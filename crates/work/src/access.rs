//! Role checks at the application boundary.

use shifttrack_core::{Capability, Role};
use tracing::warn;

use crate::error::{Result, WorkError};

/// Gate for actions performed on behalf of a role.
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard {
    role: Role,
}

impl AccessGuard {
    /// Guard for the given role.
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    /// Acting role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Fail with `PermissionDenied` unless the role has the capability.
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.role.allows(capability) {
            Ok(())
        } else {
            warn!(role = %self.role, %capability, "permission denied");
            Err(WorkError::PermissionDenied {
                role: self.role,
                capability,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_manager_cannot_manage_templates() {
        let guard = AccessGuard::new(Role::ShiftManager);
        assert!(guard.require(Capability::RunShift).is_ok());
        let err = guard.require(Capability::ManageTemplates).unwrap_err();
        assert!(matches!(
            err,
            WorkError::PermissionDenied {
                role: Role::ShiftManager,
                capability: Capability::ManageTemplates,
            }
        ));
    }

    #[test]
    fn test_admin_passes() {
        let guard = AccessGuard::new(Role::Admin);
        assert!(guard.require(Capability::ManageUsers).is_ok());
    }
}
