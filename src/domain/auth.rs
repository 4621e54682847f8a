use serde::{Deserialize, Serialize};

/// Role flags of the acting user, passed alongside a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionContext {
    /// Read-only auditor role; suppresses every mutating action
    pub user_is_system_auditor: bool,
    /// Whether the user may write settings at all
    pub can_write: bool,
}

impl Default for PermissionContext {
    fn default() -> Self {
        Self::administrator()
    }
}

impl PermissionContext {
    pub fn administrator() -> Self {
        Self {
            user_is_system_auditor: false,
            can_write: true,
        }
    }

    pub fn auditor() -> Self {
        Self {
            user_is_system_auditor: true,
            can_write: false,
        }
    }

    pub fn read_only() -> Self {
        Self {
            user_is_system_auditor: false,
            can_write: false,
        }
    }

    /// True when the user may change stored values (save, reset, revert all).
    pub fn can_mutate(&self) -> bool {
        self.can_write && !self.user_is_system_auditor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auditor_cannot_mutate_even_with_write_flag() {
        let ctx = PermissionContext {
            user_is_system_auditor: true,
            can_write: true,
        };
        assert!(!ctx.can_mutate());
    }

    #[test]
    fn test_role_presets() {
        assert!(PermissionContext::administrator().can_mutate());
        assert!(!PermissionContext::read_only().can_mutate());
        assert!(!PermissionContext::auditor().can_mutate());
        assert_eq!(PermissionContext::default(), PermissionContext::administrator());
    }
}
