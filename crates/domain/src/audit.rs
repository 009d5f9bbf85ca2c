use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role is updated.
    RoleUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when a role's active flag is toggled.
    RoleStatusToggled,
    /// Emitted when roles are assigned to a user.
    RolesAssigned,
    /// Emitted when permissions are removed from a role via the
    /// reduce-only path.
    RolePermissionsReduced,
    /// Emitted when a permission is created.
    PermissionCreated,
    /// Emitted when a permission is updated.
    PermissionUpdated,
    /// Emitted when a permission is deleted.
    PermissionDeleted,
    /// Emitted when a session is revoked by its owner.
    SessionRevoked,
    /// Emitted when expired sessions are reaped.
    SessionsCleaned,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "rbac.role.created",
            Self::RoleUpdated => "rbac.role.updated",
            Self::RoleDeleted => "rbac.role.deleted",
            Self::RoleStatusToggled => "rbac.role.status_toggled",
            Self::RolesAssigned => "rbac.roles.assigned",
            Self::RolePermissionsReduced => "rbac.role.permissions_reduced",
            Self::PermissionCreated => "rbac.permission.created",
            Self::PermissionUpdated => "rbac.permission.updated",
            Self::PermissionDeleted => "rbac.permission.deleted",
            Self::SessionRevoked => "session.revoked",
            Self::SessionsCleaned => "session.cleanup",
        }
    }
}
