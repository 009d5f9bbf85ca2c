//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod permission;
mod project;
mod role;
mod session;
mod user;

pub use audit::AuditAction;
pub use permission::{
    DEFAULT_PERMISSION_CATALOG, PermissionId, PermissionName, PermissionRecord, SeededPermission,
    WILDCARD_PERMISSION,
};
pub use project::{ProjectAccessLevel, ProjectId, UserProjectAssignment};
pub use role::{
    DEFAULT_ROLE_LEVEL, ELEVATED_LEVEL_THRESHOLD, ROOT_ROLE_LEVEL, Role, RoleId, is_root_name,
};
pub use session::{DeviceInfo, DeviceType, SessionId, UserSession};
pub use user::{EmailAddress, LegacyRole, RoleBinding, User, UserId};
