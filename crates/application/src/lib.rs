//! Application services and ports for the RBAC core.

#![forbid(unsafe_code)]

mod authorization_service;
mod bootstrap_service;
mod permission_registry;
mod ports;
mod rbac_admin_service;
mod session_service;
mod user_service;

#[cfg(test)]
mod test_support;

pub use authorization_service::{AuthorizationService, ProjectAccessGrant};
pub use bootstrap_service::{BootstrapReport, BootstrapService, MigrationReport};
pub use permission_registry::{
    BulkCreateReport, BulkItemError, BulkPermissionEntry, PermissionCatalog, PermissionRegistry,
    PermissionStats, SeedReport,
};
pub use ports::{
    AuditEvent, AuditRepository, NewRole, PasswordHasher, PermissionFilter, PermissionRepository,
    PermissionUpdate, ProjectAccessRepository, RoleRepository, RoleUpdate, SessionRepository,
    UserRepository,
};
pub use rbac_admin_service::{ActorAuthority, BulkDeleteReport, BulkRoleError, RbacAdminService};
pub use session_service::{
    DEFAULT_SESSION_LIMIT, DEFAULT_SESSION_TTL_HOURS, SessionMetadata, SessionService,
    SessionStatistics, SessionView,
};
pub use user_service::{AuthOutcome, UserService};
