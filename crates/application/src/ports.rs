//! Repository and adapter ports implemented by the infrastructure crate.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rayerp_core::AppResult;
use rayerp_domain::{
    AuditAction, PermissionId, PermissionRecord, ProjectId, Role, RoleBinding, RoleId, SessionId,
    User, UserId, UserProjectAssignment, UserSession,
};

/// Input payload for creating a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    /// Unique role name; `root` (case-insensitive) is rejected.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Permission names to grant; validated against the registry by the
    /// calling service.
    pub permissions: BTreeSet<String>,
    /// Privilege level; defaults to 50 when absent.
    pub level: Option<i32>,
}

/// Partial update applied to a stored role.
///
/// `None` fields are left untouched. The store itself refuses any update
/// targeting the Root role and any name/level change on a default role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleUpdate {
    /// New role name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement permission set.
    pub permissions: Option<BTreeSet<String>>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// New privilege level.
    pub level: Option<i32>,
}

/// Partial update applied to a stored permission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionUpdate {
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Listing filter for stored permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionFilter {
    /// Restrict to one category.
    pub category: Option<String>,
    /// Restrict by active flag.
    pub is_active: Option<bool>,
}

/// Storage port for permission definitions.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Inserts a permission; fails with `Duplicate` if the name exists.
    async fn insert(&self, record: PermissionRecord) -> AppResult<()>;

    /// Applies a partial update; fails with `NotFound` if missing.
    async fn update(
        &self,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> AppResult<PermissionRecord>;

    /// Removes a permission and returns it; fails with `NotFound` if missing.
    async fn delete(&self, id: PermissionId) -> AppResult<PermissionRecord>;

    /// Finds a permission by exact name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<PermissionRecord>>;

    /// Finds a permission by id.
    async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<PermissionRecord>>;

    /// Lists permissions matching the filter, sorted by category then name.
    async fn list(&self, filter: PermissionFilter) -> AppResult<Vec<PermissionRecord>>;
}

/// Storage port for roles.
///
/// Implementations enforce the Root and default-role invariants themselves:
/// `create` rejects the name `root`, `update` and `delete` refuse to touch
/// the Root role, and `update` refuses name or level changes on default
/// roles. These checks run regardless of what the calling service already
/// validated.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Creates a non-default role; `Forbidden` for the name `root`,
    /// `Duplicate` for an existing name.
    async fn create(&self, role: NewRole) -> AppResult<Role>;

    /// Applies a partial update subject to the store invariants.
    async fn update(&self, id: RoleId, update: RoleUpdate) -> AppResult<Role>;

    /// Deletes a role; `Forbidden` for Root and default roles.
    async fn delete(&self, id: RoleId) -> AppResult<()>;

    /// Inserts a system role only if no role with that name exists yet.
    /// Returns whether a row was inserted. This is the bootstrap path for
    /// Root and the seeded default roles; existing names are never replaced.
    async fn seed_system_role(&self, role: Role) -> AppResult<bool>;

    /// Finds a role by id.
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by name, case-insensitively.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Lists all roles sorted by level descending.
    async fn list_all(&self) -> AppResult<Vec<Role>>;
}

/// Storage port for user records, as needed by the authorization core.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user; fails with `Duplicate` if the email exists.
    async fn insert(&self, user: User) -> AppResult<()>;

    /// Finds a user by id.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Finds a user by normalized email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Lists every user record.
    async fn list_all(&self) -> AppResult<Vec<User>>;

    /// Replaces a user's plural role set; fails with `NotFound` if missing.
    async fn set_roles(&self, id: UserId, roles: Vec<RoleId>) -> AppResult<User>;

    /// Replaces a user's primary role binding.
    async fn set_role_binding(&self, id: UserId, binding: RoleBinding) -> AppResult<()>;

    /// Counts users referencing a role through either the primary binding
    /// or the plural role set.
    async fn count_with_role(&self, role_id: RoleId) -> AppResult<usize>;
}

/// Storage port for tracked login sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Inserts a session; fails with `Duplicate` on a token-hash collision.
    async fn insert(&self, session: UserSession) -> AppResult<()>;

    /// Finds a session by token hash.
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<UserSession>>;

    /// Lists every session owned by a user, live or not.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserSession>>;

    /// Lists every live session across users, for statistics.
    async fn list_live(&self, now: DateTime<Utc>) -> AppResult<Vec<UserSession>>;

    /// Counts sessions already expired at `now` but not yet reaped.
    async fn count_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Bumps `last_active` for the session with this token hash.
    async fn touch(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<()>;

    /// Deletes one session owned by `user_id`; returns whether a row went.
    async fn delete_by_session_id(&self, user_id: UserId, session_id: SessionId)
    -> AppResult<bool>;

    /// Deletes the session with this token hash; returns whether a row went.
    async fn delete_by_token_hash(&self, token_hash: &str) -> AppResult<bool>;

    /// Deletes every session of a user except the one with `token_hash`;
    /// returns the number deleted.
    async fn delete_for_user_except(&self, user_id: UserId, token_hash: &str) -> AppResult<u64>;

    /// Hard-deletes all sessions expired at `now`; returns the number deleted.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Storage port for project-scoped access assignments.
#[async_trait]
pub trait ProjectAccessRepository: Send + Sync {
    /// Finds the unique assignment for a `(user, project)` pair.
    async fn find_assignment(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Option<UserProjectAssignment>>;

    /// Creates or replaces the assignment for the pair.
    async fn upsert_assignment(&self, assignment: UserProjectAssignment) -> AppResult<()>;
}

/// An audit event appended by administrative use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Acting user.
    pub subject: String,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Resource type label, e.g. `rbac_role`.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

/// Append-only audit sink.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Password hashing port.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password for storage.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, stored_hash: &str) -> AppResult<bool>;
}
