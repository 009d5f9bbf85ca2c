//! Functional in-memory fakes shared by the service test suites.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rayerp_core::{AppError, AppResult};
use rayerp_domain::{
    DEFAULT_ROLE_LEVEL, PermissionId, PermissionRecord, ProjectId, Role, RoleBinding, RoleId,
    SessionId, User, UserId, UserProjectAssignment, UserSession, is_root_name,
};
use tokio::sync::Mutex;

use crate::ports::{
    AuditEvent, AuditRepository, NewRole, PasswordHasher, PermissionFilter, PermissionRepository,
    PermissionUpdate, ProjectAccessRepository, RoleRepository, RoleUpdate, SessionRepository,
    UserRepository,
};

#[derive(Default)]
pub(crate) struct FakePermissionRepository {
    records: Mutex<Vec<PermissionRecord>>,
}

impl FakePermissionRepository {
    /// Inserts directly, bypassing the registry (and its cache).
    pub(crate) async fn insert_raw(&self, name: &str, description: &str, category: &str) {
        if let Ok(record) = PermissionRecord::new(name, description, category) {
            self.records.lock().await.push(record);
        }
    }
}

#[async_trait]
impl PermissionRepository for FakePermissionRepository {
    async fn insert(&self, record: PermissionRecord) -> AppResult<()> {
        let mut records = self.records.lock().await;
        if records.iter().any(|stored| stored.name == record.name) {
            return Err(AppError::Duplicate(format!(
                "permission '{}' already exists",
                record.name
            )));
        }
        records.push(record);
        Ok(())
    }

    async fn update(
        &self,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> AppResult<PermissionRecord> {
        let mut records = self.records.lock().await;
        let Some(record) = records.iter_mut().find(|stored| stored.id == id) else {
            return Err(AppError::NotFound(format!("permission '{id}' not found")));
        };

        if let Some(description) = update.description {
            record.description = description;
        }
        if let Some(category) = update.category {
            record.category = category;
        }
        if let Some(is_active) = update.is_active {
            record.is_active = is_active;
        }

        Ok(record.clone())
    }

    async fn delete(&self, id: PermissionId) -> AppResult<PermissionRecord> {
        let mut records = self.records.lock().await;
        let Some(position) = records.iter().position(|stored| stored.id == id) else {
            return Err(AppError::NotFound(format!("permission '{id}' not found")));
        };
        Ok(records.remove(position))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<PermissionRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|stored| stored.name.as_str() == name)
            .cloned())
    }

    async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<PermissionRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|stored| stored.id == id)
            .cloned())
    }

    async fn list(&self, filter: PermissionFilter) -> AppResult<Vec<PermissionRecord>> {
        let mut listed: Vec<PermissionRecord> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|category| record.category == category)
                    && filter.is_active.is_none_or(|flag| record.is_active == flag)
            })
            .cloned()
            .collect();
        listed.sort_by(|left, right| {
            (left.category.as_str(), left.name.as_str())
                .cmp(&(right.category.as_str(), right.name.as_str()))
        });
        Ok(listed)
    }
}

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    roles: Mutex<Vec<Role>>,
}

impl FakeRoleRepository {
    /// Inserts directly, bypassing create-side invariants.
    pub(crate) async fn push(&self, role: Role) -> RoleId {
        let id = role.id;
        self.roles.lock().await.push(role);
        id
    }
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn create(&self, role: NewRole) -> AppResult<Role> {
        if is_root_name(&role.name) {
            return Err(AppError::Forbidden(
                "the Root role cannot be created".to_owned(),
            ));
        }

        let mut roles = self.roles.lock().await;
        if roles
            .iter()
            .any(|stored| stored.name.eq_ignore_ascii_case(&role.name))
        {
            return Err(AppError::Duplicate(format!(
                "role '{}' already exists",
                role.name
            )));
        }

        let created = Role::new(
            role.name,
            role.description,
            role.permissions,
            role.level.unwrap_or(DEFAULT_ROLE_LEVEL),
        );
        roles.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: RoleId, update: RoleUpdate) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        let Some(role) = roles.iter_mut().find(|stored| stored.id == id) else {
            return Err(AppError::NotFound(format!("role '{id}' not found")));
        };

        if role.is_root() {
            return Err(AppError::Forbidden("the Root role is immutable".to_owned()));
        }
        if role.is_default && (update.name.is_some() || update.level.is_some()) {
            return Err(AppError::Forbidden(
                "default roles cannot change name or level".to_owned(),
            ));
        }

        if let Some(name) = update.name {
            role.name = name;
        }
        if let Some(description) = update.description {
            role.description = description;
        }
        if let Some(permissions) = update.permissions {
            role.permissions = permissions;
        }
        if let Some(is_active) = update.is_active {
            role.is_active = is_active;
        }
        if let Some(level) = update.level {
            role.level = level;
        }

        Ok(role.clone())
    }

    async fn delete(&self, id: RoleId) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        let Some(position) = roles.iter().position(|stored| stored.id == id) else {
            return Err(AppError::NotFound(format!("role '{id}' not found")));
        };
        if roles[position].is_root() || roles[position].is_default {
            return Err(AppError::Forbidden(
                "system roles cannot be deleted".to_owned(),
            ));
        }
        roles.remove(position);
        Ok(())
    }

    async fn seed_system_role(&self, role: Role) -> AppResult<bool> {
        let mut roles = self.roles.lock().await;
        if roles
            .iter()
            .any(|stored| stored.name.eq_ignore_ascii_case(&role.name))
        {
            return Ok(false);
        }
        roles.push(role);
        Ok(true)
    }

    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|stored| stored.id == id)
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|stored| stored.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<Role>> {
        let mut listed = self.roles.lock().await.clone();
        listed.sort_by(|left, right| right.level.cmp(&left.level));
        Ok(listed)
    }
}

#[derive(Default)]
pub(crate) struct FakeUserRepository {
    users: Mutex<Vec<User>>,
}

impl FakeUserRepository {
    pub(crate) async fn push(&self, user: User) -> UserId {
        let id = user.id;
        self.users.lock().await.push(user);
        id
    }
}

#[async_trait]
impl UserRepository for FakeUserRepository {
    async fn insert(&self, user: User) -> AppResult<()> {
        let mut users = self.users.lock().await;
        if users.iter().any(|stored| stored.email == user.email) {
            return Err(AppError::Duplicate(format!(
                "user '{}' already exists",
                user.email.as_str()
            )));
        }
        users.push(user);
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|stored| stored.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|stored| stored.email.as_str() == email)
            .cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        Ok(self.users.lock().await.clone())
    }

    async fn set_roles(&self, id: UserId, roles: Vec<RoleId>) -> AppResult<User> {
        let mut users = self.users.lock().await;
        let Some(user) = users.iter_mut().find(|stored| stored.id == id) else {
            return Err(AppError::NotFound(format!("user '{id}' not found")));
        };
        user.roles = roles;
        Ok(user.clone())
    }

    async fn set_role_binding(&self, id: UserId, binding: RoleBinding) -> AppResult<()> {
        let mut users = self.users.lock().await;
        let Some(user) = users.iter_mut().find(|stored| stored.id == id) else {
            return Err(AppError::NotFound(format!("user '{id}' not found")));
        };
        user.role = binding;
        Ok(())
    }

    async fn count_with_role(&self, role_id: RoleId) -> AppResult<usize> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .filter(|user| user.role_references().contains(&role_id))
            .count())
    }
}

#[derive(Default)]
pub(crate) struct FakeSessionRepository {
    sessions: Mutex<Vec<UserSession>>,
}

#[async_trait]
impl SessionRepository for FakeSessionRepository {
    async fn insert(&self, session: UserSession) -> AppResult<()> {
        let mut sessions = self.sessions.lock().await;
        if sessions
            .iter()
            .any(|stored| stored.token_hash == session.token_hash)
        {
            return Err(AppError::Duplicate("session token collision".to_owned()));
        }
        sessions.push(session);
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<UserSession>> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .find(|stored| stored.token_hash == token_hash)
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserSession>> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .filter(|stored| stored.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_live(&self, now: DateTime<Utc>) -> AppResult<Vec<UserSession>> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .filter(|stored| stored.is_live(now))
            .cloned()
            .collect())
    }

    async fn count_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .filter(|stored| stored.expires_at <= now)
            .count() as u64)
    }

    async fn touch(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<()> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions
            .iter_mut()
            .find(|stored| stored.token_hash == token_hash)
        {
            session.last_active = now;
        }
        Ok(())
    }

    async fn delete_by_session_id(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> AppResult<bool> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|stored| !(stored.user_id == user_id && stored.session_id == session_id));
        Ok(sessions.len() < before)
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> AppResult<bool> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|stored| stored.token_hash != token_hash);
        Ok(sessions.len() < before)
    }

    async fn delete_for_user_except(&self, user_id: UserId, token_hash: &str) -> AppResult<u64> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|stored| stored.user_id != user_id || stored.token_hash == token_hash);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|stored| stored.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Default)]
pub(crate) struct FakeProjectAccessRepository {
    assignments: Mutex<Vec<UserProjectAssignment>>,
}

#[async_trait]
impl ProjectAccessRepository for FakeProjectAccessRepository {
    async fn find_assignment(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Option<UserProjectAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .find(|stored| stored.user_id == user_id && stored.project_id == project_id)
            .cloned())
    }

    async fn upsert_assignment(&self, assignment: UserProjectAssignment) -> AppResult<()> {
        let mut assignments = self.assignments.lock().await;
        assignments.retain(|stored| {
            !(stored.user_id == assignment.user_id && stored.project_id == assignment.project_id)
        });
        assignments.push(assignment);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Reversible stand-in hasher for deterministic login tests.
pub(crate) struct FakePasswordHasher;

impl PasswordHasher for FakePasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> AppResult<bool> {
        Ok(stored_hash == format!("hashed:{password}"))
    }
}

/// Builds a minimal active user for tests.
pub(crate) fn test_user(name: &str, role: RoleBinding, roles: Vec<RoleId>) -> User {
    User {
        id: UserId::new(),
        name: name.to_owned(),
        email: rayerp_domain::EmailAddress::new(format!("{name}@rayerp.local"))
            .unwrap_or_else(|error| panic!("invalid test email: {error}")),
        password_hash: None,
        role,
        roles,
        is_active: true,
        created_at: Utc::now(),
    }
}
