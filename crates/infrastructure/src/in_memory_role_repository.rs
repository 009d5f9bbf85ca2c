use std::collections::HashMap;

use async_trait::async_trait;
use rayerp_application::{NewRole, RoleRepository, RoleUpdate};
use rayerp_core::{AppError, AppResult};
use rayerp_domain::{DEFAULT_ROLE_LEVEL, Role, RoleId, is_root_name};
use tokio::sync::RwLock;

/// In-memory role store.
///
/// The Root invariant and the default-role locks are enforced here, at
/// the lowest layer, so no caller can bypass them: Root can be neither
/// created, updated nor deleted, and seeded default roles keep their
/// name and level.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create(&self, role: NewRole) -> AppResult<Role> {
        if is_root_name(&role.name) {
            return Err(AppError::Forbidden(
                "the Root role cannot be created".to_owned(),
            ));
        }

        let mut roles = self.roles.write().await;

        if roles
            .values()
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
        roles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: RoleId, update: RoleUpdate) -> AppResult<Role> {
        let mut roles = self.roles.write().await;

        // A missing role is reported before any rename collision.
        if !roles.contains_key(&id) {
            return Err(AppError::NotFound(format!("role '{id}' not found")));
        }

        if let Some(new_name) = &update.name
            && roles
                .values()
                .any(|stored| stored.id != id && stored.name.eq_ignore_ascii_case(new_name))
        {
            return Err(AppError::Duplicate(format!(
                "role '{new_name}' already exists"
            )));
        }

        let Some(role) = roles.get_mut(&id) else {
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
        if update.name.as_deref().is_some_and(is_root_name) {
            return Err(AppError::Forbidden(
                "a role cannot be renamed to Root".to_owned(),
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
        let mut roles = self.roles.write().await;

        let Some(role) = roles.get(&id) else {
            return Err(AppError::NotFound(format!("role '{id}' not found")));
        };
        if role.is_root() {
            return Err(AppError::Forbidden(
                "the Root role cannot be deleted".to_owned(),
            ));
        }
        if role.is_default {
            return Err(AppError::Forbidden(
                "default roles cannot be deleted".to_owned(),
            ));
        }

        roles.remove(&id);
        Ok(())
    }

    async fn seed_system_role(&self, role: Role) -> AppResult<bool> {
        let mut roles = self.roles.write().await;

        if roles
            .values()
            .any(|stored| stored.name.eq_ignore_ascii_case(&role.name))
        {
            return Ok(false);
        }

        roles.insert(role.id, role);
        Ok(true)
    }

    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|role| role.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;

        let mut values: Vec<Role> = roles.values().cloned().collect();
        values.sort_by(|left, right| {
            right
                .level
                .cmp(&left.level)
                .then_with(|| left.name.cmp(&right.name))
        });

        Ok(values)
    }
}
