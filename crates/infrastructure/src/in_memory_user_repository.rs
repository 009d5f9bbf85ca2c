use std::collections::HashMap;

use async_trait::async_trait;
use rayerp_application::UserRepository;
use rayerp_core::{AppError, AppResult};
use rayerp_domain::{RoleBinding, RoleId, User, UserId};
use tokio::sync::RwLock;

/// In-memory user store.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> AppResult<()> {
        let mut users = self.users.write().await;

        if users.values().any(|stored| stored.email == user.email) {
            return Err(AppError::Duplicate(format!(
                "user '{}' already exists",
                user.email.as_str()
            )));
        }

        users.insert(user.id, user);
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email.as_str() == email)
            .cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        let users = self.users.read().await;

        let mut values: Vec<User> = users.values().cloned().collect();
        values.sort_by(|left, right| left.email.as_str().cmp(right.email.as_str()));

        Ok(values)
    }

    async fn set_roles(&self, id: UserId, roles: Vec<RoleId>) -> AppResult<User> {
        let mut users = self.users.write().await;

        let Some(user) = users.get_mut(&id) else {
            return Err(AppError::NotFound(format!("user '{id}' not found")));
        };

        user.roles = roles;
        Ok(user.clone())
    }

    async fn set_role_binding(&self, id: UserId, binding: RoleBinding) -> AppResult<()> {
        let mut users = self.users.write().await;

        let Some(user) = users.get_mut(&id) else {
            return Err(AppError::NotFound(format!("user '{id}' not found")));
        };

        user.role = binding;
        Ok(())
    }

    async fn count_with_role(&self, role_id: RoleId) -> AppResult<usize> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.role_references().contains(&role_id))
            .count())
    }
}
