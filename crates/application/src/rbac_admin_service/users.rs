use super::*;

use std::collections::BTreeSet;

use rayerp_domain::{AuditAction, RoleId, UserId};

use crate::ports::AuditEvent;

impl RbacAdminService {
    /// Replaces a user's plural role set.
    ///
    /// The Root role is never assignable. Non-Root actors may only hand
    /// out roles strictly below their own level.
    pub async fn assign_roles_to_user(
        &self,
        actor: &User,
        user_id: UserId,
        role_ids: Vec<RoleId>,
    ) -> AppResult<User> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_elevated(authority)?;

        let mut assigned_names = Vec::with_capacity(role_ids.len());
        for role_id in &role_ids {
            let Some(role) = self.roles.find_by_id(*role_id).await? else {
                return Err(AppError::NotFound(format!("role '{role_id}' not found")));
            };
            if role.is_root() {
                return Err(AppError::Forbidden(
                    "the Root role cannot be assigned".to_owned(),
                ));
            }
            if !authority.is_root && role.level >= authority.level {
                return Err(AppError::Forbidden(format!(
                    "cannot assign role '{}' at level {} from level {}",
                    role.name, role.level, authority.level
                )));
            }
            assigned_names.push(role.name);
        }

        let updated = self.users.set_roles(user_id, role_ids).await?;

        self.audit
            .append_event(AuditEvent {
                subject: actor.email.as_str().to_owned(),
                action: AuditAction::RolesAssigned,
                resource_type: "user".to_owned(),
                resource_id: updated.id.to_string(),
                detail: Some(format!(
                    "assigned roles [{}] to '{}'",
                    assigned_names.join(", "),
                    updated.email.as_str()
                )),
            })
            .await?;

        Ok(updated)
    }

    /// Returns a user's effective permission set.
    pub async fn get_user_permissions(
        &self,
        actor: &User,
        user_id: UserId,
    ) -> AppResult<BTreeSet<String>> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_elevated(authority)?;

        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        };
        self.authorization.effective_permissions(&user).await
    }

    /// Lists active users whose resolved authority is strictly above
    /// `min_level`.
    ///
    /// Defaults to the elevation threshold, matching the administrative
    /// "who else can manage things" view.
    pub async fn get_users_by_role_level(
        &self,
        actor: &User,
        min_level: Option<i32>,
    ) -> AppResult<Vec<User>> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_elevated(authority)?;

        let min_level = min_level.unwrap_or(ELEVATED_LEVEL_THRESHOLD);
        let mut matching = Vec::new();
        for user in self.users.list_all().await? {
            if !user.is_active {
                continue;
            }
            let user_authority = self.resolve_actor(&user).await?;
            if user_authority.level > min_level {
                matching.push(user);
            }
        }
        Ok(matching)
    }
}
