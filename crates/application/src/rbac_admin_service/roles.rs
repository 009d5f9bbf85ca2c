use super::*;

use rayerp_domain::{AuditAction, ROOT_ROLE_LEVEL, Role, RoleId, WILDCARD_PERMISSION};

use crate::ports::{AuditEvent, NewRole, RoleUpdate};

/// One rejected item of a bulk role deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRoleError {
    /// Role the deletion was attempted on.
    pub role_id: RoleId,
    /// Failure description.
    pub error: String,
}

/// Outcome of a bulk role deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteReport {
    /// Names of the roles deleted by this run.
    pub deleted: Vec<String>,
    /// Per-item failures; one bad item never aborts the batch.
    pub errors: Vec<BulkRoleError>,
}

impl RbacAdminService {
    /// Returns all roles, highest level first.
    pub async fn list_roles(&self, actor: &User) -> AppResult<Vec<Role>> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_elevated(authority)?;
        self.roles.list_all().await
    }

    /// Creates a role. Root-only.
    ///
    /// Every requested permission must exist in the registry; the
    /// wildcard and the Root level are reserved.
    pub async fn create_role(&self, actor: &User, input: NewRole) -> AppResult<Role> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_root(authority)?;

        if input.name.trim().is_empty() {
            return Err(AppError::Validation("role name must not be empty".to_owned()));
        }
        if input.level.is_some_and(|level| level >= ROOT_ROLE_LEVEL) {
            return Err(AppError::Validation(format!(
                "role level must be below {ROOT_ROLE_LEVEL}"
            )));
        }
        self.validate_permission_names(&input.permissions).await?;

        let role = self.roles.create(input).await?;

        self.audit_role_event(
            actor,
            AuditAction::RoleCreated,
            &role,
            format!("created role '{}' at level {}", role.name, role.level),
        )
        .await?;

        Ok(role)
    }

    /// Updates a role under the delegation rules.
    ///
    /// Root may change anything on non-Root roles. Elevated callers may
    /// only shrink the permission set of other high-level roles.
    pub async fn update_role(
        &self,
        actor: &User,
        role_id: RoleId,
        update: RoleUpdate,
    ) -> AppResult<Role> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_elevated(authority)?;

        let Some(target) = self.roles.find_by_id(role_id).await? else {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        };
        if target.is_root() {
            return Err(AppError::Forbidden("the Root role is immutable".to_owned()));
        }

        if !authority.is_root {
            if target.level <= ELEVATED_LEVEL_THRESHOLD {
                return Err(AppError::Forbidden(
                    "elevated callers may only update roles above the elevation threshold"
                        .to_owned(),
                ));
            }
            if update.name.is_some() || update.level.is_some() || update.is_active.is_some() {
                return Err(AppError::Forbidden(
                    "elevated callers may only update role permissions".to_owned(),
                ));
            }
            if let Some(requested) = &update.permissions
                && !requested.is_subset(&target.permissions)
            {
                return Err(AppError::Forbidden(
                    "elevated callers can only reduce, not add, permissions".to_owned(),
                ));
            }
        }

        if update.level.is_some_and(|level| level >= ROOT_ROLE_LEVEL) {
            return Err(AppError::Validation(format!(
                "role level must be below {ROOT_ROLE_LEVEL}"
            )));
        }
        if let Some(requested) = &update.permissions {
            self.validate_permission_names(requested).await?;
        }

        let updated = self.roles.update(role_id, update).await?;

        self.audit_role_event(
            actor,
            AuditAction::RoleUpdated,
            &updated,
            format!("updated role '{}'", updated.name),
        )
        .await?;

        Ok(updated)
    }

    /// Deletes a role. Root-only; refused while users still hold it.
    pub async fn delete_role(&self, actor: &User, role_id: RoleId) -> AppResult<Role> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_root(authority)?;
        self.delete_role_checked(actor, role_id).await
    }

    /// Deletes several roles, accumulating per-item failures.
    pub async fn bulk_delete_roles(
        &self,
        actor: &User,
        role_ids: Vec<RoleId>,
    ) -> AppResult<BulkDeleteReport> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_root(authority)?;

        let mut report = BulkDeleteReport::default();
        for role_id in role_ids {
            match self.delete_role_checked(actor, role_id).await {
                Ok(role) => report.deleted.push(role.name),
                Err(error) => report.errors.push(BulkRoleError {
                    role_id,
                    error: error.to_string(),
                }),
            }
        }
        Ok(report)
    }

    /// Flips a role's active flag. Root-only; Root itself stays active.
    pub async fn toggle_role_status(&self, actor: &User, role_id: RoleId) -> AppResult<Role> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_root(authority)?;

        let Some(target) = self.roles.find_by_id(role_id).await? else {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        };
        if target.is_root() {
            return Err(AppError::Forbidden(
                "the Root role cannot be deactivated".to_owned(),
            ));
        }

        let updated = self
            .roles
            .update(
                role_id,
                RoleUpdate {
                    is_active: Some(!target.is_active),
                    ..RoleUpdate::default()
                },
            )
            .await?;

        self.audit_role_event(
            actor,
            AuditAction::RoleStatusToggled,
            &updated,
            format!(
                "role '{}' is now {}",
                updated.name,
                if updated.is_active { "active" } else { "inactive" }
            ),
        )
        .await?;

        Ok(updated)
    }

    /// Removes the listed permissions from a role, returning how many
    /// were actually present and removed.
    pub async fn reduce_role_permissions(
        &self,
        actor: &User,
        role_id: RoleId,
        remove: &[String],
    ) -> AppResult<usize> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_elevated(authority)?;

        if remove.is_empty() {
            return Err(AppError::Validation(
                "at least one permission to remove is required".to_owned(),
            ));
        }

        let Some(target) = self.roles.find_by_id(role_id).await? else {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        };
        if target.is_root() {
            return Err(AppError::Forbidden("the Root role is immutable".to_owned()));
        }
        if !authority.is_root && target.level <= ELEVATED_LEVEL_THRESHOLD {
            return Err(AppError::Forbidden(
                "elevated callers may only reduce roles above the elevation threshold".to_owned(),
            ));
        }

        let mut remaining = target.permissions.clone();
        let mut removed = 0usize;
        for name in remove {
            if remaining.remove(name) {
                removed += 1;
            }
        }

        if removed > 0 {
            let updated = self
                .roles
                .update(
                    role_id,
                    RoleUpdate {
                        permissions: Some(remaining),
                        ..RoleUpdate::default()
                    },
                )
                .await?;

            self.audit_role_event(
                actor,
                AuditAction::RolePermissionsReduced,
                &updated,
                format!("removed {removed} permission(s) from role '{}'", updated.name),
            )
            .await?;
        }

        Ok(removed)
    }

    async fn delete_role_checked(&self, actor: &User, role_id: RoleId) -> AppResult<Role> {
        let Some(target) = self.roles.find_by_id(role_id).await? else {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        };
        if target.is_root() {
            return Err(AppError::Forbidden("the Root role cannot be deleted".to_owned()));
        }

        let holders = self.users.count_with_role(role_id).await?;
        if holders > 0 {
            return Err(AppError::Conflict(format!(
                "role '{}' is assigned to {holders} user(s)",
                target.name
            )));
        }

        self.roles.delete(role_id).await?;

        self.audit_role_event(
            actor,
            AuditAction::RoleDeleted,
            &target,
            format!("deleted role '{}'", target.name),
        )
        .await?;

        Ok(target)
    }

    async fn validate_permission_names(
        &self,
        permissions: &std::collections::BTreeSet<String>,
    ) -> AppResult<()> {
        for name in permissions {
            if name == WILDCARD_PERMISSION {
                return Err(AppError::Validation(
                    "the wildcard permission is reserved for the Root role".to_owned(),
                ));
            }
            if !self.registry.exists(name).await? {
                return Err(AppError::Validation(format!(
                    "unknown permission '{name}'"
                )));
            }
        }
        Ok(())
    }

    async fn audit_role_event(
        &self,
        actor: &User,
        action: AuditAction,
        role: &Role,
        detail: String,
    ) -> AppResult<()> {
        self.audit
            .append_event(AuditEvent {
                subject: actor.email.as_str().to_owned(),
                action,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id.to_string(),
                detail: Some(detail),
            })
            .await
    }
}
