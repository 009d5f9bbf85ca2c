//! Per-request permission and project-access checks.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayerp_core::{AppError, AppResult};
use rayerp_domain::{ProjectAccessLevel, ProjectId, User, WILDCARD_PERMISSION};
use serde::Serialize;

use crate::ports::{ProjectAccessRepository, RoleRepository};

/// Resolved project access, attached to the request context after a
/// successful check so downstream handlers can read the granted level.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectAccessGrant {
    /// Project the grant applies to.
    pub project_id: ProjectId,
    /// Level the user actually holds on the project.
    pub access_level: ProjectAccessLevel,
    /// When the assignment was made.
    pub assigned_at: DateTime<Utc>,
}

/// Evaluates authorization decisions against the role store and the
/// per-project assignment table.
#[derive(Clone)]
pub struct AuthorizationService {
    roles: Arc<dyn RoleRepository>,
    project_access: Arc<dyn ProjectAccessRepository>,
}

impl AuthorizationService {
    /// Creates the service over its repositories.
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        project_access: Arc<dyn ProjectAccessRepository>,
    ) -> Self {
        Self {
            roles,
            project_access,
        }
    }

    /// Unions the permission sets of every active role the user holds.
    ///
    /// Inactive roles and dangling references contribute nothing. The
    /// wildcard entry is carried through as-is.
    pub async fn effective_permissions(&self, user: &User) -> AppResult<BTreeSet<String>> {
        let mut effective = BTreeSet::new();
        for role_id in user.role_references() {
            let Some(role) = self.roles.find_by_id(role_id).await? else {
                continue;
            };
            if !role.is_active {
                continue;
            }
            effective.extend(role.permissions.iter().cloned());
        }
        Ok(effective)
    }

    /// Allows when the user holds `permission` through any of its roles.
    ///
    /// Users still carrying a pre-migration `root`, `super_admin` or
    /// `admin` enum value are allowed unconditionally.
    pub async fn require_permission(&self, user: &User, permission: &str) -> AppResult<()> {
        if self.has_legacy_bypass(user) {
            return Ok(());
        }
        let effective = self.effective_permissions(user).await?;
        if grants(&effective, permission) {
            return Ok(());
        }
        Err(denied(&[permission], &effective))
    }

    /// Allows when the user holds at least one of `permissions`.
    pub async fn require_any_permission(
        &self,
        user: &User,
        permissions: &[&str],
    ) -> AppResult<()> {
        if self.has_legacy_bypass(user) {
            return Ok(());
        }
        let effective = self.effective_permissions(user).await?;
        if permissions.iter().any(|name| grants(&effective, name)) {
            return Ok(());
        }
        Err(denied(permissions, &effective))
    }

    /// Same union check as [`require_permission`] but without the legacy
    /// enum bypass. Used where blanket legacy trust must not apply.
    ///
    /// [`require_permission`]: Self::require_permission
    pub async fn check_role_permission(&self, user: &User, permission: &str) -> AppResult<bool> {
        let effective = self.effective_permissions(user).await?;
        Ok(grants(&effective, permission))
    }

    /// Verifies the user's assignment on `project_id` meets `required`.
    ///
    /// Denies when no active assignment exists or its level is below the
    /// required one. Legacy enum roles get no shortcut here.
    pub async fn check_project_access(
        &self,
        user: &User,
        project_id: ProjectId,
        required: ProjectAccessLevel,
    ) -> AppResult<ProjectAccessGrant> {
        let Some(assignment) = self
            .project_access
            .find_assignment(user.id, project_id)
            .await?
        else {
            return Err(AppError::PermissionDenied(format!(
                "not assigned to project '{project_id}'"
            )));
        };
        if !assignment.is_active {
            return Err(AppError::PermissionDenied(format!(
                "not assigned to project '{project_id}'"
            )));
        }
        if !assignment.access_level.satisfies(required) {
            return Err(AppError::PermissionDenied(format!(
                "project '{project_id}' requires {} access, assignment grants {}",
                required.as_str(),
                assignment.access_level.as_str()
            )));
        }
        Ok(ProjectAccessGrant {
            project_id,
            access_level: assignment.access_level,
            assigned_at: assignment.assigned_at,
        })
    }

    /// Sequences a bypass-free permission check and a project access
    /// check. The first failing stage denies.
    pub async fn check_role_and_project_access(
        &self,
        user: &User,
        permission: &str,
        project_id: ProjectId,
        required: ProjectAccessLevel,
    ) -> AppResult<ProjectAccessGrant> {
        let effective = self.effective_permissions(user).await?;
        if !grants(&effective, permission) {
            return Err(denied(&[permission], &effective));
        }
        self.check_project_access(user, project_id, required).await
    }

    fn has_legacy_bypass(&self, user: &User) -> bool {
        user.legacy_role()
            .is_some_and(|legacy| legacy.has_blanket_access())
    }
}

fn grants(effective: &BTreeSet<String>, permission: &str) -> bool {
    effective.contains(WILDCARD_PERMISSION) || effective.contains(permission)
}

fn denied(requested: &[&str], effective: &BTreeSet<String>) -> AppError {
    let effective_list = effective
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    AppError::PermissionDenied(format!(
        "missing permission '{}' (effective permissions: [{effective_list}])",
        requested.join("' or '")
    ))
}
