//! Idempotent startup seeding and legacy role migration.

use std::collections::BTreeSet;
use std::sync::Arc;

use rayerp_core::AppResult;
use rayerp_domain::{LegacyRole, Role, RoleBinding, RoleId};

use crate::permission_registry::PermissionRegistry;
use crate::ports::{RoleRepository, UserRepository};

/// Level given to the catch-all role minted during migration.
const EMPLOYEE_ROLE_LEVEL: i32 = 30;

/// Outcome of one bootstrap run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Permission catalog entries created by this run.
    pub permissions_created: usize,
    /// System roles created by this run.
    pub roles_created: usize,
}

/// Outcome of the legacy role migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Users moved from a legacy enum to a role reference.
    pub migrated: usize,
    /// Users already holding a role reference, left untouched.
    pub skipped: usize,
}

/// Seeds the default catalog and system roles, and migrates users off
/// the legacy role enum. Every entry point is safe to re-run.
#[derive(Clone)]
pub struct BootstrapService {
    roles: Arc<dyn RoleRepository>,
    users: Arc<dyn UserRepository>,
    registry: PermissionRegistry,
}

impl BootstrapService {
    /// Creates the service over its repositories.
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        users: Arc<dyn UserRepository>,
        registry: PermissionRegistry,
    ) -> Self {
        Self {
            roles,
            users,
            registry,
        }
    }

    /// Seeds the permission catalog and the three system roles.
    ///
    /// Root is created at level 100 with the wildcard grant; Superadmin
    /// (90) and Admin (80) start empty, pending explicit grants from
    /// Root. Existing entries are left untouched.
    pub async fn seed_defaults(&self) -> AppResult<BootstrapReport> {
        let mut report = BootstrapReport::default();

        let seeded = self.registry.seed_default_catalog().await?;
        report.permissions_created = seeded.created;

        for role in [
            Role::root(),
            Role::seeded_default("Superadmin", "Full administration short of Root", 90),
            Role::seeded_default("Admin", "Administrative access", 80),
        ] {
            if self.roles.seed_system_role(role).await? {
                report.roles_created += 1;
            }
        }

        tracing::info!(
            permissions = report.permissions_created,
            roles = report.roles_created,
            "bootstrap seed complete"
        );
        Ok(report)
    }

    /// Moves users off the legacy string enum onto role references.
    ///
    /// `root`, `super_admin` and `admin` map to their seeded system
    /// roles; every other legacy value maps to an `Employee` role
    /// created on demand. Users already holding a reference are
    /// skipped, so re-runs are safe.
    pub async fn migrate_legacy_roles(&self) -> AppResult<MigrationReport> {
        let mut report = MigrationReport::default();
        let mut employee_role: Option<RoleId> = None;

        for user in self.users.list_all().await? {
            let legacy = match &user.role {
                RoleBinding::Legacy(legacy) => *legacy,
                RoleBinding::Reference(_) => {
                    report.skipped += 1;
                    continue;
                }
            };

            let target = match legacy {
                LegacyRole::Root => self.system_role_id("Root").await?,
                LegacyRole::SuperAdmin => self.system_role_id("Superadmin").await?,
                LegacyRole::Admin => self.system_role_id("Admin").await?,
                _ => match employee_role {
                    Some(id) => id,
                    None => {
                        let id = self.ensure_employee_role().await?;
                        employee_role = Some(id);
                        id
                    }
                },
            };

            self.users
                .set_role_binding(user.id, RoleBinding::Reference(target))
                .await?;
            report.migrated += 1;
        }

        tracing::info!(
            migrated = report.migrated,
            skipped = report.skipped,
            "legacy role migration complete"
        );
        Ok(report)
    }

    async fn system_role_id(&self, name: &str) -> AppResult<RoleId> {
        if let Some(role) = self.roles.find_by_name(name).await? {
            return Ok(role.id);
        }
        // Bootstrap seeding normally runs first; recover if it did not.
        self.seed_defaults().await?;
        match self.roles.find_by_name(name).await? {
            Some(role) => Ok(role.id),
            None => Err(rayerp_core::AppError::Internal(format!(
                "system role '{name}' missing after seeding"
            ))),
        }
    }

    async fn ensure_employee_role(&self) -> AppResult<RoleId> {
        if let Some(role) = self.roles.find_by_name("Employee").await? {
            return Ok(role.id);
        }
        let permissions: BTreeSet<String> = ["projects.view", "reports.view"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        let role = Role::new(
            "Employee",
            "Baseline staff access",
            permissions,
            EMPLOYEE_ROLE_LEVEL,
        );
        self.roles.seed_system_role(role.clone()).await?;
        Ok(role.id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{FakePermissionRepository, FakeRoleRepository, FakeUserRepository, test_user};

    fn service(
        roles: Arc<FakeRoleRepository>,
        users: Arc<FakeUserRepository>,
    ) -> BootstrapService {
        let registry = PermissionRegistry::new(
            Arc::new(FakePermissionRepository::default()),
            roles.clone(),
        );
        BootstrapService::new(roles, users, registry)
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let roles = Arc::new(FakeRoleRepository::default());
        let service = service(roles.clone(), Arc::new(FakeUserRepository::default()));

        let first = service
            .seed_defaults()
            .await
            .unwrap_or_else(|error| panic!("seed failed: {error}"));
        assert_eq!(first.roles_created, 3);
        assert!(first.permissions_created > 0);

        let second = service
            .seed_defaults()
            .await
            .unwrap_or_else(|error| panic!("seed failed: {error}"));
        assert_eq!(second.roles_created, 0);
        assert_eq!(second.permissions_created, 0);

        let root = roles
            .find_by_name("root")
            .await
            .unwrap_or_else(|error| panic!("lookup failed: {error}"))
            .unwrap_or_else(|| panic!("Root role missing"));
        assert_eq!(root.level, 100);
        assert!(root.has_wildcard());
        assert!(root.is_default);
    }

    #[tokio::test]
    async fn migration_maps_legacy_values_and_skips_references() {
        let roles = Arc::new(FakeRoleRepository::default());
        let users = Arc::new(FakeUserRepository::default());
        let service = service(roles.clone(), users.clone());
        service
            .seed_defaults()
            .await
            .unwrap_or_else(|error| panic!("seed failed: {error}"));

        let root_id = users
            .push(test_user("ada", RoleBinding::Legacy(LegacyRole::Root), Vec::new()))
            .await;
        let manager_id = users
            .push(test_user("mel", RoleBinding::Legacy(LegacyRole::Manager), Vec::new()))
            .await;
        let normal_id = users
            .push(test_user("nia", RoleBinding::Legacy(LegacyRole::Normal), Vec::new()))
            .await;
        let already = roles
            .find_by_name("Admin")
            .await
            .unwrap_or_else(|error| panic!("lookup failed: {error}"))
            .unwrap_or_else(|| panic!("Admin role missing"));
        let referenced_id = users
            .push(test_user("ref", RoleBinding::Reference(already.id), Vec::new()))
            .await;

        let report = service
            .migrate_legacy_roles()
            .await
            .unwrap_or_else(|error| panic!("migration failed: {error}"));
        assert_eq!(report.migrated, 3);
        assert_eq!(report.skipped, 1);

        let employee = roles
            .find_by_name("Employee")
            .await
            .unwrap_or_else(|error| panic!("lookup failed: {error}"))
            .unwrap_or_else(|| panic!("Employee role missing"));
        assert_eq!(employee.level, EMPLOYEE_ROLE_LEVEL);
        assert!(employee.permissions.contains("projects.view"));
        assert!(employee.permissions.contains("reports.view"));

        for (user_id, expected_name) in [
            (root_id, "Root"),
            (manager_id, "Employee"),
            (normal_id, "Employee"),
        ] {
            let user = users
                .find_by_id(user_id)
                .await
                .unwrap_or_else(|error| panic!("lookup failed: {error}"))
                .unwrap_or_else(|| panic!("user missing"));
            let expected = roles
                .find_by_name(expected_name)
                .await
                .unwrap_or_else(|error| panic!("lookup failed: {error}"))
                .unwrap_or_else(|| panic!("role missing"));
            assert_eq!(user.role, RoleBinding::Reference(expected.id));
        }

        let untouched = users
            .find_by_id(referenced_id)
            .await
            .unwrap_or_else(|error| panic!("lookup failed: {error}"))
            .unwrap_or_else(|| panic!("user missing"));
        assert_eq!(untouched.role, RoleBinding::Reference(already.id));

        // Re-running migrates nothing further.
        let rerun = service
            .migrate_legacy_roles()
            .await
            .unwrap_or_else(|error| panic!("migration failed: {error}"));
        assert_eq!(rerun.migrated, 0);
        assert_eq!(rerun.skipped, 4);
    }
}
