use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayerp_core::{AppError, AppResult};
use rayerp_domain::{
    DEFAULT_PERMISSION_CATALOG, PermissionId, PermissionName, PermissionRecord,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::ports::{PermissionFilter, PermissionRepository, PermissionUpdate, RoleRepository};

/// How long a cached name set stays valid without an explicit invalidation.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Active permission names grouped and listed for callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCatalog {
    /// Flat list sorted by category, then name.
    pub permissions: Vec<PermissionRecord>,
    /// The same records grouped by category.
    pub grouped: BTreeMap<String, Vec<PermissionRecord>>,
    /// Total count.
    pub total: usize,
}

/// One rejected item of a bulk create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemError {
    /// Requested permission name.
    pub name: String,
    /// Failure description.
    pub error: String,
}

/// Outcome of a bulk permission create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkCreateReport {
    /// Newly created permissions.
    pub created: Vec<PermissionRecord>,
    /// Names skipped because they already existed.
    pub skipped: Vec<String>,
    /// Per-item failures; one bad item never aborts the batch.
    pub errors: Vec<BulkItemError>,
}

/// One entry of a bulk create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkPermissionEntry {
    /// Permission name, `module.action` format.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Grouping label.
    pub category: String,
}

/// Outcome of the idempotent catalog seeding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Entries created by this run.
    pub created: usize,
    /// Entries that already existed and were left untouched.
    pub existing: usize,
}

/// Permission usage statistics for administrative tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionStats {
    /// Total stored permissions.
    pub total: usize,
    /// Active permissions.
    pub active: usize,
    /// Inactive permissions.
    pub inactive: usize,
    /// Number of distinct categories.
    pub categories: usize,
    /// Permission name to referencing role names.
    pub usage: BTreeMap<String, Vec<String>>,
    /// Top ten most referenced permissions.
    pub most_used: Vec<(String, Vec<String>)>,
}

struct CachedNames {
    names: BTreeSet<String>,
    refreshed_at: Instant,
}

/// Canonical catalog of legal permission strings with a read-through cache.
///
/// The cache is process-wide and read-mostly. Every mutating operation
/// invalidates it synchronously before returning; the TTL only bounds
/// staleness introduced outside this registry.
#[derive(Clone)]
pub struct PermissionRegistry {
    repository: Arc<dyn PermissionRepository>,
    roles: Arc<dyn RoleRepository>,
    cache: Arc<RwLock<Option<CachedNames>>>,
    cache_ttl: Duration,
}

impl PermissionRegistry {
    /// Creates a registry with the default five-minute cache TTL.
    #[must_use]
    pub fn new(repository: Arc<dyn PermissionRepository>, roles: Arc<dyn RoleRepository>) -> Self {
        Self::with_cache_ttl(repository, roles, CACHE_TTL)
    }

    /// Creates a registry with an explicit cache TTL (used by tests).
    #[must_use]
    pub fn with_cache_ttl(
        repository: Arc<dyn PermissionRepository>,
        roles: Arc<dyn RoleRepository>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            roles,
            cache: Arc::new(RwLock::new(None)),
            cache_ttl,
        }
    }

    /// Returns whether a candidate string matches the `module.action` grammar.
    #[must_use]
    pub fn validate_format(name: &str) -> bool {
        PermissionName::is_valid_format(name)
    }

    /// Returns whether an active permission with this name is stored.
    ///
    /// Served from the cached name set when fresh; rebuilt from the store
    /// otherwise.
    pub async fn exists(&self, name: &str) -> AppResult<bool> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref()
                && cached.refreshed_at.elapsed() < self.cache_ttl
            {
                return Ok(cached.names.contains(name));
            }
        }

        let names = self.rebuild_cache().await?;
        Ok(names.contains(name))
    }

    /// Drops the cached name set. Called by every mutating operation and
    /// available to external mutation paths.
    pub async fn invalidate_cache(&self) {
        *self.cache.write().await = None;
        debug!("permission cache invalidated");
    }

    /// Lists stored permissions with grouping and a total count.
    pub async fn list_all(&self, filter: PermissionFilter) -> AppResult<PermissionCatalog> {
        let permissions = self.repository.list(filter).await?;

        let mut grouped: BTreeMap<String, Vec<PermissionRecord>> = BTreeMap::new();
        for record in &permissions {
            grouped
                .entry(record.category.clone())
                .or_default()
                .push(record.clone());
        }

        let total = permissions.len();
        Ok(PermissionCatalog {
            permissions,
            grouped,
            total,
        })
    }

    /// Lists distinct categories, sorted.
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let permissions = self.repository.list(PermissionFilter::default()).await?;
        let categories: BTreeSet<String> = permissions
            .into_iter()
            .map(|record| record.category)
            .collect();
        Ok(categories.into_iter().collect())
    }

    /// Creates a permission after format and uniqueness validation.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        category: &str,
    ) -> AppResult<PermissionRecord> {
        let record = PermissionRecord::new(name, description, category)?;

        if self.repository.find_by_name(record.name.as_str()).await?.is_some() {
            return Err(AppError::Duplicate(format!(
                "permission '{}' already exists",
                record.name
            )));
        }

        self.repository.insert(record.clone()).await?;
        self.invalidate_cache().await;
        Ok(record)
    }

    /// Applies a partial update to a stored permission.
    pub async fn update(
        &self,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> AppResult<PermissionRecord> {
        let record = self.repository.update(id, update).await?;
        self.invalidate_cache().await;
        Ok(record)
    }

    /// Deletes a permission unless a role still references its name.
    ///
    /// The conflict error lists the referencing role names for
    /// administrative diagnosability.
    pub async fn delete(&self, id: PermissionId) -> AppResult<PermissionRecord> {
        let Some(record) = self.repository.find_by_id(id).await? else {
            return Err(AppError::NotFound(format!("permission '{id}' not found")));
        };

        let referencing: Vec<String> = self
            .roles
            .list_all()
            .await?
            .into_iter()
            .filter(|role| role.permissions.contains(record.name.as_str()))
            .map(|role| role.name)
            .collect();

        if !referencing.is_empty() {
            return Err(AppError::Conflict(format!(
                "permission '{}' is used by {} role(s): {}",
                record.name,
                referencing.len(),
                referencing.join(", ")
            )));
        }

        let removed = self.repository.delete(id).await?;
        self.invalidate_cache().await;
        Ok(removed)
    }

    /// Creates many permissions with per-item failure isolation.
    pub async fn bulk_create(
        &self,
        entries: Vec<BulkPermissionEntry>,
    ) -> AppResult<BulkCreateReport> {
        let mut report = BulkCreateReport::default();

        for entry in entries {
            if !Self::validate_format(&entry.name) {
                report.errors.push(BulkItemError {
                    name: entry.name,
                    error: "invalid permission format, expected module.action".to_owned(),
                });
                continue;
            }

            if self.repository.find_by_name(&entry.name).await?.is_some() {
                report.skipped.push(entry.name);
                continue;
            }

            match PermissionRecord::new(&entry.name, &entry.description, &entry.category) {
                Ok(record) => match self.repository.insert(record.clone()).await {
                    Ok(()) => report.created.push(record),
                    Err(error) => report.errors.push(BulkItemError {
                        name: entry.name,
                        error: error.to_string(),
                    }),
                },
                Err(error) => report.errors.push(BulkItemError {
                    name: entry.name,
                    error: error.to_string(),
                }),
            }
        }

        self.invalidate_cache().await;
        Ok(report)
    }

    /// Computes usage statistics across permissions and roles.
    pub async fn stats(&self) -> AppResult<PermissionStats> {
        let permissions = self.repository.list(PermissionFilter::default()).await?;
        let roles = self.roles.list_all().await?;

        let total = permissions.len();
        let active = permissions.iter().filter(|record| record.is_active).count();
        let categories: BTreeSet<&str> = permissions
            .iter()
            .map(|record| record.category.as_str())
            .collect();

        let mut usage: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for role in &roles {
            for permission in &role.permissions {
                usage
                    .entry(permission.clone())
                    .or_default()
                    .push(role.name.clone());
            }
        }

        let mut most_used: Vec<(String, Vec<String>)> = usage
            .iter()
            .map(|(permission, roles)| (permission.clone(), roles.clone()))
            .collect();
        most_used.sort_by(|left, right| right.1.len().cmp(&left.1.len()));
        most_used.truncate(10);

        Ok(PermissionStats {
            total,
            active,
            inactive: total - active,
            categories: categories.len(),
            usage,
            most_used,
        })
    }

    /// Seeds the fixed default catalog, leaving existing names untouched.
    pub async fn seed_default_catalog(&self) -> AppResult<SeedReport> {
        let mut report = SeedReport::default();

        for entry in DEFAULT_PERMISSION_CATALOG {
            if self.repository.find_by_name(entry.name).await?.is_some() {
                report.existing += 1;
                continue;
            }

            let record = PermissionRecord::new(entry.name, entry.description, entry.category)?;
            self.repository.insert(record).await?;
            report.created += 1;
        }

        self.invalidate_cache().await;
        info!(
            created = report.created,
            existing = report.existing,
            "permission catalog seeded"
        );
        Ok(report)
    }

    async fn rebuild_cache(&self) -> AppResult<BTreeSet<String>> {
        let names: BTreeSet<String> = self
            .repository
            .list(PermissionFilter {
                category: None,
                is_active: Some(true),
            })
            .await?
            .into_iter()
            .map(|record| String::from(record.name))
            .collect();

        *self.cache.write().await = Some(CachedNames {
            names: names.clone(),
            refreshed_at: Instant::now(),
        });

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rayerp_core::AppError;
    use rayerp_domain::Role;

    use crate::ports::{PermissionFilter, PermissionUpdate};
    use crate::test_support::{FakePermissionRepository, FakeRoleRepository};

    use super::{BulkPermissionEntry, PermissionRegistry};

    fn registry() -> (
        PermissionRegistry,
        Arc<FakePermissionRepository>,
        Arc<FakeRoleRepository>,
    ) {
        let permissions = Arc::new(FakePermissionRepository::default());
        let roles = Arc::new(FakeRoleRepository::default());
        let registry = PermissionRegistry::new(permissions.clone(), roles.clone());
        (registry, permissions, roles)
    }

    #[tokio::test]
    async fn create_then_exists_without_waiting_for_ttl() {
        let (registry, _, _) = registry();

        assert!(!registry.exists("users.view").await.unwrap_or(true));
        registry
            .create("users.view", "View users", "User Management")
            .await
            .unwrap_or_else(|error| panic!("create failed: {error}"));

        // Invalidation-on-write must make the new name visible immediately.
        assert!(registry.exists("users.view").await.unwrap_or(false));
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let (registry, _, _) = registry();
        let first = registry.create("users.view", "View users", "User Management").await;
        assert!(first.is_ok());

        let second = registry.create("users.view", "View users", "User Management").await;
        assert!(matches!(second, Err(AppError::Duplicate(_))));
    }

    #[tokio::test]
    async fn malformed_name_is_rejected() {
        let (registry, _, _) = registry();
        let result = registry.create("Users:View", "bad", "Other").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn deactivated_permission_fails_exists() {
        let (registry, _, _) = registry();
        let record = registry
            .create("users.view", "View users", "User Management")
            .await
            .unwrap_or_else(|error| panic!("create failed: {error}"));

        registry
            .update(
                record.id,
                PermissionUpdate {
                    is_active: Some(false),
                    ..PermissionUpdate::default()
                },
            )
            .await
            .unwrap_or_else(|error| panic!("update failed: {error}"));

        assert!(!registry.exists("users.view").await.unwrap_or(true));
    }

    #[tokio::test]
    async fn delete_blocked_while_role_references_name() {
        let (registry, _, roles) = registry();
        let record = registry
            .create("users.view", "View users", "User Management")
            .await
            .unwrap_or_else(|error| panic!("create failed: {error}"));

        roles
            .push(Role::new(
                "Support",
                "",
                std::collections::BTreeSet::from(["users.view".to_owned()]),
                40,
            ))
            .await;

        let result = registry.delete(record.id).await;
        match result {
            Err(AppError::Conflict(message)) => assert!(message.contains("Support")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bulk_create_isolates_bad_items() {
        let (registry, _, _) = registry();
        registry
            .create("users.view", "View users", "User Management")
            .await
            .unwrap_or_else(|error| panic!("create failed: {error}"));

        let report = registry
            .bulk_create(vec![
                BulkPermissionEntry {
                    name: "users.view".to_owned(),
                    description: "dup".to_owned(),
                    category: "User Management".to_owned(),
                },
                BulkPermissionEntry {
                    name: "NOT-A-NAME".to_owned(),
                    description: "bad".to_owned(),
                    category: "Other".to_owned(),
                },
                BulkPermissionEntry {
                    name: "invoices.create".to_owned(),
                    description: "Create invoices".to_owned(),
                    category: "Invoicing".to_owned(),
                },
            ])
            .await
            .unwrap_or_else(|error| panic!("bulk create failed: {error}"));

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.skipped, vec!["users.view".to_owned()]);
        assert_eq!(report.errors.len(), 1);
        assert!(registry.exists("invoices.create").await.unwrap_or(false));
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let (registry, _, _) = registry();

        let first = registry
            .seed_default_catalog()
            .await
            .unwrap_or_else(|error| panic!("seed failed: {error}"));
        assert_eq!(first.existing, 0);
        assert!(first.created > 0);

        let second = registry
            .seed_default_catalog()
            .await
            .unwrap_or_else(|error| panic!("seed failed: {error}"));
        assert_eq!(second.created, 0);
        assert_eq!(second.existing, first.created);
    }

    #[tokio::test]
    async fn stale_cache_is_rebuilt_after_ttl() {
        let permissions = Arc::new(FakePermissionRepository::default());
        let roles = Arc::new(FakeRoleRepository::default());
        let registry = PermissionRegistry::with_cache_ttl(
            permissions.clone(),
            roles,
            Duration::from_millis(0),
        );

        assert!(!registry.exists("finance.view").await.unwrap_or(true));

        // Write behind the registry's back; a zero TTL forces a rebuild.
        permissions
            .insert_raw("finance.view", "View finance records", "Finance")
            .await;
        assert!(registry.exists("finance.view").await.unwrap_or(false));
    }

    #[tokio::test]
    async fn list_all_groups_by_category() {
        let (registry, _, _) = registry();
        registry
            .create("users.view", "View users", "User Management")
            .await
            .unwrap_or_else(|error| panic!("create failed: {error}"));
        registry
            .create("finance.view", "View finance", "Finance")
            .await
            .unwrap_or_else(|error| panic!("create failed: {error}"));

        let catalog = registry
            .list_all(PermissionFilter::default())
            .await
            .unwrap_or_else(|error| panic!("list failed: {error}"));

        assert_eq!(catalog.total, 2);
        assert_eq!(catalog.grouped.len(), 2);
        assert!(catalog.grouped.contains_key("Finance"));
    }
}
