use super::*;

use rayerp_domain::{AuditAction, PermissionId, PermissionRecord};

use crate::permission_registry::{
    BulkCreateReport, BulkPermissionEntry, PermissionCatalog, PermissionStats,
};
use crate::ports::{AuditEvent, PermissionFilter, PermissionUpdate};

impl RbacAdminService {
    /// Lists the permission catalog, optionally filtered.
    pub async fn list_permissions(
        &self,
        actor: &User,
        filter: PermissionFilter,
    ) -> AppResult<PermissionCatalog> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_elevated(authority)?;
        self.registry.list_all(filter).await
    }

    /// Returns the distinct permission categories.
    pub async fn permission_categories(&self, actor: &User) -> AppResult<Vec<String>> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_elevated(authority)?;
        self.registry.categories().await
    }

    /// Returns catalog usage statistics.
    pub async fn permission_stats(&self, actor: &User) -> AppResult<PermissionStats> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_elevated(authority)?;
        self.registry.stats().await
    }

    /// Creates a permission. Root-only.
    pub async fn create_permission(
        &self,
        actor: &User,
        name: &str,
        description: &str,
        category: &str,
    ) -> AppResult<PermissionRecord> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_root(authority)?;

        let record = self.registry.create(name, description, category).await?;
        self.audit_permission_event(
            actor,
            AuditAction::PermissionCreated,
            &record,
            format!("created permission '{}'", record.name),
        )
        .await?;
        Ok(record)
    }

    /// Updates a permission's description, category or active flag.
    /// Root-only.
    pub async fn update_permission(
        &self,
        actor: &User,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> AppResult<PermissionRecord> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_root(authority)?;

        let record = self.registry.update(id, update).await?;
        self.audit_permission_event(
            actor,
            AuditAction::PermissionUpdated,
            &record,
            format!("updated permission '{}'", record.name),
        )
        .await?;
        Ok(record)
    }

    /// Deletes a permission. Root-only; refused while roles reference it.
    pub async fn delete_permission(
        &self,
        actor: &User,
        id: PermissionId,
    ) -> AppResult<PermissionRecord> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_root(authority)?;

        let record = self.registry.delete(id).await?;
        self.audit_permission_event(
            actor,
            AuditAction::PermissionDeleted,
            &record,
            format!("deleted permission '{}'", record.name),
        )
        .await?;
        Ok(record)
    }

    /// Creates many permissions at once. Root-only; per-item failures
    /// are reported rather than aborting the batch.
    pub async fn bulk_create_permissions(
        &self,
        actor: &User,
        entries: Vec<BulkPermissionEntry>,
    ) -> AppResult<BulkCreateReport> {
        let authority = self.resolve_actor(actor).await?;
        Self::require_root(authority)?;

        let report = self.registry.bulk_create(entries).await?;
        if !report.created.is_empty() {
            self.audit
                .append_event(AuditEvent {
                    subject: actor.email.as_str().to_owned(),
                    action: AuditAction::PermissionCreated,
                    resource_type: "permission".to_owned(),
                    resource_id: "bulk".to_owned(),
                    detail: Some(format!(
                        "bulk-created {} permission(s), {} skipped, {} failed",
                        report.created.len(),
                        report.skipped.len(),
                        report.errors.len()
                    )),
                })
                .await?;
        }
        Ok(report)
    }

    async fn audit_permission_event(
        &self,
        actor: &User,
        action: AuditAction,
        record: &PermissionRecord,
        detail: String,
    ) -> AppResult<()> {
        self.audit
            .append_event(AuditEvent {
                subject: actor.email.as_str().to_owned(),
                action,
                resource_type: "permission".to_owned(),
                resource_id: record.id.to_string(),
                detail: Some(detail),
            })
            .await
    }
}
