use std::collections::HashMap;

use async_trait::async_trait;
use rayerp_application::{PermissionFilter, PermissionRepository, PermissionUpdate};
use rayerp_core::{AppError, AppResult};
use rayerp_domain::{PermissionId, PermissionRecord};
use tokio::sync::RwLock;

/// In-memory permission catalog store.
#[derive(Debug, Default)]
pub struct InMemoryPermissionRepository {
    records: RwLock<HashMap<PermissionId, PermissionRecord>>,
}

impl InMemoryPermissionRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn insert(&self, record: PermissionRecord) -> AppResult<()> {
        let mut records = self.records.write().await;

        if records
            .values()
            .any(|stored| stored.name == record.name)
        {
            return Err(AppError::Duplicate(format!(
                "permission '{}' already exists",
                record.name
            )));
        }

        records.insert(record.id, record);
        Ok(())
    }

    async fn update(
        &self,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> AppResult<PermissionRecord> {
        let mut records = self.records.write().await;

        let Some(record) = records.get_mut(&id) else {
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
        let mut records = self.records.write().await;

        records
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("permission '{id}' not found")))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<PermissionRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|record| record.name.as_str() == name)
            .cloned())
    }

    async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<PermissionRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: PermissionFilter) -> AppResult<Vec<PermissionRecord>> {
        let records = self.records.read().await;

        let mut values: Vec<PermissionRecord> = records
            .values()
            .filter(|record| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|category| record.category == category)
                    && filter.is_active.is_none_or(|flag| record.is_active == flag)
            })
            .cloned()
            .collect();
        values.sort_by(|left, right| {
            (left.category.as_str(), left.name.as_str())
                .cmp(&(right.category.as_str(), right.name.as_str()))
        });

        Ok(values)
    }
}
