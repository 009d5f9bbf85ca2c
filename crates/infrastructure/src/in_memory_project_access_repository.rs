use std::collections::HashMap;

use async_trait::async_trait;
use rayerp_application::ProjectAccessRepository;
use rayerp_core::AppResult;
use rayerp_domain::{ProjectId, UserId, UserProjectAssignment};
use tokio::sync::RwLock;

/// In-memory project assignment store.
///
/// Keyed by `(user, project)`, which makes the one-assignment-per-pair
/// invariant structural.
#[derive(Debug, Default)]
pub struct InMemoryProjectAccessRepository {
    assignments: RwLock<HashMap<(UserId, ProjectId), UserProjectAssignment>>,
}

impl InMemoryProjectAccessRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            assignments: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ProjectAccessRepository for InMemoryProjectAccessRepository {
    async fn find_assignment(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Option<UserProjectAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .get(&(user_id, project_id))
            .cloned())
    }

    async fn upsert_assignment(&self, assignment: UserProjectAssignment) -> AppResult<()> {
        self.assignments
            .write()
            .await
            .insert((assignment.user_id, assignment.project_id), assignment);
        Ok(())
    }
}
