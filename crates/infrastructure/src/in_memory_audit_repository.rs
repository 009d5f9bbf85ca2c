use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rayerp_application::{AuditEvent, AuditRepository};
use rayerp_core::AppResult;
use tokio::sync::RwLock;

/// A stored audit event with its append timestamp.
#[derive(Debug, Clone)]
pub struct StoredAuditEvent {
    /// The appended event.
    pub event: AuditEvent,
    /// When it was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// In-memory append-only audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<StoredAuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    /// Returns every recorded event in append order.
    pub async fn all(&self) -> Vec<StoredAuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.write().await.push(StoredAuditEvent {
            event,
            recorded_at: Utc::now(),
        });
        Ok(())
    }
}
