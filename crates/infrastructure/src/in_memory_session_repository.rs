use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rayerp_application::SessionRepository;
use rayerp_core::{AppError, AppResult};
use rayerp_domain::{SessionId, UserId, UserSession};
use tokio::sync::RwLock;

/// In-memory session store keyed by token hash.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, UserSession>>,
}

impl InMemorySessionRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: UserSession) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&session.token_hash) {
            return Err(AppError::Duplicate("session token collision".to_owned()));
        }

        sessions.insert(session.token_hash.clone(), session);
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<UserSession>> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserSession>> {
        let sessions = self.sessions.read().await;

        let mut values: Vec<UserSession> = sessions
            .values()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect();
        values.sort_by_key(|session| session.created_at);

        Ok(values)
    }

    async fn list_live(&self, now: DateTime<Utc>) -> AppResult<Vec<UserSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|session| session.is_live(now))
            .cloned()
            .collect())
    }

    async fn count_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|session| session.expires_at <= now)
            .count() as u64)
    }

    async fn touch(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;

        if let Some(session) = sessions.get_mut(token_hash) {
            session.last_active = now;
        }
        Ok(())
    }

    async fn delete_by_session_id(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> AppResult<bool> {
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions
            .retain(|_, session| !(session.user_id == user_id && session.session_id == session_id));
        Ok(sessions.len() < before)
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> AppResult<bool> {
        Ok(self.sessions.write().await.remove(token_hash).is_some())
    }

    async fn delete_for_user_except(&self, user_id: UserId, token_hash: &str) -> AppResult<u64> {
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|stored_hash, session| {
            session.user_id != user_id || stored_hash == token_hash
        });
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}
