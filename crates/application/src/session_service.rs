//! Session lifecycle: issuance, enumeration, revocation and cleanup.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rayerp_core::{AppError, AppResult};
use rayerp_domain::{AuditAction, DeviceInfo, SessionId, UserId, UserSession};
use serde::Serialize;

use crate::ports::{AuditEvent, AuditRepository, SessionRepository};

mod token_crypto;

/// Default bound on concurrent sessions per user.
pub const DEFAULT_SESSION_LIMIT: usize = 2;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Client-supplied request metadata captured at login.
#[derive(Debug, Clone, Default)]
pub struct SessionMetadata {
    /// Raw user-agent header, may be empty.
    pub user_agent: String,
    /// Remote address as reported by the transport.
    pub ip_address: String,
    /// Optional coarse location label.
    pub location: Option<String>,
}

/// A session row decorated for the owning user's session list.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    /// The underlying session.
    #[serde(flatten)]
    pub session: UserSession,
    /// True for the session backing the current request.
    pub is_current: bool,
}

/// Aggregate session counters for administrative dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatistics {
    /// Live sessions across all users.
    pub total_active: usize,
    /// Expired rows not yet reaped by cleanup.
    pub expired_pending_cleanup: u64,
    /// Users with at least one live session.
    pub unique_users: usize,
    /// Mean live sessions per user with any.
    pub average_per_user: f64,
    /// Largest live session count held by a single user.
    pub max_per_user: usize,
}

/// Issues and tracks bearer sessions.
///
/// Tokens are random 32-byte hex strings; only their SHA-256 hash is
/// stored. Expired rows are hard-deleted by [`cleanup_expired_sessions`].
///
/// [`cleanup_expired_sessions`]: Self::cleanup_expired_sessions
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    audit: Arc<dyn AuditRepository>,
    ttl: Duration,
    session_limit: usize,
}

impl SessionService {
    /// Creates the service with the default TTL and session limit.
    pub fn new(sessions: Arc<dyn SessionRepository>, audit: Arc<dyn AuditRepository>) -> Self {
        Self::with_limits(
            sessions,
            audit,
            Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            DEFAULT_SESSION_LIMIT,
        )
    }

    /// Creates the service with explicit TTL and per-user limit.
    pub fn with_limits(
        sessions: Arc<dyn SessionRepository>,
        audit: Arc<dyn AuditRepository>,
        ttl: Duration,
        session_limit: usize,
    ) -> Self {
        Self {
            sessions,
            audit,
            ttl,
            session_limit,
        }
    }

    /// Generates a fresh bearer token and its storage hash.
    pub fn generate_session_token() -> AppResult<(String, String)> {
        token_crypto::generate_token()
    }

    /// Hashes a presented bearer token for lookup.
    #[must_use]
    pub fn hash_session_token(raw_token: &str) -> String {
        token_crypto::hash_token(raw_token)
    }

    /// Records a new session for a successful login.
    ///
    /// When the user exceeds the concurrent session limit, the oldest
    /// surplus sessions are deleted.
    pub async fn create_session(
        &self,
        user_id: UserId,
        token_hash: String,
        metadata: SessionMetadata,
    ) -> AppResult<UserSession> {
        let now = Utc::now();
        let session = UserSession {
            user_id,
            token_hash,
            session_id: SessionId::new(),
            device_info: DeviceInfo::from_user_agent(&metadata.user_agent),
            ip_address: metadata.ip_address,
            location: metadata.location,
            created_at: now,
            last_active: now,
            expires_at: now + self.ttl,
            is_active: true,
        };
        self.sessions.insert(session.clone()).await?;

        let mut live: Vec<UserSession> = self
            .sessions
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|stored| stored.is_live(now))
            .collect();
        if live.len() > self.session_limit {
            live.sort_by_key(|stored| stored.created_at);
            let surplus = live.len() - self.session_limit;
            for stale in live.into_iter().take(surplus) {
                self.sessions
                    .delete_by_session_id(user_id, stale.session_id)
                    .await?;
            }
        }

        Ok(session)
    }

    /// Resolves a presented token hash to its live session, if any.
    pub async fn find_live_session(&self, token_hash: &str) -> AppResult<Option<UserSession>> {
        let now = Utc::now();
        Ok(self
            .sessions
            .find_by_token_hash(token_hash)
            .await?
            .filter(|session| session.is_live(now)))
    }

    /// Bumps a session's `last_active` timestamp.
    pub async fn touch(&self, token_hash: &str) -> AppResult<()> {
        self.sessions.touch(token_hash, Utc::now()).await
    }

    /// Lists the user's live sessions, most recently active first, with
    /// the current session marked.
    pub async fn list_active_sessions(
        &self,
        user_id: UserId,
        current_token_hash: &str,
    ) -> AppResult<Vec<SessionView>> {
        let now = Utc::now();
        let mut live: Vec<UserSession> = self
            .sessions
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|session| session.is_live(now))
            .collect();
        live.sort_by(|left, right| right.last_active.cmp(&left.last_active));

        Ok(live
            .into_iter()
            .map(|session| {
                let is_current = session.token_hash == current_token_hash;
                SessionView {
                    session,
                    is_current,
                }
            })
            .collect())
    }

    /// Revokes one of the user's other sessions.
    ///
    /// The session backing the current request must go through logout
    /// instead.
    pub async fn revoke_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
        current_token_hash: &str,
    ) -> AppResult<()> {
        let owned = self.sessions.list_for_user(user_id).await?;
        let Some(target) = owned
            .iter()
            .find(|session| session.session_id == session_id)
        else {
            return Err(AppError::NotFound(format!(
                "session '{session_id}' not found"
            )));
        };
        if target.token_hash == current_token_hash {
            return Err(AppError::Validation(
                "cannot revoke the current session, use logout instead".to_owned(),
            ));
        }

        self.sessions.delete_by_session_id(user_id, session_id).await?;

        self.audit
            .append_event(AuditEvent {
                subject: user_id.to_string(),
                action: AuditAction::SessionRevoked,
                resource_type: "user_session".to_owned(),
                resource_id: session_id.to_string(),
                detail: Some("session revoked by its owner".to_owned()),
            })
            .await
    }

    /// Deletes every session of the user except the current one.
    pub async fn revoke_all_other_sessions(
        &self,
        user_id: UserId,
        current_token_hash: &str,
    ) -> AppResult<u64> {
        let revoked = self
            .sessions
            .delete_for_user_except(user_id, current_token_hash)
            .await?;

        if revoked > 0 {
            self.audit
                .append_event(AuditEvent {
                    subject: user_id.to_string(),
                    action: AuditAction::SessionRevoked,
                    resource_type: "user_session".to_owned(),
                    resource_id: user_id.to_string(),
                    detail: Some(format!("revoked {revoked} other session(s)")),
                })
                .await?;
        }

        Ok(revoked)
    }

    /// Deletes the current session outright (logout).
    pub async fn end_session(&self, token_hash: &str) -> AppResult<bool> {
        self.sessions.delete_by_token_hash(token_hash).await
    }

    /// Hard-deletes expired sessions. Idempotent; returns the count.
    pub async fn cleanup_expired_sessions(&self) -> AppResult<u64> {
        let removed = self.sessions.delete_expired(Utc::now()).await?;

        if removed > 0 {
            self.audit
                .append_event(AuditEvent {
                    subject: "system".to_owned(),
                    action: AuditAction::SessionsCleaned,
                    resource_type: "user_session".to_owned(),
                    resource_id: "cleanup".to_owned(),
                    detail: Some(format!("removed {removed} expired session(s)")),
                })
                .await?;
        }

        Ok(removed)
    }

    /// Computes aggregate counters over live and expired sessions.
    pub async fn get_statistics(&self) -> AppResult<SessionStatistics> {
        let now = Utc::now();
        let live = self.sessions.list_live(now).await?;
        let expired = self.sessions.count_expired(now).await?;

        let mut per_user: std::collections::HashMap<UserId, usize> = std::collections::HashMap::new();
        for session in &live {
            *per_user.entry(session.user_id).or_default() += 1;
        }

        let unique_users = per_user.len();
        let max_per_user = per_user.values().copied().max().unwrap_or(0);
        let average_per_user = if unique_users == 0 {
            0.0
        } else {
            live.len() as f64 / unique_users as f64
        };

        Ok(SessionStatistics {
            total_active: live.len(),
            expired_pending_cleanup: expired,
            unique_users,
            average_per_user,
            max_per_user,
        })
    }
}
