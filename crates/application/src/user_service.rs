//! Credential login and user provisioning.

use std::sync::Arc;

use rayerp_core::{AppError, AppResult, NonEmptyString};
use rayerp_domain::{EmailAddress, RoleBinding, User, UserId, UserSession};

use crate::ports::{PasswordHasher, UserRepository};
use crate::session_service::{SessionMetadata, SessionService};

/// A successful login: the resolved user, the raw bearer token and the
/// session tracking it.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    /// Authenticated user.
    pub user: User,
    /// Raw bearer token, returned to the client exactly once.
    pub token: String,
    /// The session recorded for this login.
    pub session: UserSession,
}

/// Authenticates local credentials and provisions users.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: SessionService,
}

impl UserService {
    /// Creates the service over its repositories and the session layer.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        sessions: SessionService,
    ) -> Self {
        Self {
            users,
            hasher,
            sessions,
        }
    }

    /// Verifies credentials and opens a session.
    ///
    /// Every failure path returns the same `Unauthorized` message and
    /// runs a hash verification, so unknown addresses are
    /// indistinguishable from wrong passwords.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        metadata: SessionMetadata,
    ) -> AppResult<AuthOutcome> {
        let normalized = EmailAddress::new(email)?;
        let user = self.users.find_by_email(normalized.as_str()).await?;

        let stored_hash = user
            .as_ref()
            .filter(|user| user.is_active)
            .and_then(|user| user.password_hash.clone());

        let verified = match &stored_hash {
            Some(hash) => self.hasher.verify_password(password, hash)?,
            None => {
                // Burn a hash so absent accounts cost the same as wrong
                // passwords.
                let _ = self.hasher.hash_password(password)?;
                false
            }
        };

        let (Some(user), true) = (user, verified) else {
            return Err(AppError::Unauthorized("invalid credentials".to_owned()));
        };

        let (token, token_hash) = SessionService::generate_session_token()?;
        let session = self
            .sessions
            .create_session(user.id, token_hash, metadata)
            .await?;

        tracing::info!(user = %user.email.as_str(), "login succeeded");
        Ok(AuthOutcome {
            user,
            token,
            session,
        })
    }

    /// Creates a user with a hashed password. Used by seeding and
    /// administrative provisioning.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: RoleBinding,
    ) -> AppResult<User> {
        let name = NonEmptyString::new(name.trim())
            .map_err(|_| AppError::Validation("user name must not be empty".to_owned()))?;
        let email = EmailAddress::new(email)?;
        let password_hash = self.hasher.hash_password(password)?;

        let user = User {
            id: UserId::new(),
            name: name.into(),
            email,
            password_hash: Some(password_hash),
            role,
            roles: Vec::new(),
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        self.users.insert(user.clone()).await?;
        Ok(user)
    }
}
