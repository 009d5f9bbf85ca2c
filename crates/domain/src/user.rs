//! User domain types, including the legacy enum role retained for
//! backward compatibility during the RBAC migration.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rayerp_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::RoleId;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one
    /// `@`, local part and domain are non-empty, domain contains a `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation("invalid email address".to_owned()));
        };

        if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
            return Err(AppError::Validation("invalid email address".to_owned()));
        }

        Ok(Self(trimmed))
    }

    /// Returns the normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Fixed role enum predating the RBAC migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyRole {
    /// Pre-migration superuser.
    Root,
    /// Pre-migration second tier.
    SuperAdmin,
    /// Pre-migration administrator.
    Admin,
    /// Pre-migration manager tier.
    Manager,
    /// Pre-migration member tier.
    Member,
    /// Pre-migration base tier.
    Normal,
}

impl LegacyRole {
    /// Returns a stable storage value for this legacy role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Member => "member",
            Self::Normal => "normal",
        }
    }

    /// Legacy enum values that predate RBAC and retain blanket trust in the
    /// permission middleware.
    #[must_use]
    pub fn has_blanket_access(&self) -> bool {
        matches!(self, Self::Root | Self::SuperAdmin | Self::Admin)
    }
}

impl FromStr for LegacyRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "root" => Ok(Self::Root),
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "member" => Ok(Self::Member),
            "normal" => Ok(Self::Normal),
            _ => Err(AppError::Validation(format!(
                "unknown legacy role value '{value}'"
            ))),
        }
    }
}

/// The authority carried by a user's primary `role` field.
///
/// Accounts created before the RBAC migration hold a [`LegacyRole`] enum
/// value; migrated accounts reference a stored role by id. Authorization
/// dispatches on this tag instead of scattering string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum RoleBinding {
    /// Pre-migration enum role.
    Legacy(LegacyRole),
    /// Reference to a stored role.
    Reference(RoleId),
}

/// A user record as seen by the authorization core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique login email.
    pub email: EmailAddress,
    /// Argon2 password hash, when the account has a password.
    pub password_hash: Option<String>,
    /// Primary role field (legacy enum or role reference).
    pub role: RoleBinding,
    /// Additional role references for multi-role assignment paths.
    pub roles: Vec<RoleId>,
    /// Disabled users cannot authenticate.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns every role reference held by the user, primary binding first,
    /// without duplicates.
    #[must_use]
    pub fn role_references(&self) -> Vec<RoleId> {
        let mut references = Vec::with_capacity(self.roles.len() + 1);
        if let RoleBinding::Reference(role_id) = self.role {
            references.push(role_id);
        }
        for role_id in &self.roles {
            if !references.contains(role_id) {
                references.push(*role_id);
            }
        }

        references
    }

    /// Returns the legacy enum role, if the account is not yet migrated.
    #[must_use]
    pub fn legacy_role(&self) -> Option<LegacyRole> {
        match self.role {
            RoleBinding::Legacy(legacy) => Some(legacy),
            RoleBinding::Reference(_) => None,
        }
    }
}
