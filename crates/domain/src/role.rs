use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::WILDCARD_PERMISSION;

/// Privilege level carried by the unique Root role.
pub const ROOT_ROLE_LEVEL: i32 = 100;

/// Level assigned to roles created without an explicit level.
pub const DEFAULT_ROLE_LEVEL: i32 = 50;

/// Callers whose role level strictly exceeds this threshold count as
/// "elevated non-Root" for delegation purposes.
pub const ELEVATED_LEVEL_THRESHOLD: i32 = 80;

/// Unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named, leveled bundle of permissions assignable to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Permission names granted by this role. Insertion order is irrelevant;
    /// the wildcard `*` only ever appears on Root.
    pub permissions: BTreeSet<String>,
    /// Inactive roles contribute no permissions.
    pub is_active: bool,
    /// System-seeded roles have their name and level locked.
    pub is_default: bool,
    /// Integer privilege rank; higher outranks lower.
    pub level: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Creates an active, non-default role.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: BTreeSet<String>,
        level: i32,
    ) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            description: description.into(),
            permissions,
            is_active: true,
            is_default: false,
            level,
            created_at: Utc::now(),
        }
    }

    /// Builds the unique Root role: level 100, wildcard grant, default,
    /// immutable at the store layer.
    #[must_use]
    pub fn root() -> Self {
        Self {
            id: RoleId::new(),
            name: "Root".to_owned(),
            description: "Immutable superuser role".to_owned(),
            permissions: BTreeSet::from([WILDCARD_PERMISSION.to_owned()]),
            is_active: true,
            is_default: true,
            level: ROOT_ROLE_LEVEL,
            created_at: Utc::now(),
        }
    }

    /// Builds a system-seeded default role with an empty permission set.
    #[must_use]
    pub fn seeded_default(
        name: impl Into<String>,
        description: impl Into<String>,
        level: i32,
    ) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            description: description.into(),
            permissions: BTreeSet::new(),
            is_active: true,
            is_default: true,
            level,
            created_at: Utc::now(),
        }
    }

    /// Returns whether this is the protected Root role.
    #[must_use]
    pub fn is_root(&self) -> bool {
        is_root_name(&self.name)
    }

    /// Returns whether the role grants every permission.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.permissions.contains(WILDCARD_PERMISSION)
    }
}

/// Returns whether a role name case-insensitively equals `root`.
#[must_use]
pub fn is_root_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("root")
}
