use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rayerp_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserId;

/// Unique identifier for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Creates a new random project identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a project identifier from an existing UUID value.
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

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ProjectId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Per-project access level, ordered `read < write < admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectAccessLevel {
    /// Read-only project access.
    Read,
    /// Read and write project access.
    Write,
    /// Full project administration.
    Admin,
}

impl ProjectAccessLevel {
    /// Returns the numeric rank used for ordered comparison.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Read => 1,
            Self::Write => 2,
            Self::Admin => 3,
        }
    }

    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }

    /// Returns whether this level satisfies `required`.
    #[must_use]
    pub fn satisfies(&self, required: ProjectAccessLevel) -> bool {
        self.rank() >= required.rank()
    }
}

impl FromStr for ProjectAccessLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!(
                "unknown project access level '{value}'"
            ))),
        }
    }
}

/// A user's access assignment for one project.
///
/// Invariant: at most one active assignment per `(user_id, project_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProjectAssignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Target project.
    pub project_id: ProjectId,
    /// Granted access level.
    pub access_level: ProjectAccessLevel,
    /// User who made the assignment.
    pub assigned_by: UserId,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Inactive assignments deny access.
    pub is_active: bool,
}
