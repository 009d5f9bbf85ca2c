use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use rayerp_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wildcard permission carried only by the Root role.
pub const WILDCARD_PERMISSION: &str = "*";

/// Unique identifier for a stored permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a new random permission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a permission identifier from an existing UUID value.
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

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A validated permission name in `module.action` format.
///
/// The accepted grammar is `^[a-z]+\.[a-z_]+$`, e.g. `users.view`. The
/// wildcard `*` is not a valid permission name; it only ever appears in the
/// Root role's permission set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionName(String);

impl PermissionName {
    /// Creates a validated permission name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if !Self::is_valid_format(&value) {
            return Err(AppError::Validation(format!(
                "invalid permission format '{value}', expected module.action (e.g. users.view)"
            )));
        }

        Ok(Self(value))
    }

    /// Returns whether a candidate string matches the `module.action` grammar.
    #[must_use]
    pub fn is_valid_format(value: &str) -> bool {
        let Some((module, action)) = value.split_once('.') else {
            return false;
        };

        !module.is_empty()
            && !action.is_empty()
            && module.bytes().all(|byte| byte.is_ascii_lowercase())
            && action
                .bytes()
                .all(|byte| byte.is_ascii_lowercase() || byte == b'_')
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.0
    }
}

impl Display for PermissionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A stored permission definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    /// Stable permission identifier.
    pub id: PermissionId,
    /// Unique validated name.
    pub name: PermissionName,
    /// Human-readable description.
    pub description: String,
    /// Grouping label, e.g. "User Management".
    pub category: String,
    /// Inactive permissions fail `exists` checks and cannot be granted.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PermissionRecord {
    /// Creates an active permission record with a fresh identifier.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: PermissionId::new(),
            name: PermissionName::new(name)?,
            description: description.into(),
            category: category.into(),
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

/// One entry of the fixed bootstrap catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededPermission {
    /// Permission name, `module.action` format.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Grouping label.
    pub category: &'static str,
}

const fn seeded(
    name: &'static str,
    description: &'static str,
    category: &'static str,
) -> SeededPermission {
    SeededPermission {
        name,
        description,
        category,
    }
}

/// Fixed permission catalog seeded idempotently at bootstrap.
pub const DEFAULT_PERMISSION_CATALOG: &[SeededPermission] = &[
    // User Management
    seeded("users.view", "View users list", "User Management"),
    seeded("users.create", "Create new users", "User Management"),
    seeded("users.edit", "Update user details", "User Management"),
    seeded("users.delete", "Delete users", "User Management"),
    // Attendance
    seeded("attendance.view", "View attendance records", "Attendance"),
    seeded("attendance.manage", "Manage attendance records", "Attendance"),
    // Leave
    seeded("leaves.view", "View leave requests", "Leave"),
    seeded("leaves.create", "Submit leave requests", "Leave"),
    seeded("leaves.manage", "Approve and manage leave requests", "Leave"),
    // Finance
    seeded("finance.view", "View finance records", "Finance"),
    seeded("finance.manage", "Manage finance records", "Finance"),
    seeded("expenses.view", "View expenses", "Finance"),
    seeded("expenses.manage", "Manage expenses", "Finance"),
    // Invoicing
    seeded("invoices.view", "View invoices", "Invoicing"),
    seeded("invoices.create", "Create invoices", "Invoicing"),
    seeded("invoices.edit", "Update invoices", "Invoicing"),
    seeded("invoices.delete", "Delete invoices", "Invoicing"),
    // Project Management
    seeded("projects.view", "View projects", "Project Management"),
    seeded("projects.create", "Create projects", "Project Management"),
    seeded("projects.edit", "Update projects", "Project Management"),
    seeded("projects.delete", "Delete projects", "Project Management"),
    seeded(
        "projects.manage",
        "Manage project assignments",
        "Project Management",
    ),
    // Tasks
    seeded("tasks.view", "View tasks", "Project Management"),
    seeded("tasks.create", "Create tasks", "Project Management"),
    seeded("tasks.edit", "Update tasks", "Project Management"),
    seeded("tasks.delete", "Delete tasks", "Project Management"),
    // Reports & Analytics
    seeded("reports.view", "View reports", "Reports & Analytics"),
    seeded("reports.export", "Export report data", "Reports & Analytics"),
    seeded(
        "analytics.view",
        "View analytics dashboards",
        "Reports & Analytics",
    ),
    // System Administration
    seeded(
        "roles.manage",
        "Manage roles and permissions",
        "System Administration",
    ),
    seeded(
        "system.settings",
        "Access system settings",
        "System Administration",
    ),
    seeded("logs.view", "View system logs", "System Administration"),
    seeded(
        "sessions.manage",
        "Manage user sessions",
        "System Administration",
    ),
];
