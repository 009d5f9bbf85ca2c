use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayerp_application::{
    BulkCreateReport, BulkDeleteReport, PermissionCatalog, PermissionStats, SessionStatistics,
    SessionView,
};
use rayerp_domain::{
    DeviceInfo, PermissionId, PermissionRecord, Role, RoleBinding, RoleId, SessionId, User, UserId,
};
use serde::{Deserialize, Serialize};

/// Liveness probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming credential login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login result: the bearer token and the authenticated user.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// API representation of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: RoleBinding,
    pub roles: Vec<RoleId>,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.as_str().to_owned(),
            role: user.role,
            roles: user.roles,
            is_active: user.is_active,
        }
    }
}

/// `/auth/me` payload: the user plus its effective permission set.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub permissions: Vec<String>,
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub level: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            permissions: role.permissions.into_iter().collect(),
            is_active: role.is_active,
            is_default: role.is_default,
            level: role.level,
            created_at: role.created_at,
        }
    }
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub level: Option<i32>,
}

/// Incoming payload for partial role updates.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub level: Option<i32>,
}

/// Incoming payload for bulk role deletion.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRolesRequest {
    pub role_ids: Vec<RoleId>,
}

/// One failed item of a bulk role deletion.
#[derive(Debug, Serialize)]
pub struct BulkRoleErrorResponse {
    pub role_id: RoleId,
    pub error: String,
}

/// Bulk role deletion outcome.
#[derive(Debug, Serialize)]
pub struct BulkDeleteRolesResponse {
    pub deleted: Vec<String>,
    pub errors: Vec<BulkRoleErrorResponse>,
}

impl From<BulkDeleteReport> for BulkDeleteRolesResponse {
    fn from(report: BulkDeleteReport) -> Self {
        Self {
            deleted: report.deleted,
            errors: report
                .errors
                .into_iter()
                .map(|item| BulkRoleErrorResponse {
                    role_id: item.role_id,
                    error: item.error,
                })
                .collect(),
        }
    }
}

/// Incoming payload for permission reduction on a role.
#[derive(Debug, Deserialize)]
pub struct ReducePermissionsRequest {
    pub permissions_to_remove: Vec<String>,
}

/// Permission reduction outcome.
#[derive(Debug, Serialize)]
pub struct ReducePermissionsResponse {
    pub removed_count: usize,
}

/// Incoming payload for role assignment to a user.
#[derive(Debug, Deserialize)]
pub struct AssignRolesRequest {
    pub role_ids: Vec<RoleId>,
}

/// Effective permission set of a user.
#[derive(Debug, Serialize)]
pub struct UserPermissionsResponse {
    pub user_id: UserId,
    pub permissions: Vec<String>,
}

/// Query string for the users-by-level listing.
#[derive(Debug, Deserialize)]
pub struct UsersByLevelQuery {
    pub min_level: Option<i32>,
}

/// API representation of a permission.
#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub id: PermissionId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PermissionRecord> for PermissionResponse {
    fn from(record: PermissionRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.to_string(),
            description: record.description,
            category: record.category,
            is_active: record.is_active,
            created_at: record.created_at,
        }
    }
}

/// The permission catalog, flat and grouped by category.
#[derive(Debug, Serialize)]
pub struct PermissionCatalogResponse {
    pub permissions: Vec<PermissionResponse>,
    pub grouped: BTreeMap<String, Vec<PermissionResponse>>,
    pub total: usize,
}

impl From<PermissionCatalog> for PermissionCatalogResponse {
    fn from(catalog: PermissionCatalog) -> Self {
        Self {
            permissions: catalog
                .permissions
                .into_iter()
                .map(PermissionResponse::from)
                .collect(),
            grouped: catalog
                .grouped
                .into_iter()
                .map(|(category, records)| {
                    (
                        category,
                        records.into_iter().map(PermissionResponse::from).collect(),
                    )
                })
                .collect(),
            total: catalog.total,
        }
    }
}

/// Listing filter accepted by the permission catalog endpoint.
#[derive(Debug, Deserialize)]
pub struct PermissionListQuery {
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// Incoming payload for permission creation.
#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
}

/// Incoming payload for partial permission updates.
#[derive(Debug, Deserialize)]
pub struct UpdatePermissionRequest {
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// Incoming payload for bulk permission creation.
#[derive(Debug, Deserialize)]
pub struct BulkCreatePermissionsRequest {
    pub permissions: Vec<CreatePermissionRequest>,
}

/// One failed item of a bulk permission create.
#[derive(Debug, Serialize)]
pub struct BulkPermissionErrorResponse {
    pub name: String,
    pub error: String,
}

/// Bulk permission creation outcome.
#[derive(Debug, Serialize)]
pub struct BulkCreatePermissionsResponse {
    pub created: Vec<PermissionResponse>,
    pub skipped: Vec<String>,
    pub errors: Vec<BulkPermissionErrorResponse>,
}

impl From<BulkCreateReport> for BulkCreatePermissionsResponse {
    fn from(report: BulkCreateReport) -> Self {
        Self {
            created: report
                .created
                .into_iter()
                .map(PermissionResponse::from)
                .collect(),
            skipped: report.skipped,
            errors: report
                .errors
                .into_iter()
                .map(|item| BulkPermissionErrorResponse {
                    name: item.name,
                    error: item.error,
                })
                .collect(),
        }
    }
}

/// Permission usage statistics.
#[derive(Debug, Serialize)]
pub struct PermissionStatsResponse {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub categories: usize,
    pub usage: BTreeMap<String, Vec<String>>,
    pub most_used: Vec<PermissionUsageEntry>,
}

/// One entry of the most-used permission ranking.
#[derive(Debug, Serialize)]
pub struct PermissionUsageEntry {
    pub name: String,
    pub roles: Vec<String>,
}

impl From<PermissionStats> for PermissionStatsResponse {
    fn from(stats: PermissionStats) -> Self {
        Self {
            total: stats.total,
            active: stats.active,
            inactive: stats.inactive,
            categories: stats.categories,
            usage: stats.usage,
            most_used: stats
                .most_used
                .into_iter()
                .map(|(name, roles)| PermissionUsageEntry { name, roles })
                .collect(),
        }
    }
}

/// One of the caller's live sessions.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub device_info: DeviceInfo,
    pub ip_address: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_current: bool,
}

impl From<SessionView> for SessionResponse {
    fn from(view: SessionView) -> Self {
        Self {
            session_id: view.session.session_id,
            device_info: view.session.device_info,
            ip_address: view.session.ip_address,
            location: view.session.location,
            created_at: view.session.created_at,
            last_active: view.session.last_active,
            expires_at: view.session.expires_at,
            is_current: view.is_current,
        }
    }
}

/// Aggregate session statistics.
#[derive(Debug, Serialize)]
pub struct SessionStatisticsResponse {
    pub total_active: usize,
    pub expired_pending_cleanup: u64,
    pub unique_users: usize,
    pub average_per_user: f64,
    pub max_per_user: usize,
}

impl From<SessionStatistics> for SessionStatisticsResponse {
    fn from(stats: SessionStatistics) -> Self {
        Self {
            total_active: stats.total_active,
            expired_pending_cleanup: stats.expired_pending_cleanup,
            unique_users: stats.unique_users,
            average_per_user: stats.average_per_user,
            max_per_user: stats.max_per_user,
        }
    }
}

/// Generic counter payload for revocation and cleanup endpoints.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}
