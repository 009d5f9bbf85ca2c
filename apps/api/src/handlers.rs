use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use rayerp_application::{
    BulkPermissionEntry, NewRole, PermissionFilter, PermissionUpdate, ProjectAccessGrant,
    RoleUpdate,
};
use rayerp_domain::{PermissionId, RoleId, SessionId, UserId};
use uuid::Uuid;

use crate::dto::{
    AssignRolesRequest, BulkCreatePermissionsRequest, BulkCreatePermissionsResponse,
    BulkDeleteRolesRequest, BulkDeleteRolesResponse, CountResponse, CreatePermissionRequest,
    CreateRoleRequest, HealthResponse, PermissionCatalogResponse, PermissionListQuery,
    PermissionResponse, PermissionStatsResponse, ReducePermissionsRequest,
    ReducePermissionsResponse, RoleResponse, SessionResponse, SessionStatisticsResponse,
    UpdatePermissionRequest, UpdateRoleRequest, UserPermissionsResponse, UserResponse,
    UsersByLevelQuery,
};
use crate::error::ApiResult;
use crate::middleware::AuthContext;
use crate::state::AppState;

mod health;
mod permissions;
mod projects;
mod rbac;
mod sessions;

pub use health::health_handler;
pub use permissions::{
    bulk_create_permissions_handler, create_permission_handler, delete_permission_handler,
    list_permissions_handler, permission_categories_handler, permission_stats_handler,
    update_permission_handler,
};
pub use projects::{project_access_handler, update_project_settings_handler};
pub use rbac::{
    assign_roles_handler, bulk_delete_roles_handler, create_role_handler, delete_role_handler,
    list_roles_handler, reduce_role_permissions_handler, toggle_role_status_handler,
    update_role_handler, user_permissions_handler, users_by_level_handler,
};
pub use sessions::{
    cleanup_sessions_handler, list_sessions_handler, revoke_other_sessions_handler,
    revoke_session_handler, session_stats_handler,
};
