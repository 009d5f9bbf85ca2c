use axum::extract::{Extension, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use rayerp_application::SessionService;
use rayerp_core::AppError;
use rayerp_domain::{ProjectAccessLevel, ProjectId, User};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// Authenticated request identity, inserted by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The user owning the presented session.
    pub user: User,
    /// Hash of the presented bearer token; identifies the current session.
    pub token_hash: String,
}

/// Route-layer marker: the route requires this exact permission.
#[derive(Debug, Clone, Copy)]
pub struct RequiredPermission(pub &'static str);

/// Route-layer marker: the route requires at least one of these permissions.
#[derive(Debug, Clone, Copy)]
pub struct RequiredAnyPermission(pub &'static [&'static str]);

/// Route-layer marker: the route requires the permission through role
/// grants alone, with no legacy shortcut.
#[derive(Debug, Clone, Copy)]
pub struct RequiredRolePermission(pub &'static str);

/// Route-layer marker: the route requires project access at this level.
#[derive(Debug, Clone, Copy)]
pub struct RequiredProjectAccess(pub ProjectAccessLevel);

/// Route-layer marker: the route requires both a role-granted permission
/// and project access at the given level.
#[derive(Debug, Clone, Copy)]
pub struct RequiredProjectPermission(pub &'static str, pub ProjectAccessLevel);

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let token_hash = SessionService::hash_session_token(token);
    let session = state
        .session_service
        .find_live_session(&token_hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let user = state
        .user_repository
        .find_by_id(session.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    state.session_service.touch(&token_hash).await?;

    request
        .extensions_mut()
        .insert(AuthContext { user, token_hash });
    Ok(next.run(request).await)
}

pub async fn require_permission(
    State(state): State<AppState>,
    Extension(required): Extension<RequiredPermission>,
    Extension(auth): Extension<AuthContext>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    state
        .authorization_service
        .require_permission(&auth.user, required.0)
        .await?;
    Ok(next.run(request).await)
}

pub async fn require_any_permission(
    State(state): State<AppState>,
    Extension(required): Extension<RequiredAnyPermission>,
    Extension(auth): Extension<AuthContext>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    state
        .authorization_service
        .require_any_permission(&auth.user, required.0)
        .await?;
    Ok(next.run(request).await)
}

pub async fn require_role_permission(
    State(state): State<AppState>,
    Extension(required): Extension<RequiredRolePermission>,
    Extension(auth): Extension<AuthContext>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let granted = state
        .authorization_service
        .check_role_permission(&auth.user, required.0)
        .await?;
    if !granted {
        return Err(
            AppError::PermissionDenied(format!("missing permission '{}'", required.0)).into(),
        );
    }
    Ok(next.run(request).await)
}

pub async fn require_project_access(
    State(state): State<AppState>,
    Extension(required): Extension<RequiredProjectAccess>,
    Extension(auth): Extension<AuthContext>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let project_id = project_id_from_path(request.uri().path())
        .ok_or_else(|| AppError::Validation("invalid project identifier".to_owned()))?;
    let grant = state
        .authorization_service
        .check_project_access(&auth.user, project_id, required.0)
        .await?;
    request.extensions_mut().insert(grant);
    Ok(next.run(request).await)
}

pub async fn require_project_permission(
    State(state): State<AppState>,
    Extension(required): Extension<RequiredProjectPermission>,
    Extension(auth): Extension<AuthContext>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let project_id = project_id_from_path(request.uri().path())
        .ok_or_else(|| AppError::Validation("invalid project identifier".to_owned()))?;
    let grant = state
        .authorization_service
        .check_role_and_project_access(&auth.user, required.0, project_id, required.1)
        .await?;
    request.extensions_mut().insert(grant);
    Ok(next.run(request).await)
}

/// Pulls the project identifier out of the request path, the segment
/// following `projects`.
fn project_id_from_path(path: &str) -> Option<ProjectId> {
    let mut segments = path.split('/');
    segments.find(|segment| *segment == "projects")?;
    let raw = segments.next()?;
    Uuid::parse_str(raw).ok().map(ProjectId::from_uuid)
}
