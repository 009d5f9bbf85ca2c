//! RayERP authorization API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use rayerp_application::{
    AuthorizationService, BootstrapService, PermissionRegistry, RbacAdminService, SessionService,
    UserService,
};
use rayerp_core::AppError;
use rayerp_domain::{ProjectAccessLevel, RoleBinding};
use rayerp_infrastructure::{
    Argon2PasswordHasher, InMemoryAuditRepository, InMemoryPermissionRepository,
    InMemoryProjectAccessRepository, InMemoryRoleRepository, InMemorySessionRepository,
    InMemoryUserRepository,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api_config::ApiConfig;
use crate::middleware::{
    RequiredAnyPermission, RequiredPermission, RequiredProjectAccess, RequiredProjectPermission,
    RequiredRolePermission,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let permission_repository = Arc::new(InMemoryPermissionRepository::new());
    let role_repository = Arc::new(InMemoryRoleRepository::new());
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let session_repository = Arc::new(InMemorySessionRepository::new());
    let project_access_repository = Arc::new(InMemoryProjectAccessRepository::new());
    let audit_repository = Arc::new(InMemoryAuditRepository::new());

    let registry = PermissionRegistry::new(permission_repository.clone(), role_repository.clone());
    let authorization_service =
        AuthorizationService::new(role_repository.clone(), project_access_repository.clone());
    let rbac_admin_service = RbacAdminService::new(
        role_repository.clone(),
        user_repository.clone(),
        registry.clone(),
        authorization_service.clone(),
        audit_repository.clone(),
    );
    let session_service = SessionService::with_limits(
        session_repository.clone(),
        audit_repository.clone(),
        chrono::Duration::hours(config.session_ttl_hours),
        config.session_limit,
    );
    let password_hasher = Arc::new(Argon2PasswordHasher::new());
    let user_service = UserService::new(
        user_repository.clone(),
        password_hasher,
        session_service.clone(),
    );
    let bootstrap_service = BootstrapService::new(
        role_repository.clone(),
        user_repository.clone(),
        registry.clone(),
    );

    let seeded = bootstrap_service.seed_defaults().await?;
    info!(
        permissions = seeded.permissions_created,
        roles = seeded.roles_created,
        "default catalog and system roles seeded"
    );
    let migrated = bootstrap_service.migrate_legacy_roles().await?;
    if migrated.migrated > 0 {
        info!(
            migrated = migrated.migrated,
            skipped = migrated.skipped,
            "legacy role bindings migrated"
        );
    }

    if let (Some(email), Some(password)) = (
        config.root_admin_email.as_deref(),
        config.root_admin_password.as_deref(),
    ) {
        seed_root_admin(&user_service, &user_repository, &role_repository, email, password)
            .await?;
    }

    let app_state = AppState {
        authorization_service,
        rbac_admin_service,
        session_service: session_service.clone(),
        user_service,
        user_repository,
        frontend_url: config.frontend_url.clone(),
    };

    spawn_session_cleanup(session_service, config.cleanup_interval_secs);

    let app = build_router(app_state, &config.frontend_url)?;

    let host = IpAddr::from_str(&config.api_host).map_err(|error| {
        AppError::Internal(format!("invalid API_HOST '{}': {error}", config.api_host))
    })?;
    let address = SocketAddr::from((host, config.api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "rayerp-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let rbac_routes = Router::new()
        .route(
            "/api/rbac/roles",
            get(handlers::list_roles_handler).post(handlers::create_role_handler),
        )
        .route(
            "/api/rbac/roles/{role_id}",
            put(handlers::update_role_handler).delete(handlers::delete_role_handler),
        )
        .route(
            "/api/rbac/roles/bulk-delete",
            post(handlers::bulk_delete_roles_handler),
        )
        .route(
            "/api/rbac/roles/{role_id}/toggle-status",
            post(handlers::toggle_role_status_handler),
        )
        .route(
            "/api/rbac/roles/{role_id}/reduce-permissions",
            post(handlers::reduce_role_permissions_handler),
        )
        .route(
            "/api/rbac/users/{user_id}/roles",
            post(handlers::assign_roles_handler),
        )
        .route(
            "/api/rbac/users/{user_id}/permissions",
            get(handlers::user_permissions_handler),
        )
        .route(
            "/api/rbac/users/by-level",
            get(handlers::users_by_level_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_permission,
        ))
        .layer(Extension(RequiredPermission("roles.manage")));

    let permission_routes = Router::new()
        .route(
            "/api/permissions",
            get(handlers::list_permissions_handler).post(handlers::create_permission_handler),
        )
        .route(
            "/api/permissions/{id}",
            put(handlers::update_permission_handler).delete(handlers::delete_permission_handler),
        )
        .route(
            "/api/permissions/bulk",
            post(handlers::bulk_create_permissions_handler),
        )
        .route(
            "/api/permissions/categories",
            get(handlers::permission_categories_handler),
        )
        .route(
            "/api/permissions/stats",
            get(handlers::permission_stats_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_any_permission,
        ))
        .layer(Extension(RequiredAnyPermission(&[
            "roles.manage",
            "system.settings",
        ])));

    // Session administration is checked against role grants alone; the
    // legacy enum shortcut does not apply here.
    let session_admin_routes = Router::new()
        .route(
            "/api/sessions/cleanup",
            post(handlers::cleanup_sessions_handler),
        )
        .route("/api/sessions/stats", get(handlers::session_stats_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_role_permission,
        ))
        .layer(Extension(RequiredRolePermission("sessions.manage")));

    let project_read_routes = Router::new()
        .route(
            "/api/projects/{project_id}/access",
            get(handlers::project_access_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_project_access,
        ))
        .layer(Extension(RequiredProjectAccess(ProjectAccessLevel::Read)));

    let project_admin_routes = Router::new()
        .route(
            "/api/projects/{project_id}/settings",
            put(handlers::update_project_settings_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_project_permission,
        ))
        .layer(Extension(RequiredProjectPermission(
            "projects.manage",
            ProjectAccessLevel::Admin,
        )));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/api/sessions", get(handlers::list_sessions_handler))
        .route(
            "/api/sessions/{session_id}",
            axum::routing::delete(handlers::revoke_session_handler),
        )
        .route(
            "/api/sessions/revoke-others",
            post(handlers::revoke_other_sessions_handler),
        )
        .merge(rbac_routes)
        .merge(permission_routes)
        .merge(session_admin_routes)
        .merge(project_read_routes)
        .merge(project_admin_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Ok(Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}

/// Creates the initial Root-bound administrator when configured and absent.
async fn seed_root_admin(
    user_service: &UserService,
    user_repository: &Arc<InMemoryUserRepository>,
    role_repository: &Arc<InMemoryRoleRepository>,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    use rayerp_application::{RoleRepository, UserRepository};

    if user_repository.find_by_email(email).await?.is_some() {
        return Ok(());
    }

    let root_role = role_repository
        .find_by_name("Root")
        .await?
        .ok_or_else(|| AppError::Internal("Root role missing after bootstrap".to_owned()))?;

    let admin = user_service
        .create_user(
            "Root Admin",
            email,
            password,
            RoleBinding::Reference(root_role.id),
        )
        .await?;
    info!(email = %admin.email.as_str(), "root administrator seeded");

    Ok(())
}

/// Hourly background sweep that hard-deletes expired sessions.
fn spawn_session_cleanup(session_service: SessionService, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            match session_service.cleanup_expired_sessions().await {
                Ok(removed) if removed > 0 => {
                    info!(removed, "expired sessions cleaned");
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(%error, "session cleanup sweep failed");
                }
            }
        }
    });
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
