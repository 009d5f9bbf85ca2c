use std::sync::Arc;

use rayerp_application::{
    AuthorizationService, RbacAdminService, SessionService, UserRepository, UserService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub rbac_admin_service: RbacAdminService,
    pub session_service: SessionService,
    pub user_service: UserService,
    pub user_repository: Arc<dyn UserRepository>,
    pub frontend_url: String,
}
