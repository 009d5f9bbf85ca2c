//! Privileged role and permission administration with delegation rules.

use std::sync::Arc;

use rayerp_core::{AppError, AppResult};
use rayerp_domain::{ELEVATED_LEVEL_THRESHOLD, RoleBinding, User, is_root_name};

use crate::authorization_service::AuthorizationService;
use crate::permission_registry::PermissionRegistry;
use crate::ports::{AuditRepository, RoleRepository, UserRepository};

mod permissions;
mod roles;
mod users;


pub use roles::{BulkDeleteReport, BulkRoleError};

/// The acting user's resolved administrative authority.
///
/// Derived from both the primary role binding and the plural role set:
/// legacy enum values map to fixed levels, role references contribute
/// their stored level, and the highest value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorAuthority {
    /// Holds the Root role, by name or legacy enum.
    pub is_root: bool,
    /// Highest level across all resolved roles.
    pub level: i32,
}

impl ActorAuthority {
    /// An authority above the elevation threshold but below Root.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        self.is_root || self.level > ELEVATED_LEVEL_THRESHOLD
    }
}

/// Administration surface for roles, permissions and user assignments.
///
/// Enforces the delegation model on top of the store-level invariants:
/// Root may do anything except touch Root itself, elevated callers get a
/// narrow reduce-only slice, everyone else is refused.
#[derive(Clone)]
pub struct RbacAdminService {
    roles: Arc<dyn RoleRepository>,
    users: Arc<dyn UserRepository>,
    registry: PermissionRegistry,
    authorization: AuthorizationService,
    audit: Arc<dyn AuditRepository>,
}

impl RbacAdminService {
    /// Creates the service over its repositories and collaborators.
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        users: Arc<dyn UserRepository>,
        registry: PermissionRegistry,
        authorization: AuthorizationService,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            roles,
            users,
            registry,
            authorization,
            audit,
        }
    }

    /// Resolves the acting user's authority from its role bindings.
    pub async fn resolve_actor(&self, actor: &User) -> AppResult<ActorAuthority> {
        let mut authority = ActorAuthority {
            is_root: false,
            level: 0,
        };

        if let RoleBinding::Legacy(legacy) = &actor.role {
            use rayerp_domain::LegacyRole;
            match legacy {
                LegacyRole::Root => {
                    authority.is_root = true;
                    authority.level = 100;
                }
                LegacyRole::SuperAdmin => authority.level = 90,
                LegacyRole::Admin => authority.level = 80,
                _ => {}
            }
        }

        for role_id in actor.role_references() {
            let Some(role) = self.roles.find_by_id(role_id).await? else {
                continue;
            };
            if !role.is_active {
                continue;
            }
            if role.is_root() || is_root_name(&role.name) {
                authority.is_root = true;
            }
            authority.level = authority.level.max(role.level);
        }

        Ok(authority)
    }

    fn require_root(authority: ActorAuthority) -> AppResult<()> {
        if authority.is_root {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "only the Root role may perform this operation".to_owned(),
            ))
        }
    }

    fn require_elevated(authority: ActorAuthority) -> AppResult<()> {
        if authority.is_elevated() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "insufficient role level for administrative operations".to_owned(),
            ))
        }
    }
}
