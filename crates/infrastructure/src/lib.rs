//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_audit_repository;
mod in_memory_permission_repository;
mod in_memory_project_access_repository;
mod in_memory_role_repository;
mod in_memory_session_repository;
mod in_memory_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_permission_repository::InMemoryPermissionRepository;
pub use in_memory_project_access_repository::InMemoryProjectAccessRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use in_memory_session_repository::InMemorySessionRepository;
pub use in_memory_user_repository::InMemoryUserRepository;
