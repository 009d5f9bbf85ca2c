//! End-to-end scenarios over the in-memory adapters.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use rayerp_application::{
    AuthorizationService, BootstrapService, NewRole, PermissionRegistry, ProjectAccessRepository,
    RbacAdminService, RoleRepository, RoleUpdate, SessionMetadata, SessionService, UserRepository,
    UserService,
};
use rayerp_core::AppError;
use rayerp_domain::{
    ProjectAccessLevel, ProjectId, Role, RoleBinding, User, UserId, UserProjectAssignment,
};
use rayerp_infrastructure::{
    Argon2PasswordHasher, InMemoryAuditRepository, InMemoryPermissionRepository,
    InMemoryProjectAccessRepository, InMemoryRoleRepository, InMemorySessionRepository,
    InMemoryUserRepository,
};

struct World {
    roles: Arc<InMemoryRoleRepository>,
    users: Arc<InMemoryUserRepository>,
    projects: Arc<InMemoryProjectAccessRepository>,
    authorization: AuthorizationService,
    admin: RbacAdminService,
    sessions: SessionService,
    user_service: UserService,
    bootstrap: BootstrapService,
}

async fn world() -> World {
    let roles = Arc::new(InMemoryRoleRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let permissions = Arc::new(InMemoryPermissionRepository::new());
    let projects = Arc::new(InMemoryProjectAccessRepository::new());
    let audit = Arc::new(InMemoryAuditRepository::new());

    let registry = PermissionRegistry::new(permissions, roles.clone());
    let authorization = AuthorizationService::new(roles.clone(), projects.clone());
    let admin = RbacAdminService::new(
        roles.clone(),
        users.clone(),
        registry.clone(),
        authorization.clone(),
        audit.clone(),
    );
    let sessions = SessionService::new(
        Arc::new(InMemorySessionRepository::new()),
        audit.clone(),
    );
    let user_service = UserService::new(
        users.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        sessions.clone(),
    );
    let bootstrap = BootstrapService::new(roles.clone(), users.clone(), registry);

    let world = World {
        roles,
        users,
        projects,
        authorization,
        admin,
        sessions,
        user_service,
        bootstrap,
    };
    world
        .bootstrap
        .seed_defaults()
        .await
        .unwrap_or_else(|error| panic!("bootstrap failed: {error}"));
    world
}

async fn user_with_role(world: &World, name: &str, role_name: &str) -> User {
    let role = world
        .roles
        .find_by_name(role_name)
        .await
        .unwrap_or_else(|error| panic!("lookup failed: {error}"))
        .unwrap_or_else(|| panic!("role '{role_name}' missing"));
    let user = User {
        id: UserId::new(),
        name: name.to_owned(),
        email: rayerp_domain::EmailAddress::new(format!("{name}@rayerp.test"))
            .unwrap_or_else(|error| panic!("bad email: {error}")),
        password_hash: None,
        role: RoleBinding::Reference(role.id),
        roles: Vec::new(),
        is_active: true,
        created_at: Utc::now(),
    };
    world
        .users
        .insert(user.clone())
        .await
        .unwrap_or_else(|error| panic!("insert failed: {error}"));
    user
}

fn names(set: &[&str]) -> BTreeSet<String> {
    set.iter().map(|name| (*name).to_owned()).collect()
}

#[tokio::test]
async fn bootstrap_seeds_the_three_system_roles() {
    let world = world().await;
    let root = user_with_role(&world, "root", "Root").await;

    let roles = world
        .admin
        .list_roles(&root)
        .await
        .unwrap_or_else(|error| panic!("listing failed: {error}"));

    let summary: Vec<(&str, i32)> = roles
        .iter()
        .map(|role| (role.name.as_str(), role.level))
        .collect();
    assert_eq!(
        summary,
        vec![("Root", 100), ("Superadmin", 90), ("Admin", 80)]
    );
    assert_eq!(roles[0].permissions, names(&["*"]));
    assert!(roles[1].permissions.is_empty());
    assert!(roles[2].permissions.is_empty());

    // Re-running the seed changes nothing.
    let rerun = world
        .bootstrap
        .seed_defaults()
        .await
        .unwrap_or_else(|error| panic!("seed failed: {error}"));
    assert_eq!(rerun.roles_created, 0);
    assert_eq!(rerun.permissions_created, 0);
}

#[tokio::test]
async fn elevated_caller_cannot_touch_low_level_roles() {
    let world = world().await;
    let root = user_with_role(&world, "root", "Root").await;

    let accountant = world
        .admin
        .create_role(
            &root,
            NewRole {
                name: "Accountant".to_owned(),
                description: "Invoice handling".to_owned(),
                permissions: names(&["invoices.view", "invoices.create"]),
                level: Some(40),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("create failed: {error}"));

    let listed = world
        .admin
        .list_roles(&root)
        .await
        .unwrap_or_else(|error| panic!("listing failed: {error}"));
    assert!(listed.iter().any(|role| role.name == "Accountant"));

    // A level-90 caller may not raise a level-40 role.
    let superadmin = user_with_role(&world, "lena", "Superadmin").await;
    let refused = world
        .admin
        .update_role(
            &superadmin,
            accountant.id,
            RoleUpdate {
                level: Some(90),
                ..RoleUpdate::default()
            },
        )
        .await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn reduce_reports_only_actually_removed_names() {
    let world = world().await;
    let root = user_with_role(&world, "root", "Root").await;
    for (name, category) in [("audit.x", "Audit"), ("audit.y", "Audit"), ("audit.z", "Audit")] {
        world
            .admin
            .create_permission(&root, name, "", category)
            .await
            .unwrap_or_else(|error| panic!("permission create failed: {error}"));
    }
    let target = world
        .admin
        .create_role(
            &root,
            NewRole {
                name: "Auditors".to_owned(),
                description: String::new(),
                permissions: names(&["audit.x", "audit.y", "audit.z"]),
                level: Some(90),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("role create failed: {error}"));

    let superadmin = user_with_role(&world, "uma", "Superadmin").await;
    let removed = world
        .admin
        .reduce_role_permissions(
            &superadmin,
            target.id,
            &["audit.y".to_owned(), "audit.q".to_owned()],
        )
        .await
        .unwrap_or_else(|error| panic!("reduce failed: {error}"));
    assert_eq!(removed, 1);

    let after = world
        .roles
        .find_by_id(target.id)
        .await
        .unwrap_or_else(|error| panic!("lookup failed: {error}"))
        .unwrap_or_else(|| panic!("role missing"));
    assert_eq!(after.permissions, names(&["audit.x", "audit.z"]));
}

#[tokio::test]
async fn nobody_deletes_root_not_even_level_100_peers() {
    let world = world().await;
    let root_role = world
        .roles
        .find_by_name("Root")
        .await
        .unwrap_or_else(|error| panic!("lookup failed: {error}"))
        .unwrap_or_else(|| panic!("Root missing"));

    let root = user_with_role(&world, "root", "Root").await;
    let by_root = world.admin.delete_role(&root, root_role.id).await;
    assert!(matches!(by_root, Err(AppError::Forbidden(_))));

    // A level-100 role under another name confers no Root authority.
    let seeded = world
        .roles
        .seed_system_role(Role::new("Overlord", "", BTreeSet::new(), 100))
        .await
        .unwrap_or_else(|error| panic!("seed failed: {error}"));
    assert!(seeded);
    let overlord = user_with_role(&world, "vik", "Overlord").await;
    let by_peer = world.admin.delete_role(&overlord, root_role.id).await;
    assert!(matches!(by_peer, Err(AppError::Forbidden(_))));

    // Even the raw store refuses.
    let direct = world.roles.delete(root_role.id).await;
    assert!(matches!(direct, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn two_devices_then_revoke_all_others() {
    let world = world().await;
    world
        .user_service
        .create_user(
            "Noa",
            "noa@rayerp.test",
            "device-dance",
            RoleBinding::Legacy(rayerp_domain::LegacyRole::Normal),
        )
        .await
        .unwrap_or_else(|error| panic!("create_user failed: {error}"));

    let device_a = world
        .user_service
        .login(
            "noa@rayerp.test",
            "device-dance",
            SessionMetadata {
                user_agent: "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0".to_owned(),
                ip_address: "198.51.100.1".to_owned(),
                location: None,
            },
        )
        .await
        .unwrap_or_else(|error| panic!("login A failed: {error}"));
    let device_b = world
        .user_service
        .login(
            "noa@rayerp.test",
            "device-dance",
            SessionMetadata {
                user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Safari/604.1"
                    .to_owned(),
                ip_address: "198.51.100.2".to_owned(),
                location: None,
            },
        )
        .await
        .unwrap_or_else(|error| panic!("login B failed: {error}"));

    let user_id = device_a.user.id;
    let hash_a = SessionService::hash_session_token(&device_a.token);
    let hash_b = SessionService::hash_session_token(&device_b.token);

    let from_a = world
        .sessions
        .list_active_sessions(user_id, &hash_a)
        .await
        .unwrap_or_else(|error| panic!("listing failed: {error}"));
    assert_eq!(from_a.len(), 2);
    let current: Vec<_> = from_a.iter().filter(|view| view.is_current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].session.session_id, device_a.session.session_id);

    let revoked = world
        .sessions
        .revoke_all_other_sessions(user_id, &hash_a)
        .await
        .unwrap_or_else(|error| panic!("revoke failed: {error}"));
    assert_eq!(revoked, 1);

    // Device B's token no longer resolves to a session.
    let resolved_b = world
        .sessions
        .find_live_session(&hash_b)
        .await
        .unwrap_or_else(|error| panic!("lookup failed: {error}"));
    assert!(resolved_b.is_none());
    let resolved_a = world
        .sessions
        .find_live_session(&hash_a)
        .await
        .unwrap_or_else(|error| panic!("lookup failed: {error}"));
    assert!(resolved_a.is_some());
}

#[tokio::test]
async fn project_access_is_scoped_to_the_assignment() {
    let world = world().await;
    let root = user_with_role(&world, "root", "Root").await;
    let writer = user_with_role(&world, "pat", "Admin").await;
    let outsider = user_with_role(&world, "sam", "Admin").await;
    let project_id = ProjectId::new();

    world
        .projects
        .upsert_assignment(UserProjectAssignment {
            user_id: writer.id,
            project_id,
            access_level: ProjectAccessLevel::Write,
            assigned_by: root.id,
            assigned_at: Utc::now(),
            is_active: true,
        })
        .await
        .unwrap_or_else(|error| panic!("assignment failed: {error}"));

    let grant = world
        .authorization
        .check_project_access(&writer, project_id, ProjectAccessLevel::Read)
        .await
        .unwrap_or_else(|error| panic!("read check failed: {error}"));
    assert_eq!(grant.access_level, ProjectAccessLevel::Write);

    let too_high = world
        .authorization
        .check_project_access(&writer, project_id, ProjectAccessLevel::Admin)
        .await;
    assert!(matches!(too_high, Err(AppError::PermissionDenied(_))));

    // No assignment means no access, whatever the caller's roles say.
    let unassigned = world
        .authorization
        .check_project_access(&outsider, project_id, ProjectAccessLevel::Read)
        .await;
    assert!(matches!(unassigned, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn legacy_manager_migrates_to_employee_once() {
    let world = world().await;
    let manager = User {
        id: UserId::new(),
        name: "mira".to_owned(),
        email: rayerp_domain::EmailAddress::new("mira@rayerp.test")
            .unwrap_or_else(|error| panic!("bad email: {error}")),
        password_hash: None,
        role: RoleBinding::Legacy(rayerp_domain::LegacyRole::Manager),
        roles: Vec::new(),
        is_active: true,
        created_at: Utc::now(),
    };
    world
        .users
        .insert(manager.clone())
        .await
        .unwrap_or_else(|error| panic!("insert failed: {error}"));

    let report = world
        .bootstrap
        .migrate_legacy_roles()
        .await
        .unwrap_or_else(|error| panic!("migration failed: {error}"));
    assert_eq!(report.migrated, 1);

    let employee = world
        .roles
        .find_by_name("Employee")
        .await
        .unwrap_or_else(|error| panic!("lookup failed: {error}"))
        .unwrap_or_else(|| panic!("Employee missing"));
    assert_eq!(employee.permissions, names(&["projects.view", "reports.view"]));

    let migrated = world
        .users
        .find_by_id(manager.id)
        .await
        .unwrap_or_else(|error| panic!("lookup failed: {error}"))
        .unwrap_or_else(|| panic!("user missing"));
    assert_eq!(migrated.role, RoleBinding::Reference(employee.id));

    let rerun = world
        .bootstrap
        .migrate_legacy_roles()
        .await
        .unwrap_or_else(|error| panic!("migration failed: {error}"));
    assert_eq!(rerun.migrated, 0);
    assert_eq!(rerun.skipped, 1);
}

#[tokio::test]
async fn permission_delete_blocked_while_roles_reference_it() {
    let world = world().await;
    let root = user_with_role(&world, "root", "Root").await;

    let record = world
        .admin
        .create_permission(&root, "payroll.run", "Run payroll", "Finance")
        .await
        .unwrap_or_else(|error| panic!("permission create failed: {error}"));
    world
        .admin
        .create_role(
            &root,
            NewRole {
                name: "Payroll".to_owned(),
                description: String::new(),
                permissions: names(&["payroll.run"]),
                level: Some(55),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("role create failed: {error}"));

    let blocked = world.admin.delete_permission(&root, record.id).await;
    match blocked {
        Err(AppError::Conflict(message)) => assert!(message.contains("Payroll")),
        other => panic!("expected Conflict, got {other:?}"),
    }
}
