use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .rbac_admin_service
        .list_roles(&auth.user)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .rbac_admin_service
        .create_role(
            &auth.user,
            NewRole {
                name: payload.name,
                description: payload.description,
                permissions: payload.permissions.into_iter().collect(),
                level: payload.level,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .rbac_admin_service
        .update_role(
            &auth.user,
            RoleId::from_uuid(role_id),
            RoleUpdate {
                name: payload.name,
                description: payload.description,
                permissions: payload
                    .permissions
                    .map(|names| names.into_iter().collect()),
                is_active: payload.is_active,
                level: payload.level,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .rbac_admin_service
        .delete_role(&auth.user, RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn bulk_delete_roles_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<BulkDeleteRolesRequest>,
) -> ApiResult<Json<BulkDeleteRolesResponse>> {
    let report = state
        .rbac_admin_service
        .bulk_delete_roles(&auth.user, payload.role_ids)
        .await?;

    Ok(Json(BulkDeleteRolesResponse::from(report)))
}

pub async fn toggle_role_status_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .rbac_admin_service
        .toggle_role_status(&auth.user, RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn reduce_role_permissions_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<ReducePermissionsRequest>,
) -> ApiResult<Json<ReducePermissionsResponse>> {
    let removed_count = state
        .rbac_admin_service
        .reduce_role_permissions(
            &auth.user,
            RoleId::from_uuid(role_id),
            &payload.permissions_to_remove,
        )
        .await?;

    Ok(Json(ReducePermissionsResponse { removed_count }))
}

pub async fn assign_roles_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignRolesRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .rbac_admin_service
        .assign_roles_to_user(&auth.user, UserId::from_uuid(user_id), payload.role_ids)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn user_permissions_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let user_id = UserId::from_uuid(user_id);
    let permissions = state
        .rbac_admin_service
        .get_user_permissions(&auth.user, user_id)
        .await?;

    Ok(Json(UserPermissionsResponse {
        user_id,
        permissions: permissions.into_iter().collect(),
    }))
}

pub async fn users_by_level_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<UsersByLevelQuery>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .rbac_admin_service
        .get_users_by_role_level(&auth.user, query.min_level)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}
