use super::*;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PermissionListQuery>,
) -> ApiResult<Json<PermissionCatalogResponse>> {
    let catalog = state
        .rbac_admin_service
        .list_permissions(
            &auth.user,
            PermissionFilter {
                category: query.category,
                is_active: query.is_active,
            },
        )
        .await?;

    Ok(Json(PermissionCatalogResponse::from(catalog)))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let record = state
        .rbac_admin_service
        .create_permission(
            &auth.user,
            &payload.name,
            &payload.description,
            &payload.category,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(record))))
}

pub async fn update_permission_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> ApiResult<Json<PermissionResponse>> {
    let record = state
        .rbac_admin_service
        .update_permission(
            &auth.user,
            PermissionId::from_uuid(id),
            PermissionUpdate {
                description: payload.description,
                category: payload.category,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(Json(PermissionResponse::from(record)))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PermissionResponse>> {
    let record = state
        .rbac_admin_service
        .delete_permission(&auth.user, PermissionId::from_uuid(id))
        .await?;

    Ok(Json(PermissionResponse::from(record)))
}

pub async fn bulk_create_permissions_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<BulkCreatePermissionsRequest>,
) -> ApiResult<Json<BulkCreatePermissionsResponse>> {
    let entries = payload
        .permissions
        .into_iter()
        .map(|entry| BulkPermissionEntry {
            name: entry.name,
            description: entry.description,
            category: entry.category,
        })
        .collect();

    let report = state
        .rbac_admin_service
        .bulk_create_permissions(&auth.user, entries)
        .await?;

    Ok(Json(BulkCreatePermissionsResponse::from(report)))
}

pub async fn permission_categories_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<String>>> {
    let categories = state
        .rbac_admin_service
        .permission_categories(&auth.user)
        .await?;

    Ok(Json(categories))
}

pub async fn permission_stats_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PermissionStatsResponse>> {
    let stats = state.rbac_admin_service.permission_stats(&auth.user).await?;

    Ok(Json(PermissionStatsResponse::from(stats)))
}
