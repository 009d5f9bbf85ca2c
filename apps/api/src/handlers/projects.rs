use super::*;

pub async fn project_access_handler(
    Extension(grant): Extension<ProjectAccessGrant>,
) -> Json<ProjectAccessGrant> {
    Json(grant)
}

pub async fn update_project_settings_handler(
    Extension(grant): Extension<ProjectAccessGrant>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "project settings updated",
        "project_id": grant.project_id,
        "access_level": grant.access_level,
    }))
}
