use axum::Json;
use axum::extract::{Extension, State};
use axum::http::HeaderMap;
use axum::http::header;
use rayerp_application::SessionMetadata;

use crate::dto::{LoginRequest, LoginResponse, MeResponse, UserResponse};
use crate::error::ApiResult;
use crate::middleware::AuthContext;
use crate::state::AppState;

pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let metadata = session_metadata(&headers);
    let outcome = state
        .user_service
        .login(&payload.email, &payload.password, metadata)
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        user: UserResponse::from(outcome.user),
    }))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    state.session_service.end_session(&auth.token_hash).await?;
    Ok(Json(serde_json::json!({ "message": "logged out" })))
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let permissions = state
        .authorization_service
        .effective_permissions(&auth.user)
        .await?;
    Ok(Json(MeResponse {
        user: UserResponse::from(auth.user),
        permissions: permissions.into_iter().collect(),
    }))
}

fn session_metadata(headers: &HeaderMap) -> SessionMetadata {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_owned();

    SessionMetadata {
        user_agent,
        ip_address,
        location: None,
    }
}
