use super::*;

pub async fn list_sessions_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = state
        .session_service
        .list_active_sessions(auth.user.id, &auth.token_hash)
        .await?
        .into_iter()
        .map(SessionResponse::from)
        .collect();

    Ok(Json(sessions))
}

pub async fn revoke_session_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .session_service
        .revoke_session(
            auth.user.id,
            SessionId::from_uuid(session_id),
            &auth.token_hash,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_other_sessions_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<CountResponse>> {
    let count = state
        .session_service
        .revoke_all_other_sessions(auth.user.id, &auth.token_hash)
        .await?;

    Ok(Json(CountResponse { count }))
}

pub async fn cleanup_sessions_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<CountResponse>> {
    let count = state.session_service.cleanup_expired_sessions().await?;

    Ok(Json(CountResponse { count }))
}

pub async fn session_stats_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<SessionStatisticsResponse>> {
    let stats = state.session_service.get_statistics().await?;

    Ok(Json(SessionStatisticsResponse::from(stats)))
}
