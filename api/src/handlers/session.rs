//! Session endpoints: identity bootstrap for the dashboard UI and
//! logout.

use axum::{extract::State, Extension, Json};
use tower_sessions::Session;
use tracing::info;

use crate::{
    auth::{require_user, CurrentUser},
    error::ApiResult,
    models::{MeResponse, SuccessResponse},
    AppState,
};

/// Get the current user and their effective permissions
///
/// Merges the caller's role with their active grants; the UI drives
/// its navigation and player visibility off this single response.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "session",
    responses(
        (status = 200, description = "Current identity and permissions", body = MeResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<MeResponse>> {
    let user = require_user(&current)?;

    let effective = state.resolver.resolve(user).await?;

    Ok(Json(MeResponse {
        user: user.clone(),
        role: effective.role,
        display_name: effective.display_name,
        permissions: effective.flags,
        allowed_players: effective.allowed_players,
        allowed_locations: effective.allowed_locations,
    }))
}

/// Log out the current session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "session",
    responses(
        (status = 200, description = "Session cleared", body = SuccessResponse),
    )
)]
pub async fn logout(Extension(session): Extension<Session>) -> ApiResult<Json<SuccessResponse>> {
    session.clear().await;
    info!("Session cleared");

    Ok(Json(SuccessResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    }))
}
