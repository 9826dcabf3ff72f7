//! Admin grant lifecycle handlers. Every route requires the
//! `canManageUsers` flag; grants are keyed by phone number so access
//! can be handed out before the recipient's first login.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use tracing::info;

use grants::NewGrant;
use rbac::Permission;

use crate::{
    auth::{require_permission, CurrentUser},
    error::{ApiError, ApiResult},
    models::{
        GrantAccessRequest, GrantListParams, GrantListResponse, GrantResponse,
        RevokeAccessRequest, SuccessResponse,
    },
    AppState,
};

const MIN_PHONE_DIGITS: usize = 10;

/// List access grants
///
/// Unfiltered: every active grant. `player_id` narrows to one player,
/// `user_id` to one user; `include_expired` adds historical rows to
/// the per-user view.
#[utoipa::path(
    get,
    path = "/api/v1/admin/permissions",
    tag = "permissions",
    params(
        ("player_id" = Option<String>, Query, description = "Only grants on this player"),
        ("user_id" = Option<String>, Query, description = "Only grants for this user"),
        ("include_expired" = Option<bool>, Query, description = "Include expired rows (per-user view only)"),
    ),
    responses(
        (status = 200, description = "Matching grants, newest first", body = GrantListResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiErrorResponse),
        (status = 403, description = "Not a user manager", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn list_grants(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<GrantListParams>,
) -> ApiResult<Json<GrantListResponse>> {
    require_permission(state.registry(), &current, Permission::CanManageUsers)?;

    let store = state.resolver.store();
    let grants = if let Some(player_id) = &params.player_id {
        store.grants_for_player(player_id).await?
    } else if let Some(user_id) = &params.user_id {
        if params.include_expired {
            store.grants_for_user_all(user_id).await?
        } else {
            store.grants_for_user(user_id).await?
        }
    } else {
        store.grants_active().await?
    };

    let grants: Vec<GrantResponse> = grants.into_iter().map(GrantResponse::from).collect();

    Ok(Json(GrantListResponse {
        total: grants.len(),
        grants,
    }))
}

/// Grant a user access to a player
///
/// Upserts on (user, player): repeating the grant updates level,
/// expiry and notes in place. The recipient is looked up by phone
/// number and created as a pending user if unseen.
#[utoipa::path(
    post,
    path = "/api/v1/admin/permissions",
    tag = "permissions",
    request_body = GrantAccessRequest,
    responses(
        (status = 200, description = "Grant recorded", body = GrantResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiErrorResponse),
        (status = 403, description = "Not a user manager", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn grant_access(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<GrantAccessRequest>,
) -> ApiResult<Json<GrantResponse>> {
    let actor = require_permission(state.registry(), &current, Permission::CanManageUsers)?;

    if req.phone_number.chars().count() < MIN_PHONE_DIGITS {
        return Err(ApiError::Validation(format!(
            "phone_number must have at least {} characters",
            MIN_PHONE_DIGITS
        )));
    }
    if req.player_id.trim().is_empty() {
        return Err(ApiError::Validation("player_id must not be empty".to_string()));
    }
    if req.player_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "player_name must not be empty".to_string(),
        ));
    }

    let store = state.resolver.store();
    let recipient = store.ensure_user_by_phone(&req.phone_number).await?;

    let grant = store
        .grant(NewGrant {
            user_id: recipient.id,
            player_id: req.player_id,
            player_name: req.player_name,
            access_level: req.access_level,
            granted_by: actor.phone_number.clone(),
            expires_at: req.expires_at,
            notes: req.notes,
        })
        .await?;

    info!(
        "User {} granted {} access to player {} for {}",
        actor.id, grant.access_level, grant.player_id, req.phone_number
    );

    Ok(Json(GrantResponse::from(grant)))
}

/// Revoke a user's access to a player
///
/// Idempotent: revoking an absent grant still succeeds.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/permissions",
    tag = "permissions",
    request_body = RevokeAccessRequest,
    responses(
        (status = 200, description = "Grant removed (or was already absent)", body = SuccessResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiErrorResponse),
        (status = 403, description = "Not a user manager", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn revoke_access(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<RevokeAccessRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let actor = require_permission(state.registry(), &current, Permission::CanManageUsers)?;

    if req.user_id.trim().is_empty() {
        return Err(ApiError::Validation("user_id must not be empty".to_string()));
    }
    if req.player_id.trim().is_empty() {
        return Err(ApiError::Validation("player_id must not be empty".to_string()));
    }

    state
        .resolver
        .store()
        .revoke(&actor.phone_number, &req.user_id, &req.player_id)
        .await?;

    info!(
        "User {} revoked access to player {} for user {}",
        actor.id, req.player_id, req.user_id
    );

    Ok(Json(SuccessResponse {
        success: true,
        message: "Access revoked successfully".to_string(),
    }))
}
