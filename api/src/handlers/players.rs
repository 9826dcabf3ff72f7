//! Player listing and access-check handlers. The raw player list comes
//! from the signage server; authorization decides which rows survive.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::{debug, error};

use rbac::Permission;

use crate::{
    auth::{require_permission, CurrentUser},
    error::{ApiError, ApiResult},
    models::{GrantListResponse, GrantResponse, PlayerListResponse, PlayerResponse},
    AppState,
};

/// List signage players visible to the current user
///
/// Fetches the full fleet from the signage server and returns only the
/// players the caller's role and grants allow.
#[utoipa::path(
    get,
    path = "/api/v1/players",
    tag = "players",
    responses(
        (status = 200, description = "Players visible to the caller", body = PlayerListResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiErrorResponse),
        (status = 403, description = "Role lacks player visibility", body = crate::error::ApiErrorResponse),
        (status = 502, description = "Signage server unavailable", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn list_players(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<PlayerListResponse>> {
    let user = require_permission(state.registry(), &current, Permission::CanViewPlayers)?;

    let fetched = state.players.list_players().await.map_err(|e| {
        error!("Signage player listing failed: {}", e);
        ApiError::Upstream
    })?;
    let total_fetched = fetched.len();

    let visible = state.resolver.filter_allowed(user, fetched).await?;
    debug!(
        "Player listing for user {}: {} of {} visible",
        user.id,
        visible.len(),
        total_fetched
    );

    let players: Vec<PlayerResponse> = visible
        .into_iter()
        .map(|p| {
            // A location from config fills in when the signage record
            // has none.
            let location = p.location.clone().or_else(|| {
                state
                    .registry()
                    .player_location(&p.name)
                    .map(str::to_string)
            });
            PlayerResponse {
                id: p.id,
                name: p.name,
                location,
                status: if p.is_connected { "online" } else { "offline" }.to_string(),
            }
        })
        .collect();

    Ok(Json(PlayerListResponse {
        total: players.len(),
        players,
    }))
}

/// List who has access to one player
///
/// Active grants on the player, newest first. Statically allowed
/// roles do not appear here; this is the grant view only.
#[utoipa::path(
    get,
    path = "/api/v1/players/{player_id}/access",
    tag = "players",
    params(
        ("player_id" = String, Path, description = "Signage player id"),
    ),
    responses(
        (status = 200, description = "Active grants on the player", body = GrantListResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiErrorResponse),
        (status = 403, description = "Not a user manager", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn player_access(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(player_id): Path<String>,
) -> ApiResult<Json<GrantListResponse>> {
    require_permission(state.registry(), &current, Permission::CanManageUsers)?;

    let grants = state
        .resolver
        .store()
        .grants_for_player(&player_id)
        .await?;
    let grants: Vec<GrantResponse> = grants.into_iter().map(GrantResponse::from).collect();

    Ok(Json(GrantListResponse {
        total: grants.len(),
        grants,
    }))
}
