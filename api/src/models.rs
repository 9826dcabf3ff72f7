use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use grants::Grant;
use rbac::{AccessLevel, PermissionFlags, PlayerAllowList, User};

/// One signage player as seen by the dashboard.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlayerResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// "online" or "offline"
    pub status: String,
}

/// Response for listing players
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlayerListResponse {
    pub players: Vec<PlayerResponse>,
    pub total: usize,
}

/// One grant row as returned by the admin endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantResponse {
    pub user_id: String,
    pub player_id: String,
    pub player_name: String,
    #[schema(value_type = String, example = "manage")]
    pub access_level: AccessLevel,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<Grant> for GrantResponse {
    fn from(grant: Grant) -> Self {
        Self {
            user_id: grant.user_id,
            player_id: grant.player_id,
            player_name: grant.player_name,
            access_level: grant.access_level,
            granted_by: grant.granted_by,
            granted_at: grant.granted_at,
            expires_at: grant.expires_at,
            notes: grant.notes,
        }
    }
}

/// Response for listing grants
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantListResponse {
    pub grants: Vec<GrantResponse>,
    pub total: usize,
}

/// Request to grant player access to a phone number.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantAccessRequest {
    pub phone_number: String,
    pub player_id: String,
    pub player_name: String,
    #[schema(value_type = String, example = "view")]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to revoke player access.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeAccessRequest {
    pub user_id: String,
    pub player_id: String,
}

/// Query filters for the grant listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct GrantListParams {
    pub player_id: Option<String>,
    pub user_id: Option<String>,
    /// History view: include expired rows. Audit only, never used for
    /// authorization.
    #[serde(default)]
    pub include_expired: bool,
}

/// Current identity plus its resolved permissions, for UI bootstrap.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    #[schema(value_type = Object)]
    pub user: User,
    pub role: String,
    pub display_name: String,
    #[schema(value_type = Object)]
    pub permissions: PermissionFlags,
    #[schema(value_type = Object)]
    pub allowed_players: PlayerAllowList,
    pub allowed_locations: Vec<String>,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}
