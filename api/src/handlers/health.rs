use axum::{extract::State, Json};
use chrono::Utc;
use tracing::error;

use crate::{
    models::{DatabaseHealth, HealthResponse},
    AppState,
};

/// Health check endpoint
///
/// Unguarded. Reports degraded rather than failing when the grant
/// store is unreachable.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.resolver.store().database().ping().await {
        Ok(()) => DatabaseHealth {
            connected: true,
            message: "Grant store reachable".to_string(),
        },
        Err(e) => {
            error!("Health check: grant store unreachable: {}", e);
            DatabaseHealth {
                connected: false,
                message: "Grant store unreachable".to_string(),
            }
        }
    };

    let status = if database.connected { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        database,
    })
}
