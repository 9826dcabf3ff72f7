use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use grants::PermissionResolver;
use rbac::RoleRegistry;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;
pub mod signage;


// Re-export server functions for convenience
pub use server::{spawn_server, start_server, start_server_with_config, ApiConfig};
pub use signage::{PlayerDirectory, SignageClient, SignagePlayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: PermissionResolver,
    pub players: Arc<dyn PlayerDirectory>,
}

impl AppState {
    pub fn new(resolver: PermissionResolver, players: Arc<dyn PlayerDirectory>) -> Self {
        Self { resolver, players }
    }

    pub fn registry(&self) -> &RoleRegistry {
        self.resolver.registry()
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::players::list_players,
        handlers::players::player_access,
        handlers::permissions::list_grants,
        handlers::permissions::grant_access,
        handlers::permissions::revoke_access,
        handlers::session::get_current_user,
        handlers::session::logout,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::PlayerResponse,
            models::PlayerListResponse,
            models::GrantResponse,
            models::GrantListResponse,
            models::GrantAccessRequest,
            models::RevokeAccessRequest,
            models::MeResponse,
            models::SuccessResponse,
            models::HealthResponse,
            models::DatabaseHealth,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    tags(
        (name = "players", description = "Signage player visibility"),
        (name = "permissions", description = "Player access grant administration"),
        (name = "session", description = "Session and identity endpoints"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Portals Dashboard API",
        version = "1.0.0",
        description = "RESTful API for the Portals signage dashboard",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // API v1 routes
    let api_v1 = Router::new()
        .route("/players", get(handlers::players::list_players))
        .route(
            "/players/:player_id/access",
            get(handlers::players::player_access),
        )
        .route(
            "/admin/permissions",
            get(handlers::permissions::list_grants)
                .post(handlers::permissions::grant_access)
                .delete(handlers::permissions::revoke_access),
        )
        .route("/auth/me", get(handlers::session::get_current_user))
        .route("/auth/logout", post(handlers::session::logout))
        .route("/health", get(handlers::health::health_check))
        // Apply middleware to all API routes
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::identity_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::request_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::response_middleware,
        ));

    // Main router
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/api/v1/swagger").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
