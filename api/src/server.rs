use tokio::task::JoinHandle;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing::info;

use crate::{create_router, AppState};

/// API server configuration
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3030 }
    }
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Start the API server with the given configuration.
///
/// The session layer wraps the whole router so the identity middleware
/// always sees an initialized session.
pub async fn start_server_with_config(
    state: AppState,
    config: ApiConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store).with_name("portals_session");

    let app = create_router(state).layer(session_layer);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);
    info!(
        "Swagger UI available at http://localhost:{}/api/v1/swagger",
        config.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Start the API server with default configuration
pub async fn start_server(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    start_server_with_config(state, ApiConfig::default()).await
}

/// Start the API server in a background task
pub fn spawn_server(state: AppState, config: ApiConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_server_with_config(state, config).await {
            tracing::error!("API server error: {}", e);
        }
    })
}
