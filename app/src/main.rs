//! Server entrypoint: wires the role registry, grant store and
//! signage client together and serves the dashboard API.

mod config;
mod logging;

use std::sync::Arc;

use tracing::info;

use api::{ApiConfig, AppState, SignageClient};
use grants::{GrantDatabase, GrantDatabaseConfig, GrantStore, PermissionResolver};
use rbac::RoleRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = config::AppEnv::from_env()?;
    let _log_guard = logging::init_logging(&env)?;

    info!("=== Portals dashboard starting ===");

    let registry = Arc::new(RoleRegistry::load_from_file(&env.roles_config_path)?);
    info!(
        "Loaded {} roles from {:?}",
        registry.role_ids().count(),
        env.roles_config_path
    );

    let db = GrantDatabase::new(GrantDatabaseConfig {
        database_path: env.database_path.clone(),
        max_connections: 5,
    })
    .await?;
    let resolver = PermissionResolver::new(registry, GrantStore::new(db));

    let signage = SignageClient::new(&env.signage_base_url, &env.signage_api_token)?;
    let state = AppState::new(resolver, Arc::new(signage));

    api::start_server_with_config(state, ApiConfig::new().with_port(env.port)).await?;

    logging::log_shutdown();

    Ok(())
}
