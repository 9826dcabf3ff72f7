use std::path::PathBuf;

/// Process configuration, sourced from the environment (and `.env`
/// when present). The signage credentials are the only required
/// values; everything else has a sensible default.
#[derive(Debug, Clone)]
pub struct AppEnv {
    pub roles_config_path: PathBuf,
    pub database_path: PathBuf,
    pub logs_path: PathBuf,
    pub port: u16,
    pub signage_base_url: String,
    pub signage_api_token: String,
}

impl AppEnv {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let roles_config_path = std::env::var("ROLES_CONFIG_PATH")
            .unwrap_or_else(|_| "./config/roles.yaml".to_string());
        let database_path = std::env::var("GRANTS_DATABASE_PATH")
            .unwrap_or_else(|_| "./data/portals_grants.db".to_string());
        let logs_path = std::env::var("LOGS_PATH").unwrap_or_else(|_| "./data/logs".to_string());

        let port = match std::env::var("API_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("API_PORT is not a valid port: {}", raw))?,
            Err(_) => 3030,
        };

        // No defaults here: a deployment without signage credentials
        // must fail at boot, not on first player listing.
        let signage_base_url = std::env::var("SIGNAGE_BASE_URL")
            .map_err(|_| "SIGNAGE_BASE_URL must be set".to_string())?;
        let signage_api_token = std::env::var("SIGNAGE_API_TOKEN")
            .map_err(|_| "SIGNAGE_API_TOKEN must be set".to_string())?;

        Ok(Self {
            roles_config_path: PathBuf::from(roles_config_path),
            database_path: PathBuf::from(database_path),
            logs_path: PathBuf::from(logs_path),
            port,
            signage_base_url,
            signage_api_token,
        })
    }
}
