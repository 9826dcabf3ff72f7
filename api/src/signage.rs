use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use rbac::PlayerRef;

#[derive(Error, Debug)]
pub enum SignageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Signage API error: {0}")]
    Api(String),
}

/// One player record from the signage server.
#[derive(Debug, Clone, Deserialize)]
pub struct SignagePlayer {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "isConnected")]
    pub is_connected: bool,
}

impl PlayerRef for SignagePlayer {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// The narrow interface to the signage server. Handlers only ever see
/// this trait; the concrete client is injected at startup.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn list_players(&self) -> Result<Vec<SignagePlayer>, SignageError>;
}

#[derive(Debug, Deserialize)]
struct PlayersEnvelope {
    data: PlayersData,
}

#[derive(Debug, Deserialize)]
struct PlayersData {
    #[serde(default)]
    objects: Vec<SignagePlayer>,
}

/// HTTP client for the signage server. Explicitly constructed and
/// injected; construction validates the configuration so a bad
/// deployment fails at boot rather than on first use.
#[derive(Debug, Clone)]
pub struct SignageClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SignageClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, SignageError> {
        if base_url.is_empty() {
            return Err(SignageError::Config(
                "signage base URL must not be empty".to_string(),
            ));
        }
        if token.is_empty() {
            return Err(SignageError::Config(
                "signage API token must not be empty".to_string(),
            ));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl PlayerDirectory for SignageClient {
    async fn list_players(&self) -> Result<Vec<SignagePlayer>, SignageError> {
        let url = format!("{}/players", self.base_url);
        debug!("Fetching players from {}", url);

        let response = self
            .http
            .get(&url)
            .header("x-access-token", &self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SignageError::Api(format!(
                "player listing returned {}",
                response.status()
            )));
        }

        let envelope: PlayersEnvelope = response.json().await?;

        Ok(envelope.data.objects)
    }
}
