use jsonwebtoken::EncodingKey;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::backup::cloner::Cloner;
use crate::backup::BackupOrchestrator;
use crate::config::Config;
use crate::github::auth::TokenIssuer;

/// Outbound HTTP calls (token exchange) are bounded so a hung remote
/// cannot pin request handlers indefinitely.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid private key material: {0}")]
    BadKey(#[from] jsonwebtoken::errors::Error),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct AppState {
    pub webhook_secret: String,
    pub issuer: TokenIssuer,
    pub orchestrator: BackupOrchestrator,
}

pub fn build_app_state(config: &Config, cloner: Arc<dyn Cloner>) -> Result<AppState, StateError> {
    let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;

    let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;

    let issuer = TokenIssuer::new(
        client,
        encoding_key,
        config.app_id.clone(),
        config.installation_id,
        config.github_api_url.clone(),
    );

    Ok(AppState {
        webhook_secret: config.webhook_secret.clone(),
        issuer,
        orchestrator: BackupOrchestrator::new(config.backup_root.clone(), cloner),
    })
}
