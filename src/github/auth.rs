use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::github::models::Claims;

/// App assertions are valid for 10 minutes, the GitHub maximum.
const ASSERTION_TTL_SECS: usize = 600;

/// A cached token is considered stale this many seconds before
/// `expires_at`, so a token handed to a clone in flight does not expire
/// mid-use.
const FRESHNESS_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to sign app assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("token exchange request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token exchange rejected ({status}): {body}")]
    Exchange { status: StatusCode, body: String },
}

/// Short-lived installation bearer credential. Handed out by value; only
/// the issuer's cache holds onto one across requests.
#[derive(Clone, Debug, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl InstallationToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(FRESHNESS_MARGIN_SECS) < self.expires_at
    }
}

/// Mints App JWTs and exchanges them for installation tokens, caching the
/// current token until it nears expiry.
pub struct TokenIssuer {
    client: Client,
    encoding_key: EncodingKey,
    app_id: String,
    installation_id: u64,
    api_base: String,
    cached: Mutex<Option<InstallationToken>>,
}

impl TokenIssuer {
    pub fn new(
        client: Client,
        encoding_key: EncodingKey,
        app_id: String,
        installation_id: u64,
        api_base: String,
    ) -> Self {
        Self {
            client,
            encoding_key,
            app_id,
            installation_id,
            api_base: api_base.trim_end_matches('/').to_string(),
            cached: Mutex::new(None),
        }
    }

    /// Builds the signed RS256 identity assertion for this App.
    pub fn mint_assertion(&self) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as usize;
        let claims = Claims {
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
            iss: self.app_id.clone(),
        };
        Ok(encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Exchanges an assertion for an installation token. Non-201 responses
    /// are surfaced verbatim; retry policy is the caller's business.
    async fn exchange(&self, assertion: &str) -> Result<InstallationToken, AuthError> {
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base, self.installation_id
        );
        let res = self
            .client
            .post(url)
            .bearer_auth(assertion)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "gitvault")
            .send()
            .await?;

        let status = res.status();
        if status != StatusCode::CREATED {
            let body = res.text().await.unwrap_or_default();
            return Err(AuthError::Exchange { status, body });
        }

        Ok(res.json().await?)
    }

    /// Returns the cached token if still fresh, otherwise mints and
    /// exchanges a new one. The cache lock is held across the refresh, so
    /// concurrent stale observers share one in-flight exchange.
    pub async fn current_token(&self) -> Result<InstallationToken, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.clone());
            }
        }

        let assertion = self.mint_assertion()?;
        let token = self.exchange(&assertion).await?;
        tracing::debug!(expires_at = %token.expires_at, "refreshed installation token");
        *cached = Some(token.clone());
        Ok(token)
    }
}
