#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::EncodingKey;
use reqwest::Client;
use serde_json::json;
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use gitvault::app_state::AppState;
use gitvault::backup::cloner::Cloner;
use gitvault::backup::{BackupError, BackupOrchestrator};
use gitvault::github::auth::TokenIssuer;

pub const TEST_SECRET: &str = "test-webhook-secret";
pub const TEST_KEY: &str = include_str!("../fixtures/test-key.pem");

/// Computes the `X-Hub-Signature-256` header value for a payload.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Spawns a local stand-in for the GitHub token-issuance endpoint. Each
/// exchange bumps the counter and returns `ghs_test_{n}` expiring
/// `expires_in` from now.
pub async fn spawn_token_server(expires_in: Duration) -> (String, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));

    async fn issue(
        State((counter, expires_in)): State<(Arc<AtomicUsize>, Duration)>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        (
            StatusCode::CREATED,
            Json(json!({
                "token": format!("ghs_test_{n}"),
                "expires_at": (Utc::now() + expires_in).to_rfc3339(),
            })),
        )
    }

    let router = Router::new()
        .route("/app/installations/{id}/access_tokens", post(issue))
        .with_state((counter.clone(), expires_in));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}"), counter)
}

/// Token endpoint that always refuses, echoing a fixed body.
pub async fn spawn_refusing_token_server(status: StatusCode, body: &'static str) -> String {
    let router = Router::new().route(
        "/app/installations/{id}/access_tokens",
        post(move || async move { (status, body) }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}

#[derive(Debug, Clone)]
pub struct CloneCall {
    pub url: String,
    pub username: String,
    pub password: String,
    pub dest: PathBuf,
}

/// Records clone invocations instead of talking to a remote.
#[derive(Default)]
pub struct RecordingCloner {
    pub calls: Mutex<Vec<CloneCall>>,
}

#[async_trait]
impl Cloner for RecordingCloner {
    async fn clone_repo(
        &self,
        url: &str,
        username: &str,
        password: &str,
        dest: &Path,
    ) -> Result<(), BackupError> {
        self.calls.lock().unwrap().push(CloneCall {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            dest: dest.to_path_buf(),
        });
        Ok(())
    }
}

pub fn make_issuer(api_base: &str) -> TokenIssuer {
    TokenIssuer::new(
        Client::new(),
        EncodingKey::from_rsa_pem(TEST_KEY.as_bytes()).unwrap(),
        "12345".to_string(),
        999,
        api_base.to_string(),
    )
}

pub fn make_state(api_base: &str, backup_root: &Path, cloner: Arc<dyn Cloner>) -> Arc<AppState> {
    Arc::new(AppState {
        webhook_secret: TEST_SECRET.to_string(),
        issuer: make_issuer(api_base),
        orchestrator: BackupOrchestrator::new(backup_root.to_path_buf(), cloner),
    })
}

/// A plausible push envelope for `owner/repo`.
pub fn push_payload(git_ref: &str, owner: &str, repo: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "ref": git_ref,
        "repository": {
            "name": repo,
            "full_name": format!("{owner}/{repo}"),
            "clone_url": format!("https://github.com/{owner}/{repo}.git"),
            "owner": { "name": owner }
        },
        "commits": [
            { "id": "2344c05c8136207b55090d1d2e37b094db37c112", "message": "update readme" }
        ]
    }))
    .unwrap()
}
