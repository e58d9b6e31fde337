use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

use crate::app_state::AppState;
use crate::github::events::{is_main_branch, PUSH_EVENT};
use crate::github::models::PushEvent;
use crate::github::signature::verify_signature;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Request pipeline: signature → event kind → parse → branch filter →
/// token + backup. Every failure short-circuits with a stage-specific
/// status; no-op paths (non-push events, non-default branches) are 200.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let delivery = header_str(&headers, "X-GitHub-Delivery").unwrap_or("");
    let span = tracing::info_span!("webhook", request_id = delivery);
    handle(state, headers, body).instrument(span).await
}

async fn handle(
    state: Arc<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    // Verify the payload before touching it. A missing header fails the
    // same way as a bad digest.
    let signature = header_str(&headers, "X-Hub-Signature-256").unwrap_or("");
    if !verify_signature(signature, &body, &state.webhook_secret) {
        warn!("invalid webhook signature");
        return (StatusCode::UNAUTHORIZED, "Invalid signature");
    }

    let event_kind = match header_str(&headers, "X-GitHub-Event") {
        Some(kind) => kind,
        None => {
            warn!("missing X-GitHub-Event header");
            return (StatusCode::BAD_REQUEST, "Missing event header");
        }
    };

    if event_kind != PUSH_EVENT {
        info!(event_type = event_kind, "ignoring non-push event");
        return (StatusCode::OK, "");
    }

    let event: PushEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            error!(error = %err, "failed to parse webhook payload");
            return (StatusCode::BAD_REQUEST, "Failed to parse webhook payload");
        }
    };

    if !is_main_branch(&event.git_ref) {
        info!(
            repository = %event.repository.full_name,
            git_ref = %event.git_ref,
            "ignoring push to non-default branch"
        );
        return (StatusCode::OK, "");
    }

    let token = match state.issuer.current_token().await {
        Ok(token) => token,
        Err(err) => {
            error!(error = %err, "failed to obtain installation token");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to backup repository",
            );
        }
    };

    match state.orchestrator.backup(&event, &token).await {
        Ok(path) => {
            info!(
                repository = %event.repository.full_name,
                backup_dir = %path.display(),
                "webhook processed successfully"
            );
            (StatusCode::OK, "")
        }
        Err(err) => {
            error!(
                repository = %event.repository.full_name,
                error = %err,
                "failed to backup repository"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to backup repository",
            )
        }
    }
}
