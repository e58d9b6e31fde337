pub mod app_state;
pub mod backup;
pub mod config;
pub mod github;
pub mod routes;

use axum::{routing::post, Router};
use std::sync::Arc;

use crate::app_state::AppState;
use crate::routes::webhook::webhook_handler;

/// Webhook router. GitHub may be pointed at either `/` or `/webhook`;
/// non-POST methods get 405 from the router itself.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(webhook_handler))
        .route("/webhook", post(webhook_handler))
        .with_state(state)
}
