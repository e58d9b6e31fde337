use dotenvy::dotenv;
use gitvault::app;
use gitvault::app_state::build_app_state;
use gitvault::backup::cloner::GitCloner;
use gitvault::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("starting gitvault");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(err) = tokio::fs::create_dir_all(&config.backup_root).await {
        error!(
            backup_root = %config.backup_root.display(),
            error = %err,
            "failed to create backup root"
        );
        std::process::exit(1);
    }

    let state = match build_app_state(&config, Arc::new(GitCloner::default())) {
        Ok(state) => Arc::new(state),
        Err(err) => {
            error!(error = %err, "failed to build application state");
            std::process::exit(1);
        }
    };

    // Warm the token cache so the first push does not pay the exchange
    // latency. Failure here is recoverable on a later request.
    match state.issuer.current_token().await {
        Ok(token) => info!(expires_at = %token.expires_at, "obtained installation token"),
        Err(err) => warn!(error = %err, "startup token exchange failed"),
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(address = %addr, error = %err, "failed to bind listener");
            std::process::exit(1);
        }
    };
    info!(address = %addr, "listening");

    if let Err(err) = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %err, "server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}
