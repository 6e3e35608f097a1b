mod api;
mod auth;
mod config;
mod error;
mod escrow;
mod gateway;
mod models;
mod observability;
mod state;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::auth::MemoryIdentity;
use crate::gateway::{PaymentGateway, RazorpayGateway, SandboxGateway};
use crate::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let gateway: Arc<dyn PaymentGateway> = if config.payments_sandbox {
        tracing::warn!("payments sandbox enabled; gateway orders are simulated");
        Arc::new(SandboxGateway)
    } else {
        Arc::new(RazorpayGateway::new(
            config.razorpay_key_id.clone(),
            config.razorpay_key_secret.clone(),
            config.razorpay_base_url.clone(),
        ))
    };

    let app_state = Arc::new(state::AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryIdentity::new()),
        gateway,
        config.platform_account_id.clone(),
    ));

    let app = api::rest::router(app_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
