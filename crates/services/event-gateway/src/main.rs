//! NVR Event Gateway binary
//!
//! # Usage
//!
//! ```bash
//! # config.json in the working directory (defaults when absent)
//! cargo run -p nvr-event-gateway
//!
//! # explicit config file (JSON or TOML)
//! cargo run -p nvr-event-gateway -- /etc/nvr/gateway.toml
//!
//! # overrides
//! NVR_SERVER_PORT=9090 NVR_LOG_FILE=stdout RUST_LOG=debug cargo run -p nvr-event-gateway
//! ```
//!
//! # Environment Variables
//!
//! - `NVR_CONFIG`: config file path when no argument is given
//! - `NVR_*`: per-field overrides, see [`Config::apply_env`]
//! - `RUST_LOG`: log filter (default: `info,tower_http=debug`)

use anyhow::Context;
use nvr_event_gateway::{
    api::{build_router, AppState},
    config::{Config, DEFAULT_CONFIG_FILE},
    logging::init_tracing,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("NVR_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    init_tracing(&config).context("Failed to initialize logging")?;

    let addr = config.bind_address()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        bind_address = %addr,
        forward = config.forward_url().unwrap_or("disabled"),
        telegram = config.telegram_configured(),
        auth = config.auth_enabled(),
        hikvision_auth = config.hik_auth_enabled(),
        "NVR Event Gateway starting"
    );

    let state = AppState::new(config).context("Failed to configure sinks")?;
    info!(sinks = ?state.pipeline.fan_out().sink_names(), "Sinks configured");

    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("NVR Event Gateway shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
