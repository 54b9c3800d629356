//! PaperAI web front end.
//!
//! Run with: cargo run -p paperai-web

use std::sync::Arc;

use anyhow::Context;
use paperai_client::HttpPaperApi;
use paperai_config::Config;
use paperai_web::{router::build_router, state::AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,paperai_web=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting PaperAI web front end...");

    let config = Config::load().context("loading configuration")?;
    let addr = config.bind_addr()?;

    let api = HttpPaperApi::new(&config.backend.base_url, config.backend.timeout())
        .context("building backend client")?;
    info!(backend = %api.base_url(), "Backend client ready");

    let state = AppState::new(config, Arc::new(api))?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
