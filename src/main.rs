use std::sync::Arc;
use tracing::info;

use photo_search::{config::GatewayConfig, gateway, GatewayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = GatewayConfig::from_env()?;

    info!("Starting photo feed gateway");
    info!("Feed URL: {}", config.feed_url);

    let http_client = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()?;

    let state = Arc::new(GatewayState::new(config.feed_url, http_client));
    let app = gateway::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Gateway listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
