pub mod app;
pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod history;
pub mod orchestrator;
pub mod rate_limiter;
pub mod store;
pub mod theme;
pub mod types;

/// Shared state of the `/feed` proxy.
#[derive(Clone, Debug)]
pub struct GatewayState {
    pub feed_url: String,
    pub http_client: reqwest::Client,
}

pub use types::*;

impl GatewayState {
    pub fn new(feed_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            feed_url: feed_url.into(),
            http_client,
        }
    }
}
