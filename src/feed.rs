use crate::error::UpstreamError;
use crate::types::*;
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of photos for a tag.
pub trait FeedGateway: Send + Sync {
    fn fetch<'a>(&'a self, tags: &'a str) -> BoxFuture<'a, Result<Vec<Item>, UpstreamError>>;
}

/// Talks to the `/feed` proxy, or directly to the public feed since both
/// accept the same query string.
#[derive(Clone, Debug)]
pub struct HttpFeedGateway {
    endpoint: String,
    tagmode: String,
    http_client: reqwest::Client,
}

impl HttpFeedGateway {
    pub fn new(endpoint: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            tagmode: "any".to_string(),
            http_client,
        }
    }

    pub fn with_tagmode(mut self, tagmode: impl Into<String>) -> Self {
        self.tagmode = tagmode.into();
        self
    }

    pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(timeout).build()
    }

    async fn fetch_items(&self, tags: &str) -> Result<Vec<Item>, UpstreamError> {
        info!("Fetching photos for: {}", tags);

        let params = [
            ("tags", tags),
            ("tagmode", self.tagmode.as_str()),
            ("format", "json"),
            ("nojsoncallback", "1"),
        ];
        let resp = self
            .http_client
            .get(&self.endpoint)
            .query(&params)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error)
                .unwrap_or_else(|_| text.chars().take(300).collect());
            return Err(UpstreamError::Status { status, message });
        }

        let body = resp.text().await?;
        let data: serde_json::Value =
            serde_json::from_str(body.trim()).map_err(|e| UpstreamError::Decode(e.to_string()))?;

        let items = items_from_payload(data);
        info!("Feed returned {} photos", items.len());
        Ok(items)
    }
}

impl FeedGateway for HttpFeedGateway {
    fn fetch<'a>(&'a self, tags: &'a str) -> BoxFuture<'a, Result<Vec<Item>, UpstreamError>> {
        Box::pin(self.fetch_items(tags))
    }
}

/// Pulls the `items` array out of a feed payload. Anything else in place of
/// the array counts as no results.
pub fn items_from_payload(data: serde_json::Value) -> Vec<Item> {
    let raw_items = match data {
        serde_json::Value::Object(mut map) => match map.remove("items") {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let total = raw_items.len();
    let items: Vec<Item> = raw_items
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<FeedItem>(raw) {
            Ok(item) => Some(Item::from(item)),
            Err(e) => {
                warn!("Skipping malformed feed item: {}", e);
                None
            }
        })
        .collect();

    debug!("Converted {} of {} feed items", items.len(), total);
    items
}
