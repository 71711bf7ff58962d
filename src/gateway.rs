use crate::error::GatewayError;
use crate::types::*;
use crate::GatewayState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Characters of upstream body echoed back in error envelopes.
const PREVIEW_CHARS: usize = 300;

const USER_AGENT: &str = "Mozilla/5.0 (Photo Search Gateway)";

pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/feed", get(feed_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "photo-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn feed_handler(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, GatewayError> {
    // Absent and empty values both fall back; only whitespace-only tags are rejected.
    let tags = param_or(&params, "tags", DEFAULT_QUERY);
    let tagmode = param_or(&params, "tagmode", "any");

    if tags.is_empty() {
        return Err(GatewayError::MissingTags);
    }

    let body = proxy_feed(&state, &tags, &tagmode).await.map_err(|e| {
        error!("Feed proxy error: {}", e);
        e
    })?;

    let mut response = Json(body).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    Ok(response)
}

fn param_or(params: &HashMap<String, String>, key: &str, default: &str) -> String {
    params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .trim()
        .to_string()
}

/// Fetches the upstream feed for `tags` and returns its payload with `items`
/// guaranteed to be an array.
pub async fn proxy_feed(
    state: &GatewayState,
    tags: &str,
    tagmode: &str,
) -> Result<serde_json::Value, GatewayError> {
    info!("Proxying feed for: {} ({})", tags, tagmode);

    let mut feed_url = url::Url::parse(&state.feed_url)
        .map_err(|e| GatewayError::Internal(format!("Invalid feed URL: {}", e)))?;
    feed_url
        .query_pairs_mut()
        .append_pair("tags", tags)
        .append_pair("tagmode", tagmode)
        .append_pair("format", "json")
        .append_pair("nojsoncallback", "1");
    let feed_url = feed_url.to_string();
    debug!("Feed URL: {}", feed_url);

    // Only transport failures are retried; any HTTP response is final.
    let client = state.http_client.clone();
    let (status, text) = retry(
        ExponentialBackoffBuilder::new()
            .with_initial_interval(std::time::Duration::from_millis(200))
            .with_max_interval(std::time::Duration::from_secs(1))
            .with_max_elapsed_time(Some(std::time::Duration::from_secs(2)))
            .build(),
        || async {
            let resp = client
                .get(&feed_url)
                .header("User-Agent", USER_AGENT)
                .header("Accept", "application/json,text/plain,*/*")
                .send()
                .await
                .map_err(|e| {
                    warn!("Feed request failed, retrying: {}", e);
                    backoff::Error::transient(e)
                })?;
            let status = resp.status();
            let text = resp.text().await.map_err(backoff::Error::transient)?;
            Ok::<_, backoff::Error<reqwest::Error>>((status, text))
        },
    )
    .await
    .map_err(|e| GatewayError::Internal(e.to_string()))?;

    if !status.is_success() {
        return Err(GatewayError::UpstreamStatus {
            status: status.as_u16(),
            url: feed_url,
            preview: preview(&text),
        });
    }

    let trimmed = text.trim();
    if looks_like_markup(trimmed) {
        return Err(GatewayError::NotJson {
            url: feed_url,
            preview: preview(trimmed),
        });
    }

    let mut data: serde_json::Value =
        serde_json::from_str(trimmed).map_err(|_| GatewayError::Unparsable {
            url: feed_url.clone(),
            preview: preview(trimmed),
        })?;

    normalize_items(&mut data);
    Ok(data)
}

fn looks_like_markup(body: &str) -> bool {
    ["<?xml", "<rss", "<!DOCTYPE", "<html"]
        .iter()
        .any(|prefix| body.starts_with(prefix))
}

fn preview(body: &str) -> String {
    body.chars().take(PREVIEW_CHARS).collect()
}

// Non-object payloads become `{ "items": [] }`.
fn normalize_items(data: &mut serde_json::Value) {
    if !data.is_object() {
        *data = serde_json::json!({});
    }
    if let serde_json::Value::Object(map) = data {
        let is_array = matches!(map.get("items"), Some(serde_json::Value::Array(_)));
        if !is_array {
            map.insert("items".to_string(), serde_json::Value::Array(Vec::new()));
        }
    }
}
