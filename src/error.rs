use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::types::ErrorEnvelope;

/// Admission denied by the rate limiter.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Too many requests. Wait ~{wait_seconds} seconds and try again.")]
pub struct ThrottleError {
    pub wait_seconds: u64,
}

/// The feed could not be loaded.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed responded with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("feed returned an unreadable body: {0}")]
    Decode(String),
}

/// Key-value store failures. Never surfaced to the user.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("unrecognized stored value: {0}")]
    Unrecognized(String),
}

/// Failures of the `/feed` proxy route, rendered as a JSON envelope.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Missing tags parameter.")]
    MissingTags,

    #[error("Flickr error: HTTP {status}")]
    UpstreamStatus {
        status: u16,
        url: String,
        preview: String,
    },

    #[error("Flickr returned XML/HTML instead of JSON.")]
    NotJson { url: String, preview: String },

    #[error("Failed to parse Flickr response as JSON.")]
    Unparsable { url: String, preview: String },

    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingTags => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamStatus { .. }
            | GatewayError::NotJson { .. }
            | GatewayError::Unparsable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let envelope = ErrorEnvelope::new(self.to_string());
        match self {
            GatewayError::UpstreamStatus { url, preview, .. }
            | GatewayError::NotJson { url, preview }
            | GatewayError::Unparsable { url, preview } => {
                envelope.with_upstream(url.clone(), preview.clone())
            }
            GatewayError::MissingTags | GatewayError::Internal(_) => envelope,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), Json(self.envelope())).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_message_mentions_wait() {
        let err = ThrottleError { wait_seconds: 7 };
        assert_eq!(
            err.to_string(),
            "Too many requests. Wait ~7 seconds and try again."
        );
    }

    #[test]
    fn test_gateway_status_codes() {
        assert_eq!(GatewayError::MissingTags.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::NotJson {
                url: "u".into(),
                preview: "<rss".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_envelope_carries_diagnostics() {
        let err = GatewayError::UpstreamStatus {
            status: 503,
            url: "https://feed.example/photos".into(),
            preview: "down".into(),
        };
        let envelope = err.envelope();
        assert_eq!(envelope.error, "Flickr error: HTTP 503");
        assert!(envelope.items.is_empty());
        assert_eq!(envelope.url.as_deref(), Some("https://feed.example/photos"));
        assert_eq!(envelope.preview.as_deref(), Some("down"));
    }
}
