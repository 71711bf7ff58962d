use serde::{Deserialize, Serialize};

/// Photos shown per page.
pub const PER_PAGE: usize = 12;

/// Query searched when the application starts.
pub const DEFAULT_QUERY: &str = "nature";

/// Fallback title for photos published without one.
pub const UNTITLED: &str = "Untitled";

/// A single photo, normalized from the feed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    /// Unique per photo; used as the render key.
    pub link: String,
    pub author: String,
    pub image_url: String,
}

impl From<FeedItem> for Item {
    fn from(raw: FeedItem) -> Self {
        let title = match raw.title {
            Some(t) if !t.is_empty() => t,
            _ => UNTITLED.to_string(),
        };
        Self {
            title,
            link: raw.link,
            author: raw.author,
            image_url: raw.media.map(|m| m.m).unwrap_or_default(),
        }
    }
}

/// A photo as published by the feed.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedItem {
    #[serde(default)]
    pub title: Option<String>,
    pub link: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub media: Option<FeedMedia>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedMedia {
    #[serde(default)]
    pub m: String,
}

/// Body returned by the gateway for every failure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorEnvelope {
    pub items: Vec<serde_json::Value>,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            error: error.into(),
            url: None,
            preview: None,
        }
    }

    pub fn with_upstream(mut self, url: impl Into<String>, preview: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.preview = Some(preview.into());
        self
    }
}
