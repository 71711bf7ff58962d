use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Result};
use tracing::info;

use crate::store::FileStore;

/// Public photo feed queried by the gateway.
pub const DEFAULT_FEED_URL: &str = "https://www.flickr.com/services/feeds/photos_public.gne";

/// Settings for the `/feed` proxy server.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub feed_url: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: try_load("GATEWAY_ADDR", "0.0.0.0:5000")?,
            feed_url: load_string("PHOTO_FEED_URL", DEFAULT_FEED_URL),
            timeout: Duration::from_secs(try_load("HTTP_TIMEOUT_SECS", "30")?),
        })
    }
}

/// Settings for the interactive search client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub gateway_url: String,
    pub tagmode: String,
    pub store_path: PathBuf,
    pub gate_pagination: bool,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        let store_path = match env::var("PHOTO_STORE_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => {
                let path = FileStore::default_path();
                info!("PHOTO_STORE_PATH not set, using default: {}", path.display());
                path
            }
        };

        Ok(Self {
            gateway_url: load_string("PHOTO_GATEWAY_URL", "http://localhost:5000/feed"),
            tagmode: load_string("PHOTO_TAGMODE", "any"),
            store_path,
            gate_pagination: try_load("PHOTO_GATE_PAGINATION", "false")?,
            timeout: Duration::from_secs(try_load("HTTP_TIMEOUT_SECS", "30")?),
        })
    }
}

fn load_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    load_string(key, default)
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_uses_default_when_unset() {
        let port: u16 = try_load("PHOTO_SEARCH_TEST_UNSET_VAR", "5000").unwrap();
        assert_eq!(port, 5000);
    }

    #[test]
    fn test_try_load_rejects_bad_value() {
        env::set_var("PHOTO_SEARCH_TEST_BAD_BOOL", "maybe");
        let parsed: Result<bool> = try_load("PHOTO_SEARCH_TEST_BAD_BOOL", "false");
        assert!(parsed.is_err());
        env::remove_var("PHOTO_SEARCH_TEST_BAD_BOOL");
    }
}
