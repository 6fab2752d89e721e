use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Url};

use crate::error::Result;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Wrapper around the configured HTTP client and the backend base URL.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    base: Url,
}

/// Minimal data required to build an HTTP session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub api_base: String,
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(api_base: String, timeout: Duration) -> Self {
        Self { api_base, timeout }
    }
}

impl HttpSession {
    /// Build a new HTTP session based on CLI arguments.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = ClientBuilder::new()
            .default_headers(default_headers)
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .user_agent(concat!("fluxfolio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base: parse_base(&config.api_base)?,
        })
    }

    /// Returns reference to the inner `reqwest::Client`.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Base URL of the prediction backend.
    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

/// `Url::join` drops the last path segment unless it ends with a slash, so a
/// base such as `http://host/proxy` must become `http://host/proxy/`.
fn parse_base(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&with_slash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_keeps_path_prefix() {
        let base = parse_base("http://example.test/proxy").unwrap();
        assert_eq!(
            base.join("api/models").unwrap().as_str(),
            "http://example.test/proxy/api/models"
        );
    }

    #[test]
    fn rejects_garbage_base() {
        assert!(parse_base("not a url").is_err());
    }
}
