//! HTTP client configuration.

use std::time::Duration;

/// Base URL of the hosted Tggl API.
pub const DEFAULT_BASE_URL: &str = "https://api.tggl.io";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-tggl-api-key";

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL relative request paths are joined onto.
    pub base_url: Option<String>,
    /// API key sent as `x-tggl-api-key` on every request.
    pub api_key: Option<String>,
    /// Default request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Default headers for all requests.
    pub default_headers: Vec<(String, String)>,
    /// User agent string.
    pub user_agent: String,
    /// Follow redirects.
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            default_headers: Vec::new(),
            user_agent: format!("tggl-http-client/{}", env!("CARGO_PKG_VERSION")),
            follow_redirects: false,
        }
    }
}

impl HttpClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client configuration.
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL for all requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the API key if one is given.
    pub fn maybe_api_key(mut self, key: Option<String>) -> Self {
        self.config.api_key = key;
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Add a default header for all requests.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable following redirects.
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.follow_redirects);
        assert!(config.api_key.is_none());
        assert!(config.user_agent.starts_with("tggl-http-client/"));
    }

    #[test]
    fn test_builder() {
        let config = HttpClientConfig::builder()
            .base_url(DEFAULT_BASE_URL)
            .api_key("key")
            .timeout(Duration::from_secs(20))
            .default_header("x-extra", "1")
            .build();

        assert_eq!(config.base_url.as_deref(), Some("https://api.tggl.io"));
        assert_eq!(config.api_key.as_deref(), Some("key"));
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.default_headers.len(), 1);
    }

    #[test]
    fn test_maybe_api_key_clears() {
        let config = HttpClientConfig::builder()
            .api_key("key")
            .maybe_api_key(None)
            .build();
        assert!(config.api_key.is_none());
    }
}
